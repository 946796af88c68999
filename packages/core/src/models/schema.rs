//! Schema Graph Types
//!
//! An already-built schema graph is handed to the registry as [`Module`]
//! values: a flat set of [`SchemaNode`]s (position encoded in each node's
//! path), augmentations and identities. Parsing schema source text is the
//! job of an upstream collaborator.
//!
//! `SchemaNodeKind` is a closed union; the traverser and every validator
//! match on it exhaustively, so adding or removing a kind is a
//! compile-time-checked change.

use crate::models::{QName, SchemaPath};
use serde::{Deserialize, Serialize};

/// Value type of a leaf or leaf-list, restricted to what the type
/// validator consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueType {
    /// String with optional length bounds and regex patterns
    String {
        /// Inclusive `(min, max)` length bounds in characters
        length: Option<(u64, u64)>,
        /// Anchored regex patterns the value must match
        patterns: Vec<String>,
    },

    /// Signed integer with an optional inclusive range
    Int {
        /// Inclusive `(min, max)` bounds
        range: Option<(i64, i64)>,
    },

    /// Unsigned integer with an optional inclusive range
    Uint {
        /// Inclusive `(min, max)` bounds
        range: Option<(u64, u64)>,
    },

    /// Boolean, `true` or `false`
    Bool,

    /// Closed enumeration of string values
    Enumeration {
        /// Permitted values
        values: Vec<String>,
    },

    /// Reference to a registered identity derived from `base`
    IdentityRef {
        /// Base identity the value must derive from
        base: QName,
    },
}

impl ValueType {
    /// Unbounded string type
    pub fn string() -> Self {
        Self::String {
            length: None,
            patterns: Vec::new(),
        }
    }

    /// Unbounded signed integer type
    pub fn int() -> Self {
        Self::Int { range: None }
    }

    /// Unbounded unsigned integer type
    pub fn uint() -> Self {
        Self::Uint { range: None }
    }

    /// Enumeration over the given values
    pub fn enumeration(values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::Enumeration {
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// List-specific schema attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListSchema {
    /// Declared key leaves, in declared order. Order is load-bearing: the
    /// wire format requires the first N children of an entry to be exactly
    /// these keys in this order.
    pub keys: Vec<QName>,

    /// Unique-constraint groups; the value tuple of each group must be
    /// unique across sibling entries
    pub unique: Vec<Vec<QName>>,

    /// `ordered-by user` lists accept insert attributes
    pub user_ordered: bool,

    /// Minimum number of entries
    pub min_elements: Option<u32>,

    /// Maximum number of entries
    pub max_elements: Option<u32>,
}

/// Leaf-specific schema attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafSchema {
    /// Declared value type
    pub value_type: ValueType,

    /// Whether the leaf must be present in valid data
    pub mandatory: bool,

    /// Default value applied by the merge layer when absent
    pub default: Option<String>,
}

/// Leaf-list-specific schema attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafListSchema {
    /// Declared value type of every entry
    pub value_type: ValueType,

    /// `ordered-by user` leaf-lists accept insert attributes
    pub user_ordered: bool,

    /// Minimum number of entries
    pub min_elements: Option<u32>,

    /// Maximum number of entries
    pub max_elements: Option<u32>,
}

/// Closed union over the schema node kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SchemaNodeKind {
    /// Interior node holding named children
    Container {
        /// Presence containers carry meaning by existing
        presence: bool,
    },

    /// Keyed collection of entries
    List(ListSchema),

    /// Scalar leaf
    Leaf(LeafSchema),

    /// Ordered multi-valued leaf
    LeafList(LeafListSchema),

    /// Alternative between cases; never addressable in error paths
    Choice {
        /// Whether one case must be present
        mandatory: bool,
    },

    /// One alternative of a choice; transparent for traversal
    Case,

    /// Opaque XML subtree
    AnyXml,

    /// Type-system identity; not a tree node
    Identity {
        /// Base identity this one derives from, if any
        base: Option<QName>,
    },
}

/// A node of the schema graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaNode {
    /// Qualified name
    pub qname: QName,

    /// Absolute path from the schema root; unique within a registry
    pub path: SchemaPath,

    /// Kind-specific attributes
    pub kind: SchemaNodeKind,

    /// Conditional presence expression, evaluated against the parent
    /// instance node
    pub when: Option<String>,

    /// Constraint expressions evaluated against the node's own instance
    pub must: Vec<String>,
}

impl SchemaNode {
    /// Non-presence container under `parent`
    pub fn container(parent: &SchemaPath, qname: QName) -> Self {
        Self::new(parent, qname, SchemaNodeKind::Container { presence: false })
    }

    /// List under `parent`
    pub fn list(parent: &SchemaPath, qname: QName, list: ListSchema) -> Self {
        Self::new(parent, qname, SchemaNodeKind::List(list))
    }

    /// Leaf under `parent`
    pub fn leaf(parent: &SchemaPath, qname: QName, leaf: LeafSchema) -> Self {
        Self::new(parent, qname, SchemaNodeKind::Leaf(leaf))
    }

    /// Leaf-list under `parent`
    pub fn leaf_list(parent: &SchemaPath, qname: QName, leaf_list: LeafListSchema) -> Self {
        Self::new(parent, qname, SchemaNodeKind::LeafList(leaf_list))
    }

    /// Choice under `parent`
    pub fn choice(parent: &SchemaPath, qname: QName, mandatory: bool) -> Self {
        Self::new(parent, qname, SchemaNodeKind::Choice { mandatory })
    }

    /// Case under a choice `parent`
    pub fn case(parent: &SchemaPath, qname: QName) -> Self {
        Self::new(parent, qname, SchemaNodeKind::Case)
    }

    /// Identity definition (not a tree node, path is just the qname)
    pub fn identity(qname: QName, base: Option<QName>) -> Self {
        Self::new(&SchemaPath::root(), qname, SchemaNodeKind::Identity { base })
    }

    fn new(parent: &SchemaPath, qname: QName, kind: SchemaNodeKind) -> Self {
        Self {
            path: parent.child(qname.clone()),
            qname,
            kind,
            when: None,
            must: Vec::new(),
        }
    }

    /// Attach a `when` expression
    pub fn with_when(mut self, when: impl Into<String>) -> Self {
        self.when = Some(when.into());
        self
    }

    /// Attach a `must` expression
    pub fn with_must(mut self, must: impl Into<String>) -> Self {
        self.must.push(must.into());
        self
    }

    /// Whether the kind is `Choice` or `Case`. Such nodes never appear as
    /// addressable segments in error paths.
    pub fn is_choice_or_case(&self) -> bool {
        matches!(
            self.kind,
            SchemaNodeKind::Choice { .. } | SchemaNodeKind::Case
        )
    }

    /// Whether this node can hold child schema nodes
    pub fn is_interior(&self) -> bool {
        matches!(
            self.kind,
            SchemaNodeKind::Container { .. }
                | SchemaNodeKind::List(_)
                | SchemaNodeKind::Choice { .. }
                | SchemaNodeKind::Case
        )
    }

    /// Whether a leaf kind is flagged mandatory
    pub fn is_mandatory(&self) -> bool {
        match &self.kind {
            SchemaNodeKind::Leaf(leaf) => leaf.mandatory,
            SchemaNodeKind::Choice { mandatory } => *mandatory,
            _ => false,
        }
    }
}

/// Children injected under an existing target path by another module.
///
/// The target path's own identity is never changed by an augmentation;
/// only its child set grows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Augmentation {
    /// Path of the augmented node
    pub target: SchemaPath,

    /// Qualified names of the children this augmentation declares
    pub children: Vec<QName>,
}

/// One schema module: the unit handed to
/// [`crate::services::SchemaRegistry::register_module`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    /// Module name
    pub name: String,

    /// Namespace URI the module declares
    pub namespace: String,

    /// Prefix declared for that namespace, used in error paths
    pub prefix: String,

    /// All data nodes of the module, in document order. Position in the
    /// tree is carried by each node's `path`; nodes whose parent path
    /// belongs to another module are augmentation-injected children.
    pub nodes: Vec<SchemaNode>,

    /// Augmentations declared by this module
    pub augmentations: Vec<Augmentation>,

    /// Identities declared by this module
    pub identities: Vec<SchemaNode>,
}

impl Module {
    /// Module with no nodes
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            prefix: prefix.into(),
            nodes: Vec::new(),
            augmentations: Vec::new(),
            identities: Vec::new(),
        }
    }

    /// Add a data node
    pub fn with_node(mut self, node: SchemaNode) -> Self {
        self.nodes.push(node);
        self
    }

    /// Add an augmentation
    pub fn with_augmentation(mut self, augmentation: Augmentation) -> Self {
        self.augmentations.push(augmentation);
        self
    }

    /// Add an identity
    pub fn with_identity(mut self, identity: SchemaNode) -> Self {
        self.identities.push(identity);
        self
    }
}
