//! Addressing Types
//!
//! Qualified names and paths used to address nodes in the schema graph
//! (`SchemaPath`) and in the instance tree (`ModelNodeId`).
//!
//! A `ModelNodeId` is an ordered list of relative distinguished names from
//! the tree root: one `Rdn::Container` per container/list step, plus one
//! `Rdn::KeyValue` per key leaf of a list entry. The same shape is used to
//! render namespace-qualified error paths.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespace-qualified name of a schema or instance node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QName {
    /// Namespace URI of the defining module
    pub namespace: String,

    /// Local name within the namespace
    pub local_name: String,
}

impl QName {
    /// Create a qualified name from a namespace URI and a local name
    pub fn new(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local_name: local_name.into(),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}){}", self.namespace, self.local_name)
    }
}

/// Absolute path of a schema node: the ordered qualified names from the
/// schema root down to the node itself.
///
/// The root path is empty. Paths are value types; building a child path
/// clones the parent segments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaPath(Vec<QName>);

impl SchemaPath {
    /// The empty root path
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Build a path from its segments
    pub fn from_segments(segments: Vec<QName>) -> Self {
        Self(segments)
    }

    /// Path of a child of `self` with the given qualified name
    pub fn child(&self, qname: QName) -> Self {
        let mut segments = self.0.clone();
        segments.push(qname);
        Self(segments)
    }

    /// Path of the parent, or `None` for the root
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }

    /// Last segment, or `None` for the root
    pub fn last(&self) -> Option<&QName> {
        self.0.last()
    }

    /// The ordered segments
    pub fn segments(&self) -> &[QName] {
        &self.0
    }

    /// Whether this is the root path
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the path has no segments
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SchemaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "/");
        }
        for segment in &self.0 {
            write!(f, "/{}", segment.local_name)?;
        }
        Ok(())
    }
}

/// One relative distinguished name in a [`ModelNodeId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rdn {
    /// A container or list-entry step, addressed by qualified name
    Container {
        /// Namespace URI of the step
        namespace: String,
        /// Local name of the step
        name: String,
    },

    /// A key leaf value of the enclosing list entry
    KeyValue {
        /// Namespace URI of the key leaf
        namespace: String,
        /// Local name of the key leaf
        name: String,
        /// Key value as submitted
        value: String,
    },
}

impl Rdn {
    /// Container step rdn
    pub fn container(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Container {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Key-value rdn
    pub fn key_value(
        namespace: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::KeyValue {
            namespace: namespace.into(),
            name: name.into(),
            value: value.into(),
        }
    }

    /// Namespace URI of the rdn
    pub fn namespace(&self) -> &str {
        match self {
            Self::Container { namespace, .. } | Self::KeyValue { namespace, .. } => namespace,
        }
    }
}

/// Address of a [`crate::models::ModelNode`] in the instance tree: the
/// ordered rdns from the tree root down to the node.
///
/// The root of the tree has an empty id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelNodeId(Vec<Rdn>);

impl ModelNodeId {
    /// The empty id of the tree root
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Build an id from its rdns
    pub fn from_rdns(rdns: Vec<Rdn>) -> Self {
        Self(rdns)
    }

    /// A copy of `self` with one more rdn appended
    pub fn with_rdn(&self, rdn: Rdn) -> Self {
        let mut rdns = self.0.clone();
        rdns.push(rdn);
        Self(rdns)
    }

    /// The ordered rdns
    pub fn rdns(&self) -> &[Rdn] {
        &self.0
    }

    /// Whether this id addresses the tree root
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `self` is the direct parent address of `other`
    pub fn is_parent_of(&self, other: &ModelNodeId) -> bool {
        if other.0.len() <= self.0.len() {
            return false;
        }
        if other.0[..self.0.len()] != self.0[..] {
            return false;
        }
        // Everything past the parent must belong to a single child step:
        // one container rdn followed only by its key values.
        let tail = &other.0[self.0.len()..];
        matches!(tail[0], Rdn::Container { .. })
            && tail[1..].iter().all(|r| matches!(r, Rdn::KeyValue { .. }))
    }
}

/// Key of a list entry: the declared key leaves and their values, in
/// declared order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelNodeKey(Vec<(QName, String)>);

impl ModelNodeKey {
    /// The empty key (containers, keyless lookups)
    pub fn none() -> Self {
        Self(Vec::new())
    }

    /// Build a key from `(key qname, value)` pairs in declared order
    pub fn from_pairs(pairs: Vec<(QName, String)>) -> Self {
        Self(pairs)
    }

    /// The ordered `(key qname, value)` pairs
    pub fn pairs(&self) -> &[(QName, String)] {
        &self.0
    }

    /// Value for one key leaf, if present
    pub fn value_of(&self, qname: &QName) -> Option<&str> {
        self.0
            .iter()
            .find(|(q, _)| q == qname)
            .map(|(_, v)| v.as_str())
    }

    /// Whether no key pairs are present
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
