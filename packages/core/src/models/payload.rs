//! Edit-Config Payload Fragment
//!
//! The transport collaborator hands the core an [`EditNode`] tree: an
//! XML-shaped fragment of qualified names, optional scalar values, per-node
//! edit operations and insert attributes, plus the namespace prefix
//! declarations needed to resolve key predicates.

use crate::models::QName;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-element edit operation, carried as the `operation` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditOperation {
    /// Merge with existing data (the default)
    Merge,
    /// Replace the subtree
    Replace,
    /// Create; error if it already exists
    Create,
    /// Delete; error if it does not exist
    Delete,
    /// Remove; silently ignore if it does not exist
    Remove,
}

impl EditOperation {
    /// Whether the operation removes data rather than supplying it
    pub fn is_removal(self) -> bool {
        matches!(self, Self::Delete | Self::Remove)
    }
}

/// Position for list / leaf-list insert attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertPosition {
    /// Insert at the head
    First,
    /// Insert at the tail
    Last,
    /// Insert before the sibling named by the `key` attribute
    Before,
    /// Insert after the sibling named by the `key` attribute
    After,
}

impl InsertPosition {
    /// Attribute value as it appears on the wire
    pub fn as_str(self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Last => "last",
            Self::Before => "before",
            Self::After => "after",
        }
    }

    /// Whether this position needs a companion `key` attribute
    pub fn needs_key(self) -> bool {
        matches!(self, Self::Before | Self::After)
    }
}

/// Classification of one configuration-change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    /// Full replacement of the addressed subtree
    Replace,
    /// Partial merge
    Merge,
    /// Creation of new data
    Create,
    /// Deletion of existing data
    Delete,
}

impl RequestKind {
    /// Whether phase 1 must run the deeper structural checks (mandatory
    /// children). Partial deletes do not supply the full entry, so the
    /// checks would misfire on them.
    pub fn needs_deep_checks(self, operation: Option<EditOperation>) -> bool {
        if operation.is_some_and(EditOperation::is_removal) {
            return false;
        }
        matches!(self, Self::Replace | Self::Create)
    }
}

/// Error-handling mode for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorOption {
    /// Abort on the first validator failure
    StopOnError,
    /// Run every independent validator and report all failures together
    ContinueOnError,
}

/// One element of the incoming change fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditNode {
    /// Qualified name of the element
    pub qname: QName,

    /// Text content for leaf / leaf-list elements
    pub value: Option<String>,

    /// Edit operation attribute; inherited from the ancestor when `None`
    pub operation: Option<EditOperation>,

    /// Insert attribute for user-ordered lists and leaf-lists
    pub insert: Option<InsertPosition>,

    /// Companion `key` attribute: bracketed key predicates naming the
    /// reference sibling for `insert=before|after` on lists
    pub insert_key: Option<String>,

    /// Companion `value` attribute naming the reference entry for
    /// `insert=before|after` on leaf-lists
    pub insert_value: Option<String>,

    /// Namespace declarations in scope on this element (prefix to URI)
    pub prefix_declarations: HashMap<String, String>,

    /// Child elements in document order
    pub children: Vec<EditNode>,
}

impl EditNode {
    /// Element without content
    pub fn new(qname: QName) -> Self {
        Self {
            qname,
            value: None,
            operation: None,
            insert: None,
            insert_key: None,
            insert_value: None,
            prefix_declarations: HashMap::new(),
            children: Vec::new(),
        }
    }

    /// Leaf element with text content
    pub fn leaf(qname: QName, value: impl Into<String>) -> Self {
        let mut node = Self::new(qname);
        node.value = Some(value.into());
        node
    }

    /// Set the operation attribute
    pub fn with_operation(mut self, operation: EditOperation) -> Self {
        self.operation = Some(operation);
        self
    }

    /// Set the insert attribute, with the companion `key` attribute for
    /// `before`/`after` on lists
    pub fn with_insert(mut self, position: InsertPosition, key: Option<&str>) -> Self {
        self.insert = Some(position);
        self.insert_key = key.map(str::to_owned);
        self
    }

    /// Set the insert attribute with the companion `value` attribute
    /// (leaf-lists)
    pub fn with_insert_value(mut self, position: InsertPosition, value: &str) -> Self {
        self.insert = Some(position);
        self.insert_value = Some(value.to_owned());
        self
    }

    /// Declare a namespace prefix on this element
    pub fn declare_prefix(mut self, prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.prefix_declarations.insert(prefix.into(), namespace.into());
        self
    }

    /// Append a child element
    pub fn with_child(mut self, child: EditNode) -> Self {
        self.children.push(child);
        self
    }

    /// Namespace bound to a prefix on this element, if declared here
    pub fn namespace_for_prefix(&self, prefix: &str) -> Option<&str> {
        self.prefix_declarations.get(prefix).map(String::as_str)
    }

    /// First child with the given qualified name
    pub fn child(&self, qname: &QName) -> Option<&EditNode> {
        self.children.iter().find(|c| &c.qname == qname)
    }

    /// Effective operation given the operation inherited from the
    /// enclosing element
    pub fn effective_operation(&self, inherited: EditOperation) -> EditOperation {
        self.operation.unwrap_or(inherited)
    }
}
