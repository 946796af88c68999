//! Model Node Tree
//!
//! One [`ModelNode`] per schema-described entity occurrence. A node holds
//! its scalar leaf values and leaf-list values; it never owns its children.
//! Child containers and child lists are materialized on demand through the
//! helper objects in [`crate::services::helpers`] and cached for the
//! lifetime of one validation pass.
//!
//! Attributes are mutated only through the setter contract below (and by
//! the merge layer); validators read, they never write.

use crate::models::{ModelNodeId, ModelNodeKey, QName, SchemaPath};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Mutation errors for [`ModelNode`]
#[derive(Error, Debug)]
pub enum ModelNodeError {
    /// A leaf-list already holds the value being added
    #[error("Duplicate leaf-list value '{value}' for '{name}'")]
    DuplicateLeafListValue {
        /// Local name of the leaf-list
        name: String,
        /// The repeated value
        value: String,
    },
}

/// Scalar value of a leaf or one leaf-list entry.
///
/// For identityref leaves the submitted prefix's namespace is kept next to
/// the value so phase-3 re-validation can resolve the identity without the
/// original document context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigValue {
    /// String form of the value as submitted
    pub value: String,

    /// Namespace of the value's prefix, for identityref values
    pub namespace: Option<String>,
}

impl ConfigValue {
    /// Plain value without a namespace
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            namespace: None,
        }
    }

    /// Identityref-style value qualified by a namespace
    pub fn with_namespace(value: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            namespace: Some(namespace.into()),
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// One instance node of the configuration tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelNode {
    /// Path of the schema node this instance belongs to
    pub schema_path: SchemaPath,

    /// Address of this node in the instance tree
    pub node_id: ModelNodeId,

    /// Scalar leaf values keyed by qualified name
    attributes: HashMap<QName, ConfigValue>,

    /// Leaf-list values keyed by qualified name; order is significant and
    /// duplicates are forbidden
    leaf_lists: HashMap<QName, Vec<ConfigValue>>,
}

impl ModelNode {
    /// Create an empty node for the given schema path and address
    pub fn new(schema_path: SchemaPath, node_id: ModelNodeId) -> Self {
        Self {
            schema_path,
            node_id,
            attributes: HashMap::new(),
            leaf_lists: HashMap::new(),
        }
    }

    /// Qualified name of the node (last schema path segment)
    pub fn qname(&self) -> Option<&QName> {
        self.schema_path.last()
    }

    /// Scalar leaf value, if set
    pub fn attribute(&self, qname: &QName) -> Option<&ConfigValue> {
        self.attributes.get(qname)
    }

    /// All scalar leaf values
    pub fn attributes(&self) -> &HashMap<QName, ConfigValue> {
        &self.attributes
    }

    /// Set a scalar leaf value
    pub fn set_attribute(&mut self, qname: QName, value: ConfigValue) {
        self.attributes.insert(qname, value);
    }

    /// Remove a scalar leaf value
    pub fn remove_attribute(&mut self, qname: &QName) -> Option<ConfigValue> {
        self.attributes.remove(qname)
    }

    /// Ordered values of one leaf-list
    pub fn leaf_list(&self, qname: &QName) -> Option<&[ConfigValue]> {
        self.leaf_lists.get(qname).map(Vec::as_slice)
    }

    /// All leaf-lists
    pub fn leaf_lists(&self) -> &HashMap<QName, Vec<ConfigValue>> {
        &self.leaf_lists
    }

    /// Append one leaf-list value, preserving submission order.
    ///
    /// # Errors
    ///
    /// `DuplicateLeafListValue` if the value is already present; leaf-list
    /// values form an ordered set.
    pub fn add_leaf_list_value(
        &mut self,
        qname: QName,
        value: ConfigValue,
    ) -> Result<(), ModelNodeError> {
        let values = self.leaf_lists.entry(qname.clone()).or_default();
        if values.iter().any(|v| v.value == value.value) {
            return Err(ModelNodeError::DuplicateLeafListValue {
                name: qname.local_name,
                value: value.value,
            });
        }
        values.push(value);
        Ok(())
    }

    /// Insert one leaf-list value at a position (user-ordered leaf-lists)
    ///
    /// # Errors
    ///
    /// `DuplicateLeafListValue` if the value is already present.
    pub fn insert_leaf_list_value(
        &mut self,
        qname: QName,
        index: usize,
        value: ConfigValue,
    ) -> Result<(), ModelNodeError> {
        let values = self.leaf_lists.entry(qname.clone()).or_default();
        if values.iter().any(|v| v.value == value.value) {
            return Err(ModelNodeError::DuplicateLeafListValue {
                name: qname.local_name,
                value: value.value,
            });
        }
        let index = index.min(values.len());
        values.insert(index, value);
        Ok(())
    }

    /// Remove one leaf-list value; drops the leaf-list when it empties
    pub fn remove_leaf_list_value(&mut self, qname: &QName, value: &str) -> bool {
        let Some(values) = self.leaf_lists.get_mut(qname) else {
            return false;
        };
        let before = values.len();
        values.retain(|v| v.value != value);
        let removed = values.len() != before;
        if values.is_empty() {
            self.leaf_lists.remove(qname);
        }
        removed
    }

    /// Whether the node carries any committed child data (attributes or
    /// leaf-list values). Conditional expressions are only evaluated
    /// against nodes that do.
    pub fn has_child_data(&self) -> bool {
        !self.attributes.is_empty() || !self.leaf_lists.is_empty()
    }

    /// Key of this node under the given declared key order; `None` when a
    /// declared key leaf has no value yet.
    pub fn key_under(&self, keys: &[QName]) -> Option<ModelNodeKey> {
        let mut pairs = Vec::with_capacity(keys.len());
        for key in keys {
            let value = self.attributes.get(key)?;
            pairs.push((key.clone(), value.value.clone()));
        }
        Some(ModelNodeKey::from_pairs(pairs))
    }
}
