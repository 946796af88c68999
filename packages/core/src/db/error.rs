//! Datastore Error Types

use crate::models::{ModelNodeId, SchemaPath};
use thiserror::Error;

/// Datastore operation errors.
///
/// `NotRegistered` is special-cased by the model node tree: a helper whose
/// schema path has no backing store behaves as "no such child", because a
/// qualified name can collide across differently-augmented subtrees.
#[derive(Error, Debug)]
pub enum DataStoreError {
    /// No backing store registered for the schema path
    #[error("No datastore registered for schema path {schema_path}")]
    NotRegistered {
        /// Schema path of the failed lookup
        schema_path: SchemaPath,
    },

    /// Node addressed by id does not exist
    #[error("Node not found: {node_id:?}")]
    NodeNotFound {
        /// Address of the missing node
        node_id: ModelNodeId,
    },

    /// Backend-specific failure
    #[error("Datastore operation failed: {0}")]
    Internal(String),
}

impl DataStoreError {
    /// Create a not-registered error
    pub fn not_registered(schema_path: SchemaPath) -> Self {
        Self::NotRegistered { schema_path }
    }

    /// Create a node-not-found error
    pub fn node_not_found(node_id: ModelNodeId) -> Self {
        Self::NodeNotFound { node_id }
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
