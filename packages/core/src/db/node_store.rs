//! NodeDataStore Trait - Persistence Abstraction
//!
//! Abstracts the persistence collaborator that durably stores model nodes.
//! All methods are async so both embedded and networked backends fit
//! behind the same trait; within one validation pass the core resolves
//! children through the per-request cache, so a slow store delays a
//! validator but never interleaves with it.
//!
//! [`TransactionalDataStore`] adds the candidate-copy contract the
//! orchestrator depends on: an edit is merged into a candidate, validated
//! there, and only a fully valid candidate is committed back. The live
//! tree is never touched by a failed request.

use crate::db::DataStoreError;
use crate::models::{ModelNode, ModelNodeId, ModelNodeKey, SchemaPath};
use async_trait::async_trait;

/// Read/write access to committed model nodes.
///
/// Implementations must be `Send + Sync`; the core may hold them behind
/// `Arc` across await points.
#[async_trait]
pub trait NodeDataStore: Send + Sync {
    /// Find one node by schema path, list key and parent address.
    ///
    /// For containers the key is empty. Returns `Ok(None)` when no such
    /// node exists.
    ///
    /// # Errors
    ///
    /// `DataStoreError::NotRegistered` when the schema path has no backing
    /// store; other variants for backend failures.
    async fn find_node(
        &self,
        schema_path: &SchemaPath,
        key: &ModelNodeKey,
        parent_id: &ModelNodeId,
    ) -> Result<Option<ModelNode>, DataStoreError>;

    /// List all child nodes of `parent_id` instantiating `schema_path`,
    /// in storage order. Storage order is submission order for
    /// user-ordered lists.
    ///
    /// # Errors
    ///
    /// Same contract as [`NodeDataStore::find_node`].
    async fn list_child_nodes(
        &self,
        schema_path: &SchemaPath,
        parent_id: &ModelNodeId,
    ) -> Result<Vec<ModelNode>, DataStoreError>;

    /// Create a node. `insert_index` places the node among its siblings
    /// for user-ordered lists; `None` appends.
    ///
    /// # Errors
    ///
    /// `DataStoreError::Internal` when a node with the same address
    /// already exists.
    async fn create_node(
        &self,
        node: ModelNode,
        parent_id: &ModelNodeId,
        insert_index: Option<usize>,
    ) -> Result<(), DataStoreError>;

    /// Replace the stored attributes and leaf-lists of an existing node.
    ///
    /// `is_key_change` signals that the node's address changed along with
    /// its key leaves, so the backend must re-index it.
    ///
    /// # Errors
    ///
    /// `DataStoreError::NodeNotFound` when the node does not exist.
    async fn update_node(
        &self,
        node: ModelNode,
        parent_id: &ModelNodeId,
        is_key_change: bool,
    ) -> Result<(), DataStoreError>;

    /// Remove a node and its whole subtree.
    ///
    /// # Errors
    ///
    /// `DataStoreError::NodeNotFound` when the node does not exist.
    async fn remove_node(
        &self,
        schema_path: &SchemaPath,
        node_id: &ModelNodeId,
    ) -> Result<(), DataStoreError>;
}

/// Candidate-copy support on top of [`NodeDataStore`].
#[async_trait]
pub trait TransactionalDataStore: NodeDataStore {
    /// Store type of the candidate copy
    type Candidate: NodeDataStore + Send + Sync + 'static;

    /// Open a candidate holding a copy of the committed state
    ///
    /// # Errors
    ///
    /// Backend failures while snapshotting.
    async fn open_candidate(&self) -> Result<Self::Candidate, DataStoreError>;

    /// Atomically replace the committed state with the candidate's state
    ///
    /// # Errors
    ///
    /// Backend failures while swapping state.
    async fn commit(&self, candidate: Self::Candidate) -> Result<(), DataStoreError>;
}
