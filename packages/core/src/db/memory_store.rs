//! In-Memory Datastore Backend
//!
//! Keeps every model node in one ordered vector guarded by an async
//! `RwLock`. Sibling order is insertion order, which makes the backend
//! suitable for user-ordered lists, and snapshotting for a candidate copy
//! is a plain clone of the vector.

use crate::db::{DataStoreError, NodeDataStore, TransactionalDataStore};
use crate::models::{ModelNode, ModelNodeId, ModelNodeKey, SchemaPath};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Ordered in-memory node storage with candidate-copy support.
#[derive(Debug, Default)]
pub struct InMemoryDataStore {
    nodes: RwLock<Vec<ModelNode>>,
}

impl InMemoryDataStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with nodes (tests, bootstrap)
    pub fn with_nodes(nodes: Vec<ModelNode>) -> Self {
        Self {
            nodes: RwLock::new(nodes),
        }
    }

    /// Snapshot of every stored node, in storage order
    pub async fn dump(&self) -> Vec<ModelNode> {
        self.nodes.read().await.clone()
    }

    fn is_child(node: &ModelNode, schema_path: &SchemaPath, parent_id: &ModelNodeId) -> bool {
        &node.schema_path == schema_path && parent_id.is_parent_of(&node.node_id)
    }

    fn matches_key(node: &ModelNode, key: &ModelNodeKey) -> bool {
        key.pairs()
            .iter()
            .all(|(qname, value)| node.attribute(qname).is_some_and(|v| v.value == *value))
    }
}

#[async_trait]
impl NodeDataStore for InMemoryDataStore {
    async fn find_node(
        &self,
        schema_path: &SchemaPath,
        key: &ModelNodeKey,
        parent_id: &ModelNodeId,
    ) -> Result<Option<ModelNode>, DataStoreError> {
        let nodes = self.nodes.read().await;
        Ok(nodes
            .iter()
            .find(|n| Self::is_child(n, schema_path, parent_id) && Self::matches_key(n, key))
            .cloned())
    }

    async fn list_child_nodes(
        &self,
        schema_path: &SchemaPath,
        parent_id: &ModelNodeId,
    ) -> Result<Vec<ModelNode>, DataStoreError> {
        let nodes = self.nodes.read().await;
        Ok(nodes
            .iter()
            .filter(|n| Self::is_child(n, schema_path, parent_id))
            .cloned()
            .collect())
    }

    async fn create_node(
        &self,
        node: ModelNode,
        parent_id: &ModelNodeId,
        insert_index: Option<usize>,
    ) -> Result<(), DataStoreError> {
        let mut nodes = self.nodes.write().await;
        if nodes.iter().any(|n| n.node_id == node.node_id) {
            return Err(DataStoreError::internal(format!(
                "node already exists: {:?}",
                node.node_id
            )));
        }

        // Position among the siblings of the same schema path; everything
        // else keeps its storage order.
        let sibling_positions: Vec<usize> = nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| Self::is_child(n, &node.schema_path, parent_id))
            .map(|(i, _)| i)
            .collect();
        let at = match insert_index {
            Some(idx) if idx < sibling_positions.len() => sibling_positions[idx],
            _ => sibling_positions.last().map_or(nodes.len(), |last| last + 1),
        };
        nodes.insert(at, node);
        Ok(())
    }

    async fn update_node(
        &self,
        node: ModelNode,
        _parent_id: &ModelNodeId,
        _is_key_change: bool,
    ) -> Result<(), DataStoreError> {
        let mut nodes = self.nodes.write().await;
        let Some(stored) = nodes.iter_mut().find(|n| n.node_id == node.node_id) else {
            return Err(DataStoreError::node_not_found(node.node_id));
        };
        *stored = node;
        Ok(())
    }

    async fn remove_node(
        &self,
        _schema_path: &SchemaPath,
        node_id: &ModelNodeId,
    ) -> Result<(), DataStoreError> {
        let mut nodes = self.nodes.write().await;
        if !nodes.iter().any(|n| &n.node_id == node_id) {
            return Err(DataStoreError::node_not_found(node_id.clone()));
        }
        // Drop the node and its whole subtree.
        nodes.retain(|n| !n.node_id.rdns().starts_with(node_id.rdns()));
        Ok(())
    }
}

#[async_trait]
impl TransactionalDataStore for InMemoryDataStore {
    type Candidate = InMemoryDataStore;

    async fn open_candidate(&self) -> Result<Self::Candidate, DataStoreError> {
        let nodes = self.nodes.read().await.clone();
        Ok(InMemoryDataStore::with_nodes(nodes))
    }

    async fn commit(&self, candidate: Self::Candidate) -> Result<(), DataStoreError> {
        let committed = candidate.nodes.into_inner();
        *self.nodes.write().await = committed;
        Ok(())
    }
}
