//! Model Node Child Helpers
//!
//! A [`crate::models::ModelNode`] never owns its children eagerly. Child
//! container and child list access goes through helper objects registered
//! per (parent schema path, child qname). The default helpers here resolve
//! through the [`NodeDataStore`]; deployments may register their own for
//! subtrees served by other subsystems.
//!
//! A helper failing with [`DataStoreError::NotRegistered`] is treated by
//! the tree layer as "no such child" rather than a failure: a qualified
//! name can collide across differently-augmented subtrees, and only one of
//! the candidates has a backing store.

use crate::db::{DataStoreError, NodeDataStore};
use crate::models::{ModelNode, ModelNodeKey, QName, SchemaNode, SchemaNodeKind, SchemaPath};
use crate::services::{SchemaRegistry, SchemaTraverser, SchemaVisitor};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Resolves the single child container instance of a parent node.
#[async_trait]
pub trait ChildContainerHelper: Send + Sync {
    /// The child instance, or `None` when absent
    ///
    /// # Errors
    ///
    /// `DataStoreError::NotRegistered` when no store backs the child's
    /// schema path; backend failures otherwise.
    async fn resolve(&self, parent: &ModelNode) -> Result<Option<ModelNode>, DataStoreError>;
}

/// Resolves the child list entries of a parent node, in storage order.
#[async_trait]
pub trait ChildListHelper: Send + Sync {
    /// All entries, in storage order
    ///
    /// # Errors
    ///
    /// Same contract as [`ChildContainerHelper::resolve`].
    async fn resolve(&self, parent: &ModelNode) -> Result<Vec<ModelNode>, DataStoreError>;
}

/// Store-backed container helper.
pub struct DsChildContainerHelper {
    child_path: SchemaPath,
    store: Arc<dyn NodeDataStore>,
}

impl DsChildContainerHelper {
    /// Helper resolving container instances at `child_path`
    pub fn new(child_path: SchemaPath, store: Arc<dyn NodeDataStore>) -> Self {
        Self { child_path, store }
    }
}

#[async_trait]
impl ChildContainerHelper for DsChildContainerHelper {
    async fn resolve(&self, parent: &ModelNode) -> Result<Option<ModelNode>, DataStoreError> {
        self.store
            .find_node(&self.child_path, &ModelNodeKey::none(), &parent.node_id)
            .await
    }
}

/// Store-backed list helper.
pub struct DsChildListHelper {
    child_path: SchemaPath,
    store: Arc<dyn NodeDataStore>,
}

impl DsChildListHelper {
    /// Helper resolving list entries under `child_path`
    pub fn new(child_path: SchemaPath, store: Arc<dyn NodeDataStore>) -> Self {
        Self { child_path, store }
    }
}

#[async_trait]
impl ChildListHelper for DsChildListHelper {
    async fn resolve(&self, parent: &ModelNode) -> Result<Vec<ModelNode>, DataStoreError> {
        self.store
            .list_child_nodes(&self.child_path, &parent.node_id)
            .await
    }
}

/// Registry of child helpers keyed by (parent schema path, child qname).
#[derive(Default)]
pub struct HelperRegistry {
    containers: HashMap<(SchemaPath, QName), Arc<dyn ChildContainerHelper>>,
    lists: HashMap<(SchemaPath, QName), Arc<dyn ChildListHelper>>,
}

impl HelperRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with store-backed helpers for every container and list
    /// relation in the registered schema graph. Built by walking every
    /// module with the schema traverser.
    pub fn for_store(registry: &SchemaRegistry, store: Arc<dyn NodeDataStore>) -> Self {
        let mut visitor = HelperRegistrationVisitor {
            helpers: Self::new(),
            store,
        };
        let module_names: Vec<String> =
            registry.modules().iter().map(|m| m.name.clone()).collect();
        for name in module_names {
            let mut traverser = SchemaTraverser::new(
                "datastore",
                registry,
                name,
                vec![&mut visitor as &mut dyn SchemaVisitor],
            );
            traverser.traverse();
        }
        visitor.helpers
    }

    /// Register a container helper
    pub fn register_container_helper(
        &mut self,
        parent_path: SchemaPath,
        child_qname: QName,
        helper: Arc<dyn ChildContainerHelper>,
    ) {
        self.containers.insert((parent_path, child_qname), helper);
    }

    /// Register a list helper
    pub fn register_list_helper(
        &mut self,
        parent_path: SchemaPath,
        child_qname: QName,
        helper: Arc<dyn ChildListHelper>,
    ) {
        self.lists.insert((parent_path, child_qname), helper);
    }

    /// Container helper for a child relation, if registered
    pub fn container_helper(
        &self,
        parent_path: &SchemaPath,
        child_qname: &QName,
    ) -> Option<&Arc<dyn ChildContainerHelper>> {
        self.containers
            .get(&(parent_path.clone(), child_qname.clone()))
    }

    /// List helper for a child relation, if registered
    pub fn list_helper(
        &self,
        parent_path: &SchemaPath,
        child_qname: &QName,
    ) -> Option<&Arc<dyn ChildListHelper>> {
        self.lists.get(&(parent_path.clone(), child_qname.clone()))
    }
}

/// Traverser visitor registering store-backed helpers for each
/// container/list child relation it encounters.
struct HelperRegistrationVisitor {
    helpers: HelperRegistry,
    store: Arc<dyn NodeDataStore>,
}

impl SchemaVisitor for HelperRegistrationVisitor {
    fn visit_container(
        &mut self,
        _component_id: &str,
        parent: Option<&SchemaPath>,
        node: &SchemaNode,
    ) {
        let parent_path = parent.cloned().unwrap_or_default();
        self.helpers.register_container_helper(
            parent_path,
            node.qname.clone(),
            Arc::new(DsChildContainerHelper::new(
                node.path.clone(),
                Arc::clone(&self.store),
            )),
        );
    }

    fn visit_list(&mut self, _component_id: &str, parent: Option<&SchemaPath>, node: &SchemaNode) {
        debug_assert!(matches!(node.kind, SchemaNodeKind::List(_)));
        let parent_path = parent.cloned().unwrap_or_default();
        self.helpers.register_list_helper(
            parent_path,
            node.qname.clone(),
            Arc::new(DsChildListHelper::new(
                node.path.clone(),
                Arc::clone(&self.store),
            )),
        );
    }
}
