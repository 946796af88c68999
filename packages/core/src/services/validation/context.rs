//! Per-Request Validation Context
//!
//! One [`ValidationContext`] lives for exactly one orchestration pass. It
//! carries the resolved-children cache (so repeated logical reads within
//! the pass observe one snapshot) and the errors collected so far in
//! continue-on-error mode. It is dropped in full when the request
//! completes, success or failure.

use crate::models::{ModelNode, ModelNodeId, QName, RpcError, SchemaNode, SchemaNodeKind};
use crate::services::{HelperRegistry, SchemaRegistry};
use std::collections::HashMap;

/// Request-scoped state shared by the phase-2 validators.
pub struct ValidationContext<'a> {
    registry: &'a SchemaRegistry,
    helpers: &'a HelperRegistry,
    container_cache: HashMap<(ModelNodeId, QName), Option<ModelNode>>,
    list_cache: HashMap<(ModelNodeId, QName), Vec<ModelNode>>,
    errors: Vec<RpcError>,
}

impl<'a> ValidationContext<'a> {
    /// Fresh context for one request
    pub fn new(registry: &'a SchemaRegistry, helpers: &'a HelperRegistry) -> Self {
        Self {
            registry,
            helpers,
            container_cache: HashMap::new(),
            list_cache: HashMap::new(),
            errors: Vec::new(),
        }
    }

    /// The registry this pass validates against
    pub fn registry(&self) -> &'a SchemaRegistry {
        self.registry
    }

    /// Child container instance of `parent`, load-on-first-use.
    ///
    /// An unregistered helper or a store that reports
    /// `DataStoreError::NotRegistered` both resolve to "no such child";
    /// a qualified name can collide across differently-augmented
    /// subtrees and only one candidate has a backing store.
    pub async fn child_container(
        &mut self,
        parent: &ModelNode,
        child: &SchemaNode,
    ) -> Option<ModelNode> {
        debug_assert!(matches!(child.kind, SchemaNodeKind::Container { .. }));
        let cache_key = (parent.node_id.clone(), child.qname.clone());
        if let Some(cached) = self.container_cache.get(&cache_key) {
            return cached.clone();
        }
        let resolved = match self
            .helpers
            .container_helper(&parent.schema_path, &child.qname)
        {
            Some(helper) => match helper.resolve(parent).await {
                Ok(found) => found,
                Err(err) => {
                    tracing::warn!(
                        child = %child.qname,
                        error = %err,
                        "child container resolution failed, treating as absent"
                    );
                    None
                }
            },
            None => {
                tracing::warn!(child = %child.qname, "no container helper registered");
                None
            }
        };
        self.container_cache.insert(cache_key, resolved.clone());
        resolved
    }

    /// Child list entries of `parent`, in storage order, load-on-first-use
    pub async fn child_list(
        &mut self,
        parent: &ModelNode,
        child: &SchemaNode,
    ) -> Vec<ModelNode> {
        debug_assert!(matches!(child.kind, SchemaNodeKind::List(_)));
        let cache_key = (parent.node_id.clone(), child.qname.clone());
        if let Some(cached) = self.list_cache.get(&cache_key) {
            return cached.clone();
        }
        let resolved = match self.helpers.list_helper(&parent.schema_path, &child.qname) {
            Some(helper) => match helper.resolve(parent).await {
                Ok(entries) => entries,
                Err(err) => {
                    tracing::warn!(
                        child = %child.qname,
                        error = %err,
                        "child list resolution failed, treating as empty"
                    );
                    Vec::new()
                }
            },
            None => {
                tracing::warn!(child = %child.qname, "no list helper registered");
                Vec::new()
            }
        };
        self.list_cache.insert(cache_key, resolved.clone());
        resolved
    }

    /// Record one collected error
    pub fn record(&mut self, error: RpcError) {
        self.errors.push(error);
    }

    /// Errors collected so far
    pub fn errors(&self) -> &[RpcError] {
        &self.errors
    }

    /// Whether any error has been collected
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Consume the context, yielding the collected errors
    pub fn into_errors(self) -> Vec<RpcError> {
        self.errors
    }
}
