//! Edit-Config Merge Layer
//!
//! Applies a validated change fragment to a candidate store. The
//! orchestrator runs the merge between phase 1 and phase 2; a merge
//! failure (deleting absent data, creating existing data, inserting
//! relative to a missing reference entry) fails the request outright with
//! the same wire-visible error vocabulary as the validators. Replacing an
//! existing interior node drops its stored subtree before the fragment is
//! applied; descendants the fragment does not carry are gone afterwards.
//!
//! [`TreeMerger`] is the in-memory default; deployments with their own
//! persistence plumbing supply an [`EditConfigMerger`] of their own.

use crate::db::{DataStoreError, NodeDataStore};
use crate::models::{
    ConfigValue, EditNode, EditOperation, InsertPosition, ModelNode, ModelNodeError, ModelNodeId,
    ModelNodeKey, Rdn, RequestKind, RpcError, RpcErrorTag, SchemaNode, SchemaNodeKind, SchemaPath,
    APP_TAG_DATA_NOT_UNIQUE, APP_TAG_MISSING_INSTANCE,
};
use crate::services::validation::{EditConfigRequest, ListValidator};
use crate::services::{ErrorPathBuilder, SchemaRegistry, ValidationError};
use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;

/// Merges one change fragment into a candidate store.
#[async_trait]
pub trait EditConfigMerger: Send + Sync {
    /// Apply the request's fragment to `store`.
    ///
    /// # Errors
    ///
    /// A wire-visible failure; the orchestrator transitions to `Failed`
    /// and the candidate is discarded.
    async fn merge(
        &self,
        request: &EditConfigRequest,
        registry: &SchemaRegistry,
        store: &dyn NodeDataStore,
    ) -> Result<(), ValidationError>;
}

/// Default merger walking the fragment against the schema graph.
#[derive(Default)]
pub struct TreeMerger;

impl TreeMerger {
    /// Stateless merger
    pub fn new() -> Self {
        Self
    }

    fn default_operation(kind: RequestKind) -> EditOperation {
        match kind {
            RequestKind::Replace => EditOperation::Replace,
            RequestKind::Merge => EditOperation::Merge,
            RequestKind::Create => EditOperation::Create,
            RequestKind::Delete => EditOperation::Delete,
        }
    }

    fn store_failure(err: DataStoreError) -> ValidationError {
        let (path, ns) = ErrorPathBuilder::root();
        ValidationError::new(RpcError::operation_failed(err.to_string()).with_error_path(path, ns))
    }

    fn merge_element<'e>(
        &'e self,
        registry: &'e SchemaRegistry,
        store: &'e dyn NodeDataStore,
        parent_path: &'e SchemaPath,
        parent_id: &'e ModelNodeId,
        element: &'e EditNode,
        inherited: EditOperation,
    ) -> Pin<Box<dyn Future<Output = Result<(), ValidationError>> + Send + 'e>> {
        Box::pin(async move {
            let Some(schema) = registry.data_child_by_name(parent_path, &element.qname).cloned()
            else {
                let (path, ns) = ErrorPathBuilder::new(registry).path_for_schema(parent_path);
                return Err(RpcError::unknown_element(&element.qname.local_name)
                    .with_error_path(path, ns)
                    .into());
            };
            match &schema.kind {
                SchemaNodeKind::Container { .. } | SchemaNodeKind::List(_) => {
                    self.merge_interior(registry, store, &schema, parent_id, element, inherited)
                        .await
                }
                _ => {
                    tracing::warn!(
                        element = %element.qname,
                        "scalar element has no enclosing instance node, skipping"
                    );
                    Ok(())
                }
            }
        })
    }

    async fn merge_interior(
        &self,
        registry: &SchemaRegistry,
        store: &dyn NodeDataStore,
        schema: &SchemaNode,
        parent_id: &ModelNodeId,
        element: &EditNode,
        inherited: EditOperation,
    ) -> Result<(), ValidationError> {
        let paths = ErrorPathBuilder::new(registry);
        let operation = element.effective_operation(inherited);

        let mut rdns = vec![Rdn::container(
            element.qname.namespace.clone(),
            element.qname.local_name.clone(),
        )];
        let mut key_pairs = Vec::new();
        if let SchemaNodeKind::List(list) = &schema.kind {
            for key in &list.keys {
                let value = element.child(key).and_then(|c| c.value.clone()).ok_or_else(|| {
                    let (path, ns) = paths.path_for_schema(&schema.path);
                    ValidationError::new(
                        RpcError::missing_key_error(&[key.local_name.clone()])
                            .with_error_path(path, ns),
                    )
                })?;
                rdns.push(Rdn::key_value(
                    key.namespace.clone(),
                    key.local_name.clone(),
                    value.clone(),
                ));
                key_pairs.push((key.clone(), value));
            }
        }
        let node_id = rdns
            .into_iter()
            .fold(parent_id.clone(), |id, rdn| id.with_rdn(rdn));
        let key = ModelNodeKey::from_pairs(key_pairs);

        if operation.is_removal() {
            return match store.remove_node(&schema.path, &node_id).await {
                Ok(()) => Ok(()),
                Err(DataStoreError::NodeNotFound { .. }) if operation == EditOperation::Remove => {
                    Ok(())
                }
                Err(DataStoreError::NodeNotFound { .. }) => {
                    let (path, ns) = paths.path_for_node_id(&node_id);
                    Err(RpcError::data_missing(format!(
                        "Cannot delete '{}', the node does not exist",
                        element.qname.local_name
                    ))
                    .with_error_path(path, ns)
                    .into())
                }
                Err(err) => Err(Self::store_failure(err)),
            };
        }

        let existing = store
            .find_node(&schema.path, &key, parent_id)
            .await
            .map_err(Self::store_failure)?;
        if existing.is_some() && operation == EditOperation::Create {
            let (path, ns) = paths.path_for_node_id(&node_id);
            return Err(RpcError::application_error(
                RpcErrorTag::DataExists,
                format!("'{}' already exists", element.qname.local_name),
            )
            .with_error_path(path, ns)
            .into());
        }

        let created = existing.is_none();
        let replaced = !created && operation == EditOperation::Replace;

        // Replace discards the stored subtree, so descendants absent from
        // the fragment do not survive the edit. The entry keeps its
        // position among its siblings across the remove/recreate cycle.
        let mut replace_position = None;
        if replaced {
            let siblings = store
                .list_child_nodes(&schema.path, parent_id)
                .await
                .map_err(Self::store_failure)?;
            replace_position = siblings.iter().position(|n| n.node_id == node_id);
            store
                .remove_node(&schema.path, &node_id)
                .await
                .map_err(Self::store_failure)?;
        }

        let mut node = match existing {
            Some(node) if !replaced => node,
            _ => ModelNode::new(schema.path.clone(), node_id.clone()),
        };

        for child in &element.children {
            let Some(child_schema) = registry.data_child_by_name(&schema.path, &child.qname)
            else {
                let (path, ns) = paths.path_for_schema(&schema.path);
                return Err(RpcError::unknown_element(&child.qname.local_name)
                    .with_error_path(path, ns)
                    .into());
            };
            match &child_schema.kind {
                SchemaNodeKind::Leaf(_) => {
                    self.apply_leaf(registry, &mut node, child, operation)?;
                }
                SchemaNodeKind::LeafList(_) => {
                    self.apply_leaf_list_value(registry, &mut node, child, operation)?;
                }
                _ => {} // interior children merged after this node persists
            }
        }

        if created || replaced {
            for child_schema in registry.data_children_of(&schema.path) {
                if let SchemaNodeKind::Leaf(leaf) = &child_schema.kind {
                    if let Some(default) = &leaf.default {
                        if node.attribute(&child_schema.qname).is_none() {
                            node.set_attribute(
                                child_schema.qname.clone(),
                                ConfigValue::new(default.clone()),
                            );
                        }
                    }
                }
            }
        }

        if created || replaced {
            let insert_index = if !created {
                replace_position
            } else if let SchemaNodeKind::List(list) = &schema.kind {
                if list.user_ordered && element.insert.is_some() {
                    let siblings = store
                        .list_child_nodes(&schema.path, parent_id)
                        .await
                        .map_err(Self::store_failure)?;
                    ListValidator::new(registry)
                        .insert_index(schema, element, &siblings)
                        .map_err(|error| {
                            let (path, ns) = paths.path_for_schema(&schema.path);
                            ValidationError::new(error.with_error_path(path, ns))
                        })?
                } else {
                    None
                }
            } else {
                None
            };
            store
                .create_node(node, parent_id, insert_index)
                .await
                .map_err(Self::store_failure)?;
        } else {
            store
                .update_node(node, parent_id, false)
                .await
                .map_err(Self::store_failure)?;
        }

        for child in &element.children {
            let is_interior = registry
                .data_child_by_name(&schema.path, &child.qname)
                .is_some_and(|s| {
                    matches!(
                        s.kind,
                        SchemaNodeKind::Container { .. } | SchemaNodeKind::List(_)
                    )
                });
            if is_interior {
                self.merge_element(registry, store, &schema.path, &node_id, child, operation)
                    .await?;
            }
        }
        Ok(())
    }

    fn apply_leaf(
        &self,
        registry: &SchemaRegistry,
        node: &mut ModelNode,
        child: &EditNode,
        inherited: EditOperation,
    ) -> Result<(), ValidationError> {
        let paths = ErrorPathBuilder::new(registry);
        let operation = child.effective_operation(inherited);
        if operation.is_removal() {
            let removed = node.remove_attribute(&child.qname);
            if removed.is_none() && operation == EditOperation::Delete {
                let (path, ns) = paths.path_for_child(&node.node_id, &child.qname);
                return Err(RpcError::data_missing(format!(
                    "Cannot delete '{}', the leaf does not exist",
                    child.qname.local_name
                ))
                .with_error_path(path, ns)
                .into());
            }
            return Ok(());
        }
        let Some(raw) = child.value.as_deref() else {
            return Ok(());
        };
        let value = match raw
            .split_once(':')
            .and_then(|(prefix, _)| child.namespace_for_prefix(prefix))
        {
            Some(namespace) => ConfigValue::with_namespace(raw, namespace),
            None => ConfigValue::new(raw),
        };
        node.set_attribute(child.qname.clone(), value);
        Ok(())
    }

    fn apply_leaf_list_value(
        &self,
        registry: &SchemaRegistry,
        node: &mut ModelNode,
        child: &EditNode,
        inherited: EditOperation,
    ) -> Result<(), ValidationError> {
        let paths = ErrorPathBuilder::new(registry);
        let operation = child.effective_operation(inherited);
        let Some(raw) = child.value.as_deref() else {
            return Ok(());
        };
        if operation.is_removal() {
            let removed = node.remove_leaf_list_value(&child.qname, raw);
            if !removed && operation == EditOperation::Delete {
                let (path, ns) = paths.path_for_child(&node.node_id, &child.qname);
                return Err(RpcError::data_missing(format!(
                    "Cannot delete value '{raw}' from leaf-list '{}', it is not present",
                    child.qname.local_name
                ))
                .with_error_path(path, ns)
                .into());
            }
            return Ok(());
        }

        let value = ConfigValue::new(raw);
        let outcome = match child.insert {
            Some(InsertPosition::First) => {
                node.insert_leaf_list_value(child.qname.clone(), 0, value)
            }
            Some(position @ (InsertPosition::Before | InsertPosition::After)) => {
                let Some(reference) = child.insert_value.as_deref() else {
                    let (path, ns) = paths.path_for_child(&node.node_id, &child.qname);
                    return Err(RpcError::bad_attribute_error(
                        "value",
                        format!(
                            "insert='{}' requires a value attribute naming the reference entry",
                            position.as_str()
                        ),
                    )
                    .with_error_path(path, ns)
                    .into());
                };
                let index = node
                    .leaf_list(&child.qname)
                    .and_then(|values| values.iter().position(|v| v.value == reference));
                let Some(index) = index else {
                    let (path, ns) = paths.path_for_child(&node.node_id, &child.qname);
                    return Err(RpcError::bad_attribute_error(
                        "value",
                        format!("The leaf-list entry '{reference}' does not exist"),
                    )
                    .with_app_tag(APP_TAG_MISSING_INSTANCE)
                    .with_error_path(path, ns)
                    .into());
                };
                let index = match position {
                    InsertPosition::Before => index,
                    _ => index + 1,
                };
                node.insert_leaf_list_value(child.qname.clone(), index, value)
            }
            _ => node.add_leaf_list_value(child.qname.clone(), value),
        };
        outcome.map_err(|err| {
            let ModelNodeError::DuplicateLeafListValue { name, value } = err;
            let (path, ns) = paths.path_for_child(&node.node_id, &child.qname);
            ValidationError::new(
                RpcError::operation_failed(format!(
                    "Duplicate value '{value}' in leaf-list '{name}'"
                ))
                .with_app_tag(APP_TAG_DATA_NOT_UNIQUE)
                .with_error_path(path, ns),
            )
        })
    }
}

#[async_trait]
impl EditConfigMerger for TreeMerger {
    async fn merge(
        &self,
        request: &EditConfigRequest,
        registry: &SchemaRegistry,
        store: &dyn NodeDataStore,
    ) -> Result<(), ValidationError> {
        let inherited = Self::default_operation(request.kind);
        self.merge_element(
            registry,
            store,
            &request.root_path,
            &ModelNodeId::root(),
            &request.fragment,
            inherited,
        )
        .await
    }
}
