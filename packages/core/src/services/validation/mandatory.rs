//! Mandatory Validator
//!
//! Recursively confirms every mandatory-flagged child of an existing
//! container, list entry or case is present. The walk descends before it
//! checks, so a missing mandatory descendant is reported at the most
//! specific node that exists, never at an ancestor.
//!
//! Mandatory leaves living under a choice are not checked individually;
//! the choice itself is checked instead, requiring at least one data node
//! from any of its cases when the choice is flagged mandatory.

use crate::models::{ModelNode, RpcError, SchemaNode, SchemaNodeKind, SchemaPath};
use crate::services::validation::ValidationContext;
use crate::services::{ErrorPathBuilder, SchemaRegistry, ValidationError};
use std::future::Future;
use std::pin::Pin;

/// Validates presence of mandatory children, bottom-up.
pub struct MandatoryValidator<'a> {
    registry: &'a SchemaRegistry,
}

impl<'a> MandatoryValidator<'a> {
    /// Validator over the given registry
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Validate the subtree rooted at `node`.
    ///
    /// # Errors
    ///
    /// `missing-element` for the deepest absent mandatory child found.
    pub fn validate<'e>(
        &'e self,
        node: &'e ModelNode,
        ctx: &'e mut ValidationContext<'_>,
    ) -> Pin<Box<dyn Future<Output = Result<(), ValidationError>> + Send + 'e>> {
        Box::pin(async move {
            let children: Vec<SchemaNode> = self
                .registry
                .data_children_of(&node.schema_path)
                .into_iter()
                .cloned()
                .collect();

            // Descend first so failures surface at the most specific node.
            for child in &children {
                match &child.kind {
                    SchemaNodeKind::Container { .. } => {
                        if let Some(instance) = ctx.child_container(node, child).await {
                            self.validate(&instance, ctx).await?;
                        }
                    }
                    SchemaNodeKind::List(_) => {
                        for entry in ctx.child_list(node, child).await {
                            self.validate(&entry, ctx).await?;
                        }
                    }
                    _ => {}
                }
            }

            for child in &children {
                if !matches!(child.kind, SchemaNodeKind::Leaf(_)) || !child.is_mandatory() {
                    continue;
                }
                if self.registry.choice_ancestor_of(&child.path).is_some() {
                    continue;
                }
                if node.attribute(&child.qname).is_none() {
                    let (path, ns) = ErrorPathBuilder::new(self.registry)
                        .path_for_child(&node.node_id, &child.qname);
                    return Err(RpcError::missing_mandatory_element(&child.qname.local_name)
                        .with_error_path(path, ns)
                        .into());
                }
            }

            self.validate_mandatory_choices(node, ctx).await
        })
    }

    /// A mandatory choice requires at least one data node from any of its
    /// cases to be present on the enclosing instance node. Choices nested
    /// inside another choice's case count only while that case is
    /// selected, which is true as soon as any of its data nodes exists.
    async fn validate_mandatory_choices(
        &self,
        node: &ModelNode,
        ctx: &mut ValidationContext<'_>,
    ) -> Result<(), ValidationError> {
        let mut choices = Vec::new();
        self.collect_mandatory_choices(&node.schema_path, &mut choices);
        for choice in choices {
            if let Some(case) = self.registry.case_parent_of(&choice.path).cloned() {
                if !self.any_data_child_present(node, &case, ctx).await {
                    continue;
                }
            }
            if !self.any_data_child_present(node, &choice, ctx).await {
                let (path, ns) =
                    ErrorPathBuilder::new(self.registry).path_for_node_id(&node.node_id);
                return Err(
                    RpcError::missing_mandatory_element(&choice.qname.local_name)
                        .with_error_path(path, ns)
                        .into(),
                );
            }
        }
        Ok(())
    }

    /// Collect mandatory choices hanging off `path`, descending through
    /// choice and case layers the way data-child lookups do. Containers
    /// and lists are their own instance nodes and are left to the walk.
    fn collect_mandatory_choices(&self, path: &SchemaPath, out: &mut Vec<SchemaNode>) {
        for child in self.registry.children_of(path) {
            match &child.kind {
                SchemaNodeKind::Choice { mandatory } => {
                    if *mandatory {
                        out.push(child.clone());
                    }
                    self.collect_mandatory_choices(&child.path, out);
                }
                SchemaNodeKind::Case => self.collect_mandatory_choices(&child.path, out),
                _ => {}
            }
        }
    }

    /// Whether any data node under `schema` (choice/case layers
    /// flattened) exists on the instance `node`.
    async fn any_data_child_present(
        &self,
        node: &ModelNode,
        schema: &SchemaNode,
        ctx: &mut ValidationContext<'_>,
    ) -> bool {
        let children: Vec<SchemaNode> = self
            .registry
            .data_children_of(&schema.path)
            .into_iter()
            .cloned()
            .collect();
        for child in &children {
            let present = match &child.kind {
                SchemaNodeKind::Leaf(_) => node.attribute(&child.qname).is_some(),
                SchemaNodeKind::LeafList(_) => node
                    .leaf_list(&child.qname)
                    .is_some_and(|values| !values.is_empty()),
                SchemaNodeKind::Container { .. } => {
                    ctx.child_container(node, child).await.is_some()
                }
                SchemaNodeKind::List(_) => !ctx.child_list(node, child).await.is_empty(),
                _ => false,
            };
            if present {
                return true;
            }
        }
        false
    }
}
