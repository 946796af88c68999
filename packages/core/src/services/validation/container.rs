//! Container Conditional Validator
//!
//! Evaluates the `when` and `must` expressions attached directly to a
//! schema node against the candidate tree: `when` runs against the parent
//! instance node (gated on the parent having child data, like choice/case
//! conditionals), `must` runs against the node's own instance.

use crate::models::{ModelNode, RpcError, SchemaNode, APP_TAG_MUST_VIOLATION, APP_TAG_WHEN_VIOLATION};
use crate::services::expression::{Expression, ExpressionEvaluator};
use crate::services::validation::ValidationContext;
use crate::services::{ErrorPathBuilder, SchemaRegistry, ValidationError};

/// Validates node-level when/must conditionals.
pub struct ContainerValidator<'a> {
    registry: &'a SchemaRegistry,
}

impl<'a> ContainerValidator<'a> {
    /// Validator over the given registry
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Validate the conditionals of one existing instance node.
    ///
    /// # Errors
    ///
    /// `operation-failed` with app-tag `when-violation` or
    /// `must-violation`, anchored at the node (or its parent for `when`).
    pub async fn validate(
        &self,
        parent: &ModelNode,
        node: &ModelNode,
        schema: &SchemaNode,
        ctx: &mut ValidationContext<'_>,
    ) -> Result<(), ValidationError> {
        if let Some(when) = schema.when.as_deref() {
            if parent.has_child_data() {
                let holds = self.evaluate(when, parent, ctx).await?;
                if !holds {
                    let (path, ns) =
                        ErrorPathBuilder::new(self.registry).path_for_node_id(&parent.node_id);
                    return Err(RpcError::operation_failed(format!(
                        "Violate when constraints: '{when}' is false for '{}'",
                        schema.qname.local_name
                    ))
                    .with_app_tag(APP_TAG_WHEN_VIOLATION)
                    .with_error_path(path, ns)
                    .into());
                }
            }
        }
        for must in &schema.must {
            if !node.has_child_data() {
                continue;
            }
            let holds = self.evaluate(must, node, ctx).await?;
            if !holds {
                let (path, ns) =
                    ErrorPathBuilder::new(self.registry).path_for_node_id(&node.node_id);
                return Err(RpcError::operation_failed(format!(
                    "Violate must constraints: '{must}' is false for '{}'",
                    schema.qname.local_name
                ))
                .with_app_tag(APP_TAG_MUST_VIOLATION)
                .with_error_path(path, ns)
                .into());
            }
        }
        Ok(())
    }

    async fn evaluate(
        &self,
        source: &str,
        context_node: &ModelNode,
        ctx: &mut ValidationContext<'_>,
    ) -> Result<bool, ValidationError> {
        let anchor = |message: String| {
            let (path, ns) =
                ErrorPathBuilder::new(self.registry).path_for_node_id(&context_node.node_id);
            ValidationError::new(RpcError::operation_failed(message).with_error_path(path, ns))
        };
        let expression = Expression::parse(source).map_err(|err| anchor(err.to_string()))?;
        ExpressionEvaluator::new(self.registry)
            .evaluate(&expression, context_node, ctx)
            .await
            .map_err(|err| anchor(err.to_string()))
    }
}
