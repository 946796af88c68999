//! Choice/Case Validator
//!
//! A schema node reached through a case hangs off a logical choice
//! ancestor. This validator resolves that ancestor and evaluates the
//! choice's and the enclosing case's `when` expression against the
//! *parent* instance node. Evaluation only runs when the parent already
//! carries committed child data; an expression against a parent with no
//! instance data yet is vacuously satisfied, not a failure.

use crate::models::{ModelNode, RpcError, SchemaNode, APP_TAG_WHEN_VIOLATION};
use crate::services::expression::{Expression, ExpressionEvaluator};
use crate::services::validation::ValidationContext;
use crate::services::{ErrorPathBuilder, SchemaRegistry, ValidationError};

/// Validates the conditional presence of choice/case descendants.
pub struct ChoiceCaseValidator<'a> {
    registry: &'a SchemaRegistry,
}

impl<'a> ChoiceCaseValidator<'a> {
    /// Validator over the given registry
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Validate the choice/case conditionals guarding `child_schema`
    /// against its parent instance node.
    ///
    /// # Errors
    ///
    /// `operation-failed` with app-tag `when-violation`, anchored at the
    /// parent node (choice and case are never addressable path segments).
    pub async fn validate(
        &self,
        parent: &ModelNode,
        child_schema: &SchemaNode,
        ctx: &mut ValidationContext<'_>,
    ) -> Result<(), ValidationError> {
        let Some(choice) = self.registry.choice_ancestor_of(&child_schema.path) else {
            return Ok(());
        };
        if !parent.has_child_data() {
            return Ok(());
        }
        let case = self.registry.case_parent_of(&child_schema.path);
        let conditionals = [
            choice.when.as_deref().map(|w| (w, &choice.qname)),
            case.and_then(|c| c.when.as_deref().map(|w| (w, &c.qname))),
        ];
        for (source, owner) in conditionals.into_iter().flatten() {
            self.check_when(source, owner, parent, ctx).await?;
        }
        Ok(())
    }

    async fn check_when(
        &self,
        source: &str,
        owner: &crate::models::QName,
        parent: &ModelNode,
        ctx: &mut ValidationContext<'_>,
    ) -> Result<(), ValidationError> {
        let anchor = |error: RpcError| {
            let (path, ns) = ErrorPathBuilder::new(self.registry).path_for_node_id(&parent.node_id);
            ValidationError::new(error.with_error_path(path, ns))
        };
        let expression = Expression::parse(source)
            .map_err(|err| anchor(RpcError::operation_failed(err.to_string())))?;
        let holds = ExpressionEvaluator::new(self.registry)
            .evaluate(&expression, parent, ctx)
            .await
            .map_err(|err| anchor(RpcError::operation_failed(err.to_string())))?;
        if holds {
            return Ok(());
        }
        Err(anchor(
            RpcError::operation_failed(format!(
                "Violate when constraints: '{source}' is false for '{}'",
                owner.local_name
            ))
            .with_app_tag(APP_TAG_WHEN_VIOLATION),
        ))
    }
}
