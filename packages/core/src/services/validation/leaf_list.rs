//! Leaf-List Validator
//!
//! Phase 1 checks one leaf-list element of the incoming fragment: value
//! type (skipped for removals) and insert attributes; leaf-lists anchor
//! `before`/`after` with a `value` attribute rather than key predicates.
//! Phase 2 checks the candidate tree: entry count against min/max-elements
//! and the no-duplicates invariant over the stored ordered set.

use crate::models::{
    EditNode, EditOperation, LeafListSchema, ModelNode, RpcError, SchemaNode, SchemaNodeKind,
    APP_TAG_DATA_NOT_UNIQUE,
};
use crate::services::validation::TypeValidator;
use crate::services::{ErrorPathBuilder, SchemaRegistry, ValidationError};

/// Validates leaf-list values and bounds.
pub struct LeafListValidator<'a> {
    registry: &'a SchemaRegistry,
}

impl<'a> LeafListValidator<'a> {
    /// Validator over the given registry
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }

    fn leaf_list_schema(schema: &SchemaNode) -> Option<&LeafListSchema> {
        match &schema.kind {
            SchemaNodeKind::LeafList(schema) => Some(schema),
            _ => None,
        }
    }

    fn anchored(&self, schema: &SchemaNode, error: RpcError) -> ValidationError {
        let (path, ns_by_prefix) =
            ErrorPathBuilder::new(self.registry).path_for_schema(&schema.path);
        ValidationError::new(error.with_error_path(path, ns_by_prefix))
    }

    /// Phase-1 validation of one leaf-list element fragment.
    ///
    /// # Errors
    ///
    /// `unknown-attribute` for any insert attribute on an ordered-by
    /// system leaf-list; `bad-attribute` naming `value` when
    /// `before`/`after` lacks its companion attribute; `invalid-value`
    /// when the content fails the declared type.
    pub fn validate_fragment(
        &self,
        schema: &SchemaNode,
        fragment: &EditNode,
        inherited: EditOperation,
    ) -> Result<(), ValidationError> {
        let Some(leaf_list) = Self::leaf_list_schema(schema) else {
            return Ok(());
        };
        if let Some(position) = fragment.insert {
            if !leaf_list.user_ordered {
                return Err(self.anchored(
                    schema,
                    RpcError::unknown_attribute_error(format!(
                        "Attribute 'insert' is not allowed on ordered-by system leaf-list '{}'",
                        schema.qname.local_name
                    )),
                ));
            }
            if position.needs_key() && fragment.insert_value.is_none() {
                return Err(self.anchored(
                    schema,
                    RpcError::bad_attribute_error(
                        "value",
                        format!(
                            "insert='{}' requires a value attribute naming the reference entry",
                            position.as_str()
                        ),
                    ),
                ));
            }
        }

        if fragment.effective_operation(inherited).is_removal() {
            return Ok(());
        }
        let Some(raw) = fragment.value.as_deref() else {
            return Err(self.anchored(
                schema,
                RpcError::invalid_value(format!(
                    "Missing value for leaf-list '{}'",
                    schema.qname.local_name
                )),
            ));
        };
        let value_namespace = raw
            .split_once(':')
            .and_then(|(prefix, _)| fragment.namespace_for_prefix(prefix));
        TypeValidator::new(self.registry)
            .check_value(&leaf_list.value_type, raw, value_namespace)
            .map_err(|reason| self.anchored(schema, RpcError::invalid_value(reason)))
    }

    /// Phase-2 validation of one leaf-list's stored values under `parent`.
    ///
    /// # Errors
    ///
    /// `too-few-elements` / `too-many-elements` against the declared
    /// bounds; `operation-failed` with app-tag `data-not-unique` when the
    /// stored values are not pairwise distinct.
    pub fn validate_values(
        &self,
        parent: &ModelNode,
        schema: &SchemaNode,
    ) -> Result<(), ValidationError> {
        let Some(leaf_list) = Self::leaf_list_schema(schema) else {
            return Ok(());
        };
        let values = parent.leaf_list(&schema.qname).unwrap_or(&[]);
        let paths = ErrorPathBuilder::new(self.registry);

        let count = values.len() as u32;
        if let Some(min) = leaf_list.min_elements {
            if count < min {
                let (path, ns) = paths.path_for_child(&parent.node_id, &schema.qname);
                return Err(RpcError::too_few_elements(&schema.qname.local_name, min)
                    .with_error_path(path, ns)
                    .into());
            }
        }
        if let Some(max) = leaf_list.max_elements {
            if count > max {
                let (path, ns) = paths.path_for_child(&parent.node_id, &schema.qname);
                return Err(RpcError::too_many_elements(&schema.qname.local_name, max)
                    .with_error_path(path, ns)
                    .into());
            }
        }

        for (i, value) in values.iter().enumerate() {
            if values[..i].iter().any(|v| v.value == value.value) {
                let (path, ns) = paths.path_for_child(&parent.node_id, &schema.qname);
                return Err(RpcError::operation_failed(format!(
                    "Duplicate value '{}' in leaf-list '{}'",
                    value.value, schema.qname.local_name
                ))
                .with_app_tag(APP_TAG_DATA_NOT_UNIQUE)
                .with_error_path(path, ns)
                .into());
            }
        }
        Ok(())
    }
}
