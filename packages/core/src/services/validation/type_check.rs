//! Leaf Type Validator
//!
//! Checks a leaf's textual value against its declared [`ValueType`].
//! Fragment-side validation is skipped when the element's effective
//! operation removes data; deleting a node's content does not require the
//! removed value to type-check.

use crate::models::{
    EditNode, EditOperation, QName, RpcError, SchemaNode, SchemaNodeKind, ValueType,
};
use crate::services::{ErrorPathBuilder, SchemaRegistry, ValidationError};
use regex::Regex;

/// Validates leaf and leaf-list values against their declared types.
pub struct TypeValidator<'a> {
    registry: &'a SchemaRegistry,
}

impl<'a> TypeValidator<'a> {
    /// Validator over the given registry
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Check a raw textual value against a declared type. Returns the
    /// failure reason; the caller wraps it into the error record fitting
    /// its own surface (invalid-value for elements, bad-attribute for
    /// insert predicates).
    pub fn check_value(
        &self,
        value_type: &ValueType,
        raw: &str,
        value_namespace: Option<&str>,
    ) -> Result<(), String> {
        match value_type {
            ValueType::String { length, patterns } => {
                if let Some((min, max)) = length {
                    let chars = raw.chars().count() as u64;
                    if chars < *min || chars > *max {
                        return Err(format!(
                            "Length '{chars}' is out of range [{min}, {max}]"
                        ));
                    }
                }
                for pattern in patterns {
                    let anchored = format!("^(?:{pattern})$");
                    let regex = Regex::new(&anchored)
                        .map_err(|_| format!("Invalid pattern '{pattern}'"))?;
                    if !regex.is_match(raw) {
                        return Err(format!(
                            "Value '{raw}' does not match pattern '{pattern}'"
                        ));
                    }
                }
                Ok(())
            }
            ValueType::Int { range } => {
                let parsed: i64 = raw
                    .parse()
                    .map_err(|_| format!("Value '{raw}' is not a valid integer"))?;
                if let Some((min, max)) = range {
                    if parsed < *min || parsed > *max {
                        return Err(format!(
                            "Value '{parsed}' is out of range [{min}, {max}]"
                        ));
                    }
                }
                Ok(())
            }
            ValueType::Uint { range } => {
                let parsed: u64 = raw
                    .parse()
                    .map_err(|_| format!("Value '{raw}' is not a valid unsigned integer"))?;
                if let Some((min, max)) = range {
                    if parsed < *min || parsed > *max {
                        return Err(format!(
                            "Value '{parsed}' is out of range [{min}, {max}]"
                        ));
                    }
                }
                Ok(())
            }
            ValueType::Bool => match raw {
                "true" | "false" => Ok(()),
                _ => Err(format!("Value '{raw}' is not a boolean")),
            },
            ValueType::Enumeration { values } => {
                if values.iter().any(|v| v == raw) {
                    Ok(())
                } else {
                    Err(format!("Value '{raw}' is not a valid enum value"))
                }
            }
            ValueType::IdentityRef { base } => {
                let local_name = raw.rsplit(':').next().unwrap_or(raw);
                let namespace = value_namespace.unwrap_or(&base.namespace);
                let qname = QName::new(namespace, local_name);
                if self.registry.identity(&qname).is_none() {
                    return Err(format!("Value '{raw}' is not a registered identity"));
                }
                if !self.registry.identity_derives_from(&qname, base) {
                    return Err(format!(
                        "Identity '{raw}' is not derived from '{}'",
                        base.local_name
                    ));
                }
                Ok(())
            }
        }
    }

    /// Phase-1 check of one leaf element of the incoming fragment.
    ///
    /// # Errors
    ///
    /// `invalid-value` with the element's schema path when the value fails
    /// its declared type; missing content on a non-removal operation is
    /// also `invalid-value`.
    pub fn validate_leaf_fragment(
        &self,
        schema: &SchemaNode,
        fragment: &EditNode,
        inherited: EditOperation,
    ) -> Result<(), ValidationError> {
        let SchemaNodeKind::Leaf(leaf) = &schema.kind else {
            return Ok(());
        };
        if fragment.effective_operation(inherited).is_removal() {
            return Ok(());
        }
        let paths = ErrorPathBuilder::new(self.registry);
        let (path, ns_by_prefix) = paths.path_for_schema(&schema.path);
        let Some(raw) = fragment.value.as_deref() else {
            return Err(RpcError::invalid_value(format!(
                "Missing value for leaf '{}'",
                schema.qname.local_name
            ))
            .with_error_path(path, ns_by_prefix)
            .into());
        };
        let value_namespace = raw
            .split_once(':')
            .and_then(|(prefix, _)| fragment.namespace_for_prefix(prefix));
        self.check_value(&leaf.value_type, raw, value_namespace)
            .map_err(|reason| {
                ValidationError::new(
                    RpcError::invalid_value(reason).with_error_path(path, ns_by_prefix),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SchemaPath;

    const NS: &str = "urn:example:device";

    fn registry_with_identities() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        let module = crate::models::Module::new("device", NS, "dev")
            .with_identity(SchemaNode::identity(QName::new(NS, "eth-kind"), None))
            .with_identity(SchemaNode::identity(
                QName::new(NS, "fast-eth"),
                Some(QName::new(NS, "eth-kind")),
            ));
        registry.register_module(module).unwrap();
        registry
    }

    #[test]
    fn test_check_string_length_and_pattern() {
        let registry = SchemaRegistry::new();
        let validator = TypeValidator::new(&registry);
        let value_type = ValueType::String {
            length: Some((2, 5)),
            patterns: vec!["[a-z]+".to_owned()],
        };
        assert!(validator.check_value(&value_type, "abc", None).is_ok());
        assert!(validator.check_value(&value_type, "a", None).is_err());
        assert!(validator.check_value(&value_type, "ABC", None).is_err());
    }

    #[test]
    fn test_check_integer_ranges() {
        let registry = SchemaRegistry::new();
        let validator = TypeValidator::new(&registry);
        let value_type = ValueType::Int {
            range: Some((0, 4094)),
        };
        assert!(validator.check_value(&value_type, "4094", None).is_ok());
        assert!(validator.check_value(&value_type, "4095", None).is_err());
        assert!(validator.check_value(&value_type, "nope", None).is_err());
    }

    #[test]
    fn test_check_identityref_derivation() {
        let registry = registry_with_identities();
        let validator = TypeValidator::new(&registry);
        let value_type = ValueType::IdentityRef {
            base: QName::new(NS, "eth-kind"),
        };
        assert!(validator.check_value(&value_type, "fast-eth", None).is_ok());
        assert!(validator
            .check_value(&value_type, "dev:fast-eth", Some(NS))
            .is_ok());
        assert!(validator.check_value(&value_type, "unknown", None).is_err());
    }

    #[test]
    fn test_removal_skips_type_check() {
        let registry = SchemaRegistry::new();
        let validator = TypeValidator::new(&registry);
        let root = SchemaPath::root();
        let schema = SchemaNode::leaf(
            &root,
            QName::new(NS, "mtu"),
            crate::models::LeafSchema {
                value_type: ValueType::uint(),
                mandatory: false,
                default: None,
            },
        );
        let fragment = EditNode::leaf(QName::new(NS, "mtu"), "not-a-number")
            .with_operation(EditOperation::Delete);
        assert!(validator
            .validate_leaf_fragment(&schema, &fragment, EditOperation::Merge)
            .is_ok());
    }
}
