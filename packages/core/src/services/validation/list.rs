//! List Validator
//!
//! The most intricate validator. Phase 1 checks one incoming list entry
//! fragment: key order and presence, key-delete refusal, insert-attribute
//! syntax, and (for request kinds that carry the full entry) mandatory
//! children. Phase 2 checks the candidate tree: min/max-elements over the
//! resolved entry count and unique-constraint groups over sibling value
//! tuples.
//!
//! Key-order classification is two-outcome by contract: an entry either
//! misses a declared key somewhere ("missing") or carries every key but
//! not as the leading children in declared order ("misplaced"). Exactly
//! one of the two is reported.

use crate::models::{
    EditNode, EditOperation, ListSchema, ModelNode, QName, RequestKind, RpcError, SchemaNode,
    SchemaNodeKind, APP_TAG_MISSING_INSTANCE,
};
use crate::services::validation::{TypeValidator, ValidationContext};
use crate::services::{ErrorPathBuilder, SchemaRegistry, ValidationError};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// One bracketed predicate: `[name='value']` or `[prefix:name='value']`.
fn predicate_regex() -> &'static Regex {
    static PREDICATE: OnceLock<Regex> = OnceLock::new();
    PREDICATE.get_or_init(|| {
        Regex::new(r"\[\s*(?:([A-Za-z_][\w.-]*):)?([A-Za-z_][\w.-]*)\s*=\s*'([^']*)'\s*\]")
            .expect("predicate pattern is a valid regex")
    })
}

/// Parse the bracketed key predicates of an `insert=before|after` `key`
/// attribute into `(key qname, value)` pairs.
///
/// Rejects malformed syntax, prefixes resolving to a namespace other than
/// the list's own, key names the list does not declare, duplicate keys,
/// and predicate sets missing a declared key. Returned errors carry no
/// error path; the caller anchors them.
pub(crate) fn parse_key_predicates(
    registry: &SchemaRegistry,
    list: &SchemaNode,
    list_schema: &ListSchema,
    raw: &str,
    fragment: &EditNode,
) -> Result<Vec<(QName, String)>, RpcError> {
    let regex = predicate_regex();
    let mut consumed = 0;
    let mut pairs: Vec<(QName, String)> = Vec::new();
    for captures in regex.captures_iter(raw) {
        let whole = captures.get(0).ok_or_else(malformed_key_attribute)?;
        if whole.start() != consumed {
            return Err(malformed_key_attribute());
        }
        consumed = whole.end();

        let name = captures.get(2).ok_or_else(malformed_key_attribute)?.as_str();
        let value = captures.get(3).ok_or_else(malformed_key_attribute)?.as_str();
        if let Some(prefix) = captures.get(1).map(|m| m.as_str()) {
            let namespace = fragment
                .namespace_for_prefix(prefix)
                .or_else(|| registry.namespace_for_prefix(prefix));
            match namespace {
                Some(ns) if ns == list.qname.namespace => {}
                Some(_) => {
                    return Err(RpcError::bad_attribute_error(
                        "key",
                        format!(
                            "Prefix '{prefix}' in key attribute does not resolve to the namespace of list '{}'",
                            list.qname.local_name
                        ),
                    ));
                }
                None => {
                    return Err(RpcError::bad_attribute_error(
                        "key",
                        format!("Unknown prefix '{prefix}' in key attribute"),
                    ));
                }
            }
        }

        let qname = QName::new(list.qname.namespace.clone(), name);
        if !list_schema.keys.contains(&qname) {
            return Err(RpcError::bad_attribute_error(
                "key",
                format!(
                    "'{name}' is not a key of list '{}'",
                    list.qname.local_name
                ),
            ));
        }
        if pairs.iter().any(|(q, _)| q == &qname) {
            return Err(RpcError::bad_attribute_error(
                "key",
                format!("Duplicate key '{name}' in key attribute"),
            ));
        }
        pairs.push((qname, value.to_owned()));
    }
    if consumed != raw.len() || pairs.is_empty() {
        return Err(malformed_key_attribute());
    }

    let missing: Vec<&str> = list_schema
        .keys
        .iter()
        .filter(|key| !pairs.iter().any(|(q, _)| q == *key))
        .map(|key| key.local_name.as_str())
        .collect();
    if !missing.is_empty() {
        return Err(RpcError::bad_attribute_error(
            "key",
            format!(
                "Key attribute is missing declared key(s) [{}]",
                missing.join(", ")
            ),
        ));
    }
    Ok(pairs)
}

fn malformed_key_attribute() -> RpcError {
    RpcError::bad_attribute_error(
        "key",
        "Key attribute must be one or more [name='value'] predicates",
    )
}

/// Validates list entries on both validation surfaces.
pub struct ListValidator<'a> {
    registry: &'a SchemaRegistry,
}

impl<'a> ListValidator<'a> {
    /// Validator over the given registry
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }

    fn list_schema(list: &SchemaNode) -> Option<&ListSchema> {
        match &list.kind {
            SchemaNodeKind::List(schema) => Some(schema),
            _ => None,
        }
    }

    fn anchored(&self, list: &SchemaNode, error: RpcError) -> ValidationError {
        let (path, ns_by_prefix) = ErrorPathBuilder::new(self.registry).path_for_schema(&list.path);
        ValidationError::new(error.with_error_path(path, ns_by_prefix))
    }

    /// Phase-1 validation of one list entry fragment: key order, key
    /// deletes, insert attributes and (for deep-check request kinds)
    /// mandatory children.
    ///
    /// # Errors
    ///
    /// The first failing rule, anchored at the list schema node.
    pub fn validate_entry_fragment(
        &self,
        list: &SchemaNode,
        entry: &EditNode,
        kind: RequestKind,
        inherited: EditOperation,
    ) -> Result<(), ValidationError> {
        let Some(list_schema) = Self::list_schema(list) else {
            return Ok(());
        };
        let operation = entry.effective_operation(inherited);
        self.validate_keys(list, list_schema, entry)?;
        self.validate_key_operations(list, list_schema, entry, operation)?;
        self.validate_insert_attributes(list, list_schema, entry)?;
        if kind.needs_deep_checks(Some(operation)) {
            self.validate_mandatory_children(list, list_schema, entry)?;
        }
        Ok(())
    }

    /// Rule (a): the first N children of an entry, in document order,
    /// must be exactly the N declared keys in declared order. Missing and
    /// misplaced are mutually exclusive outcomes.
    fn validate_keys(
        &self,
        list: &SchemaNode,
        list_schema: &ListSchema,
        entry: &EditNode,
    ) -> Result<(), ValidationError> {
        if list_schema.keys.is_empty() {
            return Ok(());
        }
        let missing: Vec<String> = list_schema
            .keys
            .iter()
            .filter(|key| entry.child(key).is_none())
            .map(|key| key.local_name.clone())
            .collect();
        if !missing.is_empty() {
            return Err(self.anchored(list, RpcError::missing_key_error(&missing)));
        }
        let misplaced: Vec<String> = list_schema
            .keys
            .iter()
            .enumerate()
            .filter(|(i, key)| entry.children.get(*i).map(|c| &c.qname) != Some(key))
            .map(|(_, key)| key.local_name.clone())
            .collect();
        if !misplaced.is_empty() {
            return Err(self.anchored(list, RpcError::misplaced_key_error(&misplaced)));
        }
        Ok(())
    }

    /// Rule (b): key leaves never carry a delete operation.
    fn validate_key_operations(
        &self,
        list: &SchemaNode,
        list_schema: &ListSchema,
        entry: &EditNode,
        entry_operation: EditOperation,
    ) -> Result<(), ValidationError> {
        for key in &list_schema.keys {
            let Some(child) = entry.child(key) else {
                continue;
            };
            if child.operation.is_some_and(EditOperation::is_removal)
                && !entry_operation.is_removal()
            {
                return Err(self.anchored(
                    list,
                    RpcError::operation_failed(format!(
                        "Key leaf '{}' can not be deleted",
                        key.local_name
                    )),
                ));
            }
        }
        Ok(())
    }

    /// Rule (c): insert attributes. Only user-ordered lists accept them;
    /// `before`/`after` need a well-formed `key` predicate attribute whose
    /// values type-check against the key leaf types.
    fn validate_insert_attributes(
        &self,
        list: &SchemaNode,
        list_schema: &ListSchema,
        entry: &EditNode,
    ) -> Result<(), ValidationError> {
        let Some(position) = entry.insert else {
            return Ok(());
        };
        if !list_schema.user_ordered {
            return Err(self.anchored(
                list,
                RpcError::unknown_attribute_error(format!(
                    "Attribute 'insert' is not allowed on ordered-by system list '{}'",
                    list.qname.local_name
                )),
            ));
        }
        if !position.needs_key() {
            return Ok(());
        }
        let Some(raw) = entry.insert_key.as_deref() else {
            return Err(self.anchored(
                list,
                RpcError::bad_attribute_error(
                    "key",
                    format!(
                        "insert='{}' requires a key attribute naming the reference entry",
                        position.as_str()
                    ),
                ),
            ));
        };
        let pairs = parse_key_predicates(self.registry, list, list_schema, raw, entry)
            .map_err(|error| self.anchored(list, error))?;

        let types = TypeValidator::new(self.registry);
        for (qname, value) in &pairs {
            let Some(SchemaNode {
                kind: SchemaNodeKind::Leaf(leaf),
                ..
            }) = self.registry.child_by_name(&list.path, qname)
            else {
                continue;
            };
            if let Err(reason) = types.check_value(&leaf.value_type, value, None) {
                return Err(self.anchored(
                    list,
                    RpcError::bad_attribute_error(
                        "key",
                        format!("Invalid key predicate value for '{}': {reason}", qname.local_name),
                    )
                    .with_app_tag(APP_TAG_MISSING_INSTANCE),
                ));
            }
        }
        Ok(())
    }

    /// Rule (d): for request kinds carrying the full entry, every
    /// mandatory leaf child must be present in the fragment.
    fn validate_mandatory_children(
        &self,
        list: &SchemaNode,
        list_schema: &ListSchema,
        entry: &EditNode,
    ) -> Result<(), ValidationError> {
        for child in self.registry.data_children_of(&list.path) {
            if !child.is_mandatory() || list_schema.keys.contains(&child.qname) {
                continue;
            }
            if matches!(child.kind, SchemaNodeKind::Leaf(_)) && entry.child(&child.qname).is_none()
            {
                return Err(self.anchored(
                    list,
                    RpcError::missing_mandatory_element(&child.qname.local_name),
                ));
            }
        }
        Ok(())
    }

    /// Phase-2 validation of all entries of one list under `parent`:
    /// rules (e) cardinality and (f) uniqueness, against the resolved
    /// sibling collection of the candidate tree.
    ///
    /// # Errors
    ///
    /// The first violated bound or the first colliding unique tuple.
    pub async fn validate_entries(
        &self,
        parent: &ModelNode,
        list: &SchemaNode,
        ctx: &mut ValidationContext<'_>,
    ) -> Result<(), ValidationError> {
        let Some(list_schema) = Self::list_schema(list) else {
            return Ok(());
        };
        let entries = ctx.child_list(parent, list).await;
        let paths = ErrorPathBuilder::new(self.registry);

        let count = entries.len() as u32;
        if let Some(min) = list_schema.min_elements {
            if count < min {
                let (path, ns) = paths.path_for_child(&parent.node_id, &list.qname);
                return Err(RpcError::too_few_elements(&list.qname.local_name, min)
                    .with_error_path(path, ns)
                    .into());
            }
        }
        if let Some(max) = list_schema.max_elements {
            if count > max {
                let (path, ns) = paths.path_for_child(&parent.node_id, &list.qname);
                return Err(RpcError::too_many_elements(&list.qname.local_name, max)
                    .with_error_path(path, ns)
                    .into());
            }
        }

        for group in &list_schema.unique {
            let mut seen: HashMap<Vec<&str>, &ModelNode> = HashMap::new();
            for entry in &entries {
                let Some(tuple) = group
                    .iter()
                    .map(|q| entry.attribute(q).map(|v| v.value.as_str()))
                    .collect::<Option<Vec<&str>>>()
                else {
                    // An entry missing a group member can not collide.
                    continue;
                };
                if seen.insert(tuple.clone(), entry).is_some() {
                    let rendered = group
                        .iter()
                        .zip(&tuple)
                        .map(|(q, v)| format!("{} = {v}", q.local_name))
                        .collect::<Vec<String>>()
                        .join(", ");
                    let (path, ns) = paths.path_for_node_id(&entry.node_id);
                    return Err(RpcError::data_not_unique(&rendered)
                        .with_error_path(path, ns)
                        .into());
                }
            }
        }
        Ok(())
    }

    /// Compute the insert index for a user-ordered list entry given its
    /// resolved siblings: `first` is 0, `last`/no-attribute appends,
    /// `before`/`after` anchor on the entry the `key` predicates name.
    ///
    /// # Errors
    ///
    /// `bad-attribute` on `key` with app-tag `missing-instance` when the
    /// referenced entry does not exist; predicate parse errors as in
    /// [`parse_key_predicates`]. Errors carry no path; the caller anchors
    /// them.
    pub(crate) fn insert_index(
        &self,
        list: &SchemaNode,
        entry: &EditNode,
        siblings: &[ModelNode],
    ) -> Result<Option<usize>, RpcError> {
        use crate::models::InsertPosition;
        let Some(list_schema) = Self::list_schema(list) else {
            return Ok(None);
        };
        match entry.insert {
            None | Some(InsertPosition::Last) => Ok(None),
            Some(InsertPosition::First) => Ok(Some(0)),
            Some(position) => {
                let raw = entry.insert_key.as_deref().ok_or_else(|| {
                    RpcError::bad_attribute_error(
                        "key",
                        format!(
                            "insert='{}' requires a key attribute naming the reference entry",
                            position.as_str()
                        ),
                    )
                })?;
                let pairs = parse_key_predicates(self.registry, list, list_schema, raw, entry)?;
                let reference = siblings.iter().position(|sibling| {
                    pairs
                        .iter()
                        .all(|(q, v)| sibling.attribute(q).is_some_and(|cv| &cv.value == v))
                });
                match (reference, position) {
                    (Some(index), InsertPosition::Before) => Ok(Some(index)),
                    (Some(index), _) => Ok(Some(index + 1)),
                    (None, _) => Err(RpcError::bad_attribute_error(
                        "key",
                        format!("The list entry referenced by key attribute '{raw}' does not exist"),
                    )
                    .with_app_tag(APP_TAG_MISSING_INSTANCE)),
                }
            }
        }
    }
}
