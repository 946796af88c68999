//! Error Path Builder
//!
//! Converts a tree address (and optionally a schema child under it) into
//! the protocol's namespace-qualified path string plus the prefix-to-
//! namespace map the caller needs to emit correct namespace declarations
//! alongside the path.
//!
//! When the failing node cannot be resolved against the registry, the
//! path degrades to the tree root `/` with an empty namespace map. That
//! fallback is deliberate: a degraded address still reaches the caller,
//! a refused error report would not.

use crate::models::{ModelNodeId, QName, Rdn, SchemaPath};
use crate::services::SchemaRegistry;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Renders error paths against one schema registry's prefix table.
pub struct ErrorPathBuilder<'a> {
    registry: &'a SchemaRegistry,
}

impl<'a> ErrorPathBuilder<'a> {
    /// Builder over the given registry
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }

    /// The degraded root path: `/` with no namespace map
    pub fn root() -> (String, BTreeMap<String, String>) {
        ("/".to_owned(), BTreeMap::new())
    }

    /// Path of an instance tree address.
    ///
    /// Container rdns render as `/pfx:name`; key rdns render as
    /// `[pfx:name='value']` predicates on the preceding step.
    pub fn path_for_node_id(&self, node_id: &ModelNodeId) -> (String, BTreeMap<String, String>) {
        if node_id.is_root() {
            return Self::root();
        }
        let mut path = String::new();
        let mut ns_by_prefix = BTreeMap::new();
        for rdn in node_id.rdns() {
            let prefix = self.record_prefix(rdn.namespace(), &mut ns_by_prefix);
            match rdn {
                Rdn::Container { name, .. } => {
                    let _ = write!(path, "/{prefix}:{name}");
                }
                Rdn::KeyValue { name, value, .. } => {
                    let _ = write!(path, "[{prefix}:{name}='{value}']");
                }
            }
        }
        (path, ns_by_prefix)
    }

    /// Path of a schema child under an instance tree address: the parent's
    /// path plus one `/pfx:child` step.
    pub fn path_for_child(
        &self,
        parent_id: &ModelNodeId,
        child: &QName,
    ) -> (String, BTreeMap<String, String>) {
        let (mut path, mut ns_by_prefix) = if parent_id.is_root() {
            (String::new(), BTreeMap::new())
        } else {
            self.path_for_node_id(parent_id)
        };
        let prefix = self.record_prefix(&child.namespace, &mut ns_by_prefix);
        let _ = write!(path, "/{prefix}:{}", child.local_name);
        (path, ns_by_prefix)
    }

    /// Path of a schema node with no instance context (phase-1 fragment
    /// errors). Choice and case segments are skipped; they are never
    /// addressable. Unknown paths degrade to the root fallback.
    pub fn path_for_schema(&self, schema_path: &SchemaPath) -> (String, BTreeMap<String, String>) {
        if schema_path.is_root() {
            return Self::root();
        }
        let Some(node) = self.registry.node_at(schema_path) else {
            return Self::root();
        };
        // Climb to the root through the addressable ancestors only.
        let mut steps = Vec::new();
        let mut current = Some(node);
        while let Some(node) = current {
            if !node.is_choice_or_case() {
                steps.push(node.qname.clone());
            }
            current = self.registry.non_choice_parent_of(&node.path);
        }
        if steps.is_empty() {
            return Self::root();
        }
        let mut path = String::new();
        let mut ns_by_prefix = BTreeMap::new();
        for qname in steps.iter().rev() {
            let prefix = self.record_prefix(&qname.namespace, &mut ns_by_prefix);
            let _ = write!(path, "/{prefix}:{}", qname.local_name);
        }
        (path, ns_by_prefix)
    }

    fn record_prefix(&self, namespace: &str, ns_by_prefix: &mut BTreeMap<String, String>) -> String {
        let prefix = self
            .registry
            .prefix_for_namespace(namespace)
            .unwrap_or("ns")
            .to_owned();
        ns_by_prefix
            .entry(prefix.clone())
            .or_insert_with(|| namespace.to_owned());
        prefix
    }
}
