//! Schema Traverser
//!
//! Generic pre-order walk over the registered schema graph dispatching to
//! pluggable [`SchemaVisitor`]s. Used to build derived indexes such as the
//! component-ownership index or the datastore helper set.
//!
//! Visit order per node: `visit_enter`, the kind-specific callback,
//! recursion into children, `visit_leave`. The visitor list is inner to
//! the tree walk: every registered visitor observes a node before any
//! visitor observes the next one.
//!
//! Choice handling: a choice's cases are visited individually, but their
//! children are traversed as if they hung directly off the choice's
//! parent. Identities are visited once, flat, with no enter/leave pair.

use crate::models::{SchemaNode, SchemaNodeKind, SchemaPath};
use crate::services::SchemaRegistry;
use std::collections::HashMap;

/// Visitor over the schema graph. All methods default to no-ops so
/// implementors override only the kinds they care about.
#[allow(unused_variables)]
pub trait SchemaVisitor {
    /// Called before a node's kind-specific callback
    fn visit_enter(&mut self, component_id: &str, parent: Option<&SchemaPath>, path: &SchemaPath) {}

    /// Container node
    fn visit_container(
        &mut self,
        component_id: &str,
        parent: Option<&SchemaPath>,
        node: &SchemaNode,
    ) {
    }

    /// List node
    fn visit_list(&mut self, component_id: &str, parent: Option<&SchemaPath>, node: &SchemaNode) {}

    /// Leaf node
    fn visit_leaf(&mut self, component_id: &str, parent: Option<&SchemaPath>, node: &SchemaNode) {}

    /// Leaf-list node
    fn visit_leaf_list(
        &mut self,
        component_id: &str,
        parent: Option<&SchemaPath>,
        node: &SchemaNode,
    ) {
    }

    /// Choice node
    fn visit_choice(&mut self, component_id: &str, parent: Option<&SchemaPath>, node: &SchemaNode) {
    }

    /// Case node
    fn visit_case(&mut self, component_id: &str, parent: Option<&SchemaPath>, node: &SchemaNode) {}

    /// AnyXml node
    fn visit_any_xml(&mut self, component_id: &str, parent: Option<&SchemaPath>, node: &SchemaNode) {
    }

    /// Identity definition; visited flat, outside the tree walk
    fn visit_identity(&mut self, component_id: &str, node: &SchemaNode) {}

    /// Called after a node's subtree has been traversed
    fn visit_leave(&mut self, component_id: &str, parent: Option<&SchemaPath>, path: &SchemaPath) {}
}

/// Pre-order traverser over one module's subtrees.
pub struct SchemaTraverser<'a> {
    component_id: String,
    registry: &'a SchemaRegistry,
    module_name: String,
    visitors: Vec<&'a mut dyn SchemaVisitor>,
}

impl<'a> SchemaTraverser<'a> {
    /// Traverser over the module's root nodes, augmentations and
    /// identities. `component_id` tags every visit so visitors building
    /// shared indexes know which deployment component the nodes belong to.
    pub fn new(
        component_id: impl Into<String>,
        registry: &'a SchemaRegistry,
        module_name: impl Into<String>,
        visitors: Vec<&'a mut dyn SchemaVisitor>,
    ) -> Self {
        Self {
            component_id: component_id.into(),
            registry,
            module_name: module_name.into(),
            visitors,
        }
    }

    /// Run the traversal. Unknown module names traverse nothing; absence
    /// is handled by the caller's registration order, not here.
    pub fn traverse(&mut self) {
        let Some(module) = self.registry.module(&self.module_name) else {
            tracing::warn!(module = %self.module_name, "traversal requested for unregistered module");
            return;
        };
        let module = module.clone();

        for root_path in &module.root_paths {
            if let Some(root) = self.registry.node_at(root_path) {
                Self::visit_and_traverse(
                    &self.component_id,
                    self.registry,
                    &mut self.visitors,
                    None,
                    root,
                );
            }
        }

        // Augmented children are registered alongside direct children, so
        // revisit each target and walk only the subset this module's
        // augmentations declare. Matching by qualified name avoids
        // double-visiting children the target module defines directly.
        for augmentation in &module.augmentations {
            for child in self.registry.children_of(&augmentation.target) {
                if augmentation.children.contains(&child.qname) {
                    Self::visit_and_traverse(
                        &self.component_id,
                        self.registry,
                        &mut self.visitors,
                        Some(&augmentation.target),
                        child,
                    );
                }
            }
        }

        for qname in &module.identity_qnames {
            if let Some(identity) = self.registry.identity(qname) {
                for visitor in &mut self.visitors {
                    visitor.visit_identity(&self.component_id, identity);
                }
            }
        }
    }

    fn visit_and_traverse(
        component_id: &str,
        registry: &SchemaRegistry,
        visitors: &mut [&'a mut dyn SchemaVisitor],
        parent: Option<&SchemaPath>,
        node: &SchemaNode,
    ) {
        for visitor in visitors.iter_mut() {
            visitor.visit_enter(component_id, parent, &node.path);
        }
        for visitor in visitors.iter_mut() {
            match node.kind {
                SchemaNodeKind::Container { .. } => {
                    visitor.visit_container(component_id, parent, node);
                }
                SchemaNodeKind::List(_) => visitor.visit_list(component_id, parent, node),
                SchemaNodeKind::Leaf(_) => visitor.visit_leaf(component_id, parent, node),
                SchemaNodeKind::LeafList(_) => visitor.visit_leaf_list(component_id, parent, node),
                SchemaNodeKind::Choice { .. } => visitor.visit_choice(component_id, parent, node),
                SchemaNodeKind::Case => visitor.visit_case(component_id, parent, node),
                SchemaNodeKind::AnyXml => visitor.visit_any_xml(component_id, parent, node),
                SchemaNodeKind::Identity { .. } => {
                    // Identities never appear in the data tree; they are
                    // visited flat by `traverse`.
                    tracing::error!(path = %node.path, "identity registered as a data node");
                }
            }
        }

        match node.kind {
            SchemaNodeKind::Choice { .. } => {
                // Cases are individually visited, but their children hang
                // off the choice's parent for traversal purposes.
                for case in registry.children_of(&node.path) {
                    Self::visit_and_traverse(component_id, registry, visitors, parent, case);
                }
            }
            SchemaNodeKind::Case => {
                for child in registry.children_of(&node.path) {
                    Self::visit_and_traverse(component_id, registry, visitors, parent, child);
                }
            }
            SchemaNodeKind::Container { .. } | SchemaNodeKind::List(_) => {
                for child in registry.children_of(&node.path) {
                    Self::visit_and_traverse(
                        component_id,
                        registry,
                        visitors,
                        Some(&node.path),
                        child,
                    );
                }
            }
            _ => {}
        }

        for visitor in visitors.iter_mut() {
            visitor.visit_leave(component_id, parent, &node.path);
        }
    }
}

/// Visitor building the path-to-component ownership index: which deployed
/// subsystem owns which schema node.
#[derive(Debug, Default)]
pub struct ComponentIndexVisitor {
    index: HashMap<SchemaPath, String>,
}

impl ComponentIndexVisitor {
    /// Empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// The built index
    pub fn into_index(self) -> HashMap<SchemaPath, String> {
        self.index
    }

    /// Component owning a path, if indexed
    pub fn component_for(&self, path: &SchemaPath) -> Option<&str> {
        self.index.get(path).map(String::as_str)
    }

    fn record(&mut self, component_id: &str, node: &SchemaNode) {
        self.index
            .insert(node.path.clone(), component_id.to_owned());
    }
}

impl SchemaVisitor for ComponentIndexVisitor {
    fn visit_container(
        &mut self,
        component_id: &str,
        _parent: Option<&SchemaPath>,
        node: &SchemaNode,
    ) {
        self.record(component_id, node);
    }

    fn visit_list(&mut self, component_id: &str, _parent: Option<&SchemaPath>, node: &SchemaNode) {
        self.record(component_id, node);
    }

    fn visit_leaf(&mut self, component_id: &str, _parent: Option<&SchemaPath>, node: &SchemaNode) {
        self.record(component_id, node);
    }

    fn visit_leaf_list(
        &mut self,
        component_id: &str,
        _parent: Option<&SchemaPath>,
        node: &SchemaNode,
    ) {
        self.record(component_id, node);
    }
}
