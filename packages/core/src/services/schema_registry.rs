//! Schema Registry
//!
//! Owns the registered schema graph and answers path lookups for the
//! traverser, the validators and the error path builder. Modules are
//! registered explicitly through [`SchemaRegistry::register_module`] by the
//! surrounding deployment code; nothing is discovered reflectively.
//!
//! Lookups fail silently: an unknown path yields `None` or an empty child
//! list. Absence is not exceptional here, because callers must cope with
//! partially-augmented trees.

use crate::models::{Augmentation, Module, QName, SchemaNode, SchemaNodeKind, SchemaPath};
use crate::services::SchemaRegistryError;
use std::collections::HashMap;

/// Bookkeeping for one registered module, consumed by the traverser.
#[derive(Debug, Clone)]
pub struct RegisteredModule {
    /// Module name
    pub name: String,

    /// Namespace URI
    pub namespace: String,

    /// Paths of the module's root data nodes, in registration order
    pub root_paths: Vec<SchemaPath>,

    /// Augmentations the module declares
    pub augmentations: Vec<Augmentation>,

    /// Identities the module declares
    pub identity_qnames: Vec<QName>,
}

/// Registry over the parsed schema graph.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    nodes: HashMap<SchemaPath, SchemaNode>,
    children: HashMap<SchemaPath, Vec<SchemaPath>>,
    identities: HashMap<QName, SchemaNode>,
    modules: Vec<RegisteredModule>,
    prefix_by_ns: HashMap<String, String>,
    ns_by_prefix: HashMap<String, String>,
}

impl SchemaRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one module: its data nodes (including children it injects
    /// under other modules' paths via augmentation), augmentation
    /// declarations and identities.
    ///
    /// # Errors
    ///
    /// - `DuplicatePath` - a node path is already registered; paths are
    ///   unique within a registry
    /// - `MissingParent` - a non-root node arrives before its parent
    /// - `UnknownAugmentationTarget` - an augmentation names a path that
    ///   is not registered. Augmenting never changes the target's own
    ///   identity, so the target must already exist.
    pub fn register_module(&mut self, module: Module) -> Result<(), SchemaRegistryError> {
        self.prefix_by_ns
            .insert(module.namespace.clone(), module.prefix.clone());
        self.ns_by_prefix
            .insert(module.prefix.clone(), module.namespace.clone());

        let mut root_paths = Vec::new();
        for node in &module.nodes {
            if node.path.len() == 1 && node.qname.namespace == module.namespace {
                root_paths.push(node.path.clone());
            }
            self.register_node(node.clone())?;
        }

        for augmentation in &module.augmentations {
            if !self.nodes.contains_key(&augmentation.target) {
                return Err(SchemaRegistryError::UnknownAugmentationTarget {
                    target: augmentation.target.clone(),
                });
            }
        }

        let mut identity_qnames = Vec::new();
        for identity in &module.identities {
            identity_qnames.push(identity.qname.clone());
            self.identities.insert(identity.qname.clone(), identity.clone());
        }

        tracing::debug!(
            module = %module.name,
            nodes = module.nodes.len(),
            augmentations = module.augmentations.len(),
            "registered schema module"
        );
        self.modules.push(RegisteredModule {
            name: module.name,
            namespace: module.namespace,
            root_paths,
            augmentations: module.augmentations,
            identity_qnames,
        });
        Ok(())
    }

    fn register_node(&mut self, node: SchemaNode) -> Result<(), SchemaRegistryError> {
        if self.nodes.contains_key(&node.path) {
            return Err(SchemaRegistryError::DuplicatePath { path: node.path });
        }
        let parent = node.path.parent().unwrap_or_default();
        if !parent.is_root() && !self.nodes.contains_key(&parent) {
            return Err(SchemaRegistryError::MissingParent { path: node.path });
        }
        self.children
            .entry(parent)
            .or_default()
            .push(node.path.clone());
        self.nodes.insert(node.path.clone(), node);
        Ok(())
    }

    /// Schema node at a path, or `None` for unknown paths
    pub fn node_at(&self, path: &SchemaPath) -> Option<&SchemaNode> {
        self.nodes.get(path)
    }

    /// Direct children of a path, augmentation-injected children
    /// included, in registration order
    pub fn children_of(&self, path: &SchemaPath) -> Vec<&SchemaNode> {
        self.children
            .get(path)
            .map(|paths| paths.iter().filter_map(|p| self.nodes.get(p)).collect())
            .unwrap_or_default()
    }

    /// Direct child of `parent` with the given qualified name
    pub fn child_by_name(&self, parent: &SchemaPath, qname: &QName) -> Option<&SchemaNode> {
        self.children_of(parent)
            .into_iter()
            .find(|n| &n.qname == qname)
    }

    /// Child of `parent` with the given qualified name, looking through
    /// choice/case layers. This is the lookup used against instance data,
    /// where choice and case never appear as elements.
    pub fn data_child_by_name(&self, parent: &SchemaPath, qname: &QName) -> Option<&SchemaNode> {
        for child in self.children_of(parent) {
            if child.is_choice_or_case() {
                if let Some(found) = self.data_child_by_name(&child.path, qname) {
                    return Some(found);
                }
            } else if &child.qname == qname {
                return Some(child);
            }
        }
        None
    }

    /// All data children of `parent` with choice/case layers flattened
    pub fn data_children_of(&self, parent: &SchemaPath) -> Vec<&SchemaNode> {
        let mut result = Vec::new();
        for child in self.children_of(parent) {
            if child.is_choice_or_case() {
                result.extend(self.data_children_of(&child.path));
            } else {
                result.push(child);
            }
        }
        result
    }

    /// Nearest ancestor that is not a choice or case layer. Error paths
    /// never expose choice/case as addressable segments, so path rendering
    /// climbs through them.
    pub fn non_choice_parent_of(&self, path: &SchemaPath) -> Option<&SchemaNode> {
        let mut current = path.parent()?;
        loop {
            match self.nodes.get(&current) {
                Some(node) if node.is_choice_or_case() => {
                    current = current.parent()?;
                }
                other => return other,
            }
        }
    }

    /// The choice node a case-descendant path hangs off, if any. Walks up
    /// at most through one case layer: `path` is expected to name a node
    /// whose parent is a case (or a choice directly).
    pub fn choice_ancestor_of(&self, path: &SchemaPath) -> Option<&SchemaNode> {
        let parent = path.parent()?;
        let parent_node = self.nodes.get(&parent)?;
        match parent_node.kind {
            SchemaNodeKind::Choice { .. } => Some(parent_node),
            SchemaNodeKind::Case => {
                let choice_path = parent.parent()?;
                self.nodes
                    .get(&choice_path)
                    .filter(|n| matches!(n.kind, SchemaNodeKind::Choice { .. }))
            }
            _ => None,
        }
    }

    /// The case node enclosing `path`, if its parent is a case
    pub fn case_parent_of(&self, path: &SchemaPath) -> Option<&SchemaNode> {
        let parent = path.parent()?;
        self.nodes
            .get(&parent)
            .filter(|n| matches!(n.kind, SchemaNodeKind::Case))
    }

    /// Declared prefix for a namespace URI
    pub fn prefix_for_namespace(&self, namespace: &str) -> Option<&str> {
        self.prefix_by_ns.get(namespace).map(String::as_str)
    }

    /// Namespace URI for a declared prefix
    pub fn namespace_for_prefix(&self, prefix: &str) -> Option<&str> {
        self.ns_by_prefix.get(prefix).map(String::as_str)
    }

    /// Registered identity by qualified name
    pub fn identity(&self, qname: &QName) -> Option<&SchemaNode> {
        self.identities.get(qname)
    }

    /// Whether `qname` names a registered identity equal to or derived
    /// (transitively) from `base`
    pub fn identity_derives_from(&self, qname: &QName, base: &QName) -> bool {
        let mut current = Some(qname.clone());
        while let Some(qname) = current {
            if &qname == base {
                return true;
            }
            current = match self.identities.get(&qname) {
                Some(SchemaNode {
                    kind: SchemaNodeKind::Identity { base }, ..
                }) => base.clone(),
                _ => None,
            };
        }
        false
    }

    /// Registered module metadata by name
    pub fn module(&self, name: &str) -> Option<&RegisteredModule> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// All registered modules, in registration order
    pub fn modules(&self) -> &[RegisteredModule] {
        &self.modules
    }
}
