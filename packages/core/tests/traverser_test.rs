//! Traversal order, choice/case transparency, augmentation walks and the
//! component ownership index.

mod common;

use common::{device_path, interface_path, registry, registry_with_qos, QOS_NS};
use conftree_core::models::{QName, SchemaNode, SchemaPath};
use conftree_core::services::{ComponentIndexVisitor, SchemaTraverser, SchemaVisitor};

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Enter(SchemaPath),
    Leave(SchemaPath),
    Node {
        kind: &'static str,
        name: String,
        parent: Option<SchemaPath>,
    },
    Identity(String),
}

#[derive(Default)]
struct RecordingVisitor {
    events: Vec<Event>,
}

impl RecordingVisitor {
    fn record(&mut self, kind: &'static str, parent: Option<&SchemaPath>, node: &SchemaNode) {
        self.events.push(Event::Node {
            kind,
            name: node.qname.local_name.clone(),
            parent: parent.cloned(),
        });
    }

    fn node_parent(&self, kind: &str, name: &str) -> Option<SchemaPath> {
        self.events.iter().find_map(|event| match event {
            Event::Node {
                kind: k,
                name: n,
                parent,
            } if *k == kind && n == name => Some(parent.clone()),
            _ => None,
        })?
    }
}

impl SchemaVisitor for RecordingVisitor {
    fn visit_enter(&mut self, _c: &str, _parent: Option<&SchemaPath>, path: &SchemaPath) {
        self.events.push(Event::Enter(path.clone()));
    }

    fn visit_container(&mut self, _c: &str, parent: Option<&SchemaPath>, node: &SchemaNode) {
        self.record("container", parent, node);
    }

    fn visit_list(&mut self, _c: &str, parent: Option<&SchemaPath>, node: &SchemaNode) {
        self.record("list", parent, node);
    }

    fn visit_leaf(&mut self, _c: &str, parent: Option<&SchemaPath>, node: &SchemaNode) {
        self.record("leaf", parent, node);
    }

    fn visit_leaf_list(&mut self, _c: &str, parent: Option<&SchemaPath>, node: &SchemaNode) {
        self.record("leaf-list", parent, node);
    }

    fn visit_choice(&mut self, _c: &str, parent: Option<&SchemaPath>, node: &SchemaNode) {
        self.record("choice", parent, node);
    }

    fn visit_case(&mut self, _c: &str, parent: Option<&SchemaPath>, node: &SchemaNode) {
        self.record("case", parent, node);
    }

    fn visit_identity(&mut self, _c: &str, node: &SchemaNode) {
        self.events.push(Event::Identity(node.qname.local_name.clone()));
    }

    fn visit_leave(&mut self, _c: &str, _parent: Option<&SchemaPath>, path: &SchemaPath) {
        self.events.push(Event::Leave(path.clone()));
    }
}

fn traverse_module(registry: &conftree_core::services::SchemaRegistry, module: &str) -> Vec<Event> {
    let mut visitor = RecordingVisitor::default();
    let mut traverser = SchemaTraverser::new(
        "test",
        registry,
        module,
        vec![&mut visitor as &mut dyn SchemaVisitor],
    );
    traverser.traverse();
    visitor.events
}

#[test]
fn test_traversal_brackets_the_module_root() {
    let registry = registry();
    let events = traverse_module(&registry, "device-model");

    assert_eq!(events.first(), Some(&Event::Enter(device_path())));
    let last_tree_event = events
        .iter()
        .rev()
        .find(|e| !matches!(e, Event::Identity(_)))
        .expect("tree events recorded");
    assert_eq!(last_tree_event, &Event::Leave(device_path()));
}

#[test]
fn test_children_are_visited_inside_their_parents_bracket() {
    let registry = registry();
    let events = traverse_module(&registry, "device-model");

    let enter = events
        .iter()
        .position(|e| *e == Event::Enter(interface_path()))
        .expect("interface entered");
    let leave = events
        .iter()
        .position(|e| *e == Event::Leave(interface_path()))
        .expect("interface left");
    let mtu = events
        .iter()
        .position(|e| matches!(e, Event::Node { name, .. } if name == "mtu"))
        .expect("mtu visited");
    assert!(enter < mtu && mtu < leave);
}

#[test]
fn test_choice_and_case_nodes_are_visited_individually() {
    let registry = registry();
    let mut visitor = RecordingVisitor::default();
    let mut traverser = SchemaTraverser::new(
        "test",
        &registry,
        "device-model",
        vec![&mut visitor as &mut dyn SchemaVisitor],
    );
    traverser.traverse();

    assert!(visitor.node_parent("choice", "addressing").is_some());
    assert!(visitor.node_parent("case", "manual").is_some());
    assert!(visitor.node_parent("case", "auto").is_some());
}

#[test]
fn test_case_children_hang_off_the_choice_parent() {
    let registry = registry();
    let mut visitor = RecordingVisitor::default();
    let mut traverser = SchemaTraverser::new(
        "test",
        &registry,
        "device-model",
        vec![&mut visitor as &mut dyn SchemaVisitor],
    );
    traverser.traverse();

    // gateway sits under choice/case in the schema graph but is traversed
    // as a direct child of the interface list
    assert_eq!(visitor.node_parent("leaf", "gateway"), Some(interface_path()));
    assert_eq!(
        visitor.node_parent("leaf", "lease-time"),
        Some(interface_path())
    );
}

#[test]
fn test_identities_are_visited_flat() {
    let registry = registry();
    let events = traverse_module(&registry, "device-model");

    assert!(events.contains(&Event::Identity("transport".to_owned())));
    assert!(events.contains(&Event::Identity("tcp".to_owned())));
    assert!(!events.contains(&Event::Enter(SchemaPath::root())));
}

#[test]
fn test_augmenting_module_walks_only_its_injected_children() {
    let registry = registry_with_qos();
    let mut visitor = RecordingVisitor::default();
    let mut traverser = SchemaTraverser::new(
        "test",
        &registry,
        "qos-model",
        vec![&mut visitor as &mut dyn SchemaVisitor],
    );
    traverser.traverse();

    assert_eq!(
        visitor.node_parent("leaf", "bandwidth"),
        Some(interface_path())
    );
    assert!(
        visitor.node_parent("container", "device").is_none(),
        "augmenting module must not revisit the target module's roots"
    );
}

#[test]
fn test_component_index_records_last_visiting_component() {
    let registry = registry_with_qos();
    let mut index = ComponentIndexVisitor::new();

    let mut traverser = SchemaTraverser::new(
        "core",
        &registry,
        "device-model",
        vec![&mut index as &mut dyn SchemaVisitor],
    );
    traverser.traverse();
    let mut traverser = SchemaTraverser::new(
        "qos",
        &registry,
        "qos-model",
        vec![&mut index as &mut dyn SchemaVisitor],
    );
    traverser.traverse();

    assert_eq!(index.component_for(&interface_path()), Some("core"));
    assert_eq!(
        index.component_for(&interface_path().child(QName::new(QOS_NS, "bandwidth"))),
        Some("qos")
    );
}
