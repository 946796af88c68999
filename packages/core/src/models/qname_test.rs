//! Unit tests for addressing types

use crate::models::{ModelNodeId, QName, Rdn, SchemaPath};

const NS: &str = "urn:example:device";

#[test]
fn test_schema_path_child_and_parent() {
    let device = SchemaPath::root().child(QName::new(NS, "device"));
    let interfaces = device.child(QName::new(NS, "interfaces"));

    assert_eq!(interfaces.len(), 2);
    assert_eq!(interfaces.parent(), Some(device.clone()));
    assert_eq!(interfaces.last(), Some(&QName::new(NS, "interfaces")));
    assert_eq!(device.parent(), Some(SchemaPath::root()));
    assert_eq!(SchemaPath::root().parent(), None);
}

#[test]
fn test_schema_path_display() {
    let path = SchemaPath::root()
        .child(QName::new(NS, "device"))
        .child(QName::new(NS, "interfaces"));
    assert_eq!(path.to_string(), "/device/interfaces");
    assert_eq!(SchemaPath::root().to_string(), "/");
}

#[test]
fn test_model_node_id_parentage() {
    let root = ModelNodeId::root();
    let device = root.with_rdn(Rdn::container(NS, "device"));
    let entry = device
        .with_rdn(Rdn::container(NS, "interface"))
        .with_rdn(Rdn::key_value(NS, "name", "eth0"));

    assert!(root.is_parent_of(&device));
    assert!(device.is_parent_of(&entry));
    assert!(!root.is_parent_of(&entry));
    assert!(!entry.is_parent_of(&device));
}

#[test]
fn test_model_node_id_root() {
    assert!(ModelNodeId::root().is_root());
    assert!(!ModelNodeId::root()
        .with_rdn(Rdn::container(NS, "device"))
        .is_root());
}
