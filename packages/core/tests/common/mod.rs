//! Shared test fixtures: a small device-management schema exercising every
//! validator (keyed lists, unique groups, user-ordered lists, bounded
//! lists and leaf-lists, choice/case conditionals, mandatory leaves,
//! identities and an augmenting second module).

#![allow(dead_code)]

use conftree_core::db::InMemoryDataStore;
use conftree_core::models::{
    Augmentation, EditNode, ErrorOption, LeafListSchema, LeafSchema, ListSchema, Module, QName,
    RequestKind, SchemaNode, SchemaPath, ValueType,
};
use conftree_core::services::validation::{
    EditConfigRequest, EditOutcome, TreeMerger, ValidationOrchestrator,
};
use conftree_core::services::SchemaRegistry;

pub const NS: &str = "urn:conftree:device";
pub const QOS_NS: &str = "urn:conftree:qos";

pub fn qn(name: &str) -> QName {
    QName::new(NS, name)
}

pub fn device_path() -> SchemaPath {
    SchemaPath::root().child(qn("device"))
}

pub fn interface_path() -> SchemaPath {
    device_path().child(qn("interface"))
}

pub fn route_path() -> SchemaPath {
    device_path().child(qn("route"))
}

pub fn policy_path() -> SchemaPath {
    device_path().child(qn("policy"))
}

fn leaf(value_type: ValueType) -> LeafSchema {
    LeafSchema {
        value_type,
        mandatory: false,
        default: None,
    }
}

fn mandatory_leaf(value_type: ValueType) -> LeafSchema {
    LeafSchema {
        value_type,
        mandatory: true,
        default: None,
    }
}

fn keyed_list(keys: Vec<QName>) -> ListSchema {
    ListSchema {
        keys,
        unique: Vec::new(),
        user_ordered: false,
        min_elements: None,
        max_elements: None,
    }
}

/// The device-model module:
///
/// ```text
/// container device
///   leaf hostname                       (string)
///   list interface [name]               unique(address, port)
///     leaf name / address / port / mtu / enabled (default true)
///     leaf addr-mode                    (enum manual|auto)
///     leaf-list dns                     (ordered-by user)
///     choice addressing
///       case manual (when addr-mode = 'manual'): leaf gateway
///       case auto   (when addr-mode = 'auto'):   leaf lease-time
///   list route [destination, prefix-length, next-hop]   (ordered-by system)
///   list policy [name]                  (ordered-by user)
///   container dns:      list server [address]  (min 2, max 4)
///   container resolver: leaf-list search       (ordered-by user, min 2, max 3)
///   container system:   leaf contact           (mandatory)
/// identity transport; identity tcp derives transport
/// ```
pub fn device_module() -> Module {
    let root = SchemaPath::root();
    let device = device_path();
    let interface = interface_path();
    let route = route_path();
    let policy = policy_path();
    let addressing = interface.child(qn("addressing"));
    let manual = addressing.child(qn("manual"));
    let auto = addressing.child(qn("auto"));
    let dns = device.child(qn("dns"));
    let resolver = device.child(qn("resolver"));
    let system = device.child(qn("system"));

    Module::new("device-model", NS, "dev")
        .with_node(SchemaNode::container(&root, qn("device")))
        .with_node(SchemaNode::leaf(&device, qn("hostname"), leaf(ValueType::string())))
        .with_node(SchemaNode::list(
            &device,
            qn("interface"),
            ListSchema {
                keys: vec![qn("name")],
                unique: vec![vec![qn("address"), qn("port")]],
                user_ordered: false,
                min_elements: None,
                max_elements: None,
            },
        ))
        .with_node(SchemaNode::leaf(&interface, qn("name"), leaf(ValueType::string())))
        .with_node(SchemaNode::leaf(&interface, qn("address"), leaf(ValueType::string())))
        .with_node(SchemaNode::leaf(
            &interface,
            qn("port"),
            leaf(ValueType::Uint {
                range: Some((1, 65535)),
            }),
        ))
        .with_node(SchemaNode::leaf(
            &interface,
            qn("mtu"),
            leaf(ValueType::Uint {
                range: Some((576, 9216)),
            }),
        ))
        .with_node(SchemaNode::leaf(
            &interface,
            qn("enabled"),
            LeafSchema {
                value_type: ValueType::Bool,
                mandatory: false,
                default: Some("true".to_owned()),
            },
        ))
        .with_node(SchemaNode::leaf(
            &interface,
            qn("addr-mode"),
            leaf(ValueType::enumeration(["manual", "auto"])),
        ))
        .with_node(SchemaNode::leaf_list(
            &interface,
            qn("dns"),
            LeafListSchema {
                value_type: ValueType::string(),
                user_ordered: true,
                min_elements: None,
                max_elements: None,
            },
        ))
        .with_node(SchemaNode::choice(&interface, qn("addressing"), false))
        .with_node(SchemaNode::case(&addressing, qn("manual")).with_when("addr-mode = 'manual'"))
        .with_node(SchemaNode::case(&addressing, qn("auto")).with_when("addr-mode = 'auto'"))
        .with_node(SchemaNode::leaf(&manual, qn("gateway"), leaf(ValueType::string())))
        .with_node(SchemaNode::leaf(
            &auto,
            qn("lease-time"),
            leaf(ValueType::uint()),
        ))
        .with_node(SchemaNode::list(
            &device,
            qn("route"),
            keyed_list(vec![qn("destination"), qn("prefix-length"), qn("next-hop")]),
        ))
        .with_node(SchemaNode::leaf(&route, qn("destination"), leaf(ValueType::string())))
        .with_node(SchemaNode::leaf(
            &route,
            qn("prefix-length"),
            leaf(ValueType::Uint {
                range: Some((0, 32)),
            }),
        ))
        .with_node(SchemaNode::leaf(&route, qn("next-hop"), leaf(ValueType::string())))
        .with_node(SchemaNode::list(
            &device,
            qn("policy"),
            ListSchema {
                keys: vec![qn("name")],
                unique: Vec::new(),
                user_ordered: true,
                min_elements: None,
                max_elements: None,
            },
        ))
        .with_node(SchemaNode::leaf(&policy, qn("name"), leaf(ValueType::string())))
        .with_node(SchemaNode::leaf(
            &policy,
            qn("action"),
            leaf(ValueType::enumeration(["permit", "deny"])),
        ))
        .with_node(SchemaNode::container(&device, qn("dns")))
        .with_node(SchemaNode::list(
            &dns,
            qn("server"),
            ListSchema {
                keys: vec![qn("address")],
                unique: Vec::new(),
                user_ordered: false,
                min_elements: Some(2),
                max_elements: Some(4),
            },
        ))
        .with_node(SchemaNode::leaf(
            &dns.child(qn("server")),
            qn("address"),
            leaf(ValueType::string()),
        ))
        .with_node(SchemaNode::container(&device, qn("resolver")))
        .with_node(SchemaNode::leaf_list(
            &resolver,
            qn("search"),
            LeafListSchema {
                value_type: ValueType::string(),
                user_ordered: true,
                min_elements: Some(2),
                max_elements: Some(3),
            },
        ))
        .with_node(SchemaNode::container(&device, qn("system")))
        .with_node(SchemaNode::leaf(
            &system,
            qn("contact"),
            mandatory_leaf(ValueType::string()),
        ))
        .with_identity(SchemaNode::identity(qn("transport"), None))
        .with_identity(SchemaNode::identity(qn("tcp"), Some(qn("transport"))))
}

/// Second module augmenting `/device/interface` with a `bandwidth` leaf.
pub fn qos_module() -> Module {
    let interface = interface_path();
    Module::new("qos-model", QOS_NS, "qos")
        .with_node(SchemaNode::leaf(
            &interface,
            QName::new(QOS_NS, "bandwidth"),
            leaf(ValueType::uint()),
        ))
        .with_augmentation(Augmentation {
            target: interface,
            children: vec![QName::new(QOS_NS, "bandwidth")],
        })
}

pub fn registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    registry.register_module(device_module()).unwrap();
    registry
}

pub fn registry_with_qos() -> SchemaRegistry {
    let mut registry = registry();
    registry.register_module(qos_module()).unwrap();
    registry
}

/// Interface list entry fragment with key first, then the given children.
pub fn interface_entry(name: &str, children: Vec<EditNode>) -> EditNode {
    let mut entry = EditNode::new(qn("interface")).with_child(EditNode::leaf(qn("name"), name));
    for child in children {
        entry = entry.with_child(child);
    }
    entry
}

/// `<device>` fragment wrapping the given children.
pub fn device_fragment(children: Vec<EditNode>) -> EditNode {
    let mut device = EditNode::new(qn("device"));
    for child in children {
        device = device.with_child(child);
    }
    device
}

/// Run one edit-config request through a fresh orchestrator.
pub async fn edit(
    registry: &SchemaRegistry,
    store: &InMemoryDataStore,
    fragment: EditNode,
    kind: RequestKind,
    error_option: ErrorOption,
) -> EditOutcome {
    let merger = TreeMerger::new();
    let mut orchestrator = ValidationOrchestrator::new(registry, store, &merger);
    let request = EditConfigRequest::new(fragment, kind, error_option);
    orchestrator
        .edit_config(&request)
        .await
        .expect("datastore backend failure")
}

/// Merge-commit a fragment that is expected to be valid.
pub async fn seed(registry: &SchemaRegistry, store: &InMemoryDataStore, fragment: EditNode) {
    let outcome = edit(
        registry,
        store,
        fragment,
        RequestKind::Merge,
        ErrorOption::StopOnError,
    )
    .await;
    assert!(
        outcome.is_committed(),
        "seed fragment failed validation: {:?}",
        outcome.errors
    );
}
