//! End-to-end edit-config runs: fragment validation, candidate merge,
//! phase-2 constraint checks and commit, against the in-memory store.

mod common;

use common::{
    device_fragment, device_path, edit, interface_entry, interface_path, qn, registry, seed, NS,
};
use conftree_core::db::{InMemoryDataStore, NodeDataStore};
use conftree_core::models::{
    EditNode, EditOperation, ErrorOption, InsertPosition, LeafSchema, ModelNodeId, ModelNodeKey,
    Module, QName, Rdn, RequestKind, RpcErrorTag, SchemaNode, SchemaPath, ValueType,
    APP_TAG_WHEN_VIOLATION,
};
use conftree_core::services::validation::{
    EditConfigRequest, EditState, TreeMerger, ValidationOrchestrator,
};
use conftree_core::services::SchemaRegistry;

fn device_id() -> ModelNodeId {
    ModelNodeId::root().with_rdn(Rdn::container(NS, "device"))
}

fn eth0_key() -> ModelNodeKey {
    ModelNodeKey::from_pairs(vec![(qn("name"), "eth0".to_owned())])
}

// ---------------------------------------------------------------------------
// Merge round trips
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_merged_entry_reads_back_with_values_and_defaults() {
    let registry = registry();
    let store = InMemoryDataStore::new();

    seed(
        &registry,
        &store,
        device_fragment(vec![interface_entry(
            "eth0",
            vec![
                EditNode::leaf(qn("address"), "10.0.0.1"),
                EditNode::leaf(qn("port"), "8080"),
                EditNode::leaf(qn("dns"), "9.9.9.9"),
                EditNode::leaf(qn("dns"), "1.1.1.1"),
            ],
        )]),
    )
    .await;

    let entry = store
        .find_node(&interface_path(), &eth0_key(), &device_id())
        .await
        .unwrap()
        .expect("committed entry is readable");
    assert_eq!(entry.attribute(&qn("name")).map(|v| v.value.as_str()), Some("eth0"));
    assert_eq!(
        entry.attribute(&qn("address")).map(|v| v.value.as_str()),
        Some("10.0.0.1")
    );
    // default applied at creation
    assert_eq!(
        entry.attribute(&qn("enabled")).map(|v| v.value.as_str()),
        Some("true")
    );
    let dns: Vec<&str> = entry
        .leaf_list(&qn("dns"))
        .unwrap_or(&[])
        .iter()
        .map(|v| v.value.as_str())
        .collect();
    assert_eq!(dns, vec!["9.9.9.9", "1.1.1.1"]);
}

#[tokio::test]
async fn test_leaf_list_insert_first_prepends() {
    let registry = registry();
    let store = InMemoryDataStore::new();

    seed(
        &registry,
        &store,
        device_fragment(vec![interface_entry(
            "eth0",
            vec![EditNode::leaf(qn("dns"), "9.9.9.9")],
        )]),
    )
    .await;
    seed(
        &registry,
        &store,
        device_fragment(vec![interface_entry(
            "eth0",
            vec![EditNode::leaf(qn("dns"), "1.1.1.1").with_insert(InsertPosition::First, None)],
        )]),
    )
    .await;

    let entry = store
        .find_node(&interface_path(), &eth0_key(), &device_id())
        .await
        .unwrap()
        .expect("entry");
    let dns: Vec<&str> = entry
        .leaf_list(&qn("dns"))
        .unwrap_or(&[])
        .iter()
        .map(|v| v.value.as_str())
        .collect();
    assert_eq!(dns, vec!["1.1.1.1", "9.9.9.9"]);
}

// ---------------------------------------------------------------------------
// Failure isolation and state machine
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_failed_request_leaves_live_tree_untouched() {
    let registry = registry();
    let store = InMemoryDataStore::new();

    seed(
        &registry,
        &store,
        device_fragment(vec![interface_entry(
            "eth0",
            vec![EditNode::leaf(qn("mtu"), "1500")],
        )]),
    )
    .await;
    let before = store.dump().await;

    let outcome = edit(
        &registry,
        &store,
        device_fragment(vec![interface_entry(
            "eth0",
            vec![EditNode::leaf(qn("mtu"), "99999")],
        )]),
        RequestKind::Merge,
        ErrorOption::StopOnError,
    )
    .await;

    assert_eq!(outcome.state, EditState::Failed);
    assert_eq!(store.dump().await, before);
}

#[tokio::test]
async fn test_orchestrator_states_reflect_outcome() {
    let registry = registry();
    let store = InMemoryDataStore::new();
    let merger = TreeMerger::new();

    let mut orchestrator = ValidationOrchestrator::new(&registry, &store, &merger);
    assert_eq!(orchestrator.state(), EditState::Idle);
    let ok = orchestrator
        .edit_config(&EditConfigRequest::new(
            device_fragment(vec![EditNode::leaf(qn("hostname"), "core-rtr-1")]),
            RequestKind::Merge,
            ErrorOption::StopOnError,
        ))
        .await
        .unwrap();
    assert!(ok.is_committed());
    assert_eq!(orchestrator.state(), EditState::Committed);

    let mut orchestrator = ValidationOrchestrator::new(&registry, &store, &merger);
    let failed = orchestrator
        .edit_config(&EditConfigRequest::new(
            device_fragment(vec![EditNode::new(qn("bogus"))]),
            RequestKind::Merge,
            ErrorOption::StopOnError,
        ))
        .await
        .unwrap();
    assert_eq!(failed.state, EditState::Failed);
    assert_eq!(orchestrator.state(), EditState::Failed);
}

#[tokio::test]
async fn test_unknown_element_is_anchored_at_its_parent() {
    let registry = registry();
    let store = InMemoryDataStore::new();

    let outcome = edit(
        &registry,
        &store,
        device_fragment(vec![EditNode::new(qn("bogus"))]),
        RequestKind::Merge,
        ErrorOption::StopOnError,
    )
    .await;

    assert_eq!(outcome.errors.len(), 1);
    let err = &outcome.errors[0];
    assert_eq!(err.error_tag, RpcErrorTag::UnknownElement);
    assert_eq!(err.error_path.as_deref(), Some("/dev:device"));
}

#[tokio::test]
async fn test_continue_on_error_reports_every_failure() {
    let registry = registry();
    let store = InMemoryDataStore::new();

    let fragment = device_fragment(vec![interface_entry(
        "eth0",
        vec![
            EditNode::leaf(qn("mtu"), "banana"),
            EditNode::leaf(qn("port"), "70000"),
        ],
    )]);

    let outcome = edit(
        &registry,
        &store,
        fragment.clone(),
        RequestKind::Merge,
        ErrorOption::ContinueOnError,
    )
    .await;
    assert_eq!(outcome.errors.len(), 2);
    assert!(outcome
        .errors
        .iter()
        .all(|e| e.error_tag == RpcErrorTag::InvalidValue));

    let outcome = edit(
        &registry,
        &store,
        fragment,
        RequestKind::Merge,
        ErrorOption::StopOnError,
    )
    .await;
    assert_eq!(outcome.errors.len(), 1);
}

// ---------------------------------------------------------------------------
// Operation semantics
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_delete_of_absent_entry_is_data_missing() {
    let registry = registry();
    let store = InMemoryDataStore::new();

    let outcome = edit(
        &registry,
        &store,
        device_fragment(vec![
            interface_entry("eth7", vec![]).with_operation(EditOperation::Delete)
        ]),
        RequestKind::Merge,
        ErrorOption::StopOnError,
    )
    .await;

    assert_eq!(outcome.state, EditState::Failed);
    assert_eq!(outcome.errors[0].error_tag, RpcErrorTag::DataMissing);
}

#[tokio::test]
async fn test_remove_of_absent_entry_is_accepted() {
    let registry = registry();
    let store = InMemoryDataStore::new();

    let outcome = edit(
        &registry,
        &store,
        device_fragment(vec![
            interface_entry("eth7", vec![]).with_operation(EditOperation::Remove)
        ]),
        RequestKind::Merge,
        ErrorOption::StopOnError,
    )
    .await;

    assert!(outcome.is_committed(), "errors: {:?}", outcome.errors);
}

#[tokio::test]
async fn test_create_of_existing_entry_is_data_exists() {
    let registry = registry();
    let store = InMemoryDataStore::new();

    seed(
        &registry,
        &store,
        device_fragment(vec![interface_entry("eth0", vec![])]),
    )
    .await;

    let outcome = edit(
        &registry,
        &store,
        device_fragment(vec![
            interface_entry("eth0", vec![]).with_operation(EditOperation::Create)
        ]),
        RequestKind::Merge,
        ErrorOption::StopOnError,
    )
    .await;

    assert_eq!(outcome.state, EditState::Failed);
    assert_eq!(outcome.errors[0].error_tag, RpcErrorTag::DataExists);
}

// ---------------------------------------------------------------------------
// Replace semantics
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_replace_prunes_children_absent_from_the_fragment() {
    let registry = registry();
    let store = InMemoryDataStore::new();

    seed(
        &registry,
        &store,
        device_fragment(vec![
            EditNode::leaf(qn("hostname"), "edge-1"),
            interface_entry("eth0", vec![EditNode::leaf(qn("address"), "10.0.0.1")]),
        ]),
    )
    .await;

    let outcome = edit(
        &registry,
        &store,
        device_fragment(vec![EditNode::leaf(qn("hostname"), "edge-2")])
            .with_operation(EditOperation::Replace),
        RequestKind::Merge,
        ErrorOption::StopOnError,
    )
    .await;
    assert!(outcome.is_committed(), "errors: {:?}", outcome.errors);

    let device = store
        .find_node(
            &device_path(),
            &ModelNodeKey::from_pairs(Vec::new()),
            &ModelNodeId::root(),
        )
        .await
        .unwrap()
        .expect("replaced container is readable");
    assert_eq!(
        device.attribute(&qn("hostname")).map(|v| v.value.as_str()),
        Some("edge-2")
    );
    let interfaces = store
        .list_child_nodes(&interface_path(), &device_id())
        .await
        .unwrap();
    assert!(interfaces.is_empty(), "stale entries survived the replace");
}

// ---------------------------------------------------------------------------
// Phase-2 conditionals and mandatory nodes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_case_leaf_with_matching_when_commits() {
    let registry = registry();
    let store = InMemoryDataStore::new();

    let outcome = edit(
        &registry,
        &store,
        device_fragment(vec![interface_entry(
            "eth0",
            vec![
                EditNode::leaf(qn("addr-mode"), "manual"),
                EditNode::leaf(qn("gateway"), "10.0.0.254"),
            ],
        )]),
        RequestKind::Merge,
        ErrorOption::StopOnError,
    )
    .await;

    assert!(outcome.is_committed(), "errors: {:?}", outcome.errors);
}

#[tokio::test]
async fn test_case_leaf_with_failing_when_is_rejected() {
    let registry = registry();
    let store = InMemoryDataStore::new();

    let outcome = edit(
        &registry,
        &store,
        device_fragment(vec![interface_entry(
            "eth0",
            vec![
                EditNode::leaf(qn("addr-mode"), "auto"),
                EditNode::leaf(qn("gateway"), "10.0.0.254"),
            ],
        )]),
        RequestKind::Merge,
        ErrorOption::StopOnError,
    )
    .await;

    assert_eq!(outcome.state, EditState::Failed);
    let err = &outcome.errors[0];
    assert_eq!(err.error_tag, RpcErrorTag::OperationFailed);
    assert_eq!(err.app_tag.as_deref(), Some(APP_TAG_WHEN_VIOLATION));
    assert!(
        err.message.contains("when constraints"),
        "message: {}",
        err.message
    );
}

#[tokio::test]
async fn test_container_without_mandatory_leaf_is_rejected() {
    let registry = registry();
    let store = InMemoryDataStore::new();

    let outcome = edit(
        &registry,
        &store,
        device_fragment(vec![EditNode::new(qn("system"))]),
        RequestKind::Merge,
        ErrorOption::StopOnError,
    )
    .await;

    assert_eq!(outcome.state, EditState::Failed);
    let err = &outcome.errors[0];
    assert_eq!(err.error_tag, RpcErrorTag::MissingElement);
    assert_eq!(err.message, "Missing mandatory node 'contact'");
}

#[tokio::test]
async fn test_container_with_mandatory_leaf_commits() {
    let registry = registry();
    let store = InMemoryDataStore::new();

    let outcome = edit(
        &registry,
        &store,
        device_fragment(vec![
            EditNode::new(qn("system")).with_child(EditNode::leaf(qn("contact"), "noc@example.net"))
        ]),
        RequestKind::Merge,
        ErrorOption::StopOnError,
    )
    .await;

    assert!(outcome.is_committed(), "errors: {:?}", outcome.errors);
}

// ---------------------------------------------------------------------------
// Nested mandatory choices
// ---------------------------------------------------------------------------

const TUN_NS: &str = "urn:conftree:tunnel";

fn tqn(name: &str) -> QName {
    QName::new(TUN_NS, name)
}

fn string_leaf() -> LeafSchema {
    LeafSchema {
        value_type: ValueType::string(),
        mandatory: false,
        default: None,
    }
}

/// container tunnel holding choice transport; its vxlan case carries a
/// vni leaf plus a nested mandatory choice underlay (cases v4 / v6).
fn tunnel_registry() -> SchemaRegistry {
    let root = SchemaPath::root();
    let tunnel = root.child(tqn("tunnel"));
    let transport = tunnel.child(tqn("transport"));
    let vxlan = transport.child(tqn("vxlan"));
    let underlay = vxlan.child(tqn("underlay"));
    let v4 = underlay.child(tqn("v4"));
    let v6 = underlay.child(tqn("v6"));
    let module = Module::new("tunnel-model", TUN_NS, "tun")
        .with_node(SchemaNode::container(&root, tqn("tunnel")))
        .with_node(SchemaNode::leaf(&tunnel, tqn("mode"), string_leaf()))
        .with_node(SchemaNode::choice(&tunnel, tqn("transport"), false))
        .with_node(SchemaNode::case(&transport, tqn("vxlan")))
        .with_node(SchemaNode::leaf(&vxlan, tqn("vni"), string_leaf()))
        .with_node(SchemaNode::choice(&vxlan, tqn("underlay"), true))
        .with_node(SchemaNode::case(&underlay, tqn("v4")))
        .with_node(SchemaNode::leaf(&v4, tqn("local-v4"), string_leaf()))
        .with_node(SchemaNode::case(&underlay, tqn("v6")))
        .with_node(SchemaNode::leaf(&v6, tqn("local-v6"), string_leaf()));
    let mut registry = SchemaRegistry::new();
    registry.register_module(module).unwrap();
    registry
}

fn tunnel_fragment(children: Vec<EditNode>) -> EditNode {
    let mut tunnel = EditNode::new(tqn("tunnel"));
    for child in children {
        tunnel = tunnel.with_child(child);
    }
    tunnel
}

#[tokio::test]
async fn test_nested_mandatory_choice_enforced_while_its_case_is_selected() {
    let registry = tunnel_registry();
    let store = InMemoryDataStore::new();

    // vni selects the vxlan case but nothing satisfies underlay
    let outcome = edit(
        &registry,
        &store,
        tunnel_fragment(vec![EditNode::leaf(tqn("vni"), "4096")]),
        RequestKind::Merge,
        ErrorOption::StopOnError,
    )
    .await;

    assert_eq!(outcome.state, EditState::Failed);
    let err = &outcome.errors[0];
    assert_eq!(err.error_tag, RpcErrorTag::MissingElement);
    assert_eq!(err.message, "Missing mandatory node 'underlay'");
}

#[tokio::test]
async fn test_nested_mandatory_choice_ignored_while_its_case_is_unselected() {
    let registry = tunnel_registry();
    let store = InMemoryDataStore::new();

    let outcome = edit(
        &registry,
        &store,
        tunnel_fragment(vec![EditNode::leaf(tqn("mode"), "point-to-point")]),
        RequestKind::Merge,
        ErrorOption::StopOnError,
    )
    .await;

    assert!(outcome.is_committed(), "errors: {:?}", outcome.errors);
}

#[tokio::test]
async fn test_nested_mandatory_choice_satisfied_by_either_case() {
    let registry = tunnel_registry();
    let store = InMemoryDataStore::new();

    let outcome = edit(
        &registry,
        &store,
        tunnel_fragment(vec![
            EditNode::leaf(tqn("vni"), "4096"),
            EditNode::leaf(tqn("local-v6"), "fd00::1"),
        ]),
        RequestKind::Merge,
        ErrorOption::StopOnError,
    )
    .await;

    assert!(outcome.is_committed(), "errors: {:?}", outcome.errors);
}
