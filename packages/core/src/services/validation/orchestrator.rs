//! Validation Orchestrator
//!
//! Sequences one edit-config request through the state machine
//! {Idle, Phase1, Merging, Phase2, Committed, Failed}:
//!
//! 1. **Phase1** - structural, type, key and insert-attribute validation
//!    against the raw fragment.
//! 2. **Merging** - the fragment is applied to a candidate copy of the
//!    store; the live tree is never touched.
//! 3. **Phase2** - cardinality, uniqueness, conditional and mandatory
//!    validation against the candidate tree.
//! 4. **Committed** - the candidate atomically replaces the live state.
//!
//! Any validator failure transitions to `Failed` and the candidate is
//! discarded; with `ErrorOption::ContinueOnError` the remaining
//! independent validators still run and every error is reported together.

use crate::db::{DataStoreError, NodeDataStore, TransactionalDataStore};
use crate::models::{
    EditNode, EditOperation, ErrorOption, ModelNode, ModelNodeId, RequestKind, RpcError,
    SchemaNodeKind, SchemaPath,
};
use crate::services::validation::{
    ChoiceCaseValidator, ContainerValidator, EditConfigMerger, LeafListValidator, ListValidator,
    MandatoryValidator, TypeValidator, ValidationContext,
};
use crate::services::{ErrorPathBuilder, HelperRegistry, SchemaRegistry, ValidationError};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Orchestration state for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditState {
    /// No request in flight
    Idle,
    /// Validating the raw fragment
    Phase1,
    /// Applying the fragment to the candidate copy
    Merging,
    /// Validating the candidate tree
    Phase2,
    /// Candidate committed to the live state
    Committed,
    /// Request failed; live state untouched
    Failed,
}

/// One edit-config request as handed over by the transport collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditConfigRequest {
    /// The change fragment
    pub fragment: EditNode,

    /// Schema path the fragment root hangs under (usually the root)
    pub root_path: SchemaPath,

    /// Request classification
    pub kind: RequestKind,

    /// Stop-on-first-error vs collect-everything
    pub error_option: ErrorOption,
}

impl EditConfigRequest {
    /// Request rooted at the schema root
    pub fn new(fragment: EditNode, kind: RequestKind, error_option: ErrorOption) -> Self {
        Self {
            fragment,
            root_path: SchemaPath::root(),
            kind,
            error_option,
        }
    }
}

/// Final state plus every collected error of one request.
#[derive(Debug)]
pub struct EditOutcome {
    /// Terminal state, `Committed` or `Failed`
    pub state: EditState,

    /// Collected wire-visible errors; empty on success
    pub errors: Vec<RpcError>,
}

impl EditOutcome {
    /// Whether the request committed
    pub fn is_committed(&self) -> bool {
        self.state == EditState::Committed
    }
}

/// Drives the multi-phase validation of edit-config requests against one
/// transactional store.
pub struct ValidationOrchestrator<'a, S: TransactionalDataStore> {
    registry: &'a SchemaRegistry,
    store: &'a S,
    merger: &'a dyn EditConfigMerger,
    state: EditState,
}

impl<'a, S: TransactionalDataStore> ValidationOrchestrator<'a, S> {
    /// Orchestrator over the given registry, store and merger
    pub fn new(registry: &'a SchemaRegistry, store: &'a S, merger: &'a dyn EditConfigMerger) -> Self {
        Self {
            registry,
            store,
            merger,
            state: EditState::Idle,
        }
    }

    /// Current orchestration state
    pub fn state(&self) -> EditState {
        self.state
    }

    fn transition(&mut self, next: EditState) {
        tracing::debug!(from = ?self.state, to = ?next, "orchestrator state transition");
        self.state = next;
    }

    /// Validate, merge and commit one request.
    ///
    /// Validation failures are reported inside the returned
    /// [`EditOutcome`]; a `Failed` outcome leaves the live tree exactly as
    /// it was before the request began.
    ///
    /// # Errors
    ///
    /// `DataStoreError` only for backend failures while snapshotting or
    /// committing the candidate.
    pub async fn edit_config(
        &mut self,
        request: &EditConfigRequest,
    ) -> Result<EditOutcome, DataStoreError> {
        let stop_on_error = request.error_option == ErrorOption::StopOnError;
        let mut errors = Vec::new();

        self.transition(EditState::Phase1);
        let inherited = default_operation(request.kind);
        self.phase1_walk(
            &request.root_path,
            &request.fragment,
            request.kind,
            inherited,
            &mut errors,
            stop_on_error,
        );
        if !errors.is_empty() {
            self.transition(EditState::Failed);
            return Ok(EditOutcome {
                state: EditState::Failed,
                errors,
            });
        }

        self.transition(EditState::Merging);
        let candidate = Arc::new(self.store.open_candidate().await?);
        if let Err(err) = self
            .merger
            .merge(request, self.registry, candidate.as_ref())
            .await
        {
            errors.push(err.into_rpc_error());
            self.transition(EditState::Failed);
            return Ok(EditOutcome {
                state: EditState::Failed,
                errors,
            });
        }

        self.transition(EditState::Phase2);
        {
            let helpers = HelperRegistry::for_store(
                self.registry,
                Arc::clone(&candidate) as Arc<dyn NodeDataStore>,
            );
            let mut ctx = ValidationContext::new(self.registry, &helpers);
            let root = ModelNode::new(SchemaPath::root(), ModelNodeId::root());
            let keep_going = self.phase2_walk(&root, &mut ctx, stop_on_error).await;
            if keep_going || !stop_on_error {
                if let Err(err) = MandatoryValidator::new(self.registry)
                    .validate(&root, &mut ctx)
                    .await
                {
                    ctx.record(err.into_rpc_error());
                }
            }
            if ctx.has_errors() {
                tracing::debug!(count = ctx.errors().len(), "phase-2 validators reported errors");
            }
            errors.extend(ctx.into_errors());
        }
        if !errors.is_empty() {
            self.transition(EditState::Failed);
            return Ok(EditOutcome {
                state: EditState::Failed,
                errors,
            });
        }

        let candidate = Arc::try_unwrap(candidate)
            .map_err(|_| DataStoreError::internal("candidate snapshot still referenced"))?;
        self.store.commit(candidate).await?;
        self.transition(EditState::Committed);
        Ok(EditOutcome {
            state: EditState::Committed,
            errors,
        })
    }

    /// Phase-1 pre-order walk of the fragment. Returns `false` when a
    /// stop-on-error failure aborted the walk.
    fn phase1_walk(
        &self,
        parent_path: &SchemaPath,
        element: &EditNode,
        kind: RequestKind,
        inherited: EditOperation,
        errors: &mut Vec<RpcError>,
        stop_on_error: bool,
    ) -> bool {
        let record = |result: Result<(), ValidationError>, errors: &mut Vec<RpcError>| {
            match result {
                Ok(()) => true,
                Err(err) => {
                    errors.push(err.into_rpc_error());
                    !stop_on_error
                }
            }
        };

        let Some(schema) = self
            .registry
            .data_child_by_name(parent_path, &element.qname)
            .cloned()
        else {
            let (path, ns) = ErrorPathBuilder::new(self.registry).path_for_schema(parent_path);
            errors.push(
                RpcError::unknown_element(&element.qname.local_name).with_error_path(path, ns),
            );
            return !stop_on_error;
        };
        let operation = element.effective_operation(inherited);

        match &schema.kind {
            SchemaNodeKind::Leaf(_) => record(
                TypeValidator::new(self.registry).validate_leaf_fragment(
                    &schema,
                    element,
                    inherited,
                ),
                errors,
            ),
            SchemaNodeKind::LeafList(_) => record(
                LeafListValidator::new(self.registry).validate_fragment(
                    &schema,
                    element,
                    inherited,
                ),
                errors,
            ),
            SchemaNodeKind::List(_) => {
                let ok = record(
                    ListValidator::new(self.registry).validate_entry_fragment(
                        &schema,
                        element,
                        kind,
                        inherited,
                    ),
                    errors,
                );
                if !ok {
                    return false;
                }
                self.phase1_walk_children(&schema.path, element, kind, operation, errors, stop_on_error)
            }
            SchemaNodeKind::Container { .. } => {
                self.phase1_walk_children(&schema.path, element, kind, operation, errors, stop_on_error)
            }
            _ => true,
        }
    }

    fn phase1_walk_children(
        &self,
        parent_path: &SchemaPath,
        element: &EditNode,
        kind: RequestKind,
        inherited: EditOperation,
        errors: &mut Vec<RpcError>,
        stop_on_error: bool,
    ) -> bool {
        for child in &element.children {
            if !self.phase1_walk(parent_path, child, kind, inherited, errors, stop_on_error) {
                return false;
            }
        }
        true
    }

    /// Phase-2 walk of the candidate tree. Errors land in the context;
    /// returns `false` when a stop-on-error failure aborted the walk.
    fn phase2_walk<'e>(
        &'e self,
        node: &'e ModelNode,
        ctx: &'e mut ValidationContext<'_>,
        stop_on_error: bool,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + 'e>> {
        Box::pin(async move {
            let children: Vec<_> = self
                .registry
                .data_children_of(&node.schema_path)
                .into_iter()
                .cloned()
                .collect();
            let choices = ChoiceCaseValidator::new(self.registry);
            let conditionals = ContainerValidator::new(self.registry);
            let lists = ListValidator::new(self.registry);
            let leaf_lists = LeafListValidator::new(self.registry);

            for child in &children {
                match &child.kind {
                    SchemaNodeKind::Container { .. } => {
                        let Some(instance) = ctx.child_container(node, child).await else {
                            continue;
                        };
                        let checks = [
                            choices.validate(node, child, ctx).await,
                            conditionals.validate(node, &instance, child, ctx).await,
                        ];
                        for result in checks {
                            if let Err(err) = result {
                                ctx.record(err.into_rpc_error());
                                if stop_on_error {
                                    return false;
                                }
                            }
                        }
                        if !self.phase2_walk(&instance, ctx, stop_on_error).await {
                            return false;
                        }
                    }
                    SchemaNodeKind::List(_) => {
                        if let Err(err) = lists.validate_entries(node, child, ctx).await {
                            ctx.record(err.into_rpc_error());
                            if stop_on_error {
                                return false;
                            }
                        }
                        for entry in ctx.child_list(node, child).await {
                            let checks = [
                                choices.validate(node, child, ctx).await,
                                conditionals.validate(node, &entry, child, ctx).await,
                            ];
                            for result in checks {
                                if let Err(err) = result {
                                    ctx.record(err.into_rpc_error());
                                    if stop_on_error {
                                        return false;
                                    }
                                }
                            }
                            if !self.phase2_walk(&entry, ctx, stop_on_error).await {
                                return false;
                            }
                        }
                    }
                    SchemaNodeKind::LeafList(_) => {
                        if let Err(err) = leaf_lists.validate_values(node, child) {
                            ctx.record(err.into_rpc_error());
                            if stop_on_error {
                                return false;
                            }
                        }
                    }
                    SchemaNodeKind::Leaf(_) => {
                        if node.attribute(&child.qname).is_none() {
                            continue;
                        }
                        if let Err(err) = choices.validate(node, child, ctx).await {
                            ctx.record(err.into_rpc_error());
                            if stop_on_error {
                                return false;
                            }
                        }
                    }
                    _ => {}
                }
            }
            true
        })
    }
}

fn default_operation(kind: RequestKind) -> EditOperation {
    match kind {
        RequestKind::Replace => EditOperation::Replace,
        RequestKind::Merge => EditOperation::Merge,
        RequestKind::Create => EditOperation::Create,
        RequestKind::Delete => EditOperation::Delete,
    }
}
