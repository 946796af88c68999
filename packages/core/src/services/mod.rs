//! Validation Services
//!
//! This module contains the engine around the schema graph:
//!
//! - `SchemaRegistry` - path lookups over the registered schema graph
//! - `SchemaTraverser` - pre-order walk with pluggable visitors
//! - `helpers` - lazy child materialization for the model node tree
//! - `ErrorPathBuilder` - namespace-qualified error path rendering
//! - `expression` - the when/must expression subset and its evaluator
//! - `validation` - per-kind constraint validators and the orchestrator

pub mod error;
pub mod error_path;
pub mod expression;
pub mod helpers;
pub mod schema_registry;
pub mod traverser;
pub mod validation;

pub use error::{SchemaRegistryError, ValidationError};
pub use error_path::ErrorPathBuilder;
pub use expression::{Expression, ExpressionError, ExpressionEvaluator};
pub use helpers::{
    ChildContainerHelper, ChildListHelper, DsChildContainerHelper, DsChildListHelper,
    HelperRegistry,
};
pub use schema_registry::SchemaRegistry;
pub use traverser::{ComponentIndexVisitor, SchemaTraverser, SchemaVisitor};
pub use validation::{
    ChoiceCaseValidator, ContainerValidator, EditConfigMerger, EditConfigRequest, EditOutcome,
    EditState, LeafListValidator, ListValidator, MandatoryValidator, TreeMerger, TypeValidator,
    ValidationContext, ValidationOrchestrator,
};
