//! Constraint Validators & Orchestration
//!
//! Per-schema-node-kind validators sharing one result-based contract:
//! phase-1 checks run against the raw incoming fragment, phase-2 checks
//! run against the merged candidate tree. Every failure is a
//! [`crate::services::ValidationError`] whose error path is attached
//! before the validator returns; the orchestrator never reconstructs tree
//! positions after the fact.

pub mod choice;
pub mod container;
pub mod context;
pub mod leaf_list;
pub mod list;
pub mod mandatory;
pub mod merge;
pub mod orchestrator;
pub mod type_check;

pub use choice::ChoiceCaseValidator;
pub use container::ContainerValidator;
pub use context::ValidationContext;
pub use leaf_list::LeafListValidator;
pub use list::ListValidator;
pub use mandatory::MandatoryValidator;
pub use merge::{EditConfigMerger, TreeMerger};
pub use orchestrator::{EditConfigRequest, EditOutcome, EditState, ValidationOrchestrator};
pub use type_check::TypeValidator;
