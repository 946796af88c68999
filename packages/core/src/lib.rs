//! ConfTree Core Validation Engine
//!
//! This crate provides the schema registry, model node tree and the
//! multi-phase edit-config validation pipeline for the ConfTree
//! network-device configuration server.
//!
//! # Architecture
//!
//! - **Schema registry**: holds an already-built schema graph (modules,
//!   augmentations, identities) and answers path lookups. Schema source
//!   parsing happens upstream and is not part of this crate.
//! - **Model node tree**: instance nodes are plain data; children are
//!   materialized lazily through helper objects backed by a pluggable
//!   [`db::NodeDataStore`] and cached per request.
//! - **Validation pipeline**: phase 1 validates the incoming edit fragment,
//!   the merge is applied to a candidate copy of the datastore, and phases
//!   2/3 re-validate the candidate before it is committed.
//!
//! # Modules
//!
//! - [`models`] - Data structures (QName, SchemaNode, ModelNode, RpcError)
//! - [`services`] - Registry, traverser, validators and the orchestrator
//! - [`db`] - Datastore abstraction plus the in-memory backend

pub mod db;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use db::*;
pub use models::*;
pub use services::*;
