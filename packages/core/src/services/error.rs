//! Service Layer Error Types

use crate::models::{RpcError, SchemaPath};
use thiserror::Error;

/// A validation failure carrying its wire-visible [`RpcError`].
///
/// Validators attach the error path before returning, so a
/// `ValidationError` crossing the validator boundary always has a
/// namespace-resolvable location (or the documented `/` fallback).
#[derive(Error, Debug)]
#[error("{}", rpc_error)]
pub struct ValidationError {
    /// The wire-visible error record
    pub rpc_error: RpcError,
}

impl ValidationError {
    /// Wrap an rpc error record
    pub fn new(rpc_error: RpcError) -> Self {
        Self { rpc_error }
    }

    /// Consume the wrapper
    pub fn into_rpc_error(self) -> RpcError {
        self.rpc_error
    }
}

impl From<RpcError> for ValidationError {
    fn from(rpc_error: RpcError) -> Self {
        Self::new(rpc_error)
    }
}

/// Schema registration errors
#[derive(Error, Debug)]
pub enum SchemaRegistryError {
    /// A node with the same path is already registered
    #[error("Schema path already registered: {path}")]
    DuplicatePath {
        /// The colliding path
        path: SchemaPath,
    },

    /// A non-root node whose parent path is unknown
    #[error("Parent path not registered for {path}")]
    MissingParent {
        /// Path of the orphaned node
        path: SchemaPath,
    },

    /// Augmentation target path is unknown
    #[error("Augmentation target not registered: {target}")]
    UnknownAugmentationTarget {
        /// The missing target path
        target: SchemaPath,
    },
}
