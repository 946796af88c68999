//! Data Models
//!
//! This module contains the core data structures used throughout the
//! validation engine:
//!
//! - `QName` / `SchemaPath` / `ModelNodeId` - addressing, both in the schema
//!   graph and in the instance tree
//! - `SchemaNode` - a node of the schema graph with a closed kind union
//! - `ModelNode` - one instance node of the configuration tree
//! - `EditNode` - the incoming edit-config payload fragment
//! - `RpcError` - the wire-visible error record

mod node;
mod payload;
mod qname;
mod rpc_error;
mod schema;

pub use node::{ConfigValue, ModelNode, ModelNodeError};
pub use payload::{EditNode, EditOperation, ErrorOption, InsertPosition, RequestKind};
pub use qname::{ModelNodeId, ModelNodeKey, QName, Rdn, SchemaPath};
pub use rpc_error::{
    RpcError, RpcErrorInfo, RpcErrorSeverity, RpcErrorTag, RpcErrorType, APP_TAG_DATA_NOT_UNIQUE,
    APP_TAG_MISSING_INSTANCE, APP_TAG_MUST_VIOLATION, APP_TAG_TOO_FEW_ELEMENTS,
    APP_TAG_TOO_MANY_ELEMENTS, APP_TAG_WHEN_VIOLATION,
};
pub use schema::{
    Augmentation, LeafListSchema, LeafSchema, ListSchema, Module, SchemaNode, SchemaNodeKind,
    ValueType,
};

#[cfg(test)]
mod qname_test;
