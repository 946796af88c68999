//! Rpc Error Records
//!
//! Wire-visible error record assembled for every validation failure. The
//! enumerated tag values are part of the wire contract and serialize
//! verbatim; consumers match on the strings.
//!
//! An `RpcError` is created once per raised failure and is not mutated
//! after its error path is attached: [`RpcError::with_error_path`] consumes
//! the record and attaching twice keeps the first path.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Protocol layer an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RpcErrorType {
    /// Secure-transport layer
    Transport,
    /// RPC layer
    Rpc,
    /// Protocol operation layer
    Protocol,
    /// Server data model layer
    Application,
}

/// Error severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RpcErrorSeverity {
    /// Hard failure
    Error,
    /// Advisory
    Warning,
}

/// Enumerated error-tag vocabulary. Serialized forms are wire-verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RpcErrorTag {
    /// `in-use`
    InUse,
    /// `invalid-value`
    InvalidValue,
    /// `too-big`
    TooBig,
    /// `missing-attribute`
    MissingAttribute,
    /// `bad-attribute`
    BadAttribute,
    /// `unknown-attribute`
    UnknownAttribute,
    /// `missing-element`
    MissingElement,
    /// `bad-element`
    BadElement,
    /// `unknown-element`
    UnknownElement,
    /// `unknown-namespace`
    UnknownNamespace,
    /// `access-denied`
    AccessDenied,
    /// `lock-denied`
    LockDenied,
    /// `resource-denied`
    ResourceDenied,
    /// `data-exists`
    DataExists,
    /// `data-missing`
    DataMissing,
    /// `operation-not-supported`
    OperationNotSupported,
    /// `operation-failed`
    OperationFailed,
}

impl RpcErrorTag {
    /// Wire form of the tag
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InUse => "in-use",
            Self::InvalidValue => "invalid-value",
            Self::TooBig => "too-big",
            Self::MissingAttribute => "missing-attribute",
            Self::BadAttribute => "bad-attribute",
            Self::UnknownAttribute => "unknown-attribute",
            Self::MissingElement => "missing-element",
            Self::BadElement => "bad-element",
            Self::UnknownElement => "unknown-element",
            Self::UnknownNamespace => "unknown-namespace",
            Self::AccessDenied => "access-denied",
            Self::LockDenied => "lock-denied",
            Self::ResourceDenied => "resource-denied",
            Self::DataExists => "data-exists",
            Self::DataMissing => "data-missing",
            Self::OperationNotSupported => "operation-not-supported",
            Self::OperationFailed => "operation-failed",
        }
    }
}

impl fmt::Display for RpcErrorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `error-info` element: a named detail attached to the error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcErrorInfo {
    /// Element name (`bad-attribute`, `bad-element`, `non-unique`, ...)
    pub name: String,

    /// Text content
    pub value: String,
}

impl RpcErrorInfo {
    /// Build one detail element
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// App-tag value for min-elements violations (wire-verbatim).
pub const APP_TAG_TOO_FEW_ELEMENTS: &str = "too-few-elements";
/// App-tag value for max-elements violations (wire-verbatim).
pub const APP_TAG_TOO_MANY_ELEMENTS: &str = "too-many-elements";
/// App-tag value for unique-constraint violations (wire-verbatim).
pub const APP_TAG_DATA_NOT_UNIQUE: &str = "data-not-unique";
/// App-tag value for when-expression violations.
pub const APP_TAG_WHEN_VIOLATION: &str = "when-violation";
/// App-tag value for must-expression violations.
pub const APP_TAG_MUST_VIOLATION: &str = "must-violation";
/// App-tag used by insert-attribute errors referring to a missing or
/// malformed instance predicate.
pub const APP_TAG_MISSING_INSTANCE: &str = "missing-instance";

/// The protocol's standard error report record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    /// Protocol layer
    pub error_type: RpcErrorType,

    /// Enumerated error tag
    pub error_tag: RpcErrorTag,

    /// Severity; always `error` for validation failures
    pub severity: RpcErrorSeverity,

    /// Optional application-specific tag
    pub app_tag: Option<String>,

    /// Human-readable message
    pub message: String,

    /// Namespace-qualified path of the failing tree location
    pub error_path: Option<String>,

    /// Namespace URI by prefix, for the prefixes used in `error_path`
    pub ns_by_prefix: BTreeMap<String, String>,

    /// Structured details
    pub error_info: Vec<RpcErrorInfo>,
}

impl RpcError {
    /// Application-layer error with the given tag and message
    pub fn application_error(error_tag: RpcErrorTag, message: impl Into<String>) -> Self {
        Self {
            error_type: RpcErrorType::Application,
            error_tag,
            severity: RpcErrorSeverity::Error,
            app_tag: None,
            message: message.into(),
            error_path: None,
            ns_by_prefix: BTreeMap::new(),
            error_info: Vec::new(),
        }
    }

    /// `missing-element` error for list entries lacking declared keys.
    /// The message names exactly the missing keys.
    pub fn missing_key_error(missing: &[String]) -> Self {
        Self::application_error(
            RpcErrorTag::MissingElement,
            format!("Expected list key(s) [{}] is missing", missing.join(", ")),
        )
        .with_error_info(RpcErrorInfo::new("bad-element", missing.join(", ")))
    }

    /// `bad-element` error for keys present but not leading the entry in
    /// declared order.
    pub fn misplaced_key_error(misplaced: &[String]) -> Self {
        Self::application_error(
            RpcErrorTag::BadElement,
            format!(
                "Expected list key(s) [{}] is misplaced; keys must be the first elements in declared order",
                misplaced.join(", ")
            ),
        )
        .with_error_info(RpcErrorInfo::new("bad-element", misplaced.join(", ")))
    }

    /// `bad-attribute` error naming the offending attribute
    pub fn bad_attribute_error(attribute: &str, message: impl Into<String>) -> Self {
        Self::application_error(RpcErrorTag::BadAttribute, message)
            .with_error_info(RpcErrorInfo::new("bad-attribute", attribute))
    }

    /// `unknown-attribute` error
    pub fn unknown_attribute_error(message: impl Into<String>) -> Self {
        Self::application_error(RpcErrorTag::UnknownAttribute, message)
    }

    /// `operation-failed` error
    pub fn operation_failed(message: impl Into<String>) -> Self {
        Self::application_error(RpcErrorTag::OperationFailed, message)
    }

    /// min-elements violation, app-tag `too-few-elements`, naming the
    /// child and the declared bound
    pub fn too_few_elements(child_name: &str, min_elements: u32) -> Self {
        Self::operation_failed(format!(
            "Minimum number of elements '{min_elements}' not met for '{child_name}'"
        ))
        .with_app_tag(APP_TAG_TOO_FEW_ELEMENTS)
    }

    /// max-elements violation, app-tag `too-many-elements`, naming the
    /// child and the declared bound
    pub fn too_many_elements(child_name: &str, max_elements: u32) -> Self {
        Self::operation_failed(format!(
            "Maximum number of elements '{max_elements}' exceeded for '{child_name}'"
        ))
        .with_app_tag(APP_TAG_TOO_MANY_ELEMENTS)
    }

    /// unique-constraint violation, app-tag `data-not-unique`, naming the
    /// colliding tuple
    pub fn data_not_unique(tuple: &str) -> Self {
        Self::operation_failed(format!("Duplicate value tuple [{tuple}] violates unique constraint"))
            .with_app_tag(APP_TAG_DATA_NOT_UNIQUE)
            .with_error_info(RpcErrorInfo::new("non-unique", tuple))
    }

    /// `invalid-value` error for type-check failures
    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::application_error(RpcErrorTag::InvalidValue, message)
    }

    /// `unknown-element` error for elements the schema does not define
    pub fn unknown_element(element_name: &str) -> Self {
        Self::application_error(
            RpcErrorTag::UnknownElement,
            format!("An unexpected element '{element_name}' is present"),
        )
        .with_error_info(RpcErrorInfo::new("bad-element", element_name))
    }

    /// `missing-element` error for an absent mandatory child
    pub fn missing_mandatory_element(element_name: &str) -> Self {
        Self::application_error(
            RpcErrorTag::MissingElement,
            format!("Missing mandatory node '{element_name}'"),
        )
        .with_error_info(RpcErrorInfo::new("bad-element", element_name))
    }

    /// `data-missing` error for delete operations against absent data
    pub fn data_missing(message: impl Into<String>) -> Self {
        Self::application_error(RpcErrorTag::DataMissing, message)
    }

    /// Set the app-tag
    pub fn with_app_tag(mut self, app_tag: impl Into<String>) -> Self {
        self.app_tag = Some(app_tag.into());
        self
    }

    /// Append one error-info detail
    pub fn with_error_info(mut self, info: RpcErrorInfo) -> Self {
        self.error_info.push(info);
        self
    }

    /// Attach the error path and its prefix map. A path can be attached
    /// once; later calls keep the original location.
    pub fn with_error_path(
        mut self,
        path: impl Into<String>,
        ns_by_prefix: BTreeMap<String, String>,
    ) -> Self {
        if self.error_path.is_none() {
            self.error_path = Some(path.into());
            self.ns_by_prefix = ns_by_prefix;
        }
        self
    }

    /// Whether an error path has been attached
    pub fn has_error_path(&self) -> bool {
        self.error_path.is_some()
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_tag, self.message)?;
        if let Some(path) = &self.error_path {
            write!(f, " (at {path})")?;
        }
        Ok(())
    }
}
