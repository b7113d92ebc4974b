// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Transport abstraction consumed by the proxy layer.
//!
//! Session establishment, security and wire encoding belong to the
//! implementor of [`UaTransport`]. The proxy layer only needs three services
//! (Browse, Read and Call) plus an orderly close.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::ProxyResult;
use crate::types::{
    AttributeId, BrowseDirection, LocalizedText, NodeClass, NodeId, QualifiedName, StatusCode,
};

// =============================================================================
// UaValue
// =============================================================================

/// A value exchanged with the server.
#[derive(Debug, Clone, PartialEq)]
pub enum UaValue {
    /// Boolean value.
    Boolean(bool),
    /// Signed byte.
    SByte(i8),
    /// Unsigned byte.
    Byte(u8),
    /// 16-bit signed integer.
    Int16(i16),
    /// 16-bit unsigned integer.
    UInt16(u16),
    /// 32-bit signed integer.
    Int32(i32),
    /// 32-bit unsigned integer.
    UInt32(u32),
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit unsigned integer.
    UInt64(u64),
    /// 32-bit float.
    Float(f32),
    /// 64-bit double.
    Double(f64),
    /// String value.
    String(String),
    /// Date/time value.
    DateTime(DateTime<Utc>),
    /// GUID value.
    Guid(uuid::Uuid),
    /// Byte string.
    ByteString(Vec<u8>),
    /// Node identifier.
    NodeId(NodeId),
    /// Qualified name.
    QualifiedName(QualifiedName),
    /// Localized text.
    LocalizedText(LocalizedText),
    /// Array of values.
    Array(Vec<UaValue>),
    /// Null value.
    Null,
}

impl UaValue {
    /// Returns the name of the variant, used in conversion errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "Boolean",
            Self::SByte(_) => "SByte",
            Self::Byte(_) => "Byte",
            Self::Int16(_) => "Int16",
            Self::UInt16(_) => "UInt16",
            Self::Int32(_) => "Int32",
            Self::UInt32(_) => "UInt32",
            Self::Int64(_) => "Int64",
            Self::UInt64(_) => "UInt64",
            Self::Float(_) => "Float",
            Self::Double(_) => "Double",
            Self::String(_) => "String",
            Self::DateTime(_) => "DateTime",
            Self::Guid(_) => "Guid",
            Self::ByteString(_) => "ByteString",
            Self::NodeId(_) => "NodeId",
            Self::QualifiedName(_) => "QualifiedName",
            Self::LocalizedText(_) => "LocalizedText",
            Self::Array(_) => "Array",
            Self::Null => "Null",
        }
    }

    /// Returns `true` if this is a null value.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the value as a boolean; only `Boolean` converts.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Attempts to get the value as an i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::SByte(v) => Some(*v as i64),
            Self::Byte(v) => Some(*v as i64),
            Self::Int16(v) => Some(*v as i64),
            Self::UInt16(v) => Some(*v as i64),
            Self::Int32(v) => Some(*v as i64),
            Self::UInt32(v) => Some(*v as i64),
            Self::Int64(v) => Some(*v),
            Self::UInt64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Attempts to get the value as an f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v as f64),
            Self::Double(v) => Some(*v),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    /// Returns the text of string-like values.
    ///
    /// Localized text yields its text part, so a state variable's current
    /// state can be compared against a plain state name.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            Self::LocalizedText(v) => Some(&v.text),
            Self::QualifiedName(v) => Some(&v.name),
            _ => None,
        }
    }

    /// Returns the node id if this is a `NodeId` value.
    pub fn as_node_id(&self) -> Option<&NodeId> {
        match self {
            Self::NodeId(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the qualified name if this is a `QualifiedName` value.
    pub fn as_qualified_name(&self) -> Option<&QualifiedName> {
        match self {
            Self::QualifiedName(v) => Some(v),
            _ => None,
        }
    }
}

impl Default for UaValue {
    fn default() -> Self {
        Self::Null
    }
}

impl fmt::Display for UaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(v) => write!(f, "{}", v),
            Self::SByte(v) => write!(f, "{}", v),
            Self::Byte(v) => write!(f, "{}", v),
            Self::Int16(v) => write!(f, "{}", v),
            Self::UInt16(v) => write!(f, "{}", v),
            Self::Int32(v) => write!(f, "{}", v),
            Self::UInt32(v) => write!(f, "{}", v),
            Self::Int64(v) => write!(f, "{}", v),
            Self::UInt64(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Double(v) => write!(f, "{}", v),
            Self::String(v) => write!(f, "{}", v),
            Self::DateTime(v) => write!(f, "{}", v.to_rfc3339()),
            Self::Guid(v) => write!(f, "{}", v),
            Self::ByteString(v) => write!(f, "<{} bytes>", v.len()),
            Self::NodeId(v) => write!(f, "{}", v),
            Self::QualifiedName(v) => write!(f, "{}", v),
            Self::LocalizedText(v) => write!(f, "{}", v),
            Self::Array(v) => write!(f, "[{} items]", v.len()),
            Self::Null => write!(f, "null"),
        }
    }
}

impl From<bool> for UaValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i32> for UaValue {
    fn from(v: i32) -> Self {
        Self::Int32(v)
    }
}

impl From<u32> for UaValue {
    fn from(v: u32) -> Self {
        Self::UInt32(v)
    }
}

impl From<f64> for UaValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for UaValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for UaValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<LocalizedText> for UaValue {
    fn from(v: LocalizedText) -> Self {
        Self::LocalizedText(v)
    }
}

impl From<NodeId> for UaValue {
    fn from(v: NodeId) -> Self {
        Self::NodeId(v)
    }
}

// =============================================================================
// DataValue
// =============================================================================

/// Result of an attribute read: a value with its status and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct DataValue {
    /// The value, absent when the status is bad.
    pub value: Option<UaValue>,

    /// Status of the value.
    pub status: StatusCode,

    /// Source timestamp.
    pub source_timestamp: Option<DateTime<Utc>>,

    /// Server timestamp.
    pub server_timestamp: Option<DateTime<Utc>>,
}

impl DataValue {
    /// Creates a good value stamped now.
    pub fn good(value: impl Into<UaValue>) -> Self {
        let now = Utc::now();
        Self {
            value: Some(value.into()),
            status: StatusCode::GOOD,
            source_timestamp: Some(now),
            server_timestamp: Some(now),
        }
    }

    /// Creates a value-less result carrying a status.
    pub fn bad(status: StatusCode) -> Self {
        Self {
            value: None,
            status,
            source_timestamp: None,
            server_timestamp: Some(Utc::now()),
        }
    }

    /// Returns `true` if the status is good.
    #[inline]
    pub fn is_good(&self) -> bool {
        self.status.is_good()
    }

    /// Returns `true` if the status is bad.
    #[inline]
    pub fn is_bad(&self) -> bool {
        self.status.is_bad()
    }

    /// Returns the value when the status is good.
    pub fn good_value(&self) -> Option<&UaValue> {
        if self.is_good() {
            self.value.as_ref()
        } else {
            None
        }
    }

    /// Compares value and status, ignoring timestamps.
    pub fn same_reading(&self, other: &DataValue) -> bool {
        self.value == other.value && self.status == other.status
    }
}

// =============================================================================
// Browse
// =============================================================================

/// Parameters of a single-node browse.
#[derive(Debug, Clone, PartialEq)]
pub struct BrowseRequest {
    /// Node to browse from.
    pub node_id: NodeId,

    /// Which reference directions to return.
    pub direction: BrowseDirection,

    /// Reference type filter; `None` means all references.
    pub reference_type_id: Option<NodeId>,

    /// Whether subtypes of the reference type also match.
    pub include_subtypes: bool,

    /// Node class bit mask of targets; 0 means all.
    pub node_class_mask: u32,
}

impl BrowseRequest {
    /// Creates a forward browse over all references.
    pub fn new(node_id: NodeId) -> Self {
        Self {
            node_id,
            direction: BrowseDirection::Forward,
            reference_type_id: None,
            include_subtypes: true,
            node_class_mask: 0,
        }
    }

    /// Sets the browse direction.
    pub fn direction(mut self, direction: BrowseDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Restricts results to a reference type.
    pub fn reference_type(mut self, reference_type_id: NodeId, include_subtypes: bool) -> Self {
        self.reference_type_id = Some(reference_type_id);
        self.include_subtypes = include_subtypes;
        self
    }

    /// Restricts results to target node classes.
    pub fn node_class_mask(mut self, mask: u32) -> Self {
        self.node_class_mask = mask;
        self
    }
}

/// One reference returned by a browse.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceDescription {
    /// The reference type.
    pub reference_type_id: NodeId,

    /// `true` if the reference points away from the browsed node.
    pub is_forward: bool,

    /// The target node.
    pub node_id: NodeId,

    /// Target browse name.
    pub browse_name: QualifiedName,

    /// Target display name.
    pub display_name: LocalizedText,

    /// Target node class.
    pub node_class: NodeClass,

    /// Target type definition, for Object and Variable targets.
    pub type_definition: Option<NodeId>,
}

/// Result of a browse.
#[derive(Debug, Clone, PartialEq)]
pub struct BrowseResponse {
    /// Service status for the browsed node.
    pub status: StatusCode,

    /// Matching references in server order.
    pub references: Vec<ReferenceDescription>,
}

impl BrowseResponse {
    /// Creates a good response.
    pub fn good(references: Vec<ReferenceDescription>) -> Self {
        Self {
            status: StatusCode::GOOD,
            references,
        }
    }

    /// Creates an empty response carrying a status.
    pub fn bad(status: StatusCode) -> Self {
        Self {
            status,
            references: Vec::new(),
        }
    }
}

// =============================================================================
// Call
// =============================================================================

/// Parameters of a method call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRequest {
    /// The object the method is called on.
    pub object_id: NodeId,

    /// The method node.
    pub method_id: NodeId,

    /// Ordered input arguments.
    pub input_arguments: Vec<UaValue>,
}

/// Result of a method call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallResponse {
    /// Call status decided by the server.
    pub status: StatusCode,

    /// Per-argument validation statuses.
    pub input_argument_results: Vec<StatusCode>,

    /// Ordered output arguments.
    pub output_arguments: Vec<UaValue>,
}

impl CallResponse {
    /// Creates a good response.
    pub fn good(output_arguments: Vec<UaValue>) -> Self {
        Self {
            status: StatusCode::GOOD,
            input_argument_results: Vec::new(),
            output_arguments,
        }
    }

    /// Creates a response carrying a status and no outputs.
    pub fn with_status(status: StatusCode) -> Self {
        Self {
            status,
            input_argument_results: Vec::new(),
            output_arguments: Vec::new(),
        }
    }
}

// =============================================================================
// UaTransport Trait
// =============================================================================

/// Abstract transport for the three services the proxy layer consumes.
///
/// Every method resolves with either a service response or a typed failure.
/// Service-level bad statuses are reported inside the response; only failures
/// to exchange the request at all are `Err`.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`: one transport is shared by every
/// operation of a [`ProxyManager`](crate::proxy::ProxyManager), and
/// independent operations run concurrently.
#[async_trait]
pub trait UaTransport: Send + Sync {
    /// Browses the references of a single node.
    async fn browse(&self, request: &BrowseRequest) -> ProxyResult<BrowseResponse>;

    /// Reads one attribute of a node.
    async fn read(&self, node_id: &NodeId, attribute: AttributeId) -> ProxyResult<DataValue>;

    /// Calls a method on an object.
    async fn call(&self, request: &CallRequest) -> ProxyResult<CallResponse>;

    /// Releases the session. Called once when the owning manager stops.
    async fn close(&self) -> ProxyResult<()> {
        Ok(())
    }

    /// Returns the transport display name for logging.
    fn display_name(&self) -> String;
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_accessors() {
        assert_eq!(UaValue::Boolean(true).as_bool(), Some(true));
        assert_eq!(UaValue::Int32(1).as_bool(), None);
        assert_eq!(UaValue::UInt16(7).as_i64(), Some(7));
        assert_eq!(UaValue::Int32(42).as_f64(), Some(42.0));
        assert_eq!(UaValue::UInt64(u64::MAX).as_i64(), None);
        assert!(UaValue::Null.is_null());
    }

    #[test]
    fn test_value_text() {
        let state = UaValue::LocalizedText(LocalizedText::new("Ready").with_locale("en"));
        assert_eq!(state.as_text(), Some("Ready"));
        assert_eq!(state.to_string(), "Ready");
        assert_eq!(UaValue::from("Halted").as_text(), Some("Halted"));
        assert_eq!(UaValue::Double(1.0).as_text(), None);
        assert_eq!(state.type_name(), "LocalizedText");
    }

    #[test]
    fn test_data_value() {
        let good = DataValue::good(25.5);
        assert!(good.is_good());
        assert_eq!(good.good_value(), Some(&UaValue::Double(25.5)));

        let bad = DataValue::bad(StatusCode::BAD_NOT_READABLE);
        assert!(bad.is_bad());
        assert_eq!(bad.good_value(), None);

        let again = DataValue::good(25.5);
        assert!(good.same_reading(&again));
        assert!(!good.same_reading(&bad));
    }

    #[test]
    fn test_browse_request_builder() {
        let request = BrowseRequest::new(NodeId::numeric(1, 5))
            .direction(BrowseDirection::Inverse)
            .reference_type(crate::ids::reference_types::HAS_SUBTYPE, false)
            .node_class_mask(NodeClass::ObjectType.value());
        assert_eq!(request.direction, BrowseDirection::Inverse);
        assert!(!request.include_subtypes);
        assert_eq!(request.node_class_mask, 8);
    }
}
