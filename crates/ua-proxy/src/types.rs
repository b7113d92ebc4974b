// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Identity and reference model for the remote address space.
//!
//! This module provides the pure value types every other layer keys on:
//!
//! - **NodeId**: All four node identifier forms with parsing and ordering
//! - **QualifiedName / LocalizedText**: Browse and display names
//! - **NodeClass / AttributeId / BrowseDirection**: Protocol enumerations
//! - **StatusCode**: Server status codes with severity helpers
//!
//! Nothing here performs I/O. Equality on [`NodeId`] is exact; there is no
//! partial or fuzzy matching anywhere in the crate.
//!
//! # Examples
//!
//! ```
//! use ua_proxy::types::{NodeId, QualifiedName};
//!
//! let node: NodeId = "ns=1;s=Boiler#1".parse().unwrap();
//! assert_eq!(node.namespace_index, 1);
//!
//! let name = QualifiedName::from("1:Simulation");
//! assert_eq!(name.name, "Simulation");
//! ```

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ConfigurationError, ProxyError};

// =============================================================================
// NodeId
// =============================================================================

/// Identifier of a node in the remote address space.
///
/// A NodeId consists of a namespace index and an identifier which can be
/// numeric, string, GUID, or opaque (byte string). It is the primary key of
/// every lookup and cache in this crate.
///
/// # Examples
///
/// ```
/// use ua_proxy::types::NodeId;
///
/// let numeric = NodeId::numeric(2, 1001);
/// let string = NodeId::string(1, "Boiler#1");
///
/// let parsed: NodeId = "ns=2;i=1001".parse().unwrap();
/// assert_eq!(parsed, numeric);
/// assert_ne!(string, numeric);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    /// Namespace index (0 = standard namespace).
    pub namespace_index: u16,

    /// The node identifier.
    pub identifier: NodeIdentifier,
}

impl NodeId {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Creates a numeric node ID.
    #[inline]
    pub const fn numeric(namespace_index: u16, value: u32) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Numeric(value),
        }
    }

    /// Creates a string node ID.
    ///
    /// # Examples
    ///
    /// ```
    /// use ua_proxy::types::NodeId;
    ///
    /// let node = NodeId::string(1, "Boiler#1.Simulation");
    /// assert!(node.is_string());
    /// ```
    #[inline]
    pub fn string(namespace_index: u16, value: impl Into<String>) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::String(value.into()),
        }
    }

    /// Creates a GUID node ID.
    #[inline]
    pub fn guid(namespace_index: u16, value: Uuid) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Guid(value),
        }
    }

    /// Creates an opaque (byte string) node ID.
    #[inline]
    pub fn opaque(namespace_index: u16, value: Vec<u8>) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Opaque(value),
        }
    }

    /// Returns the null node ID (ns=0, i=0).
    #[inline]
    pub const fn null() -> Self {
        Self::numeric(0, 0)
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Returns `true` if this is a numeric identifier.
    #[inline]
    pub const fn is_numeric(&self) -> bool {
        matches!(self.identifier, NodeIdentifier::Numeric(_))
    }

    /// Returns `true` if this is a string identifier.
    #[inline]
    pub const fn is_string(&self) -> bool {
        matches!(self.identifier, NodeIdentifier::String(_))
    }

    /// Returns `true` if this is in the standard namespace (ns=0).
    #[inline]
    pub const fn is_standard(&self) -> bool {
        self.namespace_index == 0
    }

    /// Returns `true` if this is the null node ID.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.namespace_index == 0 && matches!(self.identifier, NodeIdentifier::Numeric(0))
    }

    /// Returns the numeric value if this is a numeric identifier.
    #[inline]
    pub fn as_numeric(&self) -> Option<u32> {
        match &self.identifier {
            NodeIdentifier::Numeric(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string value if this is a string identifier.
    #[inline]
    pub fn as_string(&self) -> Option<&str> {
        match &self.identifier {
            NodeIdentifier::String(v) => Some(v),
            _ => None,
        }
    }

    /// Converts to the textual form.
    ///
    /// Format: `ns=<namespace>;{i|s|g|b}=<identifier>`, with the namespace
    /// part omitted for namespace 0.
    ///
    /// ```
    /// use ua_proxy::types::NodeId;
    ///
    /// assert_eq!(NodeId::numeric(0, 85).to_opc_string(), "i=85");
    /// assert_eq!(NodeId::string(1, "A").to_opc_string(), "ns=1;s=A");
    /// ```
    pub fn to_opc_string(&self) -> String {
        let id_str = match &self.identifier {
            NodeIdentifier::Numeric(v) => format!("i={}", v),
            NodeIdentifier::String(v) => format!("s={}", v),
            NodeIdentifier::Guid(v) => format!("g={}", v),
            NodeIdentifier::Opaque(v) => format!("b={}", BASE64.encode(v)),
        };

        if self.namespace_index == 0 {
            id_str
        } else {
            format!("ns={};{}", self.namespace_index, id_str)
        }
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_opc_string())
    }
}

impl FromStr for NodeId {
    type Err = ProxyError;

    /// Parses a NodeId from its textual form.
    ///
    /// Supported formats:
    /// - `ns=2;i=1001` (numeric)
    /// - `ns=2;s=MyNode` (string)
    /// - `ns=2;g=550e8400-e29b-41d4-a716-446655440000` (GUID)
    /// - `ns=2;b=SGVsbG8=` (opaque, base64 encoded)
    /// - `i=85` (namespace 0)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = |reason: String| {
            ProxyError::configuration(ConfigurationError::invalid_node_id(s, reason))
        };

        let (namespace_index, identifier_part) = match s.strip_prefix("ns=") {
            Some(rest) => {
                let (ns_str, id) = rest
                    .split_once(';')
                    .ok_or_else(|| invalid("Missing identifier after namespace".into()))?;
                let ns: u16 = ns_str
                    .parse()
                    .map_err(|_| invalid("Invalid namespace index".into()))?;
                (ns, id)
            }
            None => (0, s),
        };

        let identifier = if let Some(id) = identifier_part.strip_prefix("i=") {
            NodeIdentifier::Numeric(
                id.parse()
                    .map_err(|_| invalid("Invalid numeric identifier".into()))?,
            )
        } else if let Some(id) = identifier_part.strip_prefix("s=") {
            NodeIdentifier::String(id.to_string())
        } else if let Some(id) = identifier_part.strip_prefix("g=") {
            NodeIdentifier::Guid(
                Uuid::parse_str(id).map_err(|e| invalid(format!("Invalid GUID: {}", e)))?,
            )
        } else if let Some(id) = identifier_part.strip_prefix("b=") {
            NodeIdentifier::Opaque(
                BASE64
                    .decode(id)
                    .map_err(|e| invalid(format!("Invalid base64: {}", e)))?,
            )
        } else {
            return Err(invalid(
                "Unknown identifier type. Expected i=, s=, g=, or b=".into(),
            ));
        };

        Ok(Self {
            namespace_index,
            identifier,
        })
    }
}

// =============================================================================
// NodeIdentifier
// =============================================================================

/// The identifier part of a [`NodeId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeIdentifier {
    /// Numeric identifier.
    Numeric(u32),
    /// String identifier.
    String(String),
    /// GUID identifier.
    Guid(Uuid),
    /// Opaque byte string identifier.
    Opaque(Vec<u8>),
}

// =============================================================================
// QualifiedName
// =============================================================================

/// A browse name qualified by a namespace index.
///
/// Browse names are unique among the children of one parent but not across
/// the address space. Ordering is by namespace then name, giving
/// deterministic iteration over sibling sets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QualifiedName {
    /// Namespace index.
    pub namespace_index: u16,
    /// Name.
    pub name: String,
}

impl QualifiedName {
    /// Creates a new qualified name.
    pub fn new(namespace_index: u16, name: impl Into<String>) -> Self {
        Self {
            namespace_index,
            name: name.into(),
        }
    }

    /// Returns `true` if `other` names the same thing under lookup rules.
    ///
    /// A name in namespace 0 acts as a wildcard for the namespace, so a
    /// caller asking for `ProgramStateMachineType` finds it wherever the
    /// server put it. Otherwise both parts must be equal.
    pub fn matches(&self, other: &QualifiedName) -> bool {
        self.name == other.name
            && (self.namespace_index == 0 || self.namespace_index == other.namespace_index)
    }
}

impl From<&str> for QualifiedName {
    /// Parses `"ns:Name"`; without a numeric prefix the namespace is 0.
    fn from(s: &str) -> Self {
        if let Some((ns, name)) = s.split_once(':') {
            if let Ok(namespace_index) = ns.parse::<u16>() {
                return Self::new(namespace_index, name);
            }
        }
        Self::new(0, s)
    }
}

impl From<String> for QualifiedName {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace_index == 0 {
            f.write_str(&self.name)
        } else {
            write!(f, "{}:{}", self.namespace_index, self.name)
        }
    }
}

// =============================================================================
// LocalizedText
// =============================================================================

/// Human readable text with an optional locale.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LocalizedText {
    /// Locale identifier such as `en-US`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    /// The text.
    pub text: String,
}

impl LocalizedText {
    /// Creates localized text without a locale.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            locale: None,
            text: text.into(),
        }
    }

    /// Sets the locale.
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }
}

impl From<&str> for LocalizedText {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for LocalizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

// =============================================================================
// NodeClass
// =============================================================================

/// Node class of a remote node.
///
/// Determines which proxy shape the builder produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeClass {
    /// Object node.
    Object,
    /// Variable node.
    Variable,
    /// Method node.
    Method,
    /// Object type node.
    ObjectType,
    /// Variable type node.
    VariableType,
    /// Reference type node.
    ReferenceType,
    /// Data type node.
    DataType,
    /// View node.
    View,
}

impl NodeClass {
    /// Returns the bit mask value used by browse filters.
    pub const fn value(&self) -> u32 {
        match self {
            Self::Object => 1,
            Self::Variable => 2,
            Self::Method => 4,
            Self::ObjectType => 8,
            Self::VariableType => 16,
            Self::ReferenceType => 32,
            Self::DataType => 64,
            Self::View => 128,
        }
    }

    /// Creates from the wire value.
    pub fn from_value(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::Object),
            2 => Some(Self::Variable),
            4 => Some(Self::Method),
            8 => Some(Self::ObjectType),
            16 => Some(Self::VariableType),
            32 => Some(Self::ReferenceType),
            64 => Some(Self::DataType),
            128 => Some(Self::View),
            _ => None,
        }
    }

    /// Returns `true` for ObjectType and VariableType.
    pub const fn is_type(&self) -> bool {
        matches!(self, Self::ObjectType | Self::VariableType)
    }

    /// Returns `true` if a proxy can be built for this class.
    pub const fn is_instance(&self) -> bool {
        matches!(self, Self::Object | Self::Variable | Self::Method)
    }

    /// Returns the class name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Object => "Object",
            Self::Variable => "Variable",
            Self::Method => "Method",
            Self::ObjectType => "ObjectType",
            Self::VariableType => "VariableType",
            Self::ReferenceType => "ReferenceType",
            Self::DataType => "DataType",
            Self::View => "View",
        }
    }
}

impl fmt::Display for NodeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Combines node classes into a browse filter mask; an empty slice means all.
pub fn node_class_mask(classes: &[NodeClass]) -> u32 {
    classes.iter().fold(0, |mask, class| mask | class.value())
}

// =============================================================================
// AttributeId
// =============================================================================

/// Attribute identifiers used by the proxy layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AttributeId {
    /// Node ID attribute.
    NodeId,
    /// Node class attribute.
    NodeClass,
    /// Browse name attribute.
    BrowseName,
    /// Display name attribute.
    DisplayName,
    /// Description attribute.
    Description,
    /// Is abstract attribute.
    IsAbstract,
    /// Value attribute.
    #[default]
    Value,
    /// Data type attribute.
    DataType,
    /// Access level attribute.
    AccessLevel,
    /// Executable attribute.
    Executable,
    /// User executable attribute.
    UserExecutable,
}

impl AttributeId {
    /// Returns the numeric attribute identifier.
    pub const fn value(&self) -> u32 {
        match self {
            Self::NodeId => 1,
            Self::NodeClass => 2,
            Self::BrowseName => 3,
            Self::DisplayName => 4,
            Self::Description => 5,
            Self::IsAbstract => 8,
            Self::Value => 13,
            Self::DataType => 14,
            Self::AccessLevel => 17,
            Self::Executable => 21,
            Self::UserExecutable => 22,
        }
    }

    /// Creates from the numeric attribute identifier.
    pub fn from_value(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::NodeId),
            2 => Some(Self::NodeClass),
            3 => Some(Self::BrowseName),
            4 => Some(Self::DisplayName),
            5 => Some(Self::Description),
            8 => Some(Self::IsAbstract),
            13 => Some(Self::Value),
            14 => Some(Self::DataType),
            17 => Some(Self::AccessLevel),
            21 => Some(Self::Executable),
            22 => Some(Self::UserExecutable),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// =============================================================================
// BrowseDirection
// =============================================================================

/// Direction of references returned by a browse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BrowseDirection {
    /// Browse forward references.
    #[default]
    Forward,

    /// Browse inverse references.
    Inverse,

    /// Browse both forward and inverse references.
    Both,
}

impl BrowseDirection {
    /// Returns the wire value.
    pub const fn value(&self) -> u32 {
        match self {
            Self::Forward => 0,
            Self::Inverse => 1,
            Self::Both => 2,
        }
    }

    /// Returns `true` if a reference with the given direction is included.
    pub const fn accepts(&self, is_forward: bool) -> bool {
        match self {
            Self::Forward => is_forward,
            Self::Inverse => !is_forward,
            Self::Both => true,
        }
    }
}

// =============================================================================
// StatusCode
// =============================================================================

/// A server status code.
///
/// The top two bits carry severity: `00` good, `01` uncertain, `10` bad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusCode(pub u32);

impl StatusCode {
    /// The operation succeeded.
    pub const GOOD: StatusCode = StatusCode(0);
    /// An unexpected error occurred.
    pub const BAD_UNEXPECTED_ERROR: StatusCode = StatusCode(0x8001_0000);
    /// A low level communication error occurred.
    pub const BAD_COMMUNICATION_ERROR: StatusCode = StatusCode(0x8005_0000);
    /// The operation timed out.
    pub const BAD_TIMEOUT: StatusCode = StatusCode(0x800A_0000);
    /// User does not have permission to perform the requested operation.
    pub const BAD_USER_ACCESS_DENIED: StatusCode = StatusCode(0x801F_0000);
    /// The node id refers to a node that does not exist.
    pub const BAD_NODE_ID_UNKNOWN: StatusCode = StatusCode(0x8034_0000);
    /// The attribute is not supported for the specified node.
    pub const BAD_ATTRIBUTE_ID_INVALID: StatusCode = StatusCode(0x8035_0000);
    /// The access level does not allow reading the value.
    pub const BAD_NOT_READABLE: StatusCode = StatusCode(0x803A_0000);
    /// The requested item was not found or no match was found.
    pub const BAD_NO_MATCH: StatusCode = StatusCode(0x806F_0000);
    /// The value supplied is not of the expected type.
    pub const BAD_TYPE_MISMATCH: StatusCode = StatusCode(0x8074_0000);
    /// The method id does not refer to a method of the object.
    pub const BAD_METHOD_INVALID: StatusCode = StatusCode(0x8075_0000);
    /// The client did not specify all of the input arguments.
    pub const BAD_ARGUMENTS_MISSING: StatusCode = StatusCode(0x8076_0000);
    /// The operation cannot be completed in the current state.
    pub const BAD_INVALID_STATE: StatusCode = StatusCode(0x80AF_0000);
    /// The method is not executable in the current state.
    pub const BAD_NOT_EXECUTABLE: StatusCode = StatusCode(0x8111_0000);

    /// Returns the raw bits.
    #[inline]
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Returns `true` if the severity is good.
    #[inline]
    pub const fn is_good(&self) -> bool {
        self.0 & 0xC000_0000 == 0
    }

    /// Returns `true` if the severity is uncertain.
    #[inline]
    pub const fn is_uncertain(&self) -> bool {
        self.0 & 0xC000_0000 == 0x4000_0000
    }

    /// Returns `true` if the severity is bad.
    #[inline]
    pub const fn is_bad(&self) -> bool {
        self.0 & 0x8000_0000 != 0
    }

    /// Returns the symbolic name for the codes this crate knows about.
    pub fn name(&self) -> Option<&'static str> {
        let name = match *self {
            Self::GOOD => "Good",
            Self::BAD_UNEXPECTED_ERROR => "BadUnexpectedError",
            Self::BAD_COMMUNICATION_ERROR => "BadCommunicationError",
            Self::BAD_TIMEOUT => "BadTimeout",
            Self::BAD_USER_ACCESS_DENIED => "BadUserAccessDenied",
            Self::BAD_NODE_ID_UNKNOWN => "BadNodeIdUnknown",
            Self::BAD_ATTRIBUTE_ID_INVALID => "BadAttributeIdInvalid",
            Self::BAD_NOT_READABLE => "BadNotReadable",
            Self::BAD_NO_MATCH => "BadNoMatch",
            Self::BAD_TYPE_MISMATCH => "BadTypeMismatch",
            Self::BAD_METHOD_INVALID => "BadMethodInvalid",
            Self::BAD_ARGUMENTS_MISSING => "BadArgumentsMissing",
            Self::BAD_INVALID_STATE => "BadInvalidState",
            Self::BAD_NOT_EXECUTABLE => "BadNotExecutable",
            _ => return None,
        };
        Some(name)
    }
}

impl From<u32> for StatusCode {
    fn from(bits: u32) -> Self {
        Self(bits)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} (0x{:08X})", name, self.0),
            None => write!(f, "0x{:08X}", self.0),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_node_id_numeric() {
        let node = NodeId::numeric(2, 1001);
        assert_eq!(node.namespace_index, 2);
        assert!(node.is_numeric());
        assert_eq!(node.as_numeric(), Some(1001));
        assert_eq!(node.to_opc_string(), "ns=2;i=1001");
    }

    #[test]
    fn test_node_id_parse() {
        let node: NodeId = "ns=1;s=Boiler#1".parse().unwrap();
        assert_eq!(node, NodeId::string(1, "Boiler#1"));

        let node: NodeId = "i=85".parse().unwrap();
        assert!(node.is_standard());
        assert_eq!(node.as_numeric(), Some(85));

        let node: NodeId = "ns=2;g=550e8400-e29b-41d4-a716-446655440000".parse().unwrap();
        assert!(matches!(node.identifier, NodeIdentifier::Guid(_)));

        let node: NodeId = "ns=3;b=AQIDBA==".parse().unwrap();
        assert_eq!(node.identifier, NodeIdentifier::Opaque(vec![1, 2, 3, 4]));
    }

    #[test]
    fn test_node_id_parse_errors() {
        assert!("ns=x;i=1".parse::<NodeId>().is_err());
        assert!("ns=1".parse::<NodeId>().is_err());
        assert!("ns=1;q=1".parse::<NodeId>().is_err());
        assert!("i=abc".parse::<NodeId>().is_err());
    }

    #[test]
    fn test_node_id_equality_is_exact() {
        assert_ne!(NodeId::numeric(1, 5), NodeId::numeric(2, 5));
        assert_ne!(NodeId::string(1, "5"), NodeId::numeric(1, 5));
        assert_ne!(NodeId::string(1, "start"), NodeId::string(1, "Start"));
    }

    #[test]
    fn test_node_id_ordering_is_deterministic() {
        let set: BTreeSet<NodeId> = [
            NodeId::string(1, "b"),
            NodeId::numeric(1, 9),
            NodeId::numeric(0, 85),
            NodeId::string(1, "a"),
        ]
        .into_iter()
        .collect();
        let ordered: Vec<String> = set.iter().map(|n| n.to_string()).collect();
        assert_eq!(ordered, vec!["i=85", "ns=1;i=9", "ns=1;s=a", "ns=1;s=b"]);
    }

    #[test]
    fn test_qualified_name_parsing_and_matching() {
        let name = QualifiedName::from("1:Start");
        assert_eq!(name, QualifiedName::new(1, "Start"));
        assert_eq!(name.to_string(), "1:Start");

        let wildcard = QualifiedName::from("ProgramStateMachineType");
        assert_eq!(wildcard.namespace_index, 0);
        assert!(wildcard.matches(&QualifiedName::new(0, "ProgramStateMachineType")));
        assert!(wildcard.matches(&QualifiedName::new(3, "ProgramStateMachineType")));
        assert!(!name.matches(&QualifiedName::new(2, "Start")));

        let odd = QualifiedName::from("urn:thing");
        assert_eq!(odd.namespace_index, 0);
        assert_eq!(odd.name, "urn:thing");
    }

    #[test]
    fn test_node_class_mask() {
        assert_eq!(NodeClass::Method.value(), 4);
        assert_eq!(NodeClass::from_value(16), Some(NodeClass::VariableType));
        assert_eq!(NodeClass::from_value(3), None);
        assert_eq!(
            node_class_mask(&[NodeClass::Object, NodeClass::Variable, NodeClass::Method]),
            7
        );
        assert!(NodeClass::ObjectType.is_type());
        assert!(!NodeClass::ReferenceType.is_instance());
    }

    #[test]
    fn test_attribute_ids() {
        assert_eq!(AttributeId::Value.value(), 13);
        assert_eq!(AttributeId::Executable.value(), 21);
        assert_eq!(AttributeId::from_value(22), Some(AttributeId::UserExecutable));
        assert_eq!(AttributeId::from_value(99), None);
    }

    #[test]
    fn test_browse_direction_accepts() {
        assert!(BrowseDirection::Forward.accepts(true));
        assert!(!BrowseDirection::Forward.accepts(false));
        assert!(BrowseDirection::Inverse.accepts(false));
        assert!(BrowseDirection::Both.accepts(false));
    }

    #[test]
    fn test_status_code_severity() {
        assert!(StatusCode::GOOD.is_good());
        assert!(StatusCode::BAD_NOT_EXECUTABLE.is_bad());
        assert!(!StatusCode::BAD_NOT_EXECUTABLE.is_good());
        assert!(StatusCode(0x4000_0000).is_uncertain());
        assert_eq!(
            StatusCode::BAD_USER_ACCESS_DENIED.to_string(),
            "BadUserAccessDenied (0x801F0000)"
        );
        assert_eq!(StatusCode(0x8099_0000).to_string(), "0x80990000");
    }
}
