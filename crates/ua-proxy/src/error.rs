// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Proxy layer error types with diagnostics.
//!
//! This module provides the error hierarchy for every remote-facing
//! operation in the crate, designed for:
//!
//! - **Classification**: A flat [`ErrorKind`] for callers that only branch on kind
//! - **Diagnostics**: The failing node and browse name travel with build errors
//! - **Recovery**: Retry classification and hints, with no automatic retries
//!
//! # Error Categories
//!
//! ```text
//! ProxyError
//! ├── Communication - Transport failures, timeouts, bad service status
//! ├── Browse        - Access denied, unknown nodes, unreadable attributes
//! ├── Type          - Type lookup, supertype chains, state machine checks
//! ├── Build         - Cycles, depth bound, duplicate keys, failed children
//! ├── Lifecycle     - Operations before start or after stop
//! ├── Cancelled     - Caller-triggered cancellation
//! ├── Configuration - Invalid settings
//! └── Conversion    - Value shape mismatches
//! ```
//!
//! Bad statuses returned by a method call are not errors; they come back as
//! data in [`CallOutcome`](crate::invoke::CallOutcome).
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use ua_proxy::error::{ErrorKind, ProxyError};
//!
//! let error = ProxyError::timeout("read", "ns=1;s=Temp", Duration::from_secs(5));
//! assert_eq!(error.kind(), ErrorKind::Communication);
//! assert!(error.is_retryable());
//! ```

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tracing::Level;

use crate::types::{AttributeId, StatusCode};

// =============================================================================
// ProxyError - Main Error Type
// =============================================================================

/// The main error type for proxy operations.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Transport and service level failures.
    #[error("{0}")]
    Communication(#[from] CommunicationError),

    /// Node access failures.
    #[error("{0}")]
    Browse(#[from] BrowseError),

    /// Type resolution failures.
    #[error("{0}")]
    Type(#[from] TypeError),

    /// Proxy construction failures.
    #[error("{0}")]
    Build(#[from] BuildError),

    /// Manager lifecycle misuse.
    #[error("{0}")]
    Lifecycle(#[from] LifecycleError),

    /// The caller cancelled the operation.
    #[error("Operation '{operation}' was cancelled")]
    Cancelled {
        /// The cancelled operation.
        operation: String,
    },

    /// Configuration errors.
    #[error("{0}")]
    Configuration(#[from] ConfigurationError),

    /// Value conversion errors.
    #[error("{0}")]
    Conversion(#[from] ConversionError),
}

impl ProxyError {
    // =========================================================================
    // Factory Methods
    // =========================================================================

    /// Creates a communication error.
    #[inline]
    pub fn communication(error: CommunicationError) -> Self {
        Self::Communication(error)
    }

    /// Creates a browse error.
    #[inline]
    pub fn browse(error: BrowseError) -> Self {
        Self::Browse(error)
    }

    /// Creates a type error.
    #[inline]
    pub fn type_error(error: TypeError) -> Self {
        Self::Type(error)
    }

    /// Creates a build error.
    #[inline]
    pub fn build(error: BuildError) -> Self {
        Self::Build(error)
    }

    /// Creates a configuration error.
    #[inline]
    pub fn configuration(error: ConfigurationError) -> Self {
        Self::Configuration(error)
    }

    /// Creates a conversion error.
    #[inline]
    pub fn conversion(error: ConversionError) -> Self {
        Self::Conversion(error)
    }

    // =========================================================================
    // Convenience Factory Methods
    // =========================================================================

    /// Creates a transport failure.
    pub fn transport(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Communication(CommunicationError::transport(operation, message))
    }

    /// Creates a timeout error.
    pub fn timeout(
        operation: impl Into<String>,
        node_id: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self::Communication(CommunicationError::timeout(operation, node_id, duration))
    }

    /// Creates a cancellation error.
    pub fn cancelled(operation: impl Into<String>) -> Self {
        Self::Cancelled {
            operation: operation.into(),
        }
    }

    /// Creates a not started error.
    pub fn not_started(operation: impl Into<String>) -> Self {
        Self::Lifecycle(LifecycleError::NotStarted {
            operation: operation.into(),
        })
    }

    /// Creates a stopped error.
    pub fn stopped(operation: impl Into<String>) -> Self {
        Self::Lifecycle(LifecycleError::Stopped {
            operation: operation.into(),
        })
    }

    /// Creates a node not found error.
    pub fn node_not_found(node_id: impl Into<String>) -> Self {
        Self::Browse(BrowseError::node_not_found(node_id))
    }

    /// Maps a bad service status on a node to the matching error.
    ///
    /// Permission and unknown-node statuses keep their own kinds; everything
    /// else is a communication failure carrying the status.
    pub fn from_status(
        operation: impl Into<String>,
        node_id: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        let node_id = node_id.into();
        match status {
            StatusCode::BAD_USER_ACCESS_DENIED => {
                Self::Browse(BrowseError::access_denied(node_id))
            }
            StatusCode::BAD_NODE_ID_UNKNOWN => Self::Browse(BrowseError::node_not_found(node_id)),
            _ => Self::Communication(CommunicationError::bad_status(operation, node_id, status)),
        }
    }

    // =========================================================================
    // Error Properties
    // =========================================================================

    /// Returns the flat classification of this error.
    ///
    /// A failed child build reports the kind of its underlying cause.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Communication(_) => ErrorKind::Communication,
            Self::Browse(e) => e.kind(),
            Self::Type(e) => e.kind(),
            Self::Build(e) => e.kind(),
            Self::Lifecycle(LifecycleError::NotStarted { .. }) => ErrorKind::NotStarted,
            Self::Lifecycle(LifecycleError::Stopped { .. }) => ErrorKind::Stopped,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Conversion(_) => ErrorKind::Conversion,
        }
    }

    /// Returns `true` if this error is retryable.
    ///
    /// The crate never retries on its own; this only informs caller policy.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Communication(e) => e.is_retryable(),
            Self::Build(BuildError::ChildFailed { source, .. }) => source.is_retryable(),
            _ => false,
        }
    }

    /// Returns the suggested retry delay for this error.
    ///
    /// Returns `None` if the error is not retryable.
    pub fn suggested_retry_delay(&self) -> Option<Duration> {
        match self {
            Self::Communication(e) => e.suggested_retry_delay(),
            Self::Build(BuildError::ChildFailed { source, .. }) => source.suggested_retry_delay(),
            _ => None,
        }
    }

    /// Returns the severity level of this error.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Communication(e) => e.severity(),
            Self::Browse(e) => e.severity(),
            Self::Type(e) => e.severity(),
            Self::Build(e) => e.severity(),
            Self::Lifecycle(_) => ErrorSeverity::Warning,
            Self::Cancelled { .. } => ErrorSeverity::Info,
            Self::Configuration(_) => ErrorSeverity::Critical,
            Self::Conversion(_) => ErrorSeverity::Error,
        }
    }

    /// Returns the error category for logging.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Communication(_) => "communication",
            Self::Browse(_) => "browse",
            Self::Type(_) => "type",
            Self::Build(_) => "build",
            Self::Lifecycle(_) => "lifecycle",
            Self::Cancelled { .. } => "cancelled",
            Self::Configuration(_) => "configuration",
            Self::Conversion(_) => "conversion",
        }
    }

    /// Returns a unique error code for this error.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Communication(e) => e.error_code(),
            Self::Browse(e) => e.error_code(),
            Self::Type(e) => e.error_code(),
            Self::Build(e) => e.error_code(),
            Self::Lifecycle(e) => e.error_code(),
            Self::Cancelled { .. } => ErrorCode::new(6, 1),
            Self::Configuration(e) => e.error_code(),
            Self::Conversion(e) => e.error_code(),
        }
    }

    /// Returns recovery hints for this error.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        match self {
            Self::Communication(e) => e.recovery_hints(),
            Self::Browse(e) => e.recovery_hints(),
            Self::Type(e) => e.recovery_hints(),
            Self::Build(e) => e.recovery_hints(),
            Self::Lifecycle(e) => e.recovery_hints(),
            Self::Cancelled { .. } => vec!["Reissue the operation if the result is still needed"],
            Self::Configuration(_) => vec!["Check the proxy configuration values"],
            Self::Conversion(_) => vec!["Check the data type of the remote node"],
        }
    }

    /// Returns the node and browse name of the child whose build failed.
    pub fn failing_child(&self) -> Option<(&str, &str)> {
        match self {
            Self::Build(BuildError::ChildFailed {
                node_id,
                browse_name,
                ..
            }) => Some((node_id.as_str(), browse_name.as_str())),
            _ => None,
        }
    }

    /// Returns the tracing level for this error.
    pub fn tracing_level(&self) -> Level {
        self.severity().to_tracing_level()
    }

    /// Logs this error with appropriate level and context.
    pub fn log(&self, context: &str) {
        let code = self.error_code();

        match self.tracing_level() {
            Level::ERROR => tracing::error!(
                error_code = %code,
                category = self.category(),
                context = context,
                retryable = self.is_retryable(),
                "{self}"
            ),
            Level::WARN => tracing::warn!(
                error_code = %code,
                category = self.category(),
                context = context,
                retryable = self.is_retryable(),
                "{self}"
            ),
            _ => tracing::debug!(
                error_code = %code,
                category = self.category(),
                context = context,
                retryable = self.is_retryable(),
                "{self}"
            ),
        }
    }
}

// =============================================================================
// ErrorKind
// =============================================================================

/// Flat classification of proxy errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Transport hiccup or timeout. Retryable.
    Communication,
    /// Permission failure.
    AccessDenied,
    /// Missing node, type or name.
    NotFound,
    /// The instance graph loops back onto the active build path.
    CyclicGraph,
    /// A supertype chain loops.
    CyclicType,
    /// A supertype chain does not terminate or a type node is malformed.
    MalformedType,
    /// The build went deeper than the configured bound.
    DepthExceeded,
    /// A state machine definition is inconsistent.
    InvalidStateMachine,
    /// Two siblings map to the same child key.
    DuplicateChild,
    /// The manager has not been started.
    NotStarted,
    /// The manager has been stopped.
    Stopped,
    /// The caller cancelled the operation.
    Cancelled,
    /// Invalid configuration.
    Configuration,
    /// Unexpected value shape.
    Conversion,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// =============================================================================
// CommunicationError
// =============================================================================

/// Failures of the request/response exchange itself.
#[derive(Debug, Error)]
pub enum CommunicationError {
    /// The transport failed to deliver the request or response.
    #[error("Transport failure during {operation}: {message}")]
    Transport {
        /// The operation.
        operation: String,
        /// Failure description.
        message: String,
    },

    /// No response within the request timeout.
    #[error("{operation} on '{node_id}' timed out after {duration:?}")]
    Timeout {
        /// The operation.
        operation: String,
        /// Target node.
        node_id: String,
        /// Timeout duration.
        duration: Duration,
    },

    /// The service answered with a bad status.
    #[error("{operation} on '{node_id}' failed with status {status}")]
    BadStatus {
        /// The operation.
        operation: String,
        /// Target node.
        node_id: String,
        /// Service status.
        status: StatusCode,
    },
}

impl CommunicationError {
    /// Creates a transport failure.
    pub fn transport(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(
        operation: impl Into<String>,
        node_id: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self::Timeout {
            operation: operation.into(),
            node_id: node_id.into(),
            duration,
        }
    }

    /// Creates a bad status error.
    pub fn bad_status(
        operation: impl Into<String>,
        node_id: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self::BadStatus {
            operation: operation.into(),
            node_id: node_id.into(),
            status,
        }
    }

    /// Returns `true` if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } => true,
            Self::BadStatus { status, .. } => matches!(
                *status,
                StatusCode::BAD_TIMEOUT | StatusCode::BAD_COMMUNICATION_ERROR
            ),
        }
    }

    /// Returns the suggested retry delay.
    pub fn suggested_retry_delay(&self) -> Option<Duration> {
        match self {
            Self::Transport { .. } => Some(Duration::from_millis(500)),
            Self::Timeout { .. } => Some(Duration::from_secs(1)),
            Self::BadStatus { .. } if self.is_retryable() => Some(Duration::from_millis(500)),
            Self::BadStatus { .. } => None,
        }
    }

    /// Returns the severity level.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Timeout { .. } => ErrorSeverity::Warning,
            Self::Transport { .. } => ErrorSeverity::Error,
            Self::BadStatus { .. } => ErrorSeverity::Warning,
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Transport { .. } => ErrorCode::new(1, 1),
            Self::Timeout { .. } => ErrorCode::new(1, 2),
            Self::BadStatus { .. } => ErrorCode::new(1, 3),
        }
    }

    /// Returns recovery hints.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        match self {
            Self::Transport { .. } => vec![
                "Check the session and network connection",
                "Retry the operation",
            ],
            Self::Timeout { .. } => vec![
                "Increase request_timeout",
                "Check server load",
            ],
            Self::BadStatus { .. } => vec!["Inspect the status code returned by the server"],
        }
    }
}

// =============================================================================
// BrowseError
// =============================================================================

/// Failures to access a specific node.
#[derive(Debug, Error)]
pub enum BrowseError {
    /// The node does not exist on the server.
    #[error("Node not found: '{node_id}'")]
    NodeNotFound {
        /// The node ID.
        node_id: String,
    },

    /// The server denied access to the node.
    #[error("Access denied for node '{node_id}'")]
    AccessDenied {
        /// The node ID.
        node_id: String,
    },

    /// A required attribute could not be read.
    #[error("Attribute {attribute} of '{node_id}' is unavailable: {status}")]
    AttributeUnavailable {
        /// The node ID.
        node_id: String,
        /// The attribute.
        attribute: AttributeId,
        /// Read status.
        status: StatusCode,
    },
}

impl BrowseError {
    /// Creates a node not found error.
    pub fn node_not_found(node_id: impl Into<String>) -> Self {
        Self::NodeNotFound {
            node_id: node_id.into(),
        }
    }

    /// Creates an access denied error.
    pub fn access_denied(node_id: impl Into<String>) -> Self {
        Self::AccessDenied {
            node_id: node_id.into(),
        }
    }

    /// Creates an attribute unavailable error.
    pub fn attribute_unavailable(
        node_id: impl Into<String>,
        attribute: AttributeId,
        status: StatusCode,
    ) -> Self {
        Self::AttributeUnavailable {
            node_id: node_id.into(),
            attribute,
            status,
        }
    }

    /// Returns the flat kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AccessDenied { .. } => ErrorKind::AccessDenied,
            Self::NodeNotFound { .. } | Self::AttributeUnavailable { .. } => ErrorKind::NotFound,
        }
    }

    /// Returns the severity level.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::AccessDenied { .. } => ErrorSeverity::Error,
            _ => ErrorSeverity::Warning,
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::NodeNotFound { .. } => ErrorCode::new(2, 1),
            Self::AccessDenied { .. } => ErrorCode::new(2, 2),
            Self::AttributeUnavailable { .. } => ErrorCode::new(2, 3),
        }
    }

    /// Returns recovery hints.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        match self {
            Self::NodeNotFound { .. } => vec![
                "Verify the node ID is correct",
                "Browse the parent to discover available nodes",
            ],
            Self::AccessDenied { .. } => vec![
                "Check user permissions for this node",
                "Contact server administrator",
            ],
            Self::AttributeUnavailable { .. } => {
                vec!["Verify the node class supports the attribute"]
            }
        }
    }
}

// =============================================================================
// TypeError
// =============================================================================

/// Type resolution failures.
#[derive(Debug, Error)]
pub enum TypeError {
    /// No type with the requested name exists.
    #[error("Type not found: '{name}'")]
    NotFound {
        /// Requested type name or id.
        name: String,
    },

    /// The instance has no type definition reference.
    #[error("Node '{node_id}' has no type definition")]
    MissingTypeDefinition {
        /// The instance node.
        node_id: String,
    },

    /// A supertype chain revisits a type.
    #[error("Cyclic supertype chain at '{type_id}': {}", chain.join(" -> "))]
    CyclicType {
        /// The type that reappeared.
        type_id: String,
        /// The chain walked so far.
        chain: Vec<String>,
    },

    /// The type node is not usable as a type definition.
    #[error("Malformed type '{type_id}': {reason}")]
    MalformedType {
        /// The type node.
        type_id: String,
        /// Reason.
        reason: String,
    },

    /// The state machine definition is inconsistent.
    #[error("Invalid state machine '{type_name}': {reason}")]
    InvalidStateMachine {
        /// The state machine type.
        type_name: String,
        /// Reason.
        reason: String,
    },
}

impl TypeError {
    /// Creates a type not found error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Creates a missing type definition error.
    pub fn missing_type_definition(node_id: impl Into<String>) -> Self {
        Self::MissingTypeDefinition {
            node_id: node_id.into(),
        }
    }

    /// Creates a malformed type error.
    pub fn malformed(type_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedType {
            type_id: type_id.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid state machine error.
    pub fn invalid_state_machine(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidStateMachine {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    /// Returns the flat kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } | Self::MissingTypeDefinition { .. } => ErrorKind::NotFound,
            Self::CyclicType { .. } => ErrorKind::CyclicType,
            Self::MalformedType { .. } => ErrorKind::MalformedType,
            Self::InvalidStateMachine { .. } => ErrorKind::InvalidStateMachine,
        }
    }

    /// Returns the severity level.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotFound { .. } | Self::MissingTypeDefinition { .. } => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::new(3, 1),
            Self::MissingTypeDefinition { .. } => ErrorCode::new(3, 2),
            Self::CyclicType { .. } => ErrorCode::new(3, 3),
            Self::MalformedType { .. } => ErrorCode::new(3, 4),
            Self::InvalidStateMachine { .. } => ErrorCode::new(3, 5),
        }
    }

    /// Returns recovery hints.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        match self {
            Self::NotFound { .. } => vec![
                "Check the type name and namespace",
                "Verify the server exposes the type under BaseObjectType",
            ],
            Self::MissingTypeDefinition { .. } => {
                vec!["The node has no HasTypeDefinition reference"]
            }
            Self::CyclicType { .. } | Self::MalformedType { .. } => {
                vec!["The server's type hierarchy is malformed; report it to the server vendor"]
            }
            Self::InvalidStateMachine { .. } => vec![
                "Check FromState/ToState references of every transition",
                "A state machine may declare at most one initial state",
            ],
        }
    }
}

// =============================================================================
// BuildError
// =============================================================================

/// Proxy construction failures.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A node reappeared on the active build path.
    #[error("Cyclic reference to '{node_id}' via {}", path.join(" / "))]
    CyclicGraph {
        /// The node that reappeared.
        node_id: String,
        /// Browse names from the root down to the offending reference.
        path: Vec<String>,
    },

    /// The build went deeper than the configured bound.
    #[error("Depth {depth} at '{node_id}' exceeds maximum {max}")]
    DepthExceeded {
        /// The node that crossed the bound.
        node_id: String,
        /// Its depth.
        depth: usize,
        /// Configured maximum.
        max: usize,
    },

    /// Two children map to the same key.
    #[error("Node '{parent}' has more than one child keyed '{key}'")]
    DuplicateChildName {
        /// The parent node.
        parent: String,
        /// The colliding key.
        key: String,
    },

    /// The root of a build is not an Object node.
    #[error("Node '{node_id}' is a {node_class}, not an Object")]
    NotAnObject {
        /// The node.
        node_id: String,
        /// Its class.
        node_class: String,
    },

    /// A child could not be built, aborting the whole tree.
    #[error("Failed to build child '{browse_name}' ({node_id}): {source}")]
    ChildFailed {
        /// The failing child.
        node_id: String,
        /// Its browse name.
        browse_name: String,
        /// Underlying failure.
        #[source]
        source: Box<ProxyError>,
    },
}

impl BuildError {
    /// Creates a cyclic graph error.
    pub fn cyclic_graph(node_id: impl Into<String>, path: Vec<String>) -> Self {
        Self::CyclicGraph {
            node_id: node_id.into(),
            path,
        }
    }

    /// Creates a depth exceeded error.
    pub fn depth_exceeded(node_id: impl Into<String>, depth: usize, max: usize) -> Self {
        Self::DepthExceeded {
            node_id: node_id.into(),
            depth,
            max,
        }
    }

    /// Creates a duplicate child error.
    pub fn duplicate_child(parent: impl Into<String>, key: impl Into<String>) -> Self {
        Self::DuplicateChildName {
            parent: parent.into(),
            key: key.into(),
        }
    }

    /// Creates a not-an-object error.
    pub fn not_an_object(node_id: impl Into<String>, node_class: impl Into<String>) -> Self {
        Self::NotAnObject {
            node_id: node_id.into(),
            node_class: node_class.into(),
        }
    }

    /// Wraps the failure of a child build.
    pub fn child_failed(
        node_id: impl Into<String>,
        browse_name: impl Into<String>,
        source: ProxyError,
    ) -> Self {
        Self::ChildFailed {
            node_id: node_id.into(),
            browse_name: browse_name.into(),
            source: Box::new(source),
        }
    }

    /// Returns the flat kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CyclicGraph { .. } => ErrorKind::CyclicGraph,
            Self::DepthExceeded { .. } => ErrorKind::DepthExceeded,
            Self::DuplicateChildName { .. } => ErrorKind::DuplicateChild,
            Self::NotAnObject { .. } => ErrorKind::NotFound,
            Self::ChildFailed { source, .. } => source.kind(),
        }
    }

    /// Returns the severity level.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ChildFailed { source, .. } => source.severity(),
            Self::NotAnObject { .. } => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::CyclicGraph { .. } => ErrorCode::new(4, 1),
            Self::DepthExceeded { .. } => ErrorCode::new(4, 2),
            Self::DuplicateChildName { .. } => ErrorCode::new(4, 3),
            Self::NotAnObject { .. } => ErrorCode::new(4, 4),
            Self::ChildFailed { source, .. } => source.error_code(),
        }
    }

    /// Returns recovery hints.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        match self {
            Self::CyclicGraph { .. } => {
                vec!["Build a proxy for a node below the cycle instead"]
            }
            Self::DepthExceeded { .. } => vec![
                "Increase max_depth",
                "Build a proxy for a deeper sub-object",
            ],
            Self::DuplicateChildName { .. } => {
                vec!["Method keys are lower-cased; check for siblings differing only in case"]
            }
            Self::NotAnObject { .. } => vec!["Pass the NodeId of an Object node"],
            Self::ChildFailed { source, .. } => source.recovery_hints(),
        }
    }
}

// =============================================================================
// LifecycleError
// =============================================================================

/// Manager lifecycle misuse.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// An operation ran before `start()`.
    #[error("Proxy manager not started (operation: {operation})")]
    NotStarted {
        /// The rejected operation.
        operation: String,
    },

    /// An operation ran after `stop()` began.
    #[error("Proxy manager stopped (operation: {operation})")]
    Stopped {
        /// The rejected operation.
        operation: String,
    },
}

impl LifecycleError {
    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotStarted { .. } => ErrorCode::new(5, 1),
            Self::Stopped { .. } => ErrorCode::new(5, 2),
        }
    }

    /// Returns recovery hints.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        match self {
            Self::NotStarted { .. } => vec!["Call ProxyManager::start() first"],
            Self::Stopped { .. } => vec!["Create a new ProxyManager; a stopped manager cannot restart"],
        }
    }
}

// =============================================================================
// ConfigurationError
// =============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// A node id string could not be parsed.
    #[error("Invalid node ID '{value}': {reason}")]
    InvalidNodeId {
        /// The input.
        value: String,
        /// Reason.
        reason: String,
    },

    /// A field holds an unusable value.
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue {
        /// Field name.
        field: String,
        /// Reason.
        reason: String,
    },

    /// A configuration document could not be parsed.
    #[error("Failed to parse {format} configuration: {message}")]
    Parse {
        /// Document format.
        format: &'static str,
        /// Parser message.
        message: String,
    },
}

impl ConfigurationError {
    /// Creates an invalid node ID error.
    pub fn invalid_node_id(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidNodeId {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid value error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a parse error.
    pub fn parse(format: &'static str, message: impl Into<String>) -> Self {
        Self::Parse {
            format,
            message: message.into(),
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidNodeId { .. } => ErrorCode::new(7, 1),
            Self::InvalidValue { .. } => ErrorCode::new(7, 2),
            Self::Parse { .. } => ErrorCode::new(7, 3),
        }
    }
}

// =============================================================================
// ConversionError
// =============================================================================

/// Value conversion errors.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// The value does not have the expected shape.
    #[error("Type mismatch reading {attribute} of '{node_id}': expected {expected}, got {actual}")]
    TypeMismatch {
        /// The node.
        node_id: String,
        /// The attribute.
        attribute: AttributeId,
        /// Expected shape.
        expected: &'static str,
        /// Actual shape.
        actual: String,
    },
}

impl ConversionError {
    /// Creates a type mismatch error.
    pub fn type_mismatch(
        node_id: impl Into<String>,
        attribute: AttributeId,
        expected: &'static str,
        actual: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            node_id: node_id.into(),
            attribute,
            expected,
            actual: actual.into(),
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::TypeMismatch { .. } => ErrorCode::new(8, 1),
        }
    }
}

// =============================================================================
// ErrorSeverity
// =============================================================================

/// Error severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    /// Informational - no action required.
    Info,
    /// Warning - action may be required.
    Warning,
    /// Error - action required, but recoverable.
    Error,
    /// Critical - immediate action required.
    Critical,
}

impl ErrorSeverity {
    /// Converts to tracing level.
    pub fn to_tracing_level(self) -> Level {
        match self {
            Self::Info => Level::INFO,
            Self::Warning => Level::WARN,
            Self::Error | Self::Critical => Level::ERROR,
        }
    }

    /// Returns the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// ErrorCode
// =============================================================================

/// Structured error code for categorization.
///
/// Format: `UA-XXYY` where XX is category and YY is specific error.
///
/// Categories:
/// - 1: Communication
/// - 2: Browse
/// - 3: Type
/// - 4: Build
/// - 5: Lifecycle
/// - 6: Cancellation
/// - 7: Configuration
/// - 8: Conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode {
    /// Category.
    pub category: u8,
    /// Specific error within category.
    pub code: u8,
}

impl ErrorCode {
    /// Creates a new error code.
    pub const fn new(category: u8, code: u8) -> Self {
        Self { category, code }
    }

    /// Returns the full error code as a u16.
    pub fn as_u16(&self) -> u16 {
        ((self.category as u16) << 8) | (self.code as u16)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UA-{:02X}{:02X}", self.category, self.code)
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// A Result type with ProxyError.
pub type ProxyResult<T> = Result<T, ProxyError>;

// =============================================================================
// Error Context Extension
// =============================================================================

/// Extension trait for attaching diagnostic context to proxy errors.
pub trait ProxyErrorContext<T> {
    /// Logs the error with node context before passing it on.
    fn with_node(self, node_id: &str) -> ProxyResult<T>;

    /// Logs the error at its severity with operation context.
    fn log_err(self, operation: &str) -> ProxyResult<T>;
}

impl<T> ProxyErrorContext<T> for ProxyResult<T> {
    fn with_node(self, node_id: &str) -> ProxyResult<T> {
        self.map_err(|e| {
            tracing::debug!(node_id = node_id, error = %e, "proxy error with node context");
            e
        })
    }

    fn log_err(self, operation: &str) -> ProxyResult<T> {
        self.map_err(|e| {
            e.log(operation);
            e
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let denied = ProxyError::from_status("browse", "ns=1;i=7", StatusCode::BAD_USER_ACCESS_DENIED);
        assert_eq!(denied.kind(), ErrorKind::AccessDenied);
        assert!(!denied.is_retryable());

        let unknown = ProxyError::from_status("read", "ns=1;i=7", StatusCode::BAD_NODE_ID_UNKNOWN);
        assert_eq!(unknown.kind(), ErrorKind::NotFound);

        let busy = ProxyError::from_status("read", "ns=1;i=7", StatusCode::BAD_TIMEOUT);
        assert_eq!(busy.kind(), ErrorKind::Communication);
        assert!(busy.is_retryable());

        let other = ProxyError::from_status("read", "ns=1;i=7", StatusCode::BAD_TYPE_MISMATCH);
        assert_eq!(other.kind(), ErrorKind::Communication);
        assert!(!other.is_retryable());
    }

    #[test]
    fn test_communication_retryable() {
        let err = ProxyError::transport("browse", "connection reset");
        assert!(err.is_retryable());
        assert_eq!(err.suggested_retry_delay(), Some(Duration::from_millis(500)));

        let err = ProxyError::timeout("read", "ns=1;i=1", Duration::from_secs(2));
        assert!(err.is_retryable());
        assert_eq!(err.severity(), ErrorSeverity::Warning);
    }

    #[test]
    fn test_cancelled_distinct_from_timeout() {
        let cancelled = ProxyError::cancelled("call");
        let timeout = ProxyError::timeout("call", "ns=1;i=1", Duration::from_secs(1));
        assert_eq!(cancelled.kind(), ErrorKind::Cancelled);
        assert_eq!(timeout.kind(), ErrorKind::Communication);
        assert!(!cancelled.is_retryable());
    }

    #[test]
    fn test_child_failed_reports_inner_kind() {
        let inner = ProxyError::build(BuildError::cyclic_graph(
            "ns=1;i=1",
            vec!["A".into(), "B".into()],
        ));
        let wrapped = ProxyError::build(BuildError::child_failed("ns=1;i=2", "B", inner));

        assert_eq!(wrapped.kind(), ErrorKind::CyclicGraph);
        assert_eq!(wrapped.failing_child(), Some(("ns=1;i=2", "B")));
        assert!(wrapped.to_string().contains("'B'"));

        let timeout = ProxyError::timeout("read", "ns=1;i=3", Duration::from_secs(1));
        let wrapped = ProxyError::build(BuildError::child_failed("ns=1;i=3", "Temp", timeout));
        assert!(wrapped.is_retryable());
    }

    #[test]
    fn test_lifecycle_kinds() {
        assert_eq!(ProxyError::not_started("get_object").kind(), ErrorKind::NotStarted);
        assert_eq!(ProxyError::stopped("get_object").kind(), ErrorKind::Stopped);
    }

    #[test]
    fn test_type_error_kinds() {
        assert_eq!(
            ProxyError::type_error(TypeError::not_found("Nope")).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            ProxyError::type_error(TypeError::invalid_state_machine("X", "bad")).kind(),
            ErrorKind::InvalidStateMachine
        );
        let cyclic = TypeError::CyclicType {
            type_id: "ns=1;i=5".into(),
            chain: vec!["ns=1;i=5".into(), "ns=1;i=6".into()],
        };
        assert!(cyclic.to_string().contains("ns=1;i=5 -> ns=1;i=6"));
    }

    #[test]
    fn test_error_code_display() {
        let code = ErrorCode::new(4, 2);
        assert_eq!(code.to_string(), "UA-0402");
        assert_eq!(code.as_u16(), 0x0402);
        assert_eq!(
            ProxyError::build(BuildError::depth_exceeded("n", 33, 32)).error_code(),
            code
        );
    }

    #[test]
    fn test_recovery_hints() {
        let err = ProxyError::not_started("get_object");
        assert!(!err.recovery_hints().is_empty());
        let err = ProxyError::node_not_found("ns=1;i=1");
        assert!(!err.recovery_hints().is_empty());
    }
}
