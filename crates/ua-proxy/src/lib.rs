// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Client-side proxy objects for OPC UA address spaces.
//!
//! This crate mirrors remote Object nodes as local proxy trees. Variables
//! can be read, methods invoked, and the executability of state machine
//! methods checked, without hand-written browse and read plumbing.
//!
//! # Features
//!
//! - Proxy trees built from hierarchical references, with cycle and depth
//!   guards
//! - Type definition and supertype resolution with a shared cache
//! - State machine introspection (states, transitions, causes)
//! - Executability gate with explicit fresh reads and a wait primitive
//! - Method invocation where server refusals are data, not errors
//! - Lifecycle, request timeouts and caller cancellation on every operation
//!
//! # Error Handling
//!
//! ```text
//! ProxyError
//! ├── Communication - Transport failures, timeouts, bad service statuses
//! ├── Browse        - Access denied, unknown nodes, missing attributes
//! ├── Type          - Unresolvable, cyclic or malformed types
//! ├── Build         - Cyclic graphs, depth bound, duplicate keys
//! ├── Lifecycle     - NotStarted / Stopped
//! ├── Cancelled     - Caller cancellation
//! ├── Configuration - Invalid settings
//! └── Conversion    - Unexpected attribute value shapes
//! ```
//!
//! [`ProxyError::kind`] flattens the hierarchy into [`ErrorKind`].
//!
//! # Example
//!
//! ```rust,ignore
//! use ua_proxy::{NodeId, ProxyConfig, ProxyManager};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = ProxyManager::new(transport, ProxyConfig::default());
//!     manager.start().await?;
//!
//!     let boiler = manager.get_object(&NodeId::string(1, "Boiler#1")).await?;
//!     let simulation = boiler.object("Simulation").unwrap();
//!
//!     let start = simulation.method("start").unwrap();
//!     if start.read_executable_flag().await? {
//!         let outcome = start.invoke(vec![]).await?;
//!         println!("Start: {}", outcome);
//!     }
//!
//!     manager.stop().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod browse;
pub mod client;
pub mod config;
pub mod error;
pub mod gate;
pub mod ids;
pub mod invoke;
pub mod logging;
pub mod proxy;
pub mod resolver;
pub mod types;

// Re-export commonly used types
pub use error::{
    BrowseError, BuildError, CommunicationError, ConfigurationError, ConversionError, ErrorCode,
    ErrorKind, ErrorSeverity, LifecycleError, ProxyError, ProxyErrorContext, ProxyResult,
    TypeError,
};

pub use types::{
    AttributeId, BrowseDirection, LocalizedText, NodeClass, NodeId, NodeIdentifier,
    QualifiedName, StatusCode,
};

pub use config::{LogFormat, LoggingConfig, ProxyConfig, ProxyConfigBuilder};

// Re-export client types
pub use client::{
    BrowseRequest, BrowseResponse, CallRequest, CallResponse, CancellationToken, DataValue,
    ManagerState, ReferenceDescription, SessionStatsSnapshot, UaTransport, UaValue,
};

#[cfg(feature = "real-transport")]
pub use client::OpcUaSessionTransport;

// Re-export proxy types
pub use browse::{ChildReference, GraphBrowser};
pub use invoke::CallOutcome;
pub use proxy::{Children, MethodProxy, NodeInfo, ObjectProxy, ProxyManager, ProxyNode, VariableProxy};
pub use resolver::{
    StateDescription, StateMachineType, StateMachineTypeRef, TransitionDescription, TypeCache,
    TypeDefinition, TypeResolver,
};
