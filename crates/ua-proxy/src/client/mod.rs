// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session-facing layer of the proxy stack.
//!
//! - **Transport**: the three services consumed (browse, read, call)
//! - **Session**: lifecycle gate, timeouts, cancellation and statistics
//! - **Cancellation**: caller-owned tokens releasing in-flight requests
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │            ProxyManager / ObjectProxy / MethodProxy             │
//! └─────────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        ProxySession                             │
//! │        (state gate, request timeout, cancellation race)         │
//! └─────────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        UaTransport                              │
//! │         (mock address space or opcua session adapter)           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod cancel;
mod session;
mod transport;

#[cfg(feature = "real-transport")]
mod real_transport;

pub use cancel::CancellationToken;
pub use session::{ManagerState, ProxySession, SessionStats, SessionStatsSnapshot};
pub use transport::{
    BrowseRequest, BrowseResponse, CallRequest, CallResponse, DataValue, ReferenceDescription,
    UaTransport, UaValue,
};

#[cfg(feature = "real-transport")]
pub use real_transport::OpcUaSessionTransport;
