// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # UA Proxy Integration Tests
//!
//! Test utilities and integration tests for the `ua-proxy` crate. The
//! utilities serve an in-memory address space through a mock transport, so
//! every scenario runs without a server.
//!
//! ## Module Structure
//!
//! - [`common`]: Shared test utilities, fixtures, and helpers
//!   - `mocks`: `MockAddressSpace`, `MockTransport`, `MethodHandler`
//!   - `fixtures`: The Boiler with a program state machine, broken state
//!     machine types, cyclic and deep graphs, denied nodes
//!   - `builders`: `AddressSpaceBuilder` DSL and test configurations
//!   - `assertions`: Custom assertion helpers
//!   - `harness`: Manager setup and time-bounded test bodies
//!
//! ## Running Tests
//!
//! ```bash
//! # Run all integration tests
//! cargo test -p ua-proxy-tests
//!
//! # Run specific test suite
//! cargo test -p ua-proxy-tests --test integration_proxy
//! cargo test -p ua-proxy-tests --test integration_state_machine
//! cargo test -p ua-proxy-tests --test integration_lifecycle
//! ```
//!
//! ## Test Categories
//!
//! ### Proxy Tests (`integration_proxy.rs`)
//! - Tree shape, keys and type resolution
//! - Variable reads and cached values
//! - Cycle, depth, duplicate and access failures
//!
//! ### State Machine Tests (`integration_state_machine.rs`)
//! - State machine type introspection
//! - Broken type definitions
//! - Gated invocation on the Boiler
//!
//! ### Lifecycle Tests (`integration_lifecycle.rs`)
//! - Start, stop and their idempotence
//! - Cancellation versus timeout
//! - Inert proxies after stop
//!
//! ## Writing New Tests
//!
//! ```rust,ignore
//! use ua_proxy_tests::prelude::*;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let boiler = BoilerFixture::new();
//!     let manager = started_manager(boiler.transport.clone(), TestConfig::default_config()).await;
//!     let proxy = manager.get_object(&BoilerFixture::boiler_id()).await.unwrap();
//!     // ... test logic
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod common;

/// Re-export commonly used items for convenience.
pub mod prelude {
    pub use crate::common::assertions::*;
    pub use crate::common::builders::*;
    pub use crate::common::fixtures::*;
    pub use crate::common::harness::*;
    pub use crate::common::mocks::*;
    pub use crate::common::init_test_logging;
}
