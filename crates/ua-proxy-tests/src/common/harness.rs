// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Harness
//!
//! High-level test harness pairing a mock transport with a started proxy
//! manager.
//!
//! ## Design Principles
//!
//! - One call from fixture to a started manager
//! - Every test body bounded in time, so a hang fails instead of stalling
//!   the suite
//! - The transport stays reachable for counters and failure injection

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use ua_proxy::{ProxyConfig, ProxyManager};

use crate::common::builders::TestConfig;
use crate::common::init_test_logging;
use crate::common::mocks::MockTransport;

// =============================================================================
// Test Harness
// =============================================================================

/// Configuration for the test harness.
#[derive(Debug, Clone)]
pub struct TestHarnessConfig {
    /// Name of the test, used in logs.
    pub test_name: String,

    /// Timeout for the whole test body.
    pub timeout: Duration,

    /// Proxy configuration of the manager.
    pub proxy: ProxyConfig,

    /// Whether to start the manager before the body runs.
    pub auto_start: bool,

    /// Whether to enable tracing for the test.
    pub enable_tracing: bool,
}

impl Default for TestHarnessConfig {
    fn default() -> Self {
        Self {
            test_name: "unknown_test".to_string(),
            timeout: Duration::from_secs(30),
            proxy: TestConfig::default_config(),
            auto_start: true,
            enable_tracing: false,
        }
    }
}

impl TestHarnessConfig {
    /// Create a new config with a test name.
    pub fn new(test_name: impl Into<String>) -> Self {
        Self {
            test_name: test_name.into(),
            ..Default::default()
        }
    }

    /// Set the timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the proxy configuration.
    pub fn proxy(mut self, proxy: ProxyConfig) -> Self {
        self.proxy = proxy;
        self
    }

    /// Leave the manager in `Created`.
    pub fn no_start(mut self) -> Self {
        self.auto_start = false;
        self
    }

    /// Enable tracing.
    pub fn with_tracing(mut self) -> Self {
        self.enable_tracing = true;
        self
    }
}

/// Resources provided by the test harness.
pub struct TestResources {
    /// Configuration used to create this harness.
    pub config: TestHarnessConfig,

    /// The mock transport behind the manager.
    pub transport: Arc<MockTransport>,

    /// The manager under test.
    pub manager: Arc<ProxyManager>,
}

/// Runs a test body against a manager over a mock transport.
pub struct TestHarness {
    config: TestHarnessConfig,
}

impl TestHarness {
    /// Create a harness with a configuration.
    pub fn new(config: TestHarnessConfig) -> Self {
        Self { config }
    }

    /// Create a harness with default configuration and a name.
    pub fn with_name(test_name: impl Into<String>) -> Self {
        Self::new(TestHarnessConfig::new(test_name))
    }

    /// Builds the resources: a manager over `transport`, started unless
    /// configured otherwise.
    pub async fn setup(&self, transport: Arc<MockTransport>) -> TestResources {
        if self.config.enable_tracing {
            init_test_logging();
        }

        let manager = Arc::new(ProxyManager::new(
            transport.clone(),
            self.config.proxy.clone(),
        ));
        if self.config.auto_start {
            manager
                .start()
                .await
                .unwrap_or_else(|e| panic!("{}: start failed: {}", self.config.test_name, e));
        }

        TestResources {
            config: self.config.clone(),
            transport,
            manager,
        }
    }

    /// Sets up resources, runs `body` within the configured timeout and
    /// stops the manager afterwards.
    pub async fn run<F, Fut, T>(&self, transport: Arc<MockTransport>, body: F) -> T
    where
        F: FnOnce(Arc<TestResources>) -> Fut,
        Fut: Future<Output = T>,
    {
        let resources = Arc::new(self.setup(transport).await);
        let result = with_timeout(self.config.timeout, body(resources.clone())).await;
        // Stop is idempotent; the body may already have stopped the manager.
        let _ = resources.manager.stop().await;
        result
    }
}

/// Starts a manager with test defaults over `transport`.
pub async fn started_manager(transport: Arc<MockTransport>, config: ProxyConfig) -> ProxyManager {
    let manager = ProxyManager::new(transport, config);
    manager.start().await.expect("manager starts");
    manager
}

/// Runs `future`, panicking if it does not finish within `timeout`.
pub async fn with_timeout<F, T>(timeout: Duration, future: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(value) => value,
        Err(_) => panic!("Test timed out after {:?}", timeout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::fixtures::BoilerFixture;
    use ua_proxy::ManagerState;

    #[tokio::test]
    async fn test_harness_starts_and_stops() {
        let boiler = BoilerFixture::new();
        let harness = TestHarness::with_name("harness_lifecycle");

        let manager = harness
            .run(boiler.transport.clone(), |resources| async move {
                assert_eq!(resources.manager.state(), ManagerState::Started);
                resources.manager.clone()
            })
            .await;

        assert_eq!(manager.state(), ManagerState::Stopped);
        assert!(boiler.transport.is_closed());
    }
}
