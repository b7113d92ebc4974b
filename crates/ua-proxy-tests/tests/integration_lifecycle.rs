// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Lifecycle Integration Tests
//!
//! Integration tests for the manager lifecycle and request control:
//!
//! - Start and stop, including repeated calls
//! - Operations before start and after stop
//! - Cancellation versus timeout
//! - In-flight requests released by stop
//!
//! ## Test Categories
//!
//! - `test_lifecycle_*`: State transitions
//! - `test_stopped_*`: Behavior after stop
//! - `test_cancel_*`: Caller cancellation
//! - `test_timeout_*`: Request timeouts

use std::sync::Arc;
use std::time::Duration;

use ua_proxy::{CancellationToken, ErrorKind, ManagerState, ProxyManager};

use ua_proxy_tests::prelude::*;

fn unstarted(boiler: &BoilerFixture) -> ProxyManager {
    ProxyManager::new(boiler.transport.clone(), TestConfig::default_config())
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[tokio::test]
async fn test_lifecycle_operations_before_start() {
    init_test_logging();
    let boiler = BoilerFixture::new();
    let manager = unstarted(&boiler);
    assert_eq!(manager.state(), ManagerState::Created);

    manager
        .get_object(&BoilerFixture::boiler_id())
        .await
        .assert_kind(ErrorKind::NotStarted);
    manager
        .get_state_machine_type("ProgramStateMachineType")
        .await
        .assert_kind(ErrorKind::NotStarted);
    assert_eq!(boiler.transport.request_count(), 0);
}

#[tokio::test]
async fn test_lifecycle_start_is_idempotent() {
    let boiler = BoilerFixture::new();
    let manager = unstarted(&boiler);

    manager.start().await.assert_ok();
    let warmed = boiler.transport.request_count();
    assert!(warmed > 0);
    assert!(!manager.type_resolver().cache().is_empty());

    manager.start().await.assert_ok();
    assert_eq!(manager.state(), ManagerState::Started);
    assert_eq!(boiler.transport.request_count(), warmed);
}

#[tokio::test]
async fn test_lifecycle_stop_is_idempotent() {
    let boiler = BoilerFixture::new();
    let manager = started_manager(boiler.transport.clone(), TestConfig::default_config()).await;

    manager.stop().await.assert_ok();
    manager.stop().await.assert_ok();

    assert_eq!(manager.state(), ManagerState::Stopped);
    assert_eq!(boiler.transport.close_count(), 1);
}

#[tokio::test]
async fn test_lifecycle_stop_without_start() {
    let boiler = BoilerFixture::new();
    let manager = unstarted(&boiler);

    manager.stop().await.assert_ok();
    assert_eq!(manager.state(), ManagerState::Stopped);
    assert!(boiler.transport.is_closed());
}

#[tokio::test]
async fn test_lifecycle_no_restart_after_stop() {
    let boiler = BoilerFixture::new();
    let manager = started_manager(boiler.transport.clone(), TestConfig::default_config()).await;
    manager.stop().await.unwrap();

    manager.start().await.assert_kind(ErrorKind::Stopped);
    assert_eq!(manager.state(), ManagerState::Stopped);
}

#[tokio::test]
async fn test_lifecycle_failed_warm_can_be_retried() {
    let boiler = BoilerFixture::new();
    let manager = unstarted(&boiler);

    boiler.transport.fail_next(MockOperation::Read);
    let err = manager.start().await.assert_kind(ErrorKind::Communication);
    assert!(err.is_retryable());
    assert_eq!(manager.state(), ManagerState::Created);

    manager.start().await.assert_ok();
    assert_eq!(manager.state(), ManagerState::Started);
    manager
        .get_object(&BoilerFixture::boiler_id())
        .await
        .assert_ok();
}

#[tokio::test]
async fn test_lifecycle_concurrent_builds() {
    let boiler = BoilerFixture::new();
    let manager = started_manager(boiler.transport.clone(), TestConfig::default_config()).await;
    let boiler_id = BoilerFixture::boiler_id();

    let (first, second) = futures::join!(
        manager.get_object(&boiler_id),
        manager.get_object(&boiler_id)
    );
    let first = first.assert_ok();
    let second = second.assert_ok();

    assert_eq!(first.node_id(), second.node_id());
    assert_eq!(first.describe(), second.describe());

    // Whichever build landed in the cache is served from now on.
    let third = manager.get_object(&boiler_id).await.unwrap();
    assert!(Arc::ptr_eq(&third, &first) || Arc::ptr_eq(&third, &second));
}

#[tokio::test]
async fn test_lifecycle_harness_stops_manager() {
    let boiler = BoilerFixture::new();
    let harness = TestHarness::new(
        TestHarnessConfig::new("lifecycle_harness")
            .timeout(Duration::from_secs(5))
            .with_tracing(),
    );

    harness
        .run(boiler.transport.clone(), |resources| async move {
            let proxy = resources
                .manager
                .get_object(&BoilerFixture::boiler_id())
                .await
                .unwrap();
            proxy.assert_type_name("BoilerType");
        })
        .await;

    assert!(boiler.transport.is_closed());
}

// =============================================================================
// Stopped Tests
// =============================================================================

#[tokio::test]
async fn test_stopped_proxies_are_inert() {
    let boiler = BoilerFixture::new();
    let manager = started_manager(boiler.transport.clone(), TestConfig::default_config()).await;
    let proxy = manager.get_object(&BoilerFixture::boiler_id()).await.unwrap();
    let temperature = proxy.variable("Temperature").unwrap();
    temperature.read_value().await.unwrap();

    manager.stop().await.unwrap();
    let requests = boiler.transport.request_count();

    manager
        .get_object(&BoilerFixture::boiler_id())
        .await
        .assert_kind(ErrorKind::Stopped);
    temperature
        .read_value()
        .await
        .assert_kind(ErrorKind::Stopped);

    let start = proxy.find("Simulation/Start").unwrap().as_method().unwrap();
    start
        .read_executable_flag()
        .await
        .assert_kind(ErrorKind::Stopped);
    start.invoke(vec![]).await.assert_kind(ErrorKind::Stopped);

    assert_eq!(boiler.transport.request_count(), requests);
    // Local state outlives the session.
    temperature
        .cached_value()
        .expect("cached value")
        .assert_value_approx(21.5, 1e-9);
    assert_eq!(start.executable_flag(), Some(true));
}

#[tokio::test]
async fn test_stopped_clears_caches() {
    let boiler = BoilerFixture::new();
    let manager = started_manager(boiler.transport.clone(), TestConfig::default_config()).await;
    manager
        .get_state_machine_type("ProgramStateMachineType")
        .await
        .unwrap();
    assert!(!manager.type_resolver().cache().is_empty());

    manager.stop().await.unwrap();
    assert!(manager.type_resolver().cache().is_empty());
    manager
        .get_state_machine_type("ProgramStateMachineType")
        .await
        .assert_kind(ErrorKind::Stopped);
}

#[tokio::test(start_paused = true)]
async fn test_stopped_releases_in_flight_reads() {
    let boiler = BoilerFixture::new();
    let manager = started_manager(boiler.transport.clone(), TestConfig::default_config()).await;
    let proxy = manager.get_object(&BoilerFixture::boiler_id()).await.unwrap();

    boiler.transport.hang(MockOperation::Read, true);
    let pending = {
        let proxy = proxy.clone();
        tokio::spawn(async move {
            proxy
                .variable("Temperature")
                .expect("temperature")
                .read_value()
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(!pending.is_finished());

    manager.stop().await.unwrap();

    let result = assert_completes_within(Duration::from_millis(100), pending)
        .await
        .expect("read task");
    result.assert_kind(ErrorKind::Stopped);
}

#[tokio::test(start_paused = true)]
async fn test_stopped_during_build_caches_nothing() {
    let boiler = BoilerFixture::new();
    let manager = Arc::new(
        started_manager(boiler.transport.clone(), TestConfig::default_config()).await,
    );

    boiler.transport.hang(MockOperation::Browse, true);
    let pending = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.get_object(&BoilerFixture::boiler_id()).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(!pending.is_finished());

    manager.stop().await.unwrap();

    let result = assert_completes_within(Duration::from_millis(100), pending)
        .await
        .expect("build task");
    result.assert_kind(ErrorKind::Stopped);
    assert_eq!(manager.cached_objects(), 0);
    assert_eq!(manager.state(), ManagerState::Stopped);
}

// =============================================================================
// Cancellation Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_cancel_hung_read() {
    let boiler = BoilerFixture::new();
    let manager = started_manager(boiler.transport.clone(), TestConfig::default_config()).await;
    let proxy = manager.get_object(&BoilerFixture::boiler_id()).await.unwrap();
    let temperature = proxy.variable("Temperature").unwrap();

    boiler.transport.hang(MockOperation::Read, true);
    let token = CancellationToken::new();
    {
        let token = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            token.cancel();
        });
    }

    let err = temperature
        .read_value_with(&token)
        .await
        .assert_kind(ErrorKind::Cancelled);
    assert!(!err.is_retryable());

    let stats = manager.stats();
    assert_eq!(stats.cancellations, 1);
    assert_eq!(stats.timeouts, 0);
    assert_eq!(manager.state(), ManagerState::Started);
}

#[tokio::test]
async fn test_cancel_before_request() {
    let boiler = BoilerFixture::new();
    let manager = started_manager(boiler.transport.clone(), TestConfig::default_config()).await;
    let proxy = manager.get_object(&BoilerFixture::boiler_id()).await.unwrap();
    let start = proxy.find("Simulation/Start").unwrap().as_method().unwrap();

    let token = CancellationToken::new();
    token.cancel();

    start
        .read_executable_flag_with(&token)
        .await
        .assert_kind(ErrorKind::Cancelled);
    start
        .invoke_with(vec![], &token)
        .await
        .assert_kind(ErrorKind::Cancelled);
    assert_eq!(boiler.state(), ProgramState::Ready);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_build() {
    let boiler = BoilerFixture::new();
    let manager = started_manager(boiler.transport.clone(), TestConfig::default_config()).await;

    boiler.transport.hang(MockOperation::Browse, true);
    let token = CancellationToken::new();
    {
        let token = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            token.cancel();
        });
    }

    manager
        .get_object_with(&BoilerFixture::boiler_id(), &token)
        .await
        .assert_kind(ErrorKind::Cancelled);

    boiler.transport.hang(MockOperation::Browse, false);
    let proxy = manager
        .get_object(&BoilerFixture::boiler_id())
        .await
        .assert_ok();
    proxy.assert_child_keys(&["Temperature", "Simulation"]);
}

#[tokio::test]
async fn test_cancel_state_machine_resolution() {
    let boiler = BoilerFixture::new();
    let manager = started_manager(boiler.transport.clone(), TestConfig::default_config()).await;

    let token = CancellationToken::new();
    token.cancel();
    manager
        .get_state_machine_type_with("ProgramStateMachineType", &token)
        .await
        .assert_kind(ErrorKind::Cancelled);

    // Nothing half-built was cached.
    manager
        .get_state_machine_type("ProgramStateMachineType")
        .await
        .assert_ok()
        .assert_closed();
}

// =============================================================================
// Timeout Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_timeout_hung_read() {
    let boiler = BoilerFixture::new();
    let manager = started_manager(
        boiler.transport.clone(),
        TestConfig::with_timeout(Duration::from_millis(500)),
    )
    .await;
    let proxy = manager.get_object(&BoilerFixture::boiler_id()).await.unwrap();
    let temperature = proxy.variable("Temperature").unwrap();

    boiler.transport.hang(MockOperation::Read, true);
    let err = temperature
        .read_value()
        .await
        .assert_kind(ErrorKind::Communication);

    assert!(err.is_retryable());
    assert!(err.to_string().contains("500ms"));
    let stats = manager.stats();
    assert_eq!(stats.timeouts, 1);
    assert_eq!(stats.cancellations, 0);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_distinct_from_cancel() {
    let boiler = BoilerFixture::new();
    let manager = started_manager(
        boiler.transport.clone(),
        TestConfig::with_timeout(Duration::from_millis(500)),
    )
    .await;
    let proxy = manager.get_object(&BoilerFixture::boiler_id()).await.unwrap();
    let start = proxy.find("Simulation/Start").unwrap().as_method().unwrap();

    boiler.transport.hang(MockOperation::Call, true);

    let timed_out = start.invoke(vec![]).await.unwrap_err();

    let token = CancellationToken::new();
    {
        let token = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            token.cancel();
        });
    }
    let cancelled = start.invoke_with(vec![], &token).await.unwrap_err();

    assert_eq!(timed_out.kind(), ErrorKind::Communication);
    assert_eq!(cancelled.kind(), ErrorKind::Cancelled);
    assert!(timed_out.is_retryable());
    assert!(!cancelled.is_retryable());
}

#[tokio::test(start_paused = true)]
async fn test_timeout_slow_transport_within_budget() {
    let boiler = BoilerFixture::new();
    let manager = started_manager(
        boiler.transport.clone(),
        TestConfig::with_timeout(Duration::from_millis(500)),
    )
    .await;
    let proxy = manager.get_object(&BoilerFixture::boiler_id()).await.unwrap();

    boiler.transport.set_latency(Duration::from_millis(200));
    proxy
        .variable("Temperature")
        .unwrap()
        .read_value()
        .await
        .assert_ok()
        .assert_good();
}
