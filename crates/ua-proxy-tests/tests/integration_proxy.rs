// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Proxy Integration Tests
//!
//! Integration tests for proxy tree construction and variable reads:
//!
//! - Tree shape, child keys and type resolution
//! - Case-insensitive method lookup and path navigation
//! - Variable reads and cached values
//! - Cycle, depth, duplicate and access failures
//!
//! ## Test Categories
//!
//! - `test_build_*`: Tree construction
//! - `test_lookup_*`: Child access and navigation
//! - `test_read_*`: Variable reads
//! - `test_failure_*`: Pathological graphs and server refusals
//! - `test_cache_*`: Object cache

use std::sync::Arc;
use std::time::Duration;

use ua_proxy::client::UaValue;
use ua_proxy::ids::types;
use ua_proxy::{ErrorKind, NodeClass, NodeId, ProxyNode, StatusCode};

use ua_proxy_tests::prelude::*;

async fn boiler_manager() -> (BoilerFixture, ua_proxy::ProxyManager) {
    init_test_logging();
    let boiler = BoilerFixture::new();
    let manager = started_manager(boiler.transport.clone(), TestConfig::default_config()).await;
    (boiler, manager)
}

// =============================================================================
// Build Tests
// =============================================================================

#[tokio::test]
async fn test_build_boiler_tree() {
    let (_boiler, manager) = boiler_manager().await;

    let proxy = manager
        .get_object(&BoilerFixture::boiler_id())
        .await
        .assert_ok();

    assert_eq!(proxy.node_id(), &BoilerFixture::boiler_id());
    assert_eq!(proxy.browse_name().to_string(), "1:Boiler#1");
    proxy.assert_type_name("BoilerType");
    proxy.assert_child_keys(&["Temperature", "Simulation"]);

    let simulation = proxy.object("Simulation").expect("Simulation object");
    simulation.assert_type_name("ProgramStateMachineType");
    simulation.assert_child_keys(&["CurrentState", "start", "suspend", "resume", "halt", "reset"]);

    let current_state = simulation.variable("CurrentState").expect("CurrentState");
    assert_eq!(
        current_state.info().type_definition.as_ref().map(|t| t.name()),
        Some("FiniteStateVariableType")
    );
    assert_eq!(current_state.children().len(), 1);
}

#[tokio::test]
async fn test_build_reads_initial_snapshot() {
    let (_boiler, manager) = boiler_manager().await;
    let proxy = manager.get_object(&BoilerFixture::boiler_id()).await.unwrap();

    let temperature = proxy.variable("Temperature").unwrap();
    temperature
        .cached_value()
        .expect("initial value read during build")
        .assert_value(&UaValue::Double(21.5));

    let simulation = proxy.object("Simulation").unwrap();
    simulation.assert_executable_flags(&[
        ("start", true),
        ("halt", true),
        ("resume", true),
        ("suspend", false),
        ("reset", false),
    ]);
}

#[tokio::test]
async fn test_build_without_initial_reads() {
    let boiler = BoilerFixture::new();
    let config = TestConfig::builder()
        .read_initial_values(false)
        .read_initial_executable_flags(false)
        .build()
        .unwrap();
    let manager = started_manager(boiler.transport.clone(), config).await;

    let proxy = manager.get_object(&BoilerFixture::boiler_id()).await.unwrap();
    assert!(proxy.variable("Temperature").unwrap().cached_value().is_none());

    let start = proxy.object("Simulation").unwrap().method("start").unwrap();
    assert_eq!(start.executable_flag(), None);
    assert_eq!(
        boiler
            .transport
            .reads_of(&BoilerFixture::temperature_id(), ua_proxy::AttributeId::Value),
        0
    );
}

#[tokio::test]
async fn test_build_sequential_matches_concurrent() {
    let boiler = BoilerFixture::new();
    let config = TestConfig::builder().concurrent_build(false).build().unwrap();
    let sequential = started_manager(boiler.transport.clone(), config).await;
    let concurrent = started_manager(boiler.transport.clone(), TestConfig::default_config()).await;

    let a = sequential.get_object(&BoilerFixture::boiler_id()).await.unwrap();
    let b = concurrent.get_object(&BoilerFixture::boiler_id()).await.unwrap();
    assert_eq!(a.describe(), b.describe());
}

#[tokio::test]
async fn test_build_describe_tree() {
    let (_boiler, manager) = boiler_manager().await;
    let proxy = manager.get_object(&BoilerFixture::boiler_id()).await.unwrap();

    let dump = proxy.describe();
    let lines: Vec<&str> = dump.lines().collect();
    assert_eq!(lines[0], "Boiler#1 [Object] ns=1;s=Boiler#1 : BoilerType");
    assert!(dump.contains(
        "  Temperature [Variable] ns=1;s=Boiler#1.Temperature : BaseDataVariableType = 21.5"
    ));
    assert!(dump.contains("    start [Method] ns=1;s=Boiler#1.Simulation.Start executable=true"));
    assert!(dump.contains("    suspend [Method] ns=1;s=Boiler#1.Simulation.Suspend executable=false"));
    assert!(dump.contains("      Id [Variable]"));
}

#[tokio::test]
async fn test_build_shared_child_is_not_a_cycle() {
    let (transport, root) = GraphFixtures::diamond();
    let manager = started_manager(Arc::new(transport), TestConfig::default_config()).await;

    let proxy = manager.get_object(&root).await.assert_ok();
    let left = proxy.find("Left/Shared").expect("shared under left");
    let right = proxy.find("Right/Shared").expect("shared under right");
    assert_eq!(left.node_id(), right.node_id());
}

#[tokio::test]
async fn test_build_method_under_variable_targets_object() {
    let (transport, root, calibrate) = GraphFixtures::method_under_variable();
    let transport = Arc::new(transport);
    let manager = started_manager(transport.clone(), TestConfig::default_config()).await;

    let proxy = manager.get_object(&root).await.unwrap();
    let method = proxy
        .find("Position/Calibrate")
        .and_then(ProxyNode::as_method)
        .expect("method under variable");
    assert_eq!(method.node_id(), &calibrate);
    assert_eq!(method.object_id(), &root);

    method.invoke(vec![]).await.unwrap();
    assert_eq!(transport.call_history()[0].object_id, root);
}

// =============================================================================
// Lookup Tests
// =============================================================================

#[tokio::test]
async fn test_lookup_method_case_insensitive() {
    let (_boiler, manager) = boiler_manager().await;
    let proxy = manager.get_object(&BoilerFixture::boiler_id()).await.unwrap();
    let simulation = proxy.object("Simulation").unwrap();

    let lower = simulation.method("start").expect("lower-case key");
    let upper = simulation.method("Start").expect("original browse name");
    assert!(std::ptr::eq(lower, upper));
    assert_eq!(lower.browse_name().name, "Start");

    // Only methods fold case.
    assert!(proxy.variable("temperature").is_none());
    assert!(proxy.object("simulation").is_none());
}

#[tokio::test]
async fn test_lookup_find_paths() {
    let (_boiler, manager) = boiler_manager().await;
    let proxy = manager.get_object(&BoilerFixture::boiler_id()).await.unwrap();

    let start = proxy.find("Simulation/Start").expect("path to method");
    assert!(start.is_method());
    assert_eq!(start.key(), "start");

    let id = proxy
        .find("Simulation/CurrentState/Id")
        .and_then(ProxyNode::as_variable)
        .expect("property of a variable");
    assert_eq!(id.node_id(), &BoilerFixture::current_state_number_id());

    assert!(proxy.find("Simulation/Start/Anything").is_none());
    assert!(proxy.find("Missing").is_none());
    assert!(proxy.find("").is_none());
}

#[tokio::test]
async fn test_lookup_typed_iterators() {
    let (_boiler, manager) = boiler_manager().await;
    let proxy = manager.get_object(&BoilerFixture::boiler_id()).await.unwrap();
    let simulation = proxy.object("Simulation").unwrap();

    assert_eq!(proxy.objects().count(), 1);
    assert_eq!(proxy.variables().count(), 1);
    assert_eq!(simulation.methods().count(), 5);
    assert!(simulation
        .methods()
        .all(|m| m.info().node_class == NodeClass::Method && m.object_id() == simulation.node_id()));

    let node = proxy.child("Simulation").unwrap();
    assert_eq!(node.node_class(), NodeClass::Object);
    assert!(node.method("reset").is_some());
}

#[tokio::test]
async fn test_lookup_operations_on_tagged_nodes() {
    let (boiler, manager) = boiler_manager().await;
    let proxy = manager.get_object(&BoilerFixture::boiler_id()).await.unwrap();

    let temperature = proxy.child("Temperature").unwrap();
    temperature
        .read_value()
        .await
        .unwrap()
        .assert_value_approx(21.5, 1e-9);
    temperature
        .invoke(vec![])
        .await
        .assert_kind(ErrorKind::Conversion);
    assert_eq!(temperature.executable_flag(), None);

    let start = proxy.find("Simulation/Start").unwrap();
    assert_eq!(start.executable_flag(), Some(true));
    assert!(start.read_executable_flag().await.unwrap());
    start.read_value().await.assert_kind(ErrorKind::Conversion);
    assert!(start.invoke(vec![]).await.unwrap().is_good());
    assert_eq!(boiler.state(), ProgramState::Running);
}

#[tokio::test]
async fn test_lookup_variable_and_method_named_alike() {
    let (transport, root) = GraphFixtures::variable_and_method_named_alike();
    let manager = started_manager(Arc::new(transport), TestConfig::default_config()).await;

    let proxy = manager.get_object(&root).await.assert_ok();
    let flag = proxy.variable("start").expect("variable keeps its exact name");
    let method = proxy.method("start").expect("method found case-insensitively");
    assert_eq!(flag.node_id(), &NodeId::string(2, "Pump.start"));
    assert_eq!(method.node_id(), &NodeId::string(2, "Pump.Start"));

    assert!(proxy.find("start").and_then(ProxyNode::as_variable).is_some());
    assert!(proxy.find("Start").map(ProxyNode::is_method).unwrap_or(false));
    assert_eq!(proxy.children().len(), 2);
}

// =============================================================================
// Read Tests
// =============================================================================

#[tokio::test]
async fn test_read_value_twice_is_stable() {
    let (_boiler, manager) = boiler_manager().await;
    let proxy = manager.get_object(&BoilerFixture::boiler_id()).await.unwrap();
    let temperature = proxy.variable("Temperature").unwrap();

    let first = temperature.read_value().await.unwrap();
    let second = temperature.read_value().await.unwrap();

    first.assert_good();
    assert!(first.same_reading(&second));
    assert_eq!(temperature.cached_value(), Some(second));
}

#[tokio::test]
async fn test_read_value_is_live() {
    let (boiler, manager) = boiler_manager().await;
    let proxy = manager.get_object(&BoilerFixture::boiler_id()).await.unwrap();
    let temperature = proxy.variable("Temperature").unwrap();

    boiler.set_temperature(88.25);
    // The cache still holds the build snapshot until a read completes.
    temperature.cached_value().unwrap().assert_value_approx(21.5, 1e-9);

    let value = temperature.read_value().await.unwrap();
    value.assert_value_approx(88.25, 1e-9);
    value.assert_recent(Duration::from_secs(5));
    temperature.cached_value().unwrap().assert_value_approx(88.25, 1e-9);
}

#[tokio::test]
async fn test_read_bad_status_is_data() {
    let (boiler, manager) = boiler_manager().await;
    let proxy = manager.get_object(&BoilerFixture::boiler_id()).await.unwrap();
    let temperature = proxy.variable("Temperature").unwrap();

    boiler
        .transport
        .space()
        .write()
        .deny(&BoilerFixture::temperature_id());

    let value = temperature.read_value().await.assert_ok();
    value.assert_status(StatusCode::BAD_USER_ACCESS_DENIED);
    assert_eq!(value.good_value(), None);
    assert_eq!(temperature.cached_value(), Some(value));
}

#[tokio::test]
async fn test_read_transport_failure_is_error() {
    let (boiler, manager) = boiler_manager().await;
    let proxy = manager.get_object(&BoilerFixture::boiler_id()).await.unwrap();
    let temperature = proxy.variable("Temperature").unwrap();
    let before = temperature.cached_value();

    boiler.transport.fail_next(MockOperation::Read);
    let err = temperature.read_value().await.assert_kind(ErrorKind::Communication);
    assert!(err.is_retryable());

    // A failed read leaves the cache alone.
    assert_eq!(temperature.cached_value(), before);
}

#[tokio::test]
async fn test_read_current_state_text() {
    let (_boiler, manager) = boiler_manager().await;
    let proxy = manager.get_object(&BoilerFixture::boiler_id()).await.unwrap();

    let state = proxy
        .find("Simulation/CurrentState")
        .and_then(ProxyNode::as_variable)
        .unwrap();
    state.read_value().await.unwrap().assert_text("Ready");
}

// =============================================================================
// Failure Tests
// =============================================================================

#[tokio::test]
async fn test_failure_cycle_detected() {
    let (transport, root) = GraphFixtures::cyclic();
    let manager = started_manager(Arc::new(transport), TestConfig::default_config()).await;

    let result = assert_completes_within(Duration::from_secs(5), manager.get_object(&root)).await;
    let err = result.assert_kind(ErrorKind::CyclicGraph);
    assert!(!err.is_retryable());
    assert!(err.to_string().contains("Loop"));
}

#[tokio::test]
async fn test_failure_depth_bound() {
    let max_depth = 4;

    let (transport, root) = GraphFixtures::deep_chain(max_depth);
    let manager = started_manager(Arc::new(transport), TestConfig::with_max_depth(max_depth)).await;
    let proxy = manager.get_object(&root).await.assert_ok();
    assert!(proxy.find("Level1/Level2/Level3/Level4").is_some());

    let (transport, root) = GraphFixtures::deep_chain(max_depth + 1);
    let manager = started_manager(Arc::new(transport), TestConfig::with_max_depth(max_depth)).await;
    let err = manager
        .get_object(&root)
        .await
        .assert_kind(ErrorKind::DepthExceeded);
    assert!(err.to_string().contains("Level5"));
}

#[tokio::test]
async fn test_failure_duplicate_keys() {
    let (transport, root) = GraphFixtures::duplicate_method_keys();
    let manager = started_manager(Arc::new(transport), TestConfig::default_config()).await;

    let err = manager
        .get_object(&root)
        .await
        .assert_kind(ErrorKind::DuplicateChild);
    assert!(err.to_string().contains("start"));
}

#[tokio::test]
async fn test_failure_access_denied_names_child() {
    let (transport, root, secret) = GraphFixtures::access_denied();
    let manager = started_manager(Arc::new(transport), TestConfig::default_config()).await;

    let err = manager
        .get_object(&root)
        .await
        .assert_kind(ErrorKind::AccessDenied);
    assert!(!err.is_retryable());

    let (node_id, browse_name) = err.failing_child().expect("failing child named");
    assert_eq!(node_id, secret.to_string());
    assert_eq!(browse_name, "2:Secret");
}

#[tokio::test]
async fn test_failure_nested_child_wrapped_once() {
    let (transport, root) = GraphFixtures::deep_chain(3);
    let transport = Arc::new(transport);
    transport
        .space()
        .write()
        .deny(&NodeId::string(GraphFixtures::NAMESPACE, "Level3"));
    let manager = started_manager(transport, TestConfig::default_config()).await;

    let err = manager
        .get_object(&root)
        .await
        .assert_kind(ErrorKind::AccessDenied);
    // The innermost failure is attributed; ancestors pass it through.
    let (node_id, _) = err.failing_child().unwrap();
    assert_eq!(node_id, "ns=2;s=Level3");
}

#[tokio::test]
async fn test_failure_root_not_an_object() {
    let (_boiler, manager) = boiler_manager().await;

    let err = manager
        .get_object(&BoilerFixture::temperature_id())
        .await
        .assert_kind(ErrorKind::NotFound);
    assert!(err.to_string().to_lowercase().contains("not an object"));

    manager
        .get_object(&NodeId::string(1, "NoSuchNode"))
        .await
        .assert_kind(ErrorKind::NotFound);
}

#[tokio::test]
async fn test_failure_transport_aborts_build() {
    let (boiler, manager) = boiler_manager().await;
    boiler.transport.fail_all(MockOperation::Browse, true);

    manager
        .get_object(&BoilerFixture::boiler_id())
        .await
        .assert_kind(ErrorKind::Communication);

    boiler.transport.fail_all(MockOperation::Browse, false);
    manager
        .get_object(&BoilerFixture::boiler_id())
        .await
        .assert_ok();
}

// =============================================================================
// Cache Tests
// =============================================================================

#[tokio::test]
async fn test_cache_same_tree_for_same_root() {
    let (boiler, manager) = boiler_manager().await;

    let first = manager.get_object(&BoilerFixture::boiler_id()).await.unwrap();
    let requests = boiler.transport.request_count();
    let second = manager.get_object(&BoilerFixture::boiler_id()).await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(boiler.transport.request_count(), requests);
}

#[tokio::test]
async fn test_cache_rebuild_replaces_tree() {
    let (boiler, manager) = boiler_manager().await;

    let first = manager.get_object(&BoilerFixture::boiler_id()).await.unwrap();
    boiler.set_temperature(30.0);
    let rebuilt = manager
        .rebuild_object(&BoilerFixture::boiler_id())
        .await
        .unwrap();

    assert!(!Arc::ptr_eq(&first, &rebuilt));
    rebuilt
        .variable("Temperature")
        .unwrap()
        .cached_value()
        .unwrap()
        .assert_value(&UaValue::Double(30.0));

    let again = manager.get_object(&BoilerFixture::boiler_id()).await.unwrap();
    assert!(Arc::ptr_eq(&rebuilt, &again));
}

#[tokio::test]
async fn test_cache_disabled_builds_each_time() {
    let boiler = BoilerFixture::new();
    let config = TestConfig::builder().cache_objects(false).build().unwrap();
    let manager = started_manager(boiler.transport.clone(), config).await;

    let first = manager.get_object(&BoilerFixture::boiler_id()).await.unwrap();
    let second = manager.get_object(&BoilerFixture::boiler_id()).await.unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn test_cache_type_resolution_shared() {
    let (_boiler, manager) = boiler_manager().await;
    manager.get_object(&BoilerFixture::boiler_id()).await.unwrap();

    let cache = manager.type_resolver().cache();
    assert!(cache.definition(&types::PROGRAM_STATE_MACHINE_TYPE).is_some());
    assert!(cache.definition(&BoilerFixture::boiler_type_id()).is_some());

    let stats = manager.stats();
    assert!(stats.browses > 0);
    assert!(stats.reads > 0);
    assert_eq!(stats.errors, 0);
}
