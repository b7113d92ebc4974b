// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Custom Test Assertions
//!
//! Domain-specific assertion helpers for proxy integration tests.
//!
//! ## Design Principles
//!
//! - Provide clear, informative failure messages
//! - Support both synchronous and asynchronous assertions
//! - Name the node involved in every failure

use std::fmt::Debug;
use std::time::Duration;

use ua_proxy::client::{DataValue, UaValue};
use ua_proxy::{ErrorKind, ObjectProxy, ProxyError, ProxyResult, StateMachineType, StatusCode};

// =============================================================================
// Result Assertions
// =============================================================================

/// Assertion extensions for proxy results.
pub trait ProxyResultAssertions<T> {
    /// Assert the result is an error of `kind` and return the error.
    fn assert_kind(self, kind: ErrorKind) -> ProxyError;

    /// Assert the result is `Ok` and return the value.
    fn assert_ok(self) -> T;
}

impl<T: Debug> ProxyResultAssertions<T> for ProxyResult<T> {
    fn assert_kind(self, kind: ErrorKind) -> ProxyError {
        match self {
            Ok(value) => panic!("Expected {} error, but got Ok({:?})", kind, value),
            Err(e) => {
                assert_eq!(
                    e.kind(),
                    kind,
                    "Expected {} error, but got {} ({})",
                    kind,
                    e.kind(),
                    e
                );
                e
            }
        }
    }

    fn assert_ok(self) -> T {
        match self {
            Ok(value) => value,
            Err(e) => panic!("Expected Ok, but got {} error: {}", e.kind(), e),
        }
    }
}

// =============================================================================
// DataValue Assertions
// =============================================================================

/// Assertion extensions for DataValue.
pub trait DataValueAssertions {
    /// Assert the status is good.
    fn assert_good(&self);

    /// Assert a specific status.
    fn assert_status(&self, expected: StatusCode);

    /// Assert the value matches.
    fn assert_value(&self, expected: &UaValue);

    /// Assert the value is a number within a tolerance.
    fn assert_value_approx(&self, expected: f64, tolerance: f64);

    /// Assert the value is text (string, localized text or name) equal to
    /// `expected`.
    fn assert_text(&self, expected: &str);

    /// Assert the server timestamp is recent.
    fn assert_recent(&self, max_age: Duration);
}

impl DataValueAssertions for DataValue {
    fn assert_good(&self) {
        assert!(
            self.is_good(),
            "Expected Good status, but got {}",
            self.status
        );
    }

    fn assert_status(&self, expected: StatusCode) {
        assert_eq!(
            self.status, expected,
            "Expected status {}, but got {}",
            expected, self.status
        );
    }

    fn assert_value(&self, expected: &UaValue) {
        assert_eq!(
            self.value.as_ref(),
            Some(expected),
            "Expected value {}, but got {:?}",
            expected,
            self.value
        );
    }

    fn assert_value_approx(&self, expected: f64, tolerance: f64) {
        let actual = self
            .value
            .as_ref()
            .and_then(UaValue::as_f64)
            .expect("Value is not convertible to f64");
        let diff = (actual - expected).abs();
        assert!(
            diff <= tolerance,
            "Expected value {} ± {}, but got {} (diff: {})",
            expected,
            tolerance,
            actual,
            diff
        );
    }

    fn assert_text(&self, expected: &str) {
        let actual = self.value.as_ref().and_then(UaValue::as_text);
        assert_eq!(
            actual,
            Some(expected),
            "Expected text '{}', but got {:?}",
            expected,
            self.value
        );
    }

    fn assert_recent(&self, max_age: Duration) {
        let timestamp = self
            .server_timestamp
            .expect("DataValue has no server timestamp");
        let age = chrono::Utc::now()
            .signed_duration_since(timestamp)
            .to_std()
            .unwrap_or(Duration::ZERO);
        assert!(
            age <= max_age,
            "DataValue is too old: {:?} (max allowed: {:?})",
            age,
            max_age
        );
    }
}

// =============================================================================
// Proxy Assertions
// =============================================================================

/// Assertion extensions for ObjectProxy.
pub trait ObjectProxyAssertions {
    /// Assert the child keys, in key order.
    fn assert_child_keys(&self, expected: &[&str]);

    /// Assert the last known executable flags of methods, by key.
    fn assert_executable_flags(&self, expected: &[(&str, bool)]);

    /// Assert the type definition's browse name.
    fn assert_type_name(&self, expected: &str);
}

impl ObjectProxyAssertions for ObjectProxy {
    fn assert_child_keys(&self, expected: &[&str]) {
        let actual: Vec<&str> = self.children().iter().map(|(key, _)| key).collect();
        assert_eq!(
            actual, expected,
            "Unexpected children under {}",
            self.browse_name()
        );
    }

    fn assert_executable_flags(&self, expected: &[(&str, bool)]) {
        for (key, flag) in expected {
            let method = self
                .method(key)
                .unwrap_or_else(|| panic!("No method '{}' under {}", key, self.browse_name()));
            assert_eq!(
                method.executable_flag(),
                Some(*flag),
                "Expected {}.executable == {}",
                key,
                flag
            );
        }
    }

    fn assert_type_name(&self, expected: &str) {
        let actual = self.type_definition().map(|t| t.name());
        assert_eq!(
            actual,
            Some(expected),
            "Unexpected type of {}",
            self.browse_name()
        );
    }
}

/// Reads the executable flags of methods freshly and asserts them.
pub async fn assert_fresh_executable_flags(object: &ObjectProxy, expected: &[(&str, bool)]) {
    for (key, flag) in expected {
        let method = object
            .method(key)
            .unwrap_or_else(|| panic!("No method '{}' under {}", key, object.browse_name()));
        let actual = method
            .read_executable_flag()
            .await
            .unwrap_or_else(|e| panic!("Reading {}.executable failed: {}", key, e));
        assert_eq!(actual, *flag, "Expected fresh {}.executable == {}", key, flag);
    }
}

// =============================================================================
// State Machine Assertions
// =============================================================================

/// Assertion extensions for StateMachineType.
pub trait StateMachineAssertions {
    /// Assert the state names, in any order.
    fn assert_states(&self, expected: &[&str]);

    /// Assert every transition endpoint is a declared state.
    fn assert_closed(&self);
}

impl StateMachineAssertions for StateMachineType {
    fn assert_states(&self, expected: &[&str]) {
        let mut actual: Vec<&str> = self.states().iter().map(|s| s.name.as_str()).collect();
        let mut expected = expected.to_vec();
        actual.sort_unstable();
        expected.sort_unstable();
        assert_eq!(actual, expected, "Unexpected states of {}", self.name());
    }

    fn assert_closed(&self) {
        for transition in self.transitions() {
            assert!(
                self.state(&transition.from).is_some(),
                "{} starts outside the state set",
                transition.name
            );
            assert!(
                self.state(&transition.to).is_some(),
                "{} ends outside the state set",
                transition.name
            );
        }
    }
}

// =============================================================================
// Async Assertions
// =============================================================================

/// Assert that a future completes within the given duration.
pub async fn assert_completes_within<F, T>(duration: Duration, future: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(duration, future)
        .await
        .unwrap_or_else(|_| panic!("Future did not complete within {:?}", duration))
}
