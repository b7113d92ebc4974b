// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Shared session context for one proxy manager.
//!
//! Every remote operation issued by a manager, or by any proxy it built,
//! goes through [`ProxySession`]. The session enforces the lifecycle gate,
//! bounds each request by the configured timeout, races it against caller
//! cancellation and manager shutdown, and keeps operation statistics.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::client::cancel::CancellationToken;
use crate::client::transport::{
    BrowseRequest, BrowseResponse, CallRequest, CallResponse, DataValue, UaTransport,
};
use crate::config::ProxyConfig;
use crate::error::{ProxyError, ProxyResult};
use crate::types::{AttributeId, NodeId};

// =============================================================================
// ManagerState
// =============================================================================

/// Lifecycle state of a proxy manager and its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ManagerState {
    /// Constructed, not yet started.
    #[default]
    Created,

    /// Started and accepting operations.
    Started,

    /// `stop()` has begun releasing the session.
    Stopping,

    /// Terminal.
    Stopped,
}

impl ManagerState {
    /// Returns `true` if operations are accepted.
    #[inline]
    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started)
    }

    /// Returns `true` once `stop()` has begun.
    #[inline]
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopping | Self::Stopped)
    }
}

impl fmt::Display for ManagerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "Created"),
            Self::Started => write!(f, "Started"),
            Self::Stopping => write!(f, "Stopping"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}

// =============================================================================
// SessionStats
// =============================================================================

/// Counters for remote operations issued through one session.
#[derive(Debug, Default)]
pub struct SessionStats {
    browses: AtomicU64,
    reads: AtomicU64,
    calls: AtomicU64,
    errors: AtomicU64,
    timeouts: AtomicU64,
    cancellations: AtomicU64,
    total_response_time_us: AtomicU64,
}

impl SessionStats {
    fn record(&self, operation: Operation, duration: Duration) {
        let counter = match operation {
            Operation::Browse => &self.browses,
            Operation::Read => &self.reads,
            Operation::Call => &self.calls,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.total_response_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
        self.record_error();
    }

    fn record_cancellation(&self) {
        self.cancellations.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a point-in-time copy of the counters.
    pub fn snapshot(&self) -> SessionStatsSnapshot {
        SessionStatsSnapshot {
            browses: self.browses.load(Ordering::Relaxed),
            reads: self.reads.load(Ordering::Relaxed),
            calls: self.calls.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            cancellations: self.cancellations.load(Ordering::Relaxed),
            total_response_time_us: self.total_response_time_us.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of [`SessionStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionStatsSnapshot {
    /// Completed browse requests.
    pub browses: u64,
    /// Completed read requests.
    pub reads: u64,
    /// Completed call requests.
    pub calls: u64,
    /// Failed requests, including timeouts.
    pub errors: u64,
    /// Requests that exceeded the timeout.
    pub timeouts: u64,
    /// Requests released by caller cancellation.
    pub cancellations: u64,
    /// Accumulated response time of completed requests.
    pub total_response_time_us: u64,
}

impl SessionStatsSnapshot {
    /// Returns the number of completed requests.
    pub fn total_requests(&self) -> u64 {
        self.browses + self.reads + self.calls
    }

    /// Returns the average response time of completed requests.
    pub fn average_response_time(&self) -> Duration {
        match self.total_requests() {
            0 => Duration::ZERO,
            n => Duration::from_micros(self.total_response_time_us / n),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Operation {
    Browse,
    Read,
    Call,
}

impl Operation {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Browse => "browse",
            Self::Read => "read",
            Self::Call => "call",
        }
    }
}

// =============================================================================
// ProxySession
// =============================================================================

/// The transport plus lifecycle, timeout and cancellation policy.
///
/// Cloned `Arc`s of the session are held by every proxy a manager builds, so
/// a proxy outliving `stop()` fails with `Stopped` instead of reaching the
/// released transport.
pub struct ProxySession {
    transport: Arc<dyn UaTransport>,
    config: ProxyConfig,
    state: RwLock<ManagerState>,
    closing: CancellationToken,
    stats: SessionStats,
}

impl ProxySession {
    /// Creates a session in the `Created` state.
    pub fn new(transport: Arc<dyn UaTransport>, config: ProxyConfig) -> Self {
        Self {
            transport,
            config,
            state: RwLock::new(ManagerState::Created),
            closing: CancellationToken::new(),
            stats: SessionStats::default(),
        }
    }

    /// Returns the configuration.
    #[inline]
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> ManagerState {
        *self.state.read()
    }

    /// Returns the operation counters.
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Returns the transport display name.
    pub fn transport_name(&self) -> String {
        self.transport.display_name()
    }

    /// Moves to `to` if the current state is one of `from`.
    ///
    /// Returns the state found, whether or not the transition happened.
    pub(crate) fn transition(&self, from: &[ManagerState], to: ManagerState) -> ManagerState {
        let mut state = self.state.write();
        let previous = *state;
        if from.contains(&previous) {
            *state = to;
            info!(from = %previous, to = %to, "proxy manager state changed");
        }
        previous
    }

    /// Fails unless the session accepts operations.
    pub fn ensure_started(&self, operation: &str) -> ProxyResult<()> {
        match self.state() {
            ManagerState::Started => Ok(()),
            ManagerState::Created => Err(ProxyError::not_started(operation)),
            ManagerState::Stopping | ManagerState::Stopped => Err(ProxyError::stopped(operation)),
        }
    }

    /// Browses one node.
    pub async fn browse(
        &self,
        request: &BrowseRequest,
        cancel: Option<&CancellationToken>,
    ) -> ProxyResult<BrowseResponse> {
        self.execute(
            Operation::Browse,
            &request.node_id,
            cancel,
            self.transport.browse(request),
        )
        .await
    }

    /// Reads one attribute.
    pub async fn read(
        &self,
        node_id: &NodeId,
        attribute: AttributeId,
        cancel: Option<&CancellationToken>,
    ) -> ProxyResult<DataValue> {
        self.execute(
            Operation::Read,
            node_id,
            cancel,
            self.transport.read(node_id, attribute),
        )
        .await
    }

    /// Calls a method.
    pub async fn call(
        &self,
        request: &CallRequest,
        cancel: Option<&CancellationToken>,
    ) -> ProxyResult<CallResponse> {
        self.execute(
            Operation::Call,
            &request.method_id,
            cancel,
            self.transport.call(request),
        )
        .await
    }

    async fn execute<T, F>(
        &self,
        operation: Operation,
        node_id: &NodeId,
        cancel: Option<&CancellationToken>,
        request: F,
    ) -> ProxyResult<T>
    where
        F: Future<Output = ProxyResult<T>>,
    {
        let name = operation.as_str();
        self.ensure_started(name)?;

        if self.config.trace_operations {
            trace!(operation = name, node_id = %node_id, "issuing request");
        }

        let timeout = self.config.request_timeout;
        let caller_cancelled = async {
            match cancel {
                Some(token) => token.cancelled().await,
                None => std::future::pending::<()>().await,
            }
        };
        let started = Instant::now();

        let result = tokio::select! {
            biased;
            _ = self.closing.cancelled() => Err(ProxyError::stopped(name)),
            _ = caller_cancelled => {
                self.stats.record_cancellation();
                Err(ProxyError::cancelled(name))
            }
            outcome = tokio::time::timeout(timeout, request) => match outcome {
                Ok(result) => result,
                Err(_) => {
                    self.stats.record_timeout();
                    return Err(ProxyError::timeout(name, node_id.to_string(), timeout));
                }
            },
        };

        match &result {
            Ok(_) => self.stats.record(operation, started.elapsed()),
            Err(ProxyError::Cancelled { .. }) => {}
            Err(e) => {
                self.stats.record_error();
                debug!(operation = name, node_id = %node_id, error = %e, "request failed");
            }
        }

        if self.config.trace_operations {
            trace!(
                operation = name,
                node_id = %node_id,
                duration_ms = started.elapsed().as_millis() as u64,
                ok = result.is_ok(),
                "request completed"
            );
        }

        result
    }

    /// Releases in-flight requests with `Stopped` and closes the transport.
    pub(crate) async fn close(&self) -> ProxyResult<()> {
        self.closing.cancel();
        self.transport.close().await
    }
}

impl fmt::Debug for ProxySession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxySession")
            .field("transport", &self.transport.display_name())
            .field("state", &self.state())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
