// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Proxy manager: lifecycle, object cache and type resolution entry point.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::client::{
    CancellationToken, ManagerState, ProxySession, SessionStatsSnapshot, UaTransport,
};
use crate::config::ProxyConfig;
use crate::error::{ProxyError, ProxyErrorContext, ProxyResult};
use crate::proxy::{ObjectProxy, ProxyBuilder};
use crate::resolver::{StateMachineType, StateMachineTypeRef, TypeResolver};
use crate::types::NodeId;

// =============================================================================
// ProxyManager
// =============================================================================

/// Builds and owns proxy trees over one transport.
///
/// # Lifecycle
///
/// ```text
/// Created ──start()──► Started ──stop()──► Stopping ──► Stopped
/// ```
///
/// Operations before `start()` fail with `NotStarted`. After `stop()` every
/// operation fails with `Stopped`, including operations on proxies handed
/// out earlier. Repeated `start()` or `stop()` calls are no-ops.
///
/// # Example
///
/// ```rust,ignore
/// let manager = ProxyManager::new(transport, ProxyConfig::default());
/// manager.start().await?;
///
/// let boiler = manager.get_object(&NodeId::string(1, "Boiler#1")).await?;
/// let start = boiler.find("Simulation/Start").and_then(|n| n.as_method()).unwrap();
/// if start.read_executable_flag().await? {
///     start.invoke(vec![]).await?;
/// }
///
/// manager.stop().await?;
/// ```
pub struct ProxyManager {
    session: Arc<ProxySession>,
    resolver: TypeResolver,
    builder: ProxyBuilder,
    objects: DashMap<NodeId, Arc<ObjectProxy>>,
    lifecycle: Mutex<()>,
}

impl ProxyManager {
    /// Creates a manager in the `Created` state.
    pub fn new(transport: Arc<dyn UaTransport>, config: ProxyConfig) -> Self {
        let session = Arc::new(ProxySession::new(transport, config));
        let resolver = TypeResolver::new(session.clone());
        let builder = ProxyBuilder::new(session.clone(), resolver.clone());
        Self {
            session,
            resolver,
            builder,
            objects: DashMap::new(),
            lifecycle: Mutex::new(()),
        }
    }

    /// Returns the lifecycle state.
    pub fn state(&self) -> ManagerState {
        self.session.state()
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ProxyConfig {
        self.session.config()
    }

    /// Returns the type resolver.
    pub fn type_resolver(&self) -> &TypeResolver {
        &self.resolver
    }

    /// Returns the number of cached object trees.
    pub fn cached_objects(&self) -> usize {
        self.objects.len()
    }

    /// Returns a snapshot of the operation counters.
    pub fn stats(&self) -> SessionStatsSnapshot {
        self.session.stats().snapshot()
    }

    /// Starts the manager and warms the type cache.
    ///
    /// If warming fails the manager stays `Created` and `start()` may be
    /// retried.
    pub async fn start(&self) -> ProxyResult<()> {
        let _guard = self.lifecycle.lock().await;

        match self.session.state() {
            ManagerState::Started => return Ok(()),
            ManagerState::Stopping | ManagerState::Stopped => {
                return Err(ProxyError::stopped("start"));
            }
            ManagerState::Created => {}
        }

        info!(transport = %self.session.transport_name(), "Starting proxy manager");
        self.session
            .transition(&[ManagerState::Created], ManagerState::Started);

        if let Err(e) = self.resolver.warm(None).await {
            e.log("start");
            self.session
                .transition(&[ManagerState::Started], ManagerState::Created);
            return Err(e);
        }

        debug!(cached_types = self.resolver.cache().len(), "Type cache warmed");
        Ok(())
    }

    /// Stops the manager.
    ///
    /// In-flight operations fail with `Stopped`, built proxies are dropped,
    /// the type cache is cleared and the transport is closed.
    pub async fn stop(&self) -> ProxyResult<()> {
        let _guard = self.lifecycle.lock().await;

        let previous = self.session.transition(
            &[ManagerState::Created, ManagerState::Started],
            ManagerState::Stopping,
        );
        if previous.is_stopped() {
            return Ok(());
        }

        let closed = self.session.close().await;
        self.objects.clear();
        self.resolver.cache().clear();
        self.session
            .transition(&[ManagerState::Stopping], ManagerState::Stopped);

        if let Err(e) = &closed {
            warn!(error = %e, "Transport close failed");
        }
        info!("Proxy manager stopped");
        closed
    }

    /// Resolves a state machine type by browse name or NodeId.
    pub async fn get_state_machine_type(
        &self,
        type_ref: impl Into<StateMachineTypeRef>,
    ) -> ProxyResult<Arc<StateMachineType>> {
        self.resolve_state_machine(type_ref.into(), None).await
    }

    /// Like [`get_state_machine_type`](Self::get_state_machine_type),
    /// released early by `cancel`.
    pub async fn get_state_machine_type_with(
        &self,
        type_ref: impl Into<StateMachineTypeRef>,
        cancel: &CancellationToken,
    ) -> ProxyResult<Arc<StateMachineType>> {
        self.resolve_state_machine(type_ref.into(), Some(cancel))
            .await
    }

    async fn resolve_state_machine(
        &self,
        type_ref: StateMachineTypeRef,
        cancel: Option<&CancellationToken>,
    ) -> ProxyResult<Arc<StateMachineType>> {
        self.session.ensure_started("get_state_machine_type")?;
        self.resolver
            .resolve_state_machine_type(type_ref, cancel)
            .await
            .log_err("get_state_machine_type")
    }

    /// Returns the proxy tree rooted at an Object node.
    ///
    /// With `cache_objects`, repeated calls for the same root return the
    /// same tree.
    pub async fn get_object(&self, node_id: &NodeId) -> ProxyResult<Arc<ObjectProxy>> {
        self.object(node_id, None).await
    }

    /// Like [`get_object`](Self::get_object), released early by `cancel`.
    pub async fn get_object_with(
        &self,
        node_id: &NodeId,
        cancel: &CancellationToken,
    ) -> ProxyResult<Arc<ObjectProxy>> {
        self.object(node_id, Some(cancel)).await
    }

    /// Discards any cached tree for `node_id` and builds a new one.
    pub async fn rebuild_object(&self, node_id: &NodeId) -> ProxyResult<Arc<ObjectProxy>> {
        self.session.ensure_started("rebuild_object")?;
        self.objects.remove(node_id);
        self.object(node_id, None).await
    }

    async fn object(
        &self,
        node_id: &NodeId,
        cancel: Option<&CancellationToken>,
    ) -> ProxyResult<Arc<ObjectProxy>> {
        self.session.ensure_started("get_object")?;

        let cache_objects = self.session.config().cache_objects;
        if cache_objects {
            if let Some(object) = self.objects.get(node_id) {
                return Ok(object.value().clone());
            }
        }

        let object = Arc::new(
            self.builder
                .build_object(node_id, cancel)
                .await
                .log_err("get_object")?,
        );

        if cache_objects {
            self.cache_object(node_id, &object)?;
        }
        Ok(object)
    }

    /// Caches a built tree unless stop() began meanwhile.
    ///
    /// stop() leaves Started before it clears the cache, so an entry
    /// inserted around the clear is removed either by the clear or by the
    /// re-check here.
    fn cache_object(&self, node_id: &NodeId, object: &Arc<ObjectProxy>) -> ProxyResult<()> {
        self.objects.insert(node_id.clone(), object.clone());
        if let Err(e) = self.session.ensure_started("get_object") {
            self.objects.remove(node_id);
            return Err(e);
        }
        Ok(())
    }
}

impl std::fmt::Debug for ProxyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyManager")
            .field("session", &self.session)
            .field("objects", &self.objects.len())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{BrowseRequest, BrowseResponse, CallRequest, CallResponse, DataValue};
    use crate::error::ErrorKind;
    use crate::proxy::{Children, NodeInfo};
    use crate::types::{AttributeId, NodeClass, QualifiedName, StatusCode};
    use async_trait::async_trait;

    struct NullTransport;

    #[async_trait]
    impl UaTransport for NullTransport {
        async fn browse(&self, _request: &BrowseRequest) -> ProxyResult<BrowseResponse> {
            Ok(BrowseResponse::good(Vec::new()))
        }

        async fn read(&self, _node_id: &NodeId, _attribute: AttributeId) -> ProxyResult<DataValue> {
            Ok(DataValue::bad(StatusCode::BAD_NOT_READABLE))
        }

        async fn call(&self, _request: &CallRequest) -> ProxyResult<CallResponse> {
            Ok(CallResponse::with_status(StatusCode::BAD_METHOD_INVALID))
        }

        fn display_name(&self) -> String {
            "null".into()
        }
    }

    fn pump() -> (NodeId, Arc<ObjectProxy>) {
        let node_id = NodeId::numeric(1, 1);
        let info = NodeInfo {
            node_id: node_id.clone(),
            browse_name: QualifiedName::new(1, "Pump"),
            node_class: NodeClass::Object,
            type_definition: None,
        };
        (node_id, Arc::new(ObjectProxy::new(info, Children::new())))
    }

    #[test]
    fn test_cache_object_while_started() {
        let manager = ProxyManager::new(Arc::new(NullTransport), ProxyConfig::default());
        manager
            .session
            .transition(&[ManagerState::Created], ManagerState::Started);

        let (node_id, object) = pump();
        manager.cache_object(&node_id, &object).unwrap();
        assert_eq!(manager.cached_objects(), 1);
    }

    #[test]
    fn test_cache_object_after_stop_began() {
        let manager = ProxyManager::new(Arc::new(NullTransport), ProxyConfig::default());
        manager
            .session
            .transition(&[ManagerState::Created], ManagerState::Started);

        // stop() has left Started and cleared the cache; the build lands now.
        manager
            .session
            .transition(&[ManagerState::Started], ManagerState::Stopping);
        manager.objects.clear();

        let (node_id, object) = pump();
        let err = manager.cache_object(&node_id, &object).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Stopped);
        assert_eq!(manager.cached_objects(), 0);
    }
}
