// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Mock Implementations
//!
//! An in-memory address space and a [`UaTransport`] serving it, for testing
//! the proxy layer without a server.
//!
//! ## Design Principles
//!
//! - Browse and Read follow server rules (direction, reference subtypes,
//!   node class masks, access denial, unknown nodes)
//! - Recording of interactions for verification
//! - Thread-safe for concurrent builds
//! - Failure injection per operation: errors, latency and hangs

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};

use ua_proxy::client::{
    BrowseRequest, BrowseResponse, CallRequest, CallResponse, DataValue, ReferenceDescription,
    UaTransport, UaValue,
};
use ua_proxy::ids::{is_reference_subtype, reference_types};
use ua_proxy::{
    AttributeId, LocalizedText, NodeClass, NodeId, ProxyError, ProxyResult, QualifiedName,
    StatusCode,
};

// =============================================================================
// Mock Address Space
// =============================================================================

/// One edge stored on a mock node.
#[derive(Debug, Clone, PartialEq)]
pub struct MockReference {
    /// Reference type.
    pub reference_type_id: NodeId,
    /// Direction as seen from the owning node.
    pub is_forward: bool,
    /// The other end.
    pub target: NodeId,
}

/// A node in the mock address space.
#[derive(Debug, Clone)]
pub struct MockNode {
    /// Node identifier.
    pub node_id: NodeId,
    /// Node class.
    pub node_class: NodeClass,
    /// Browse name.
    pub browse_name: QualifiedName,
    /// Display name.
    pub display_name: LocalizedText,
    /// Attributes other than the identity ones, keyed by attribute.
    pub attributes: HashMap<AttributeId, DataValue>,
    /// Forward and inverse references, in insertion order.
    pub references: Vec<MockReference>,
}

impl MockNode {
    /// Creates a node without attributes or references.
    pub fn new(node_id: NodeId, node_class: NodeClass, browse_name: impl Into<QualifiedName>) -> Self {
        let browse_name = browse_name.into();
        Self {
            display_name: LocalizedText::new(browse_name.name.clone()),
            node_id,
            node_class,
            browse_name,
            attributes: HashMap::new(),
            references: Vec::new(),
        }
    }

    /// Returns the target of the forward HasTypeDefinition reference.
    pub fn type_definition(&self) -> Option<&NodeId> {
        self.references
            .iter()
            .find(|r| r.is_forward && r.reference_type_id == reference_types::HAS_TYPE_DEFINITION)
            .map(|r| &r.target)
    }
}

/// In-memory node graph answering Browse and Read the way a server would.
#[derive(Debug, Default, Clone)]
pub struct MockAddressSpace {
    nodes: HashMap<NodeId, MockNode>,
    denied: HashSet<NodeId>,
}

/// Address space shared between a transport and its method handlers.
pub type SharedAddressSpace = Arc<RwLock<MockAddressSpace>>;

impl MockAddressSpace {
    /// Creates an empty address space.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a node.
    pub fn add_node(&mut self, node: MockNode) {
        self.nodes.insert(node.node_id.clone(), node);
    }

    /// Returns a node.
    pub fn node(&self, node_id: &NodeId) -> Option<&MockNode> {
        self.nodes.get(node_id)
    }

    /// Returns `true` if the node exists.
    pub fn contains(&self, node_id: &NodeId) -> bool {
        self.nodes.contains_key(node_id)
    }

    /// Returns the number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if there are no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Adds a forward reference on `source` and its inverse on `target`.
    ///
    /// A missing endpoint only gets the half that has a node.
    pub fn add_reference(&mut self, source: &NodeId, reference_type: NodeId, target: &NodeId) {
        if let Some(node) = self.nodes.get_mut(source) {
            node.references.push(MockReference {
                reference_type_id: reference_type.clone(),
                is_forward: true,
                target: target.clone(),
            });
        }
        if let Some(node) = self.nodes.get_mut(target) {
            node.references.push(MockReference {
                reference_type_id: reference_type,
                is_forward: false,
                target: source.clone(),
            });
        }
    }

    /// Stores an attribute value.
    pub fn set_attribute(&mut self, node_id: &NodeId, attribute: AttributeId, value: DataValue) {
        if let Some(node) = self.nodes.get_mut(node_id) {
            node.attributes.insert(attribute, value);
        }
    }

    /// Stores a good Value attribute.
    pub fn set_value(&mut self, node_id: &NodeId, value: impl Into<UaValue>) {
        self.set_attribute(node_id, AttributeId::Value, DataValue::good(value));
    }

    /// Stores the Executable and UserExecutable attributes of a method.
    pub fn set_executable(&mut self, node_id: &NodeId, executable: bool) {
        self.set_attribute(node_id, AttributeId::Executable, DataValue::good(executable));
        self.set_attribute(node_id, AttributeId::UserExecutable, DataValue::good(executable));
    }

    /// Returns the good Value attribute of a node.
    pub fn value(&self, node_id: &NodeId) -> Option<UaValue> {
        self.nodes
            .get(node_id)?
            .attributes
            .get(&AttributeId::Value)?
            .good_value()
            .cloned()
    }

    /// Returns the Executable attribute of a method.
    pub fn executable(&self, node_id: &NodeId) -> Option<bool> {
        self.nodes
            .get(node_id)?
            .attributes
            .get(&AttributeId::Executable)?
            .good_value()?
            .as_bool()
    }

    /// Makes every Browse and Read on `node_id` fail with BadUserAccessDenied.
    pub fn deny(&mut self, node_id: &NodeId) {
        self.denied.insert(node_id.clone());
    }

    /// Lifts a denial.
    pub fn allow(&mut self, node_id: &NodeId) {
        self.denied.remove(node_id);
    }

    /// Answers a Browse request.
    pub fn browse(&self, request: &BrowseRequest) -> BrowseResponse {
        if self.denied.contains(&request.node_id) {
            return BrowseResponse::bad(StatusCode::BAD_USER_ACCESS_DENIED);
        }
        let Some(node) = self.nodes.get(&request.node_id) else {
            return BrowseResponse::bad(StatusCode::BAD_NODE_ID_UNKNOWN);
        };

        let references = node
            .references
            .iter()
            .filter(|r| request.direction.accepts(r.is_forward))
            .filter(|r| match &request.reference_type_id {
                None => true,
                Some(filter) if request.include_subtypes => {
                    is_reference_subtype(&r.reference_type_id, filter)
                }
                Some(filter) => &r.reference_type_id == filter,
            })
            .filter_map(|r| {
                let target = self.nodes.get(&r.target)?;
                if request.node_class_mask != 0
                    && request.node_class_mask & target.node_class.value() == 0
                {
                    return None;
                }
                Some(ReferenceDescription {
                    reference_type_id: r.reference_type_id.clone(),
                    is_forward: r.is_forward,
                    node_id: target.node_id.clone(),
                    browse_name: target.browse_name.clone(),
                    display_name: target.display_name.clone(),
                    node_class: target.node_class,
                    type_definition: target.type_definition().cloned(),
                })
            })
            .collect();

        BrowseResponse::good(references)
    }

    /// Answers a Read request.
    pub fn read(&self, node_id: &NodeId, attribute: AttributeId) -> DataValue {
        if self.denied.contains(node_id) {
            return DataValue::bad(StatusCode::BAD_USER_ACCESS_DENIED);
        }
        let Some(node) = self.nodes.get(node_id) else {
            return DataValue::bad(StatusCode::BAD_NODE_ID_UNKNOWN);
        };

        match attribute {
            AttributeId::NodeId => DataValue::good(node.node_id.clone()),
            AttributeId::NodeClass => DataValue::good(UaValue::Int32(node.node_class.value() as i32)),
            AttributeId::BrowseName => DataValue::good(UaValue::QualifiedName(node.browse_name.clone())),
            AttributeId::DisplayName => DataValue::good(node.display_name.clone()),
            other => node
                .attributes
                .get(&other)
                .cloned()
                .unwrap_or_else(|| DataValue::bad(StatusCode::BAD_ATTRIBUTE_ID_INVALID)),
        }
    }
}

// =============================================================================
// Method Handler
// =============================================================================

/// Scripted behavior of a mock method.
///
/// Handlers run after the transport has checked that the method exists and
/// is executable.
pub trait MethodHandler: Send + Sync {
    /// Executes a call against the shared address space.
    fn call(&self, space: &SharedAddressSpace, request: &CallRequest) -> CallResponse;
}

impl<F> MethodHandler for F
where
    F: Fn(&SharedAddressSpace, &CallRequest) -> CallResponse + Send + Sync,
{
    fn call(&self, space: &SharedAddressSpace, request: &CallRequest) -> CallResponse {
        self(space, request)
    }
}

// =============================================================================
// Mock Transport
// =============================================================================

/// Operations failure injection can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    /// Browse service.
    Browse,
    /// Read service.
    Read,
    /// Call service.
    Call,
}

impl MockOperation {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Browse => "browse",
            Self::Read => "read",
            Self::Call => "call",
        }
    }
}

/// A configurable [`UaTransport`] over a [`MockAddressSpace`].
pub struct MockTransport {
    /// The served address space.
    space: SharedAddressSpace,

    /// Scripted methods keyed by method node.
    handlers: RwLock<HashMap<NodeId, Arc<dyn MethodHandler>>>,

    /// Simulated latency of every request.
    latency: Mutex<Duration>,

    /// Operations whose next request fails.
    fail_next: Mutex<HashSet<MockOperation>>,

    /// Operations whose requests all fail.
    fail_all: Mutex<HashSet<MockOperation>>,

    /// Operations whose requests never complete.
    hang: Mutex<HashSet<MockOperation>>,

    /// Set once `close()` ran.
    closed: AtomicBool,

    browse_count: AtomicU64,
    read_count: AtomicU64,
    call_count: AtomicU64,
    close_count: AtomicU64,

    /// Call history for verification.
    call_history: Mutex<Vec<CallRequest>>,

    /// Read history for verification.
    read_history: Mutex<Vec<(NodeId, AttributeId)>>,
}

impl MockTransport {
    /// Creates a transport serving `space`.
    pub fn new(space: MockAddressSpace) -> Self {
        Self::with_shared(Arc::new(RwLock::new(space)))
    }

    /// Creates a transport over an address space shared with the caller.
    pub fn with_shared(space: SharedAddressSpace) -> Self {
        Self {
            space,
            handlers: RwLock::new(HashMap::new()),
            latency: Mutex::new(Duration::ZERO),
            fail_next: Mutex::new(HashSet::new()),
            fail_all: Mutex::new(HashSet::new()),
            hang: Mutex::new(HashSet::new()),
            closed: AtomicBool::new(false),
            browse_count: AtomicU64::new(0),
            read_count: AtomicU64::new(0),
            call_count: AtomicU64::new(0),
            close_count: AtomicU64::new(0),
            call_history: Mutex::new(Vec::new()),
            read_history: Mutex::new(Vec::new()),
        }
    }

    /// Returns the served address space.
    pub fn space(&self) -> &SharedAddressSpace {
        &self.space
    }

    /// Registers a scripted method.
    pub fn set_handler(&self, method_id: NodeId, handler: impl MethodHandler + 'static) {
        self.handlers.write().insert(method_id, Arc::new(handler));
    }

    /// Sets the latency of every request.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = latency;
    }

    /// Fails the next request of `operation` with a transport error.
    pub fn fail_next(&self, operation: MockOperation) {
        self.fail_next.lock().insert(operation);
    }

    /// Fails every request of `operation` while `fail` is set.
    pub fn fail_all(&self, operation: MockOperation, fail: bool) {
        let mut set = self.fail_all.lock();
        if fail {
            set.insert(operation);
        } else {
            set.remove(&operation);
        }
    }

    /// Makes every request of `operation` hang while `hang` is set.
    pub fn hang(&self, operation: MockOperation, hang: bool) {
        let mut set = self.hang.lock();
        if hang {
            set.insert(operation);
        } else {
            set.remove(&operation);
        }
    }

    /// Returns the number of Browse requests.
    pub fn browse_count(&self) -> u64 {
        self.browse_count.load(Ordering::SeqCst)
    }

    /// Returns the number of Read requests.
    pub fn read_count(&self) -> u64 {
        self.read_count.load(Ordering::SeqCst)
    }

    /// Returns the number of Call requests.
    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Returns the number of `close()` calls.
    pub fn close_count(&self) -> u64 {
        self.close_count.load(Ordering::SeqCst)
    }

    /// Returns the total number of service requests.
    pub fn request_count(&self) -> u64 {
        self.browse_count() + self.read_count() + self.call_count()
    }

    /// Returns `true` once `close()` ran.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Returns the call history.
    pub fn call_history(&self) -> Vec<CallRequest> {
        self.call_history.lock().clone()
    }

    /// Returns how many times an attribute of a node was read.
    pub fn reads_of(&self, node_id: &NodeId, attribute: AttributeId) -> usize {
        self.read_history
            .lock()
            .iter()
            .filter(|(n, a)| n == node_id && *a == attribute)
            .count()
    }

    /// Clears counters, history and injected failures.
    pub fn reset(&self) {
        self.browse_count.store(0, Ordering::SeqCst);
        self.read_count.store(0, Ordering::SeqCst);
        self.call_count.store(0, Ordering::SeqCst);
        self.close_count.store(0, Ordering::SeqCst);
        self.call_history.lock().clear();
        self.read_history.lock().clear();
        self.fail_next.lock().clear();
        self.fail_all.lock().clear();
        self.hang.lock().clear();
    }

    /// Applies latency, hangs and injected failures ahead of a request.
    async fn before(&self, operation: MockOperation) -> ProxyResult<()> {
        let latency = *self.latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let hang = self.hang.lock().contains(&operation);
        if hang {
            trace!(operation = operation.as_str(), "mock request hanging");
            std::future::pending::<()>().await;
        }

        let fail = self.fail_next.lock().remove(&operation)
            || self.fail_all.lock().contains(&operation);
        if fail {
            debug!(operation = operation.as_str(), "injecting transport failure");
            return Err(ProxyError::transport(
                operation.as_str(),
                "injected transport failure",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl UaTransport for MockTransport {
    async fn browse(&self, request: &BrowseRequest) -> ProxyResult<BrowseResponse> {
        self.browse_count.fetch_add(1, Ordering::SeqCst);
        self.before(MockOperation::Browse).await?;
        Ok(self.space.read().browse(request))
    }

    async fn read(&self, node_id: &NodeId, attribute: AttributeId) -> ProxyResult<DataValue> {
        self.read_count.fetch_add(1, Ordering::SeqCst);
        self.read_history.lock().push((node_id.clone(), attribute));
        self.before(MockOperation::Read).await?;
        Ok(self.space.read().read(node_id, attribute))
    }

    async fn call(&self, request: &CallRequest) -> ProxyResult<CallResponse> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.call_history.lock().push(request.clone());
        self.before(MockOperation::Call).await?;

        {
            let space = self.space.read();
            if !space.contains(&request.object_id) {
                return Ok(CallResponse::with_status(StatusCode::BAD_NODE_ID_UNKNOWN));
            }
            match space.node(&request.method_id) {
                Some(node) if node.node_class == NodeClass::Method => {}
                _ => return Ok(CallResponse::with_status(StatusCode::BAD_METHOD_INVALID)),
            }
            if space.executable(&request.method_id) == Some(false) {
                return Ok(CallResponse::with_status(StatusCode::BAD_NOT_EXECUTABLE));
            }
        }

        let handler = self.handlers.read().get(&request.method_id).cloned();
        Ok(match handler {
            Some(handler) => handler.call(&self.space, request),
            None => CallResponse::good(Vec::new()),
        })
    }

    async fn close(&self) -> ProxyResult<()> {
        self.close_count.fetch_add(1, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn display_name(&self) -> String {
        "mock".to_string()
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("nodes", &self.space.read().len())
            .field("browse_count", &self.browse_count())
            .field("read_count", &self.read_count())
            .field("call_count", &self.call_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ua_proxy::BrowseDirection;

    fn space() -> MockAddressSpace {
        let mut space = MockAddressSpace::new();
        let parent = NodeId::numeric(1, 1);
        let child = NodeId::numeric(1, 2);
        space.add_node(MockNode::new(parent.clone(), NodeClass::Object, "1:Parent"));
        space.add_node(MockNode::new(child.clone(), NodeClass::Variable, "1:Child"));
        space.add_reference(&parent, reference_types::HAS_PROPERTY, &child);
        space.set_value(&child, 7);
        space
    }

    #[test]
    fn test_browse_follows_reference_subtypes() {
        let space = space();
        let request = BrowseRequest::new(NodeId::numeric(1, 1))
            .reference_type(reference_types::HIERARCHICAL_REFERENCES, true);
        assert_eq!(space.browse(&request).references.len(), 1);

        let exact = BrowseRequest::new(NodeId::numeric(1, 1))
            .reference_type(reference_types::HAS_COMPONENT, false);
        assert!(space.browse(&exact).references.is_empty());

        let inverse = BrowseRequest::new(NodeId::numeric(1, 2)).direction(BrowseDirection::Inverse);
        let response = space.browse(&inverse);
        assert_eq!(response.references.len(), 1);
        assert!(!response.references[0].is_forward);
    }

    #[test]
    fn test_read_statuses() {
        let mut space = space();
        assert_eq!(
            space.read(&NodeId::numeric(1, 2), AttributeId::Value).value,
            Some(UaValue::Int32(7))
        );
        assert_eq!(
            space.read(&NodeId::numeric(1, 1), AttributeId::Executable).status,
            StatusCode::BAD_ATTRIBUTE_ID_INVALID
        );
        assert_eq!(
            space.read(&NodeId::numeric(1, 9), AttributeId::Value).status,
            StatusCode::BAD_NODE_ID_UNKNOWN
        );

        space.deny(&NodeId::numeric(1, 2));
        assert_eq!(
            space.read(&NodeId::numeric(1, 2), AttributeId::Value).status,
            StatusCode::BAD_USER_ACCESS_DENIED
        );
    }

    #[tokio::test]
    async fn test_injected_failure_is_one_shot() {
        let transport = MockTransport::new(space());
        transport.fail_next(MockOperation::Read);

        assert!(transport.read(&NodeId::numeric(1, 2), AttributeId::Value).await.is_err());
        assert!(transport.read(&NodeId::numeric(1, 2), AttributeId::Value).await.is_ok());
        assert_eq!(transport.read_count(), 2);
        assert_eq!(transport.reads_of(&NodeId::numeric(1, 2), AttributeId::Value), 2);
    }
}
