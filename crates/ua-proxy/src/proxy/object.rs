// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Proxy shapes for Object, Variable and Method nodes.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::client::{CancellationToken, DataValue, ProxySession};
use crate::error::{BuildError, ProxyError, ProxyResult};
use crate::proxy::ProxyNode;
use crate::resolver::TypeDefinition;
use crate::types::{AttributeId, NodeClass, NodeId, QualifiedName};

// =============================================================================
// NodeInfo
// =============================================================================

/// Identity of a proxied node, captured at build time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    /// The remote node.
    pub node_id: NodeId,

    /// Browse name of the node.
    pub browse_name: QualifiedName,

    /// Node class.
    pub node_class: NodeClass,

    /// Resolved type definition, for Object and Variable nodes.
    pub type_definition: Option<TypeDefinition>,
}

impl NodeInfo {
    /// Returns the child key of this node under its parent.
    ///
    /// Methods are keyed by their lower-cased browse name; everything else
    /// keeps the exact name.
    pub fn key(&self) -> String {
        child_key(&self.browse_name, self.node_class)
    }
}

/// Returns the key a child with this name and class is stored under.
pub(crate) fn child_key(browse_name: &QualifiedName, node_class: NodeClass) -> String {
    match node_class {
        NodeClass::Method => browse_name.name.to_lowercase(),
        _ => browse_name.name.clone(),
    }
}

// =============================================================================
// Children
// =============================================================================

/// Key bookkeeping for the children of one parent.
///
/// Browse names must be unique among siblings. Methods additionally claim
/// their lower-cased name in a key space of their own.
#[derive(Debug, Default)]
pub(crate) struct ChildKeys {
    names: HashSet<String>,
    methods: HashSet<String>,
}

impl ChildKeys {
    /// Claims the key of a child, returning it.
    pub(crate) fn claim(
        &mut self,
        parent: &NodeId,
        browse_name: &QualifiedName,
        node_class: NodeClass,
    ) -> ProxyResult<String> {
        let duplicate = |key: String| {
            Err(ProxyError::build(BuildError::duplicate_child(
                parent.to_string(),
                key,
            )))
        };

        if !self.names.insert(browse_name.name.clone()) {
            return duplicate(browse_name.name.clone());
        }
        let key = child_key(browse_name, node_class);
        if node_class == NodeClass::Method && !self.methods.insert(key.clone()) {
            return duplicate(key);
        }
        Ok(key)
    }
}

/// Uniquely keyed children of a proxy, in server browse order.
///
/// Objects and Variables are found by exact browse name, Methods by their
/// lower-cased name. A Variable `start` and a Method `Start` coexist.
#[derive(Debug, Default)]
pub struct Children {
    entries: Vec<(String, ProxyNode)>,
    named: HashMap<String, usize>,
    methods: HashMap<String, usize>,
    keys: ChildKeys,
}

impl Children {
    /// Creates an empty child map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a child. A taken browse name or method key is a build
    /// failure.
    pub fn insert(&mut self, parent: &NodeId, node: ProxyNode) -> ProxyResult<()> {
        let key = self
            .keys
            .claim(parent, node.browse_name(), node.node_class())?;
        let index = self.entries.len();
        if node.is_method() {
            self.methods.insert(key.clone(), index);
        } else {
            self.named.insert(key.clone(), index);
        }
        self.entries.push((key, node));
        Ok(())
    }

    /// Returns the child stored under `key`.
    ///
    /// Objects and Variables match exactly first, then Methods match
    /// case-insensitively.
    pub fn get(&self, key: &str) -> Option<&ProxyNode> {
        self.named(key).or_else(|| self.method(key))
    }

    /// Returns the Object or Variable child with this exact browse name.
    pub fn named(&self, name: &str) -> Option<&ProxyNode> {
        self.named.get(name).and_then(|&i| self.at(i))
    }

    /// Returns the Method child with this name, ignoring case.
    pub fn method(&self, name: &str) -> Option<&ProxyNode> {
        self.methods
            .get(&name.to_lowercase())
            .and_then(|&i| self.at(i))
    }

    fn at(&self, index: usize) -> Option<&ProxyNode> {
        self.entries.get(index).map(|(_, node)| node)
    }

    /// Iterates over `(key, child)` pairs in server order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProxyNode)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of children.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no children.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// ObjectProxy
// =============================================================================

/// Client-side mirror of a remote Object node.
pub struct ObjectProxy {
    pub(crate) info: NodeInfo,
    pub(crate) children: Children,
}

impl ObjectProxy {
    pub(crate) fn new(info: NodeInfo, children: Children) -> Self {
        Self { info, children }
    }

    /// Returns the node identity.
    pub fn info(&self) -> &NodeInfo {
        &self.info
    }

    /// Returns the remote node.
    pub fn node_id(&self) -> &NodeId {
        &self.info.node_id
    }

    /// Returns the browse name.
    pub fn browse_name(&self) -> &QualifiedName {
        &self.info.browse_name
    }

    /// Returns the resolved type definition.
    pub fn type_definition(&self) -> Option<&TypeDefinition> {
        self.info.type_definition.as_ref()
    }

    /// Returns the children.
    pub fn children(&self) -> &Children {
        &self.children
    }

    /// Returns a child of any shape.
    pub fn child(&self, key: &str) -> Option<&ProxyNode> {
        self.children.get(key)
    }

    /// Returns a child Object.
    pub fn object(&self, name: &str) -> Option<&ObjectProxy> {
        self.children.named(name).and_then(ProxyNode::as_object)
    }

    /// Returns a child Variable.
    pub fn variable(&self, name: &str) -> Option<&VariableProxy> {
        self.children.named(name).and_then(ProxyNode::as_variable)
    }

    /// Returns a child Method. The lookup is case-insensitive.
    pub fn method(&self, name: &str) -> Option<&MethodProxy> {
        self.children.method(name).and_then(ProxyNode::as_method)
    }

    /// Iterates over child Objects.
    pub fn objects(&self) -> impl Iterator<Item = &ObjectProxy> {
        self.children.iter().filter_map(|(_, n)| n.as_object())
    }

    /// Iterates over child Variables.
    pub fn variables(&self) -> impl Iterator<Item = &VariableProxy> {
        self.children.iter().filter_map(|(_, n)| n.as_variable())
    }

    /// Iterates over child Methods.
    pub fn methods(&self) -> impl Iterator<Item = &MethodProxy> {
        self.children.iter().filter_map(|(_, n)| n.as_method())
    }

    /// Navigates a slash-separated path of child keys.
    ///
    /// Method segments match case-insensitively. An empty path is `None`.
    pub fn find(&self, path: &str) -> Option<&ProxyNode> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let mut current = self.children.get(segments.next()?)?;
        for segment in segments {
            current = current.children()?.get(segment)?;
        }
        Some(current)
    }
}

impl fmt::Debug for ObjectProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectProxy")
            .field("node_id", &self.info.node_id)
            .field("browse_name", &self.info.browse_name)
            .field("children", &self.children.len())
            .finish()
    }
}

// =============================================================================
// VariableProxy
// =============================================================================

/// Client-side mirror of a remote Variable node.
pub struct VariableProxy {
    pub(crate) info: NodeInfo,
    pub(crate) children: Children,
    session: Arc<ProxySession>,
    cached: RwLock<Option<DataValue>>,
}

impl VariableProxy {
    pub(crate) fn new(
        info: NodeInfo,
        children: Children,
        session: Arc<ProxySession>,
        initial: Option<DataValue>,
    ) -> Self {
        Self {
            info,
            children,
            session,
            cached: RwLock::new(initial),
        }
    }

    /// Returns the node identity.
    pub fn info(&self) -> &NodeInfo {
        &self.info
    }

    /// Returns the remote node.
    pub fn node_id(&self) -> &NodeId {
        &self.info.node_id
    }

    /// Returns the browse name.
    pub fn browse_name(&self) -> &QualifiedName {
        &self.info.browse_name
    }

    /// Returns properties and components of the variable.
    pub fn children(&self) -> &Children {
        &self.children
    }

    /// Reads the current value from the server and caches it.
    ///
    /// A bad status on the value is data; only transport failures, timeouts
    /// and lifecycle misuse are errors.
    pub async fn read_value(&self) -> ProxyResult<DataValue> {
        self.read(None).await
    }

    /// Like [`read_value`](Self::read_value), released early by `cancel`.
    pub async fn read_value_with(&self, cancel: &CancellationToken) -> ProxyResult<DataValue> {
        self.read(Some(cancel)).await
    }

    async fn read(&self, cancel: Option<&CancellationToken>) -> ProxyResult<DataValue> {
        let value = self
            .session
            .read(&self.info.node_id, AttributeId::Value, cancel)
            .await?;
        trace!(node_id = %self.info.node_id, status = %value.status, "Read value");
        *self.cached.write() = Some(value.clone());
        Ok(value)
    }

    /// Returns the value of the most recent completed read, without I/O.
    pub fn cached_value(&self) -> Option<DataValue> {
        self.cached.read().clone()
    }
}

impl fmt::Debug for VariableProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariableProxy")
            .field("node_id", &self.info.node_id)
            .field("browse_name", &self.info.browse_name)
            .field("cached", &*self.cached.read())
            .finish()
    }
}

// =============================================================================
// MethodProxy
// =============================================================================

/// Client-side mirror of a remote Method node.
///
/// The gate operations live in [`crate::gate`] and invocation in
/// [`crate::invoke`].
pub struct MethodProxy {
    pub(crate) info: NodeInfo,
    pub(crate) object_id: NodeId,
    pub(crate) session: Arc<ProxySession>,
    pub(crate) executable: RwLock<Option<bool>>,
}

impl MethodProxy {
    pub(crate) fn new(
        info: NodeInfo,
        object_id: NodeId,
        session: Arc<ProxySession>,
        executable: Option<bool>,
    ) -> Self {
        Self {
            info,
            object_id,
            session,
            executable: RwLock::new(executable),
        }
    }

    /// Returns the node identity.
    pub fn info(&self) -> &NodeInfo {
        &self.info
    }

    /// Returns the method node.
    pub fn node_id(&self) -> &NodeId {
        &self.info.node_id
    }

    /// Returns the browse name.
    pub fn browse_name(&self) -> &QualifiedName {
        &self.info.browse_name
    }

    /// Returns the object the method is invoked on.
    pub fn object_id(&self) -> &NodeId {
        &self.object_id
    }
}

impl fmt::Debug for MethodProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodProxy")
            .field("node_id", &self.info.node_id)
            .field("browse_name", &self.info.browse_name)
            .field("object_id", &self.object_id)
            .field("executable", &*self.executable.read())
            .finish()
    }
}
