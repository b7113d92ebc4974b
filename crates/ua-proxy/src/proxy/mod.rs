// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Proxy trees and the manager that builds them.
//!
//! A built tree mirrors one remote Object and everything hierarchically
//! below it:
//!
//! ```text
//! ObjectProxy  Boiler#1
//! ├── VariableProxy  Temperature        (cached DataValue)
//! └── ObjectProxy    Simulation
//!     ├── VariableProxy  CurrentState
//!     │   └── VariableProxy  Id
//!     ├── MethodProxy    start          (cached executable flag)
//!     └── MethodProxy    halt
//! ```
//!
//! Children keep the server's browse order. Objects and Variables are keyed
//! by browse name, Methods by their lower-cased name.

mod builder;
mod manager;
mod object;

use std::fmt::{self, Write as _};

pub use manager::ProxyManager;
pub use object::{Children, MethodProxy, NodeInfo, ObjectProxy, VariableProxy};

pub(crate) use builder::ProxyBuilder;

use crate::client::{DataValue, UaValue};
use crate::error::{ConversionError, ProxyError, ProxyResult};
use crate::invoke::CallOutcome;
use crate::resolver::TypeDefinition;
use crate::types::{AttributeId, NodeClass, NodeId, QualifiedName};

// =============================================================================
// ProxyNode
// =============================================================================

/// A node of a proxy tree.
#[derive(Debug)]
pub enum ProxyNode {
    /// An Object with children.
    Object(ObjectProxy),

    /// A Variable with a cached value.
    Variable(VariableProxy),

    /// A Method with a cached executable flag.
    Method(MethodProxy),
}

impl ProxyNode {
    /// Returns the node identity.
    pub fn info(&self) -> &NodeInfo {
        match self {
            Self::Object(o) => &o.info,
            Self::Variable(v) => &v.info,
            Self::Method(m) => &m.info,
        }
    }

    /// Returns the remote node.
    pub fn node_id(&self) -> &NodeId {
        &self.info().node_id
    }

    /// Returns the browse name.
    pub fn browse_name(&self) -> &QualifiedName {
        &self.info().browse_name
    }

    /// Returns the node class.
    pub fn node_class(&self) -> NodeClass {
        self.info().node_class
    }

    /// Returns the resolved type definition.
    pub fn type_definition(&self) -> Option<&TypeDefinition> {
        self.info().type_definition.as_ref()
    }

    /// Returns the key this node is stored under in its parent.
    pub fn key(&self) -> String {
        self.info().key()
    }

    /// Returns `true` for a Method node.
    pub fn is_method(&self) -> bool {
        matches!(self, Self::Method(_))
    }

    /// Returns the Object proxy, if this is one.
    pub fn as_object(&self) -> Option<&ObjectProxy> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Returns the Variable proxy, if this is one.
    pub fn as_variable(&self) -> Option<&VariableProxy> {
        match self {
            Self::Variable(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the Method proxy, if this is one.
    pub fn as_method(&self) -> Option<&MethodProxy> {
        match self {
            Self::Method(m) => Some(m),
            _ => None,
        }
    }

    fn shape_mismatch(&self, expected: &'static str) -> ProxyError {
        ProxyError::conversion(ConversionError::type_mismatch(
            self.node_id().to_string(),
            AttributeId::NodeClass,
            expected,
            self.node_class().to_string(),
        ))
    }

    /// Reads the value of a Variable node. Other shapes fail with
    /// `Conversion`.
    pub async fn read_value(&self) -> ProxyResult<DataValue> {
        match self {
            Self::Variable(v) => v.read_value().await,
            _ => Err(self.shape_mismatch("Variable")),
        }
    }

    /// Invokes a Method node. Other shapes fail with `Conversion`.
    pub async fn invoke(&self, args: Vec<UaValue>) -> ProxyResult<CallOutcome> {
        match self {
            Self::Method(m) => m.invoke(args).await,
            _ => Err(self.shape_mismatch("Method")),
        }
    }

    /// Last known executable flag of a Method node, `None` for other shapes.
    pub fn executable_flag(&self) -> Option<bool> {
        self.as_method().and_then(MethodProxy::executable_flag)
    }

    /// Reads the executable flag of a Method node from the server.
    pub async fn read_executable_flag(&self) -> ProxyResult<bool> {
        match self {
            Self::Method(m) => m.read_executable_flag().await,
            _ => Err(self.shape_mismatch("Method")),
        }
    }

    /// Returns the children. Methods have none.
    pub fn children(&self) -> Option<&Children> {
        match self {
            Self::Object(o) => Some(&o.children),
            Self::Variable(v) => Some(&v.children),
            Self::Method(_) => None,
        }
    }

    /// Returns a child of any shape.
    pub fn child(&self, key: &str) -> Option<&ProxyNode> {
        self.children()?.get(key)
    }

    /// Returns a child Object.
    pub fn object(&self, name: &str) -> Option<&ObjectProxy> {
        self.children()?.named(name).and_then(Self::as_object)
    }

    /// Returns a child Variable.
    pub fn variable(&self, name: &str) -> Option<&VariableProxy> {
        self.children()?.named(name).and_then(Self::as_variable)
    }

    /// Returns a child Method. The lookup is case-insensitive.
    pub fn method(&self, name: &str) -> Option<&MethodProxy> {
        self.children()?.method(name).and_then(Self::as_method)
    }

    /// Navigates a slash-separated path of child keys below this node.
    pub fn find(&self, path: &str) -> Option<&ProxyNode> {
        let mut current = self;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = current.child(segment)?;
        }
        Some(current)
    }

    /// Renders the subtree as indented text.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        describe_into(&mut out, &self.key(), self, 0);
        out
    }
}

impl ObjectProxy {
    /// Renders the tree as indented text.
    ///
    /// One line per node: key, node class, NodeId, the type name where
    /// resolved, and the cached value or executable flag.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        write_line(&mut out, &self.info.browse_name.name, &self.info, 0, None);
        for (key, child) in self.children.iter() {
            describe_into(&mut out, key, child, 1);
        }
        out
    }
}

fn describe_into(out: &mut String, key: &str, node: &ProxyNode, depth: usize) {
    let detail = match node {
        ProxyNode::Object(_) => None,
        ProxyNode::Variable(v) => Some(match v.cached_value() {
            Some(value) => match value.good_value() {
                Some(v) => format!("= {}", v),
                None => format!("= <{}>", value.status),
            },
            None => "= <unread>".to_string(),
        }),
        ProxyNode::Method(m) => Some(match m.executable_flag() {
            Some(flag) => format!("executable={}", flag),
            None => "executable=?".to_string(),
        }),
    };
    write_line(out, key, node.info(), depth, detail.as_deref());
    if let Some(children) = node.children() {
        for (key, child) in children.iter() {
            describe_into(out, key, child, depth + 1);
        }
    }
}

fn write_line(out: &mut String, key: &str, info: &NodeInfo, depth: usize, detail: Option<&str>) {
    let _ = write!(
        out,
        "{:indent$}{} [{}] {}",
        "",
        key,
        info.node_class,
        info.node_id,
        indent = depth * 2
    );
    if let Some(definition) = &info.type_definition {
        let _ = write!(out, " : {}", definition.name());
    }
    if let Some(detail) = detail {
        let _ = write!(out, " {}", detail);
    }
    out.push('\n');
}

impl fmt::Display for ProxyNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.browse_name(), self.node_class(), self.node_id())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{
        BrowseRequest, BrowseResponse, CallRequest, CallResponse, DataValue, ProxySession,
        UaTransport, UaValue,
    };
    use crate::config::ProxyConfig;
    use crate::error::{ErrorKind, ProxyResult};
    use crate::types::{AttributeId, StatusCode};
    use async_trait::async_trait;
    use std::sync::Arc;

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

    fn info(name: &str, id: u32, node_class: NodeClass) -> NodeInfo {
        NodeInfo {
            node_id: NodeId::numeric(1, id),
            browse_name: QualifiedName::new(1, name),
            node_class,
            type_definition: None,
        }
    }

    fn tree() -> ObjectProxy {
        let session = Arc::new(ProxySession::new(Arc::new(NullTransport), ProxyConfig::default()));
        let parent = NodeId::numeric(1, 1);

        let mut simulation = Children::new();
        simulation
            .insert(
                &NodeId::numeric(1, 3),
                ProxyNode::Method(MethodProxy::new(
                    info("Start", 4, NodeClass::Method),
                    NodeId::numeric(1, 3),
                    session.clone(),
                    Some(true),
                )),
            )
            .unwrap();

        let mut children = Children::new();
        children
            .insert(
                &parent,
                ProxyNode::Variable(VariableProxy::new(
                    info("Temperature", 2, NodeClass::Variable),
                    Children::new(),
                    session,
                    Some(DataValue::good(UaValue::Double(21.5))),
                )),
            )
            .unwrap();
        children
            .insert(
                &parent,
                ProxyNode::Object(ObjectProxy::new(info("Simulation", 3, NodeClass::Object), simulation)),
            )
            .unwrap();

        ObjectProxy::new(info("Boiler", 1, NodeClass::Object), children)
    }

    #[test]
    fn test_method_lookup_is_case_insensitive() {
        let boiler = tree();
        let simulation = boiler.object("Simulation").unwrap();
        assert!(simulation.method("Start").is_some());
        assert!(simulation.method("start").is_some());
        assert!(simulation.method("START").is_some());
        assert!(simulation.child("Start").is_some());
        assert_eq!(simulation.methods().count(), 1);
    }

    #[test]
    fn test_non_method_keys_are_exact() {
        let boiler = tree();
        assert!(boiler.variable("Temperature").is_some());
        assert!(boiler.variable("temperature").is_none());
        assert_eq!(boiler.variables().count(), 1);
        assert_eq!(boiler.objects().count(), 1);
    }

    #[test]
    fn test_find_path() {
        let boiler = tree();
        let start = boiler.find("Simulation/Start").unwrap();
        assert!(start.is_method());
        assert_eq!(start.key(), "start");
        assert!(boiler.find("Simulation/Stop").is_none());
        assert!(boiler.find("Temperature/Start").is_none());
        assert!(boiler.find("").is_none());
    }

    #[test]
    fn test_duplicate_key_fails() {
        let session = Arc::new(ProxySession::new(Arc::new(NullTransport), ProxyConfig::default()));
        let parent = NodeId::numeric(1, 1);
        let mut children = Children::new();
        let method = |name: &str, id| {
            ProxyNode::Method(MethodProxy::new(
                info(name, id, NodeClass::Method),
                parent.clone(),
                session.clone(),
                None,
            ))
        };
        children.insert(&parent, method("Start", 2)).unwrap();
        let err = children.insert(&parent, method("START", 3)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateChild);
    }

    #[test]
    fn test_method_and_variable_keys_are_separate() {
        let session = Arc::new(ProxySession::new(Arc::new(NullTransport), ProxyConfig::default()));
        let parent = NodeId::numeric(1, 1);
        let mut children = Children::new();
        children
            .insert(
                &parent,
                ProxyNode::Variable(VariableProxy::new(
                    info("start", 2, NodeClass::Variable),
                    Children::new(),
                    session.clone(),
                    None,
                )),
            )
            .unwrap();
        children
            .insert(
                &parent,
                ProxyNode::Method(MethodProxy::new(
                    info("Start", 3, NodeClass::Method),
                    parent.clone(),
                    session.clone(),
                    None,
                )),
            )
            .unwrap();

        let object = ObjectProxy::new(info("Pump", 1, NodeClass::Object), children);
        assert_eq!(object.variable("start").unwrap().node_id(), &NodeId::numeric(1, 2));
        assert_eq!(object.method("start").unwrap().node_id(), &NodeId::numeric(1, 3));
        assert!(object.child("start").unwrap().as_variable().is_some());
        assert!(object.child("Start").unwrap().is_method());
        let keys: Vec<&str> = object.children().iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["start", "start"]);
    }

    #[test]
    fn test_same_exact_name_fails_across_shapes() {
        let session = Arc::new(ProxySession::new(Arc::new(NullTransport), ProxyConfig::default()));
        let parent = NodeId::numeric(1, 1);
        let mut children = Children::new();
        children
            .insert(
                &parent,
                ProxyNode::Object(ObjectProxy::new(info("Start", 2, NodeClass::Object), Children::new())),
            )
            .unwrap();
        let err = children
            .insert(
                &parent,
                ProxyNode::Method(MethodProxy::new(
                    info("Start", 3, NodeClass::Method),
                    parent.clone(),
                    session,
                    None,
                )),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateChild);
    }

    #[test]
    fn test_describe() {
        let text = tree().describe();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Boiler [Object] ns=1;i=1");
        assert_eq!(lines[1], "  Temperature [Variable] ns=1;i=2 = 21.5");
        assert_eq!(lines[2], "  Simulation [Object] ns=1;i=3");
        assert_eq!(lines[3], "    start [Method] ns=1;i=4 executable=true");
    }
}
