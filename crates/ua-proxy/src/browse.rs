// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Single-level graph browsing.
//!
//! [`GraphBrowser`] enumerates the references of one node at a time. It
//! never recurses: the proxy builder drives recursion, and the type resolver
//! follows individual type links.
//!
//! # Examples
//!
//! ```rust,ignore
//! use ua_proxy::browse::GraphBrowser;
//!
//! let browser = GraphBrowser::new(session);
//! for child in browser.browse_children(&boiler_id, None).await? {
//!     println!("{} -> {}", child.browse_name, child.node_id);
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::{
    BrowseRequest, CancellationToken, ProxySession, ReferenceDescription, UaValue,
};
use crate::error::{BrowseError, ConversionError, ProxyError, ProxyResult};
use crate::ids::{is_child_reference, reference_types};
use crate::types::{AttributeId, BrowseDirection, NodeClass, NodeId, QualifiedName, StatusCode};

// =============================================================================
// ChildReference
// =============================================================================

/// A hierarchical child of a browsed node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildReference {
    /// Browse name of the child.
    pub browse_name: QualifiedName,

    /// Child node.
    pub node_id: NodeId,

    /// Child node class.
    pub node_class: NodeClass,

    /// Reference type linking parent to child.
    pub reference_type: NodeId,

    /// Type definition reported by the server, if any.
    pub type_definition: Option<NodeId>,
}

impl From<ReferenceDescription> for ChildReference {
    fn from(r: ReferenceDescription) -> Self {
        Self {
            browse_name: r.browse_name,
            node_id: r.node_id,
            node_class: r.node_class,
            reference_type: r.reference_type_id,
            type_definition: r.type_definition,
        }
    }
}

impl fmt::Display for ChildReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.browse_name, self.node_class, self.node_id)
    }
}

// =============================================================================
// GraphBrowser
// =============================================================================

/// Enumerates the references of a single node.
#[derive(Debug, Clone)]
pub struct GraphBrowser {
    session: Arc<ProxySession>,
}

impl GraphBrowser {
    /// Creates a browser over a session.
    pub fn new(session: Arc<ProxySession>) -> Self {
        Self { session }
    }

    /// Returns the hierarchical children of `node_id` in server order.
    ///
    /// HasSubtype and non-hierarchical references are excluded.
    pub async fn browse_children(
        &self,
        node_id: &NodeId,
        cancel: Option<&CancellationToken>,
    ) -> ProxyResult<Vec<ChildReference>> {
        let references = self
            .browse_references(
                node_id,
                BrowseDirection::Forward,
                Some(&reference_types::HIERARCHICAL_REFERENCES),
                true,
                cancel,
            )
            .await?;

        let children: Vec<ChildReference> = references
            .into_iter()
            .filter(|r| r.is_forward)
            // Servers resolve their own reference types; only standard ones are checked here.
            .filter(|r| !r.reference_type_id.is_standard() || is_child_reference(&r.reference_type_id))
            .map(ChildReference::from)
            .collect();

        debug!(node_id = %node_id, count = children.len(), "Browsed children");
        Ok(children)
    }

    /// Returns the references of `node_id` matching the filter.
    ///
    /// A bad browse status maps to `AccessDenied`, `NotFound` or
    /// `Communication`.
    pub async fn browse_references(
        &self,
        node_id: &NodeId,
        direction: BrowseDirection,
        reference_type: Option<&NodeId>,
        include_subtypes: bool,
        cancel: Option<&CancellationToken>,
    ) -> ProxyResult<Vec<ReferenceDescription>> {
        let mut request = BrowseRequest::new(node_id.clone()).direction(direction);
        if let Some(reference_type) = reference_type {
            request = request.reference_type(reference_type.clone(), include_subtypes);
        }

        let response = self.session.browse(&request, cancel).await?;
        if response.status.is_bad() {
            return Err(ProxyError::from_status(
                "browse",
                node_id.to_string(),
                response.status,
            ));
        }

        Ok(response
            .references
            .into_iter()
            .filter(|r| direction.accepts(r.is_forward))
            .collect())
    }

    /// Returns the target of the first reference of a type, if any.
    pub async fn follow(
        &self,
        node_id: &NodeId,
        direction: BrowseDirection,
        reference_type: &NodeId,
        cancel: Option<&CancellationToken>,
    ) -> ProxyResult<Option<ReferenceDescription>> {
        let references = self
            .browse_references(node_id, direction, Some(reference_type), false, cancel)
            .await?;
        Ok(references.into_iter().next())
    }

    /// Reads a metadata attribute that must be present.
    ///
    /// Unlike value reads, a bad status here is an error.
    pub async fn read_attribute(
        &self,
        node_id: &NodeId,
        attribute: AttributeId,
        cancel: Option<&CancellationToken>,
    ) -> ProxyResult<UaValue> {
        let data_value = self.session.read(node_id, attribute, cancel).await?;
        match data_value.status {
            status if status == StatusCode::BAD_ATTRIBUTE_ID_INVALID => {
                Err(ProxyError::browse(BrowseError::attribute_unavailable(
                    node_id.to_string(),
                    attribute,
                    status,
                )))
            }
            status if status.is_bad() => {
                Err(ProxyError::from_status("read", node_id.to_string(), status))
            }
            status => data_value.value.ok_or_else(|| {
                ProxyError::browse(BrowseError::attribute_unavailable(
                    node_id.to_string(),
                    attribute,
                    status,
                ))
            }),
        }
    }

    /// Reads the NodeClass attribute.
    pub async fn read_node_class(
        &self,
        node_id: &NodeId,
        cancel: Option<&CancellationToken>,
    ) -> ProxyResult<NodeClass> {
        let value = self
            .read_attribute(node_id, AttributeId::NodeClass, cancel)
            .await?;
        value
            .as_i64()
            .and_then(|v| u32::try_from(v).ok())
            .and_then(NodeClass::from_value)
            .ok_or_else(|| {
                ProxyError::conversion(ConversionError::type_mismatch(
                    node_id.to_string(),
                    AttributeId::NodeClass,
                    "NodeClass",
                    value.to_string(),
                ))
            })
    }

    /// Reads the BrowseName attribute.
    pub async fn read_browse_name(
        &self,
        node_id: &NodeId,
        cancel: Option<&CancellationToken>,
    ) -> ProxyResult<QualifiedName> {
        let value = self
            .read_attribute(node_id, AttributeId::BrowseName, cancel)
            .await?;
        match value {
            UaValue::QualifiedName(name) => Ok(name),
            UaValue::String(name) => Ok(QualifiedName::from(name)),
            other => Err(ProxyError::conversion(ConversionError::type_mismatch(
                node_id.to_string(),
                AttributeId::BrowseName,
                "QualifiedName",
                other.type_name(),
            ))),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{
        BrowseResponse, CallRequest, CallResponse, DataValue, ManagerState, UaTransport,
    };
    use crate::config::ProxyConfig;
    use crate::error::ErrorKind;
    use crate::types::LocalizedText;
    use async_trait::async_trait;

    struct FixedBrowse {
        response: BrowseResponse,
    }

    #[async_trait]
    impl UaTransport for FixedBrowse {
        async fn browse(&self, _request: &BrowseRequest) -> ProxyResult<BrowseResponse> {
            Ok(self.response.clone())
        }

        async fn read(&self, _node_id: &NodeId, _attribute: AttributeId) -> ProxyResult<DataValue> {
            Ok(DataValue::bad(StatusCode::BAD_NOT_READABLE))
        }

        async fn call(&self, _request: &CallRequest) -> ProxyResult<CallResponse> {
            Ok(CallResponse::with_status(StatusCode::BAD_METHOD_INVALID))
        }

        fn display_name(&self) -> String {
            "fixed".into()
        }
    }

    fn reference(name: &str, id: u32, reference_type: NodeId) -> ReferenceDescription {
        ReferenceDescription {
            reference_type_id: reference_type,
            is_forward: true,
            node_id: NodeId::numeric(1, id),
            browse_name: QualifiedName::new(1, name),
            display_name: LocalizedText::new(name),
            node_class: NodeClass::Variable,
            type_definition: None,
        }
    }

    fn browser(response: BrowseResponse) -> GraphBrowser {
        let session = ProxySession::new(Arc::new(FixedBrowse { response }), ProxyConfig::default());
        session.transition(&[ManagerState::Created], ManagerState::Started);
        GraphBrowser::new(Arc::new(session))
    }

    #[tokio::test]
    async fn test_children_exclude_subtype_and_type_links() {
        let browser = browser(BrowseResponse::good(vec![
            reference("Temperature", 1, reference_types::HAS_COMPONENT),
            reference("Subtype", 2, reference_types::HAS_SUBTYPE),
            reference("Type", 3, reference_types::HAS_TYPE_DEFINITION),
            reference("Setpoint", 4, reference_types::HAS_PROPERTY),
        ]));

        let children = browser
            .browse_children(&NodeId::numeric(1, 100), None)
            .await
            .unwrap();
        let names: Vec<_> = children.iter().map(|c| c.browse_name.name.as_str()).collect();
        assert_eq!(names, vec!["Temperature", "Setpoint"]);
    }

    #[tokio::test]
    async fn test_bad_status_maps_to_kind() {
        let denied = browser(BrowseResponse::bad(StatusCode::BAD_USER_ACCESS_DENIED));
        let err = denied
            .browse_children(&NodeId::numeric(1, 100), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AccessDenied);
        assert!(!err.is_retryable());

        let unknown = browser(BrowseResponse::bad(StatusCode::BAD_NODE_ID_UNKNOWN));
        let err = unknown
            .browse_children(&NodeId::numeric(1, 100), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
