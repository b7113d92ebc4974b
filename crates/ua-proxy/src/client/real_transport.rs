// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! [`UaTransport`] over a session of the `opcua` crate.
//!
//! Connection establishment, security and reconnection stay with the
//! application: the adapter wraps a session that is already activated and
//! only issues browse, read and call services on it. The `opcua` client API
//! is blocking, so each service runs on the blocking pool.
//!
//! # Example
//!
//! ```rust,ignore
//! use ua_proxy::client::OpcUaSessionTransport;
//! use ua_proxy::{ProxyConfig, ProxyManager};
//!
//! let session = client.connect_to_endpoint(endpoint, IdentityToken::Anonymous)?;
//! let transport = Arc::new(OpcUaSessionTransport::new(session));
//! let manager = ProxyManager::new(transport, ProxyConfig::default());
//! manager.start().await?;
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, trace, warn};

use opcua::client::prelude::{
    AttributeService, BrowseDescription, BrowseDescriptionResultMask, CallMethodRequest,
    MethodService, ReadValueId, Session, TimestampsToReturn, ViewService,
};
use opcua::sync::RwLock as OpcUaRwLock;

use crate::client::transport::{
    BrowseRequest, BrowseResponse, CallRequest, CallResponse, DataValue, ReferenceDescription,
    UaTransport, UaValue,
};
use crate::error::{ConversionError, ProxyError, ProxyResult};
use crate::types::{
    AttributeId, BrowseDirection, LocalizedText, NodeClass, NodeId, NodeIdentifier,
    QualifiedName, StatusCode,
};

// =============================================================================
// OpcUaSessionTransport
// =============================================================================

/// Transport adapter around an activated `opcua` client session.
pub struct OpcUaSessionTransport {
    session: Arc<OpcUaRwLock<Session>>,
    disconnect_on_close: bool,
}

impl OpcUaSessionTransport {
    /// Wraps a connected session. The session is disconnected on close.
    pub fn new(session: Arc<OpcUaRwLock<Session>>) -> Self {
        Self {
            session,
            disconnect_on_close: true,
        }
    }

    /// Leaves the session connected when the owning manager stops.
    pub fn keep_session_open(mut self) -> Self {
        self.disconnect_on_close = false;
        self
    }

    async fn blocking<T, F>(&self, operation: &'static str, f: F) -> ProxyResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Session) -> ProxyResult<T> + Send + 'static,
    {
        let session = self.session.clone();
        tokio::task::spawn_blocking(move || {
            let session = session.read();
            f(&session)
        })
        .await
        .map_err(|e| ProxyError::transport(operation, format!("worker failed: {}", e)))?
    }
}

#[async_trait]
impl UaTransport for OpcUaSessionTransport {
    async fn browse(&self, request: &BrowseRequest) -> ProxyResult<BrowseResponse> {
        let description = BrowseDescription {
            node_id: to_opcua_node_id(&request.node_id),
            browse_direction: match request.direction {
                BrowseDirection::Forward => opcua::types::BrowseDirection::Forward,
                BrowseDirection::Inverse => opcua::types::BrowseDirection::Inverse,
                BrowseDirection::Both => opcua::types::BrowseDirection::Both,
            },
            reference_type_id: request
                .reference_type_id
                .as_ref()
                .map(to_opcua_node_id)
                .unwrap_or_else(opcua::types::NodeId::null),
            include_subtypes: request.include_subtypes,
            node_class_mask: request.node_class_mask,
            result_mask: BrowseDescriptionResultMask::all().bits(),
        };

        trace!(node_id = %request.node_id, "Browsing node");

        let node_id = request.node_id.clone();
        self.blocking("browse", move |session| {
            let results = session
                .browse(&[description])
                .map_err(|s| ProxyError::transport("browse", format!("browse failed: {}", s)))?
                .unwrap_or_default();

            let Some(first) = results.into_iter().next() else {
                return Ok(BrowseResponse::good(Vec::new()));
            };

            let status = StatusCode(first.status_code.bits());
            if status.is_bad() {
                return Ok(BrowseResponse::bad(status));
            }

            let mut references = from_opcua_references(first.references)?;

            let mut continuation = first.continuation_point;
            while !continuation.is_null() {
                let next = session
                    .browse_next(false, &[continuation.clone()])
                    .map_err(|s| {
                        ProxyError::transport("browse", format!("browse next failed: {}", s))
                    })?
                    .unwrap_or_default();
                let Some(page) = next.into_iter().next() else {
                    warn!(node_id = %node_id, "Browse continuation returned no result");
                    return Ok(BrowseResponse::bad(StatusCode::BAD_UNEXPECTED_ERROR));
                };
                let status = StatusCode(page.status_code.bits());
                if status.is_bad() {
                    warn!(node_id = %node_id, status = %status, "Browse continuation failed");
                    return Ok(BrowseResponse::bad(status));
                }
                references.extend(from_opcua_references(page.references)?);
                continuation = page.continuation_point;
            }

            Ok(BrowseResponse::good(references))
        })
        .await
    }

    async fn read(&self, node_id: &NodeId, attribute: AttributeId) -> ProxyResult<DataValue> {
        let read_value_id = ReadValueId {
            node_id: to_opcua_node_id(node_id),
            attribute_id: attribute.value(),
            index_range: opcua::types::UAString::null(),
            data_encoding: opcua::types::QualifiedName::null(),
        };

        trace!(node_id = %node_id, attribute = %attribute, "Reading attribute");

        self.blocking("read", move |session| {
            let results = session
                .read(&[read_value_id], TimestampsToReturn::Both, 0.0)
                .map_err(|s| ProxyError::transport("read", format!("read failed: {}", s)))?;

            let Some(data_value) = results.into_iter().next() else {
                return Ok(DataValue::bad(StatusCode::BAD_UNEXPECTED_ERROR));
            };

            let status = StatusCode(data_value.status.map(|s| s.bits()).unwrap_or(0));
            if status.is_bad() {
                return Ok(DataValue::bad(status));
            }

            Ok(DataValue {
                value: data_value.value.as_ref().map(from_opcua_variant),
                status,
                source_timestamp: data_value.source_timestamp.map(from_opcua_date_time),
                server_timestamp: data_value.server_timestamp.map(from_opcua_date_time),
            })
        })
        .await
    }

    async fn call(&self, request: &CallRequest) -> ProxyResult<CallResponse> {
        let input_arguments = request
            .input_arguments
            .iter()
            .map(to_opcua_variant)
            .collect::<ProxyResult<Vec<_>>>()?;

        let call = CallMethodRequest {
            object_id: to_opcua_node_id(&request.object_id),
            method_id: to_opcua_node_id(&request.method_id),
            input_arguments: Some(input_arguments),
        };

        debug!(
            object_id = %request.object_id,
            method_id = %request.method_id,
            "Calling method"
        );

        self.blocking("call", move |session| {
            let result = session
                .call(call)
                .map_err(|s| ProxyError::transport("call", format!("call failed: {}", s)))?;

            Ok(CallResponse {
                status: StatusCode(result.status_code.bits()),
                input_argument_results: result
                    .input_argument_results
                    .unwrap_or_default()
                    .iter()
                    .map(|s| StatusCode(s.bits()))
                    .collect(),
                output_arguments: result
                    .output_arguments
                    .unwrap_or_default()
                    .iter()
                    .map(from_opcua_variant)
                    .collect(),
            })
        })
        .await
    }

    async fn close(&self) -> ProxyResult<()> {
        if self.disconnect_on_close {
            self.blocking("close", |session| {
                session.disconnect();
                Ok(())
            })
            .await?;
            debug!("Disconnected opcua session");
        }
        Ok(())
    }

    fn display_name(&self) -> String {
        "opcua-session".to_string()
    }
}

// =============================================================================
// Conversions
// =============================================================================

fn to_opcua_node_id(node_id: &NodeId) -> opcua::types::NodeId {
    let ns = node_id.namespace_index;
    match &node_id.identifier {
        NodeIdentifier::Numeric(v) => opcua::types::NodeId::new(ns, *v),
        NodeIdentifier::String(v) => opcua::types::NodeId::new(ns, v.clone()),
        NodeIdentifier::Guid(v) => opcua::types::NodeId::new(ns, opcua::types::Guid::from(*v)),
        NodeIdentifier::Opaque(v) => {
            opcua::types::NodeId::new(ns, opcua::types::ByteString::from(v.as_slice()))
        }
    }
}

fn from_opcua_node_id(node_id: &opcua::types::NodeId) -> NodeId {
    let ns = node_id.namespace;
    match &node_id.identifier {
        opcua::types::Identifier::Numeric(v) => NodeId::numeric(ns, *v),
        opcua::types::Identifier::String(v) => NodeId::string(ns, v.as_ref()),
        opcua::types::Identifier::Guid(v) => {
            NodeId::guid(ns, uuid::Uuid::from_bytes(*v.as_bytes()))
        }
        opcua::types::Identifier::ByteString(v) => {
            NodeId::opaque(ns, v.value.clone().unwrap_or_default())
        }
    }
}

fn from_opcua_qualified_name(name: &opcua::types::QualifiedName) -> QualifiedName {
    QualifiedName::new(name.namespace_index, name.name.as_ref())
}

fn from_opcua_localized_text(text: &opcua::types::LocalizedText) -> LocalizedText {
    let value = text.text.as_ref();
    if text.locale.is_null() || text.locale.as_ref().is_empty() {
        LocalizedText::new(value)
    } else {
        LocalizedText::new(value).with_locale(text.locale.as_ref())
    }
}

/// Returns `None` for targets of an unspecified node class.
fn from_opcua_references(
    references: Option<Vec<opcua::types::ReferenceDescription>>,
) -> ProxyResult<Vec<ReferenceDescription>> {
    references
        .unwrap_or_default()
        .iter()
        .map(from_opcua_reference)
        .collect()
}

/// Converts one reference. A node class outside the OPC UA set fails the
/// browse instead of hiding the child.
fn from_opcua_reference(r: &opcua::types::ReferenceDescription) -> ProxyResult<ReferenceDescription> {
    let node_id = from_opcua_node_id(&r.node_id.node_id);
    let raw_class = r.node_class as u32;
    let node_class = NodeClass::from_value(raw_class).ok_or_else(|| {
        ProxyError::conversion(ConversionError::type_mismatch(
            node_id.to_string(),
            AttributeId::NodeClass,
            "NodeClass",
            raw_class.to_string(),
        ))
    })?;
    let type_definition = &r.type_definition.node_id;
    Ok(ReferenceDescription {
        reference_type_id: from_opcua_node_id(&r.reference_type_id),
        is_forward: r.is_forward,
        node_id,
        browse_name: from_opcua_qualified_name(&r.browse_name),
        display_name: from_opcua_localized_text(&r.display_name),
        node_class,
        type_definition: (!type_definition.is_null()).then(|| from_opcua_node_id(type_definition)),
    })
}

fn from_opcua_date_time(dt: opcua::types::DateTime) -> chrono::DateTime<chrono::Utc> {
    let value = dt.as_chrono();
    chrono::DateTime::from_timestamp(value.timestamp(), value.timestamp_subsec_nanos())
        .unwrap_or_else(chrono::Utc::now)
}

fn from_opcua_variant(variant: &opcua::types::Variant) -> UaValue {
    use opcua::types::Variant;

    match variant {
        Variant::Empty => UaValue::Null,
        Variant::Boolean(v) => UaValue::Boolean(*v),
        Variant::SByte(v) => UaValue::SByte(*v),
        Variant::Byte(v) => UaValue::Byte(*v),
        Variant::Int16(v) => UaValue::Int16(*v),
        Variant::UInt16(v) => UaValue::UInt16(*v),
        Variant::Int32(v) => UaValue::Int32(*v),
        Variant::UInt32(v) => UaValue::UInt32(*v),
        Variant::Int64(v) => UaValue::Int64(*v),
        Variant::UInt64(v) => UaValue::UInt64(*v),
        Variant::Float(v) => UaValue::Float(*v),
        Variant::Double(v) => UaValue::Double(*v),
        Variant::String(v) => UaValue::String(v.as_ref().to_string()),
        Variant::DateTime(v) => UaValue::DateTime(from_opcua_date_time(**v)),
        Variant::Guid(v) => UaValue::Guid(uuid::Uuid::from_bytes(*v.as_bytes())),
        Variant::ByteString(v) => UaValue::ByteString(v.value.clone().unwrap_or_default()),
        Variant::NodeId(v) => UaValue::NodeId(from_opcua_node_id(v)),
        Variant::QualifiedName(v) => UaValue::QualifiedName(from_opcua_qualified_name(v)),
        Variant::LocalizedText(v) => UaValue::LocalizedText(from_opcua_localized_text(v)),
        Variant::Array(arr) => UaValue::Array(arr.values.iter().map(from_opcua_variant).collect()),
        other => UaValue::String(format!("{:?}", other)),
    }
}

fn to_opcua_variant(value: &UaValue) -> ProxyResult<opcua::types::Variant> {
    use opcua::types::Variant;

    Ok(match value {
        UaValue::Null => Variant::Empty,
        UaValue::Boolean(v) => Variant::Boolean(*v),
        UaValue::SByte(v) => Variant::SByte(*v),
        UaValue::Byte(v) => Variant::Byte(*v),
        UaValue::Int16(v) => Variant::Int16(*v),
        UaValue::UInt16(v) => Variant::UInt16(*v),
        UaValue::Int32(v) => Variant::Int32(*v),
        UaValue::UInt32(v) => Variant::UInt32(*v),
        UaValue::Int64(v) => Variant::Int64(*v),
        UaValue::UInt64(v) => Variant::UInt64(*v),
        UaValue::Float(v) => Variant::Float(*v),
        UaValue::Double(v) => Variant::Double(*v),
        UaValue::String(v) => Variant::String(opcua::types::UAString::from(v.as_str())),
        UaValue::DateTime(v) => Variant::DateTime(Box::new(opcua::types::DateTime::from(*v))),
        UaValue::Guid(v) => Variant::Guid(Box::new(opcua::types::Guid::from(*v))),
        UaValue::ByteString(v) => Variant::ByteString(opcua::types::ByteString::from(v.as_slice())),
        UaValue::NodeId(v) => Variant::NodeId(Box::new(to_opcua_node_id(v))),
        UaValue::QualifiedName(v) => Variant::QualifiedName(Box::new(
            opcua::types::QualifiedName::new(v.namespace_index, v.name.as_str()),
        )),
        UaValue::LocalizedText(v) => Variant::LocalizedText(Box::new(
            opcua::types::LocalizedText::new(v.locale.as_deref().unwrap_or(""), v.text.as_str()),
        )),
        UaValue::Array(values) => {
            let variants = values
                .iter()
                .map(to_opcua_variant)
                .collect::<ProxyResult<Vec<_>>>()?;
            let type_id = variants
                .first()
                .map(|v| v.type_id())
                .unwrap_or(opcua::types::VariantTypeId::Empty);
            let array = opcua::types::Array::new(type_id, variants).map_err(|s| {
                ProxyError::transport("call", format!("invalid array argument: {}", s))
            })?;
            Variant::Array(Box::new(array))
        }
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn reference(node_class: opcua::types::NodeClass) -> opcua::types::ReferenceDescription {
        opcua::types::ReferenceDescription {
            reference_type_id: to_opcua_node_id(&NodeId::numeric(0, 47)),
            is_forward: true,
            node_id: to_opcua_node_id(&NodeId::string(2, "Pump.Start")).into(),
            browse_name: opcua::types::QualifiedName::new(2, "Start"),
            display_name: opcua::types::LocalizedText::new("", "Start"),
            node_class,
            type_definition: opcua::types::ExpandedNodeId::null(),
        }
    }

    #[test]
    fn test_reference_conversion() {
        let converted = from_opcua_reference(&reference(opcua::types::NodeClass::Method)).unwrap();
        assert_eq!(converted.node_class, NodeClass::Method);
        assert_eq!(converted.node_id, NodeId::string(2, "Pump.Start"));
        assert!(converted.type_definition.is_none());
    }

    #[test]
    fn test_unknown_node_class_fails_page() {
        let page = Some(vec![
            reference(opcua::types::NodeClass::Method),
            reference(opcua::types::NodeClass::Unspecified),
        ]);
        let err = from_opcua_references(page).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conversion);
        assert!(err.to_string().contains("Pump.Start"));
    }
}
