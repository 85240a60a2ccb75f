//! OPC UA transport, enabled with the `opcua` cargo feature.
//!
//! The `opcua` client API is blocking, so every call runs on tokio's blocking
//! pool. The session layer bounds each call with its timeout; a call that
//! overruns is abandoned and finishes on its pool thread.

use super::transport::{Connection, Connector, TransportError};
use crate::catalog::NodeAddress;
use crate::model::WireValue;
use crate::registry::EndpointAddress;
use async_trait::async_trait;
use opcua::client::prelude::*;
use opcua::sync::RwLock;
use std::sync::Arc;
use tracing::debug;

/// Connects anonymously, without message security, as the line controllers
/// are configured on the plant network.
#[derive(Debug, Clone)]
pub struct OpcUaConnector {
    application_name: String,
}

impl OpcUaConnector {
    pub fn new(application_name: impl Into<String>) -> Self {
        Self {
            application_name: application_name.into(),
        }
    }
}

impl Default for OpcUaConnector {
    fn default() -> Self {
        Self::new("pilot-link")
    }
}

async fn off_thread<T, F>(f: F) -> Result<T, TransportError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, TransportError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|_| TransportError::Closed)?
}

fn node_id(node: &NodeAddress) -> NodeId {
    NodeId::new(node.namespace, node.identifier.clone())
}

fn to_variant(value: &WireValue) -> Variant {
    match value {
        WireValue::String(s) => Variant::String(UAString::from(s.as_str())),
        WireValue::Int32(n) => Variant::Int32(*n),
        WireValue::Boolean(b) => Variant::Boolean(*b),
    }
}

/// Any integer variant is accepted as long as it fits an Int32.
fn from_variant(node: &NodeAddress, variant: Variant) -> Result<WireValue, TransportError> {
    let out_of_range = |value: String| TransportError::Rejected(format!("{node} holds {value}, outside Int32"));
    match variant {
        Variant::String(s) => Ok(WireValue::String(s.as_ref().to_string())),
        Variant::Boolean(b) => Ok(WireValue::Boolean(b)),
        Variant::Int32(n) => Ok(WireValue::Int32(n)),
        Variant::Int16(n) => Ok(WireValue::Int32(n.into())),
        Variant::UInt16(n) => Ok(WireValue::Int32(n.into())),
        Variant::SByte(n) => Ok(WireValue::Int32(n.into())),
        Variant::Byte(n) => Ok(WireValue::Int32(n.into())),
        Variant::UInt32(n) => i32::try_from(n)
            .map(WireValue::Int32)
            .map_err(|_| out_of_range(n.to_string())),
        Variant::Int64(n) => i32::try_from(n)
            .map(WireValue::Int32)
            .map_err(|_| out_of_range(n.to_string())),
        Variant::UInt64(n) => i32::try_from(n)
            .map(WireValue::Int32)
            .map_err(|_| out_of_range(n.to_string())),
        other => Err(TransportError::Rejected(format!(
            "{node} holds an unsupported value {other:?}"
        ))),
    }
}

#[async_trait]
impl Connector for OpcUaConnector {
    async fn connect(&self, endpoint: &EndpointAddress) -> Result<Box<dyn Connection>, TransportError> {
        let url = endpoint.to_string();
        let name = self.application_name.clone();
        let session = off_thread(move || {
            let mut client = ClientBuilder::new()
                .application_name(name.as_str())
                .application_uri(format!("urn:{name}"))
                .trust_server_certs(true)
                .create_sample_keypair(true)
                .session_retry_limit(0)
                .client()
                .ok_or_else(|| TransportError::Unreachable("invalid client configuration".into()))?;
            client
                .connect_to_endpoint(
                    (
                        url.as_str(),
                        SecurityPolicy::None.to_str(),
                        MessageSecurityMode::None,
                        UserTokenPolicy::anonymous(),
                    ),
                    IdentityToken::Anonymous,
                )
                .map_err(|status| TransportError::Unreachable(format!("{url}: {status}")))
        })
        .await?;
        debug!(%endpoint, "OPC UA session established");
        Ok(Box::new(OpcUaConnection { session: Some(session) }))
    }
}

struct OpcUaConnection {
    session: Option<Arc<RwLock<Session>>>,
}

impl OpcUaConnection {
    fn session(&self) -> Result<Arc<RwLock<Session>>, TransportError> {
        self.session.clone().ok_or(TransportError::Closed)
    }
}

#[async_trait]
impl Connection for OpcUaConnection {
    async fn write(&mut self, node: &NodeAddress, value: &WireValue) -> Result<(), TransportError> {
        let session = self.session()?;
        let node = node.clone();
        let variant = to_variant(value);
        off_thread(move || {
            let request = WriteValue {
                node_id: node_id(&node),
                attribute_id: AttributeId::Value as u32,
                index_range: UAString::null(),
                value: DataValue::new_now(variant),
            };
            let results = session
                .read()
                .write(&[request])
                .map_err(|status| TransportError::Rejected(status.to_string()))?;
            match results.first() {
                Some(status) if status.is_good() => Ok(()),
                Some(status) if *status == StatusCode::BadNodeIdUnknown => {
                    Err(TransportError::BadNode(node.to_string()))
                }
                Some(status) => Err(TransportError::Rejected(format!("{node}: {status}"))),
                None => Err(TransportError::Rejected(format!("{node}: empty write response"))),
            }
        })
        .await
    }

    async fn read(&mut self, node: &NodeAddress) -> Result<WireValue, TransportError> {
        let session = self.session()?;
        let node = node.clone();
        off_thread(move || {
            let request = ReadValueId {
                node_id: node_id(&node),
                attribute_id: AttributeId::Value as u32,
                index_range: UAString::null(),
                data_encoding: QualifiedName::null(),
            };
            let mut results = session
                .read()
                .read(&[request], TimestampsToReturn::Neither, 0.0)
                .map_err(|status| TransportError::Rejected(status.to_string()))?;
            let data = results
                .pop()
                .ok_or_else(|| TransportError::Rejected(format!("{node}: empty read response")))?;
            match data.status {
                Some(status) if status == StatusCode::BadNodeIdUnknown => {
                    return Err(TransportError::BadNode(node.to_string()))
                }
                Some(status) if !status.is_good() => {
                    return Err(TransportError::Rejected(format!("{node}: {status}")))
                }
                _ => {}
            }
            let variant = data
                .value
                .ok_or_else(|| TransportError::Rejected(format!("{node}: no value")))?;
            from_variant(&node, variant)
        })
        .await
    }

    async fn disconnect(&mut self) {
        if let Some(session) = self.session.take() {
            let _ = off_thread(move || {
                session.read().disconnect();
                Ok(())
            })
            .await;
        }
    }
}
