//! # Controller Sessions
//!
//! A [`ControllerSession`] is one short-lived connection to one line
//! controller, used for a single operation and then released.
//!
//! ## Lifecycle
//!
//! ```text
//! SessionFactory::open(line) ──► ControllerSession ──► write/read ... ──► close()
//!                                        │
//!                                        └── dropped without close() ──► Drop disconnects
//! ```
//!
//! A session is either fully connected or fully closed: `open` only returns
//! once the transport handshake succeeded, and `close` consumes the session.
//! Every `open` is matched by exactly one disconnect on every exit path:
//! callers end with [`ControllerSession::close`], and early returns, panics or
//! a cancelled future fall through to `Drop`, which schedules the disconnect
//! on the runtime.
//!
//! Sessions are never pooled: controllers are addressed a few times a minute
//! (manual dispatch, periodic polling), so a fresh connection per operation
//! is cheaper than detecting stale pooled ones.
//!
//! ## Timeouts
//!
//! Connect, read and write are each bounded by the configured
//! [`Timeouts`](crate::config::Timeouts). A connect timeout is a connection
//! error, a read/write timeout a protocol error.

pub mod mock;
#[cfg(feature = "opcua")]
pub mod opcua;
pub mod transport;

pub use transport::*;

use crate::catalog::SymbolicTag;
use crate::config::StationConfig;
use crate::error::LinkError;
use crate::model::{LineId, TagValue, WireValue};
use crate::registry::EndpointAddress;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Opens sessions against the configured endpoints.
///
/// Cheap to clone; the configuration and the connector are shared read-only.
#[derive(Clone)]
pub struct SessionFactory {
    config: Arc<StationConfig>,
    connector: Arc<dyn Connector>,
}

impl SessionFactory {
    /// Validates the catalog and builds the factory.
    pub fn new(config: StationConfig, connector: Arc<dyn Connector>) -> Result<Self, LinkError> {
        config.catalog.validate()?;
        Ok(Self {
            config: Arc::new(config),
            connector,
        })
    }

    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    /// Lines known to the registry, in key order.
    pub fn lines(&self) -> Vec<LineId> {
        self.config.registry.lines().collect()
    }

    /// Connects to the controller of `line`.
    pub async fn open(&self, line: LineId) -> Result<ControllerSession, LinkError> {
        let endpoint = self.config.registry.resolve(line)?.clone();
        self.connect(line.to_string(), endpoint).await
    }

    /// Connects to a line key (`"LGN01"`) or a direct `opc.tcp://` URL.
    pub async fn open_target(&self, target: &str) -> Result<ControllerSession, LinkError> {
        let endpoint = self.config.registry.resolve_target(target)?;
        self.connect(target.trim().to_string(), endpoint).await
    }

    async fn connect(&self, target: String, endpoint: EndpointAddress) -> Result<ControllerSession, LinkError> {
        let limit = self.config.timeouts.connect;
        debug!(controller = %target, %endpoint, "Connecting");
        let connection = match timeout(limit, self.connector.connect(&endpoint)).await {
            Ok(Ok(connection)) => connection,
            Ok(Err(e)) => return Err(LinkError::connection(&target, e)),
            Err(_) => {
                return Err(LinkError::connection(
                    &target,
                    format!("no answer from {endpoint} within {} ms", limit.as_millis()),
                ))
            }
        };
        debug!(controller = %target, "Session open");
        Ok(ControllerSession {
            target,
            config: self.config.clone(),
            connection: Some(connection),
        })
    }
}

/// A live connection to one line controller, addressed by symbolic tag.
pub struct ControllerSession {
    target: String,
    config: Arc<StationConfig>,
    connection: Option<Box<dyn Connection>>,
}

impl ControllerSession {
    /// The line key or URL this session was opened for.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Writes `value` to `tag`.
    ///
    /// The value is encoded before anything is sent: a type the wire cannot
    /// carry fails with [`LinkError::TypeMismatch`] and leaves the controller
    /// untouched.
    pub async fn write(&mut self, tag: SymbolicTag, value: impl Into<TagValue>) -> Result<(), LinkError> {
        let wire = value.into().encode(tag)?;
        let node = self.config.catalog.resolve(tag)?;
        let connection = self
            .connection
            .as_mut()
            .ok_or_else(|| LinkError::protocol(&self.target, tag, "session closed"))?;

        debug!(controller = %self.target, %tag, %node, value = %wire, "Write");
        match timeout(self.config.timeouts.io, connection.write(node, &wire)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(LinkError::protocol(&self.target, tag, e)),
            Err(_) => Err(LinkError::protocol(&self.target, tag, "write timed out")),
        }
    }

    /// Reads the raw value of `tag`.
    pub async fn read(&mut self, tag: SymbolicTag) -> Result<WireValue, LinkError> {
        let node = self.config.catalog.resolve(tag)?;
        let connection = self
            .connection
            .as_mut()
            .ok_or_else(|| LinkError::protocol(&self.target, tag, "session closed"))?;

        let value = match timeout(self.config.timeouts.io, connection.read(node)).await {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => return Err(LinkError::protocol(&self.target, tag, e)),
            Err(_) => return Err(LinkError::protocol(&self.target, tag, "read timed out")),
        };
        debug!(controller = %self.target, %tag, %node, %value, "Read");
        Ok(value)
    }

    /// Releases the connection. Never fails.
    pub async fn close(mut self) {
        if let Some(mut connection) = self.connection.take() {
            if timeout(self.config.timeouts.io, connection.disconnect()).await.is_err() {
                warn!(controller = %self.target, "Disconnect timed out; connection abandoned");
            }
            debug!(controller = %self.target, "Session closed");
        }
    }
}

impl Drop for ControllerSession {
    fn drop(&mut self) {
        let Some(mut connection) = self.connection.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                warn!(controller = %self.target, "Session dropped while open; disconnecting in background");
                handle.spawn(async move { connection.disconnect().await });
            }
            Err(_) => {
                warn!(controller = %self.target, "Session dropped outside a runtime; connection released without disconnect");
            }
        }
    }
}
