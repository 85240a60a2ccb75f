//! # Transport Seam
//!
//! The session layer never talks to a wire protocol directly. It goes through
//! a [`Connector`] that opens [`Connection`]s; the real OPC UA client and the
//! in-memory fake controller both sit behind these traits, so the dispatcher
//! and the poller are tested without a network.

use crate::catalog::NodeAddress;
use crate::model::WireValue;
use crate::registry::EndpointAddress;
use async_trait::async_trait;
use thiserror::Error;

/// Failures reported by a transport implementation.
///
/// The session classifies them: anything raised by [`Connector::connect`]
/// becomes a connection error, anything raised afterwards a protocol error.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransportError {
    /// Network or handshake failure.
    #[error("endpoint unreachable: {0}")]
    Unreachable(String),

    /// The controller does not expose the addressed node.
    #[error("unknown node {0}")]
    BadNode(String),

    /// The controller answered with a bad status or a malformed value.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The connection was already closed.
    #[error("connection closed")]
    Closed,
}

/// Opens connections to controller endpoints.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self, endpoint: &EndpointAddress) -> Result<Box<dyn Connection>, TransportError>;
}

/// One open connection to a controller.
#[async_trait]
pub trait Connection: Send + 'static {
    async fn write(&mut self, node: &NodeAddress, value: &WireValue) -> Result<(), TransportError>;

    async fn read(&mut self, node: &NodeAddress) -> Result<WireValue, TransportError>;

    /// Releases the connection. Must not fail; errors are the transport's to log.
    async fn disconnect(&mut self);
}
