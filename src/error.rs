//! # Link Errors
//!
//! The error taxonomy of the controller communication layer. Sessions raise
//! the most specific variant they can; the dispatcher, the poller and the
//! station catch all of them at their boundary and turn them into a boolean,
//! a sentinel state, or a log line.

use crate::catalog::SymbolicTag;
use thiserror::Error;

/// Errors raised by the registry, the catalog and controller sessions.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LinkError {
    /// The identifier is not one of the known production lines.
    #[error("Unknown line: {0}")]
    UnknownLine(String),

    /// The symbolic tag has no protocol address in the catalog.
    #[error("Unknown tag: {0}")]
    UnknownTag(String),

    /// A protocol address could not be parsed (expected `ns=<n>;s=<name>`).
    #[error("Invalid node address: {0}")]
    InvalidAddress(String),

    /// The session could not be established (unreachable, handshake, timeout).
    #[error("Connection to {line} failed: {reason}")]
    Connection { line: String, reason: String },

    /// A read or write failed after the session was open.
    #[error("Protocol error on {line} ({tag}): {reason}")]
    Protocol {
        line: String,
        tag: SymbolicTag,
        reason: String,
    },

    /// The value cannot be represented by the tag's wire encoding.
    #[error("Type mismatch on {tag}: {found} cannot be encoded")]
    TypeMismatch { tag: SymbolicTag, found: &'static str },

    /// The order quantity is not a non-negative whole number of units.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),
}

impl LinkError {
    /// True for failures that happened before or while opening a session.
    pub fn is_connection(&self) -> bool {
        matches!(self, LinkError::Connection { .. })
    }

    pub(crate) fn connection(line: impl ToString, reason: impl ToString) -> Self {
        LinkError::Connection {
            line: line.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn protocol(line: impl ToString, tag: SymbolicTag, reason: impl ToString) -> Self {
        LinkError::Protocol {
            line: line.to_string(),
            tag,
            reason: reason.to_string(),
        }
    }
}
