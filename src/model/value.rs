//! Values written to and read from controller tags.
//!
//! Callers hand the session a [`TagValue`]; the session encodes it into a
//! [`WireValue`], the protocol primitive actually sent to the controller.
//! Only three primitives exist on the wire (String, Int32, Boolean). Every
//! other caller-side value is rejected with [`LinkError::TypeMismatch`],
//! never stringified.

use crate::catalog::SymbolicTag;
use crate::error::LinkError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A value as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TagValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
    Float(f64),
    List(Vec<TagValue>),
}

impl TagValue {
    /// Short name of the value's type, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            TagValue::Text(_) => "text",
            TagValue::Integer(_) => "integer",
            TagValue::Boolean(_) => "boolean",
            TagValue::Float(_) => "float",
            TagValue::List(_) => "list",
        }
    }

    /// Encodes the value with the protocol primitive matching its type.
    pub fn encode(self, tag: SymbolicTag) -> Result<WireValue, LinkError> {
        match self {
            TagValue::Text(s) => Ok(WireValue::String(s)),
            TagValue::Boolean(b) => Ok(WireValue::Boolean(b)),
            TagValue::Integer(n) => i32::try_from(n)
                .map(WireValue::Int32)
                .map_err(|_| LinkError::TypeMismatch {
                    tag,
                    found: "integer outside Int32 range",
                }),
            other => Err(LinkError::TypeMismatch {
                tag,
                found: other.kind(),
            }),
        }
    }
}

impl From<&str> for TagValue {
    fn from(s: &str) -> Self {
        TagValue::Text(s.to_string())
    }
}

impl From<String> for TagValue {
    fn from(s: String) -> Self {
        TagValue::Text(s)
    }
}

impl From<i32> for TagValue {
    fn from(n: i32) -> Self {
        TagValue::Integer(n.into())
    }
}

impl From<i64> for TagValue {
    fn from(n: i64) -> Self {
        TagValue::Integer(n)
    }
}

impl From<bool> for TagValue {
    fn from(b: bool) -> Self {
        TagValue::Boolean(b)
    }
}

impl From<f64> for TagValue {
    fn from(x: f64) -> Self {
        TagValue::Float(x)
    }
}

/// A protocol primitive as carried by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WireValue {
    String(String),
    Int32(i32),
    Boolean(bool),
}

impl fmt::Display for WireValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireValue::String(s) => write!(f, "{s:?}"),
            WireValue::Int32(n) => write!(f, "{n}"),
            WireValue::Boolean(b) => write!(f, "{b}"),
        }
    }
}
