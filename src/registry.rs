//! # Endpoint Registry
//!
//! One controller endpoint per production line. Addresses start from the
//! plant defaults and may be overridden once at startup (see
//! [`crate::config`]); after that the registry is a read-only table shared by
//! every session.

use crate::error::LinkError;
use crate::model::LineId;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

/// URL scheme of controller endpoints.
pub const ENDPOINT_SCHEME: &str = "opc.tcp://";

/// Connection URI of one line controller. Never empty, never padded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EndpointAddress(String);

impl EndpointAddress {
    /// Trims the raw text; `None` if nothing is left.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EndpointAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Factory address of each line controller.
pub fn default_endpoint(line: LineId) -> EndpointAddress {
    let host = match line {
        LineId::Lgn01 => "172.30.30.110",
        LineId::Lgn02 => "172.30.30.120",
        LineId::Lgn03 => "172.30.30.130",
    };
    EndpointAddress(format!("{ENDPOINT_SCHEME}{host}:4840"))
}

/// Read-only line → endpoint table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointRegistry {
    endpoints: BTreeMap<LineId, EndpointAddress>,
}

impl EndpointRegistry {
    /// Registry holding the factory address of every line.
    pub fn with_defaults() -> Self {
        Self {
            endpoints: LineId::ALL
                .into_iter()
                .map(|line| (line, default_endpoint(line)))
                .collect(),
        }
    }

    /// Defaults with per-line overrides applied.
    ///
    /// Overrides are trimmed; an override that is blank after trimming is
    /// ignored and the default kept.
    pub fn with_overrides<S: AsRef<str>>(overrides: impl IntoIterator<Item = (LineId, S)>) -> Self {
        let mut registry = Self::with_defaults();
        for (line, raw) in overrides {
            match EndpointAddress::parse(raw.as_ref()) {
                Some(endpoint) => {
                    debug!(%line, %endpoint, "Endpoint override");
                    registry.endpoints.insert(line, endpoint);
                }
                None => warn!(%line, "Blank endpoint override ignored"),
            }
        }
        registry
    }

    pub fn resolve(&self, line: LineId) -> Result<&EndpointAddress, LinkError> {
        self.endpoints
            .get(&line)
            .ok_or_else(|| LinkError::UnknownLine(line.to_string()))
    }

    /// Resolves a line key such as `"LGN02"`.
    pub fn resolve_key(&self, key: &str) -> Result<&EndpointAddress, LinkError> {
        self.resolve(key.parse()?)
    }

    /// Resolves either a line key or a full `opc.tcp://` URL.
    pub fn resolve_target(&self, target: &str) -> Result<EndpointAddress, LinkError> {
        let target = target.trim();
        if target.starts_with(ENDPOINT_SCHEME) {
            return EndpointAddress::parse(target)
                .ok_or_else(|| LinkError::UnknownLine(target.to_string()));
        }
        self.resolve_key(target).cloned()
    }

    pub fn lines(&self) -> impl Iterator<Item = LineId> + '_ {
        self.endpoints.keys().copied()
    }
}

impl Default for EndpointRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
