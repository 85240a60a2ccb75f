//! # Station Configuration
//!
//! Everything the communication layer needs is assembled once at startup into
//! an immutable [`StationConfig`] and injected into the session factory.
//!
//! ## Sources
//!
//! Layered with the `config` crate, later sources winning:
//!
//! 1. Built-in plant defaults.
//! 2. An optional TOML file (`pilot-link.toml` in the working directory, or
//!    an explicit path).
//! 3. The process environment, prefix `OPCUA_`.
//!
//! | Key                        | Meaning                          |
//! |----------------------------|----------------------------------|
//! | `OPCUA_LGN01`..`OPCUA_LGN03` | Endpoint override for the line |
//! | `OPCUA_CONNECT_TIMEOUT_MS` | Session establishment timeout    |
//! | `OPCUA_IO_TIMEOUT_MS`      | Timeout of a single read/write   |
//!
//! In the file the same keys are used without the prefix, in lower case
//! (`lgn01 = "opc.tcp://..."`, `io_timeout_ms = 2000`).

pub mod error;

pub use error::*;

use crate::catalog::TagCatalog;
use crate::model::LineId;
use crate::registry::EndpointRegistry;
use ::config::{Config, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Name of the optional configuration file, without extension.
pub const DEFAULT_CONFIG_FILE: &str = "pilot-link";

/// Prefix of the environment overrides.
pub const ENV_PREFIX: &str = "OPCUA";

const DEFAULT_TIMEOUT_MS: u64 = 3_000;

/// Upper bounds on the blocking steps of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Connect and handshake.
    pub connect: Duration,
    /// One read or one write.
    pub io: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            io: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

/// Shape of the merged configuration sources.
#[derive(Debug, Default, Deserialize)]
struct RawSettings {
    lgn01: Option<String>,
    lgn02: Option<String>,
    lgn03: Option<String>,
    connect_timeout_ms: Option<u64>,
    io_timeout_ms: Option<u64>,
}

impl RawSettings {
    fn endpoint_overrides(&self) -> Vec<(LineId, &str)> {
        [
            (LineId::Lgn01, &self.lgn01),
            (LineId::Lgn02, &self.lgn02),
            (LineId::Lgn03, &self.lgn03),
        ]
        .into_iter()
        .filter_map(|(line, value)| value.as_deref().map(|v| (line, v)))
        .collect()
    }
}

/// Immutable configuration shared by every session.
#[derive(Debug, Clone, PartialEq)]
pub struct StationConfig {
    pub registry: EndpointRegistry,
    pub catalog: TagCatalog,
    pub timeouts: Timeouts,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            registry: EndpointRegistry::with_defaults(),
            catalog: TagCatalog::standard(),
            timeouts: Timeouts::default(),
        }
    }
}

impl StationConfig {
    /// Loads defaults, the optional default file and the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None, None)
    }

    /// Loads configuration.
    ///
    /// * `file` - explicit configuration file; when `None` the optional
    ///   `pilot-link.*` file in the working directory is used if present.
    /// * `env` - replacement for the process environment (tests); when `None`
    ///   the real environment is read.
    pub fn load(file: Option<&Path>, env: Option<HashMap<String, String>>) -> Result<Self, ConfigError> {
        let file_source = match file {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let raw: RawSettings = Config::builder()
            .add_source(file_source)
            .add_source(Environment::with_prefix(ENV_PREFIX).source(env))
            .build()?
            .try_deserialize()?;

        let config = Self::from_raw(raw)?;
        info!(
            endpoints = ?config.registry,
            connect_timeout_ms = config.timeouts.connect.as_millis() as u64,
            io_timeout_ms = config.timeouts.io.as_millis() as u64,
            "Configuration loaded"
        );
        Ok(config)
    }

    fn from_raw(raw: RawSettings) -> Result<Self, ConfigError> {
        let timeouts = Timeouts {
            connect: timeout_from(raw.connect_timeout_ms, "connect_timeout_ms")?,
            io: timeout_from(raw.io_timeout_ms, "io_timeout_ms")?,
        };
        let config = Self {
            registry: EndpointRegistry::with_overrides(raw.endpoint_overrides()),
            catalog: TagCatalog::standard(),
            timeouts,
        };
        config.validate()?;
        Ok(config)
    }

    /// Startup validation: every tag the core uses must have an address.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.catalog.validate()?;
        Ok(())
    }
}

fn timeout_from(ms: Option<u64>, key: &'static str) -> Result<Duration, ConfigError> {
    match ms {
        None => Ok(Duration::from_millis(DEFAULT_TIMEOUT_MS)),
        Some(0) => Err(ConfigError::InvalidTimeout { key }),
        Some(ms) => Ok(Duration::from_millis(ms)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::default_endpoint;

    fn env(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_defaults_without_overrides() {
        let config = StationConfig::load(None, env(&[])).unwrap();
        assert_eq!(config, StationConfig::default());
    }

    #[test]
    fn test_env_overrides_endpoint_and_timeouts() {
        let config = StationConfig::load(
            None,
            env(&[
                ("OPCUA_LGN02", "  opc.tcp://10.1.1.2:4840  "),
                ("OPCUA_IO_TIMEOUT_MS", "1500"),
            ]),
        )
        .unwrap();

        assert_eq!(
            config.registry.resolve(LineId::Lgn02).unwrap().as_str(),
            "opc.tcp://10.1.1.2:4840"
        );
        assert_eq!(
            config.registry.resolve(LineId::Lgn01).unwrap(),
            &default_endpoint(LineId::Lgn01)
        );
        assert_eq!(config.timeouts.io, Duration::from_millis(1500));
        assert_eq!(config.timeouts.connect, Duration::from_millis(DEFAULT_TIMEOUT_MS));
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let err = StationConfig::load(None, env(&[("OPCUA_CONNECT_TIMEOUT_MS", "0")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidTimeout { key: "connect_timeout_ms" }
        ));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = StationConfig::load(Some(Path::new("/nonexistent/pilot-link.toml")), env(&[]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Source(_)));
    }
}
