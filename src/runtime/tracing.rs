//! # Observability & Tracing
//!
//! [`setup_tracing`] installs the global subscriber for the binary.
//!
//! ## Configuration
//!
//! - `RUST_LOG` filters by level and module, e.g. `RUST_LOG=pilot_link=debug`.
//! - `PILOT_LOG_FORMAT=json` switches to one JSON object per event, for
//!   shipping the station log to a collector. Anything else (or unset) keeps
//!   the compact human format.
//!
//! Module paths are hidden (`with_target(false)`); every event carries its
//! own `line`, `tag` and `error` fields instead.
//!
//! ## What Gets Traced
//!
//! ```text
//! INFO  Station started lines=3
//! INFO  start_minimal{line=LGN01 order_number="WH/MO/00012"}: Order dispatched line=LGN01 operation=start_minimal
//! WARN  poll_all: Line unreachable line=LGN02 error=Connection to LGN02 failed: ...
//! ```
//!
//! With `RUST_LOG=debug` each write and read is logged with its node address
//! and wire value.

use tracing_subscriber::EnvFilter;

/// Environment variable selecting the output format.
pub const LOG_FORMAT_ENV: &str = "PILOT_LOG_FORMAT";

/// Output format of the global subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl LogFormat {
    /// Parses a `PILOT_LOG_FORMAT` value; unknown values fall back to compact.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Compact
        }
    }

    pub fn from_env() -> Self {
        std::env::var(LOG_FORMAT_ENV)
            .map(|value| Self::parse(&value))
            .unwrap_or_default()
    }
}

/// Installs the subscriber in the format chosen by `PILOT_LOG_FORMAT`.
pub fn setup_tracing() {
    setup_tracing_with(LogFormat::from_env());
}

/// Installs the subscriber. A second call is a no-op.
pub fn setup_tracing_with(format: LogFormat) {
    let filter = EnvFilter::from_default_env();
    let installed = match format {
        LogFormat::Compact => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .try_init(),
    };
    if installed.is_err() {
        tracing::debug!("Global tracing subscriber already installed");
    }
}
