//! # Pilot Link
//!
//! > **The line-controller communication layer of a production-floor pilot station.**
//!
//! An operator picks a manufacturing order and sends it to one of three
//! production lines (`LGN01`..`LGN03`); the station also shows what each line
//! is doing. Both go through OPC UA: orders are written field by field into
//! named process tags, machine state is read back from another.
//!
//! ## 🏗️ Design
//!
//! ### One session per operation
//! Controllers are contacted a few times a minute. Every dispatch or poll
//! opens a [`ControllerSession`](session::ControllerSession), uses it, and
//! closes it. Each open is matched by exactly one disconnect, on every path,
//! including a dropped future.
//!
//! ### Failures stop at the boundary
//! Inside the layer everything returns `Result<_, LinkError>`. The
//! [`OrderDispatcher`](dispatch::OrderDispatcher) and the
//! [`FleetPoller`](poller::FleetPoller) catch all of it: a dispatch answers
//! `true`/`false`, a poll answers a state for every line, and the cause goes
//! to the log.
//!
//! ### One worker per line
//! The [`PilotStation`](station::PilotStation) runs a worker task per line
//! that handles requests one at a time, so two operations never share a
//! controller at once. Lines still run in parallel.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. Configuration ([`registry`], [`catalog`], [`config`])
//! - **Role**: line → endpoint, symbolic tag → `ns=<n>;s=<name>`, and the
//!   file/environment layers that override them.
//! - **Key items**: [`EndpointRegistry`](registry::EndpointRegistry),
//!   [`TagCatalog`](catalog::TagCatalog), [`StationConfig`](config::StationConfig).
//!
//! ### 2. The Wire ([`session`])
//! - **Role**: typed read/write by symbolic tag over a pluggable transport.
//! - **Key items**: [`SessionFactory`](session::SessionFactory),
//!   [`Connector`](session::Connector), and
//!   [`FakeController`](session::mock::FakeController) for tests.
//!
//! ### 3. The Operations ([`dispatch`], [`poller`], [`station`])
//! - **Role**: the three entry points the UI calls: `start_minimal`,
//!   `start_full`, `poll_all`.
//!
//! ### 4. Shared types ([`model`], [`error`])
//!
//! ## 🚀 Quick Start
//!
//! ```no_run
//! use pilot_link::config::StationConfig;
//! use pilot_link::model::{LineId, OrderStartRequest, Quantity};
//! use pilot_link::session::{mock::FakeController, SessionFactory};
//! use pilot_link::station::PilotStation;
//! use std::sync::Arc;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StationConfig::from_env()?;
//! let fake = FakeController::with_config(&config);
//! let station = PilotStation::start(SessionFactory::new(config, Arc::new(fake))?);
//!
//! let request = OrderStartRequest::new(LineId::Lgn02, "WH/MO/00012", "ART-7", Quantity::new(5)?);
//! let sent = station.start_full(request).await;
//! let states = station.poll_all().await;
//! println!("sent={sent} states={states:?}");
//!
//! station.shutdown().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Running Tests
//!
//! ```bash
//! cargo test
//! cargo test --features opcua   # also builds the OPC UA transport
//! ```

pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod model;
pub mod poller;
pub mod registry;
pub mod runtime;
pub mod session;
pub mod station;

pub use error::LinkError;
