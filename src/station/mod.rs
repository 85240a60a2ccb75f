//! # Pilot Station
//!
//! Runs one worker task per line and routes every operation through it.
//!
//! ```text
//!                    ┌─► LineClient(LGN01) ──mpsc──► LineWorker(LGN01) ──► controller
//! PilotStation ──────┼─► LineClient(LGN02) ──mpsc──► LineWorker(LGN02) ──► controller
//!                    └─► LineClient(LGN03) ──mpsc──► LineWorker(LGN03) ──► controller
//! ```
//!
//! A worker handles its queue sequentially, so a dispatch and a poll aimed at
//! the same line never hold two sessions to that controller at once. Different
//! lines still proceed in parallel.
//!
//! The station keeps the dispatcher and poller contracts: dispatches answer a
//! boolean, `poll_all` answers a state for every line. A worker that has gone
//! away counts as a failed dispatch or an `Unreachable` line.
//!
//! ## Shutdown
//!
//! [`PilotStation::shutdown`] drops every client, which closes the queues;
//! each worker finishes the request in hand, drains what is queued and exits.

pub mod client;
pub mod message;
pub mod worker;

pub use client::*;
pub use message::*;
pub use worker::*;

use crate::dispatch::{log_report, OrderDispatcher};
use crate::model::{LineId, MachineState, OrderStartRequest};
use crate::poller::{FleetPoller, FleetSnapshot};
use crate::session::SessionFactory;
use futures::future::join_all;
use std::collections::BTreeMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

/// Queue depth of each line worker.
pub const WORKER_QUEUE: usize = 16;

/// The running set of line workers.
pub struct PilotStation {
    clients: BTreeMap<LineId, LineClient>,
    handles: Vec<(LineId, JoinHandle<()>)>,
}

impl PilotStation {
    /// Spawns a worker for every line in the registry.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(sessions: SessionFactory) -> Self {
        let dispatcher = OrderDispatcher::new(sessions.clone());
        let poller = FleetPoller::new(sessions.clone());

        let mut clients = BTreeMap::new();
        let mut handles = Vec::new();
        for line in sessions.lines() {
            let (sender, receiver) = mpsc::channel(WORKER_QUEUE);
            let worker = LineWorker::new(line, receiver, dispatcher.clone(), poller.clone());
            handles.push((line, tokio::spawn(worker.run())));
            clients.insert(line, LineClient::new(line, sender));
        }

        info!(lines = clients.len(), "Station started");
        Self { clients, handles }
    }

    /// Client for one line's worker.
    pub fn client(&self, line: LineId) -> Option<&LineClient> {
        self.clients.get(&line)
    }

    /// Writes only the order number. True iff the write succeeded.
    #[instrument(skip(self))]
    pub async fn start_minimal(&self, line: LineId, order_number: &str) -> bool {
        let Some(client) = self.client(line) else {
            warn!(%line, "No worker for line");
            return false;
        };
        match client.start_minimal(order_number).await {
            Ok(report) => {
                log_report(&report);
                report.is_success()
            }
            Err(error) => {
                warn!(%line, %error, "Dispatch not delivered");
                false
            }
        }
    }

    /// Writes all order fields. True only if all four writes succeeded.
    #[instrument(skip(self, request), fields(line = %request.line, order = %request.order_number))]
    pub async fn start_full(&self, request: OrderStartRequest) -> bool {
        let line = request.line;
        let Some(client) = self.client(line) else {
            warn!(%line, "No worker for line");
            return false;
        };
        match client.start_full(request).await {
            Ok(report) => {
                log_report(&report);
                report.is_success()
            }
            Err(error) => {
                warn!(%line, %error, "Dispatch not delivered");
                false
            }
        }
    }

    /// State of every line, read through the workers concurrently.
    #[instrument(skip(self))]
    pub async fn poll_all(&self) -> FleetSnapshot {
        let reads = self.clients.values().map(|client| async move {
            let state = match client.read_state().await {
                Ok(state) => state,
                Err(error) => {
                    warn!(line = %client.line(), %error, "State not delivered");
                    MachineState::Unreachable
                }
            };
            (client.line(), state)
        });
        join_all(reads).await.into_iter().collect()
    }

    /// Closes every queue and waits for the workers to exit.
    pub async fn shutdown(self) -> Result<(), StationError> {
        info!("Shutting down station...");
        drop(self.clients);

        let mut first_failure = None;
        for (line, handle) in self.handles {
            if let Err(e) = handle.await {
                error!(%line, error = %e, "Worker task failed");
                first_failure.get_or_insert(StationError::WorkerDropped(line));
            }
        }

        match first_failure {
            None => {
                info!("Station shutdown complete.");
                Ok(())
            }
            Some(failure) => Err(failure),
        }
    }
}
