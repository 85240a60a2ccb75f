use super::message::LineRequest;
use crate::dispatch::DispatchReport;
use crate::model::{LineId, MachineState, OrderStartRequest};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// Failures talking to a line worker (not to its controller).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StationError {
    /// The worker's queue is closed.
    #[error("Worker for {0} is not running")]
    WorkerClosed(LineId),
    /// The worker dropped the request without answering.
    #[error("Worker for {0} dropped the request")]
    WorkerDropped(LineId),
}

/// Handle to one line worker. Cheap to clone.
#[derive(Clone)]
pub struct LineClient {
    line: LineId,
    sender: mpsc::Sender<LineRequest>,
}

impl LineClient {
    pub fn new(line: LineId, sender: mpsc::Sender<LineRequest>) -> Self {
        Self { line, sender }
    }

    pub fn line(&self) -> LineId {
        self.line
    }

    pub async fn start_minimal(&self, order_number: impl Into<String>) -> Result<DispatchReport, StationError> {
        let (respond_to, response) = oneshot::channel();
        self.send(LineRequest::StartMinimal {
            order_number: order_number.into(),
            respond_to,
        })
        .await?;
        response.await.map_err(|_| StationError::WorkerDropped(self.line))
    }

    pub async fn start_full(&self, request: OrderStartRequest) -> Result<DispatchReport, StationError> {
        let (respond_to, response) = oneshot::channel();
        self.send(LineRequest::StartFull { request, respond_to }).await?;
        response.await.map_err(|_| StationError::WorkerDropped(self.line))
    }

    pub async fn read_state(&self) -> Result<MachineState, StationError> {
        let (respond_to, response) = oneshot::channel();
        self.send(LineRequest::ReadState { respond_to }).await?;
        response.await.map_err(|_| StationError::WorkerDropped(self.line))
    }

    async fn send(&self, request: LineRequest) -> Result<(), StationError> {
        self.sender
            .send(request)
            .await
            .map_err(|_| StationError::WorkerClosed(self.line))
    }
}
