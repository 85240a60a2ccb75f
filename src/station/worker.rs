use super::message::LineRequest;
use crate::dispatch::OrderDispatcher;
use crate::model::LineId;
use crate::poller::FleetPoller;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Owns the request queue of one line.
///
/// Requests are handled strictly one after another, so at most one session
/// to the line's controller is open at any time.
pub struct LineWorker {
    line: LineId,
    receiver: mpsc::Receiver<LineRequest>,
    dispatcher: OrderDispatcher,
    poller: FleetPoller,
}

impl LineWorker {
    pub fn new(
        line: LineId,
        receiver: mpsc::Receiver<LineRequest>,
        dispatcher: OrderDispatcher,
        poller: FleetPoller,
    ) -> Self {
        Self {
            line,
            receiver,
            dispatcher,
            poller,
        }
    }

    /// Processes requests until every client is dropped.
    pub async fn run(mut self) {
        let line = self.line;
        info!(%line, "Worker started");
        let mut handled = 0usize;

        while let Some(request) = self.receiver.recv().await {
            match request {
                LineRequest::StartMinimal {
                    order_number,
                    respond_to,
                } => {
                    debug!(%line, %order_number, "StartMinimal");
                    let report = self
                        .dispatcher
                        .start_minimal_report(line, &order_number)
                        .await;
                    let _ = respond_to.send(report);
                }
                LineRequest::StartFull { request, respond_to } => {
                    debug!(%line, order = %request.order_number, "StartFull");
                    let report = self.dispatcher.start_full_report(request).await;
                    let _ = respond_to.send(report);
                }
                LineRequest::ReadState { respond_to } => {
                    let state = self.poller.poll_line(line).await;
                    debug!(%line, %state, "ReadState");
                    let _ = respond_to.send(state);
                }
            }
            handled += 1;
        }

        info!(%line, handled, "Worker stopped");
    }
}
