//! # Order Dispatcher
//!
//! Sends a manufacturing order to a line controller.
//!
//! ## Boundary
//!
//! Nothing raised below this module crosses it. Connection, protocol and
//! encoding failures are caught, logged with line, operation and cause, and
//! returned as `false` (or as a [`DispatchReport`] for callers that want to
//! show which fields reached the controller).
//!
//! ## Write order
//!
//! A full start writes, strictly in sequence and over one session:
//!
//! 1. `StartOrder` - order number (String)
//! 2. `OrderCode` - article code (String)
//! 3. `OrderQuantity` - whole units (Int32, fractional input truncated)
//! 4. `OrderDate` - timestamp text (String)
//!
//! The controller program relies on this order. The first failure stops the
//! sequence; earlier writes are not rolled back.

pub mod report;

pub use report::*;

use crate::catalog::SymbolicTag;
use crate::model::{LineId, OrderStartRequest, TagValue};
use crate::session::SessionFactory;
use tracing::{debug, info, instrument, warn};

/// Starts orders on line controllers.
#[derive(Clone)]
pub struct OrderDispatcher {
    sessions: SessionFactory,
}

impl OrderDispatcher {
    pub fn new(sessions: SessionFactory) -> Self {
        Self { sessions }
    }

    /// Writes only the order number. True iff the write succeeded.
    #[instrument(skip(self))]
    pub async fn start_minimal(&self, line: LineId, order_number: &str) -> bool {
        let report = self.start_minimal_report(line, order_number).await;
        log_report(&report);
        report.is_success()
    }

    /// Writes all order fields. True only if all four writes succeeded.
    #[instrument(skip(self, request), fields(line = %request.line, order = %request.order_number))]
    pub async fn start_full(&self, request: OrderStartRequest) -> bool {
        let report = self.start_full_report(request).await;
        log_report(&report);
        report.is_success()
    }

    /// Like [`start_minimal`](Self::start_minimal), returning the full report.
    pub async fn start_minimal_report(&self, line: LineId, order_number: &str) -> DispatchReport {
        let writes = vec![(SymbolicTag::StartOrder, TagValue::from(order_number))];
        self.dispatch(line, Operation::StartMinimal, writes).await
    }

    /// Like [`start_full`](Self::start_full), returning the full report.
    pub async fn start_full_report(&self, request: OrderStartRequest) -> DispatchReport {
        debug!(?request, "start_full called");
        let line = request.line;
        let writes = vec![
            (SymbolicTag::StartOrder, TagValue::Text(request.order_number)),
            (SymbolicTag::OrderCode, TagValue::Text(request.article_code)),
            (
                SymbolicTag::OrderQuantity,
                TagValue::Integer(request.quantity.units().into()),
            ),
            (SymbolicTag::OrderDate, TagValue::Text(request.date.render())),
        ];
        self.dispatch(line, Operation::StartFull, writes).await
    }

    async fn dispatch(
        &self,
        line: LineId,
        operation: Operation,
        writes: Vec<(SymbolicTag, TagValue)>,
    ) -> DispatchReport {
        let mut report = DispatchReport::new(line, operation);

        let mut session = match self.sessions.open(line).await {
            Ok(session) => session,
            Err(e) => {
                report.failure = Some(e);
                return report;
            }
        };

        for (tag, value) in writes {
            if let Err(e) = session.write(tag, value).await {
                report.failure = Some(e);
                break;
            }
            report.applied.push(tag);
        }

        session.close().await;
        report
    }
}

pub(crate) fn log_report(report: &DispatchReport) {
    match &report.failure {
        None => info!(line = %report.line, operation = %report.operation, "Order dispatched"),
        Some(error) if report.is_partial() => warn!(
            line = %report.line,
            operation = %report.operation,
            applied = ?report.applied,
            %error,
            "Dispatch failed; controller holds a partial order"
        ),
        Some(error) => warn!(
            line = %report.line,
            operation = %report.operation,
            %error,
            "Dispatch failed"
        ),
    }
}
