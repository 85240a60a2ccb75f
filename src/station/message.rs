use crate::dispatch::DispatchReport;
use crate::model::{MachineState, OrderStartRequest};
use tokio::sync::oneshot;

/// One-shot reply channel carried by every request.
pub type Reply<T> = oneshot::Sender<T>;

/// Requests accepted by a line worker.
///
/// Workers never fail a request: dispatches answer with a report and state
/// reads with a state, `Unreachable` included.
#[derive(Debug)]
pub enum LineRequest {
    StartMinimal {
        order_number: String,
        respond_to: Reply<DispatchReport>,
    },
    StartFull {
        request: OrderStartRequest,
        respond_to: Reply<DispatchReport>,
    },
    ReadState {
        respond_to: Reply<MachineState>,
    },
}
