//! # Fleet State Poller
//!
//! Reads the machine state of every line for the status view.
//!
//! `poll_all` is total: it returns an entry for every known line and never
//! fails. Each line is polled in its own future, so an unreachable controller
//! only costs its own timeout and shows up as
//! [`MachineState::Unreachable`] while the others report normally. Results
//! are merged into a map keyed by line, so completion order does not matter.

use crate::catalog::SymbolicTag;
use crate::error::LinkError;
use crate::model::{LineId, MachineState, WireValue};
use crate::session::SessionFactory;
use futures::future::join_all;
use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};

/// State of every line, keyed by line.
pub type FleetSnapshot = BTreeMap<LineId, MachineState>;

/// Polls line controllers for their machine state.
#[derive(Clone)]
pub struct FleetPoller {
    sessions: SessionFactory,
}

impl FleetPoller {
    pub fn new(sessions: SessionFactory) -> Self {
        Self { sessions }
    }

    /// Polls every line concurrently.
    #[instrument(skip(self))]
    pub async fn poll_all(&self) -> FleetSnapshot {
        let lines = self.sessions.lines();
        let states = join_all(lines.iter().map(|line| self.poll_line(*line))).await;
        let snapshot: FleetSnapshot = lines.into_iter().zip(states).collect();
        debug!(?snapshot, "Poll complete");
        snapshot
    }

    /// Polls one line; any failure reads as `Unreachable`.
    pub async fn poll_line(&self, line: LineId) -> MachineState {
        match self.read_state(line).await {
            Ok(state) => state,
            Err(error) => {
                warn!(%line, %error, "Line unreachable");
                MachineState::Unreachable
            }
        }
    }

    /// Reads and translates the machine state, surfacing the failure cause.
    pub async fn read_state(&self, line: LineId) -> Result<MachineState, LinkError> {
        let mut session = self.sessions.open(line).await?;
        let raw = session.read(SymbolicTag::MachineState).await;
        session.close().await;
        translate(line, raw?)
    }
}

/// Raw code to state. A decimal string is accepted as a code; any other
/// non-integer value is a malformed response.
fn translate(line: LineId, raw: WireValue) -> Result<MachineState, LinkError> {
    let code = match raw {
        WireValue::Int32(code) => code,
        WireValue::String(ref text) => text.trim().parse::<i32>().map_err(|_| {
            LinkError::protocol(line, SymbolicTag::MachineState, format!("malformed state {raw}"))
        })?,
        WireValue::Boolean(_) => {
            return Err(LinkError::protocol(
                line,
                SymbolicTag::MachineState,
                format!("malformed state {raw}"),
            ))
        }
    };
    Ok(MachineState::from_code(code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StationConfig;
    use crate::session::mock::FakeController;
    use std::sync::Arc;

    fn poller(fake: &FakeController) -> FleetPoller {
        let sessions = SessionFactory::new(StationConfig::default(), Arc::new(fake.clone())).unwrap();
        FleetPoller::new(sessions)
    }

    #[tokio::test]
    async fn test_codes_translate() {
        let fake = FakeController::new();
        let poller = poller(&fake);

        for (code, expected) in [
            (0, MachineState::Stopped),
            (1, MachineState::Running),
            (2, MachineState::Alarm),
            (5, MachineState::Unknown(5)),
        ] {
            fake.line(LineId::Lgn01).state(code);
            assert_eq!(poller.poll_line(LineId::Lgn01).await, expected);
        }
        assert_eq!(fake.disconnects(LineId::Lgn01), 4);
    }

    #[tokio::test]
    async fn test_string_code_is_accepted() {
        let fake = FakeController::new();
        fake.line(LineId::Lgn02)
            .value(SymbolicTag::MachineState, WireValue::String(" 1 ".into()));
        assert_eq!(poller(&fake).poll_line(LineId::Lgn02).await, MachineState::Running);
    }

    #[tokio::test]
    async fn test_malformed_state_is_unreachable() {
        let fake = FakeController::new();
        fake.line(LineId::Lgn02)
            .value(SymbolicTag::MachineState, WireValue::Boolean(true));

        let poller = poller(&fake);
        assert!(matches!(
            poller.read_state(LineId::Lgn02).await,
            Err(LinkError::Protocol { .. })
        ));
        assert_eq!(poller.poll_line(LineId::Lgn02).await, MachineState::Unreachable);
    }

    #[tokio::test]
    async fn test_failed_read_still_closes_session() {
        let fake = FakeController::new();
        fake.line(LineId::Lgn03).fail_read(SymbolicTag::MachineState);

        assert_eq!(poller(&fake).poll_line(LineId::Lgn03).await, MachineState::Unreachable);
        assert_eq!(fake.connects(LineId::Lgn03), 1);
        assert_eq!(fake.disconnects(LineId::Lgn03), 1);
    }
}
