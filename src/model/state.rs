use serde::{Serialize, Serializer};
use std::fmt;

/// Machine state of one line as shown on the dashboard.
///
/// `Unreachable` is never reported by a controller; the poller synthesizes it
/// when a line cannot be connected to or read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MachineState {
    Stopped,
    Running,
    Alarm,
    /// A code outside the known set, passed through unchanged.
    Unknown(i32),
    Unreachable,
}

impl MachineState {
    /// Translates the raw `State` tag code.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => MachineState::Stopped,
            1 => MachineState::Running,
            2 => MachineState::Alarm,
            other => MachineState::Unknown(other),
        }
    }

    /// Operator-facing label: `STOP`, `RUN`, `ALARM`, the raw code, or `OFF`.
    pub fn label(&self) -> String {
        match self {
            MachineState::Stopped => "STOP".to_string(),
            MachineState::Running => "RUN".to_string(),
            MachineState::Alarm => "ALARM".to_string(),
            MachineState::Unknown(code) => code.to_string(),
            MachineState::Unreachable => "OFF".to_string(),
        }
    }

    pub fn is_reachable(&self) -> bool {
        !matches!(self, MachineState::Unreachable)
    }
}

impl fmt::Display for MachineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

// Serialized as the label so `states --json` matches the dashboard text.
impl Serialize for MachineState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert_eq!(MachineState::from_code(0), MachineState::Stopped);
        assert_eq!(MachineState::from_code(1), MachineState::Running);
        assert_eq!(MachineState::from_code(2), MachineState::Alarm);
    }

    #[test]
    fn test_unknown_code_passes_through() {
        let state = MachineState::from_code(5);
        assert_eq!(state, MachineState::Unknown(5));
        assert_eq!(state.label(), "5");
    }

    #[test]
    fn test_labels() {
        assert_eq!(MachineState::Running.to_string(), "RUN");
        assert_eq!(MachineState::Unreachable.to_string(), "OFF");
        assert!(!MachineState::Unreachable.is_reachable());
    }
}
