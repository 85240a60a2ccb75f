use crate::catalog::SymbolicTag;
use crate::error::LinkError;
use crate::model::LineId;
use std::fmt;

/// The two ways an order can be started on a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Order number only.
    StartMinimal,
    /// Order number, article code, quantity and date.
    StartFull,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::StartMinimal => "start_minimal",
            Operation::StartFull => "start_full",
        })
    }
}

/// Outcome of one dispatch, for display and logging.
///
/// `applied` lists the tags the controller accepted, in write order. When a
/// dispatch fails half way those writes stay on the controller: the protocol
/// has no multi-tag transaction, so nothing is rolled back.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchReport {
    pub line: LineId,
    pub operation: Operation,
    pub applied: Vec<SymbolicTag>,
    pub failure: Option<LinkError>,
}

impl DispatchReport {
    pub(crate) fn new(line: LineId, operation: Operation) -> Self {
        Self {
            line,
            operation,
            applied: Vec::new(),
            failure: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// True when the controller kept some, but not all, of the order fields.
    pub fn is_partial(&self) -> bool {
        self.failure.is_some() && !self.applied.is_empty()
    }

    /// Human-readable failure cause, if any.
    pub fn cause(&self) -> Option<String> {
        self.failure.as_ref().map(ToString::to_string)
    }
}

impl fmt::Display for DispatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.failure {
            None => write!(f, "{} {}: ok", self.line, self.operation),
            Some(error) if self.applied.is_empty() => {
                write!(f, "{} {} failed: {error}", self.line, self.operation)
            }
            Some(error) => {
                let applied: Vec<&str> = self.applied.iter().map(|tag| tag.name()).collect();
                write!(
                    f,
                    "{} {} failed after writing [{}]: {error}",
                    self.line,
                    self.operation,
                    applied.join(", ")
                )
            }
        }
    }
}
