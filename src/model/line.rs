use crate::error::LinkError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the production lines reachable from the pilot station.
///
/// The set is closed: any other identifier is rejected with
/// [`LinkError::UnknownLine`] when parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LineId {
    #[serde(rename = "LGN01")]
    Lgn01,
    #[serde(rename = "LGN02")]
    Lgn02,
    #[serde(rename = "LGN03")]
    Lgn03,
}

impl LineId {
    /// Every known line, in key order.
    pub const ALL: [LineId; 3] = [LineId::Lgn01, LineId::Lgn02, LineId::Lgn03];

    /// Canonical key, also the suffix of the `OPCUA_<KEY>` override.
    pub fn key(self) -> &'static str {
        match self {
            LineId::Lgn01 => "LGN01",
            LineId::Lgn02 => "LGN02",
            LineId::Lgn03 => "LGN03",
        }
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for LineId {
    type Err = LinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        LineId::ALL
            .into_iter()
            .find(|line| line.key().eq_ignore_ascii_case(key))
            .ok_or_else(|| LinkError::UnknownLine(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("lgn02".parse::<LineId>().unwrap(), LineId::Lgn02);
        assert_eq!(" LGN03 ".parse::<LineId>().unwrap(), LineId::Lgn03);
    }

    #[test]
    fn test_unknown_line_is_rejected() {
        let err = "LGN04".parse::<LineId>().unwrap_err();
        assert_eq!(err, LinkError::UnknownLine("LGN04".to_string()));
    }
}
