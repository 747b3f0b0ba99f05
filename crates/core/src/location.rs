//! Where an invocation is currently executing.

use serde::{Deserialize, Serialize};

/// The kind of process running an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionLocation {
    /// The synchronous request handler that must answer Slack within 3s.
    Sync,
    /// An asynchronous worker that received a wire record.
    Async,
    /// A containerized long-running task.
    Container,
}

impl ExecutionLocation {
    /// Lower-case name used in logs and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sync => "sync",
            Self::Async => "async",
            Self::Container => "container",
        }
    }
}

impl std::fmt::Display for ExecutionLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExecutionLocation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sync" => Ok(Self::Sync),
            "async" => Ok(Self::Async),
            "container" => Ok(Self::Container),
            _ => Err(format!("invalid execution location: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse() {
        for loc in [
            ExecutionLocation::Sync,
            ExecutionLocation::Async,
            ExecutionLocation::Container,
        ] {
            assert_eq!(loc.to_string().parse::<ExecutionLocation>().unwrap(), loc);
        }
        assert!("lambda".parse::<ExecutionLocation>().is_err());
    }
}
