//! Task kinds: the closed set of synthetic workloads a node may run.
//!
//! The original service matched task names as strings at dispatch time; here
//! the set is a closed enum so unknown names are rejected during request
//! validation and dispatch cannot fail. Execution lives in
//! `callmesh-tasklets`.

use std::fmt;
use std::str::FromStr;

/// A named synthetic workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Block until cancelled; no resource usage.
    Sleep,
    /// Block until cancelled, then sever the connection without a response.
    Fail,
    /// Block until cancelled, then terminate the whole host process.
    Crash,
    /// Busy-loop consuming a fixed fraction of one core until cancelled.
    Cpu,
    /// Hold and periodically touch an anonymous memory region until cancelled.
    Ram,
}

impl TaskKind {
    /// The wire name of this task kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sleep => "sleep",
            Self::Fail => "fail",
            Self::Crash => "crash",
            Self::Cpu => "cpu",
            Self::Ram => "ram",
        }
    }
}

impl FromStr for TaskKind {
    type Err = crate::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sleep" => Ok(Self::Sleep),
            "fail" => Ok(Self::Fail),
            "crash" => Ok(Self::Crash),
            "cpu" => Ok(Self::Cpu),
            "ram" => Ok(Self::Ram),
            other => Err(crate::ValidationError::UnknownTask(other.to_string())),
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ValidationError;

    #[test]
    fn parses_exactly_the_known_set() {
        for name in ["sleep", "fail", "crash", "cpu", "ram"] {
            assert_eq!(name.parse::<TaskKind>().unwrap().as_str(), name);
        }
        assert_eq!(
            "fork".parse::<TaskKind>(),
            Err(ValidationError::UnknownTask("fork".to_string()))
        );
    }
}
