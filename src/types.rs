//! Type definitions and aliases

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// Classification of a single probe attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseKind {
    /// Matching ICMP echo reply
    EchoReply,
    /// ICMP destination unreachable referring to our request
    Unreachable,
    /// ICMP time exceeded referring to our request
    TimeExceeded,
    /// Any other ICMP message correlated with our request
    Other,
    /// No reply before the round deadline, or the attempt failed
    TimedOut,
}

impl ResponseKind {
    /// Whether the outcome carries a measured round trip
    pub fn is_reply(&self) -> bool {
        !matches!(self, ResponseKind::TimedOut)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseKind::EchoReply => "echo_reply",
            ResponseKind::Unreachable => "unreachable",
            ResponseKind::TimeExceeded => "time_exceeded",
            ResponseKind::Other => "other",
            ResponseKind::TimedOut => "timed_out",
        }
    }
}

impl fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How timed-out probes take part in round aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeoutPolicy {
    /// Timed-out probes are left out of min/avg/max and counted separately
    #[default]
    ExcludeTimeouts,
    /// Timed-out probes count as zero latency (legacy dashboards)
    ZeroLatency,
}

impl TimeoutPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeoutPolicy::ExcludeTimeouts => "exclude-timeouts",
            TimeoutPolicy::ZeroLatency => "zero-latency",
        }
    }
}

impl fmt::Display for TimeoutPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeoutPolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "exclude-timeouts" | "exclude" => Ok(TimeoutPolicy::ExcludeTimeouts),
            "zero-latency" | "zero" | "compat" => Ok(TimeoutPolicy::ZeroLatency),
            other => Err(AppError::parse(format!("Invalid timeout policy: {}", other))),
        }
    }
}
