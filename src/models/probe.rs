//! Probe outcome and round result data models

use crate::stats::{aggregate, LatencySummary};
use crate::types::{ResponseKind, Result, TimeoutPolicy};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// A probed endpoint: an IP literal or a hostname.
///
/// Cheap to clone; every probe of a round shares the same string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Destination(Arc<str>);

impl Destination {
    pub fn new(target: impl AsRef<str>) -> Self {
        Self(Arc::from(target.as_ref().trim()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Destination {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Destination {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Classified result of one probe attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    /// What came back (or that nothing did)
    pub kind: ResponseKind,
    /// Receive time minus send time; zero for timed-out attempts
    pub latency: Duration,
}

impl ProbeOutcome {
    /// An outcome backed by a received ICMP message
    pub fn reply(kind: ResponseKind, latency: Duration) -> Self {
        Self { kind, latency }
    }

    /// Placeholder for an attempt that produced no reply in time
    pub fn timed_out() -> Self {
        Self {
            kind: ResponseKind::TimedOut,
            latency: Duration::ZERO,
        }
    }

    pub fn is_timed_out(&self) -> bool {
        self.kind == ResponseKind::TimedOut
    }

    /// Latency in milliseconds
    pub fn latency_ms(&self) -> f64 {
        self.latency.as_secs_f64() * 1000.0
    }
}

/// Everything one round against one destination produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundResult {
    /// Destination that was probed
    pub destination: Destination,

    /// Wall-clock time the round started
    pub timestamp: DateTime<Utc>,

    /// Outcomes in issue order; always as many as the configured count
    pub outcomes: Vec<ProbeOutcome>,

    pub min_latency: Duration,
    pub max_latency: Duration,
    pub avg_latency: Duration,

    /// Number of timed-out outcomes in the round
    pub timeout_count: usize,

    /// Number of outcomes that fed min/max/avg
    pub sample_count: usize,

    /// Policy the aggregates were computed with
    pub timeout_policy: TimeoutPolicy,
}

impl RoundResult {
    /// Aggregate a finished round.
    ///
    /// An empty outcome list (probe count of zero) skips aggregation entirely
    /// and reports zero latencies.
    pub fn from_outcomes(
        destination: Destination,
        timestamp: DateTime<Utc>,
        outcomes: Vec<ProbeOutcome>,
        policy: TimeoutPolicy,
    ) -> Result<Self> {
        let summary = if outcomes.is_empty() {
            LatencySummary::default()
        } else {
            aggregate(&outcomes, policy)?
        };

        Ok(Self {
            destination,
            timestamp,
            outcomes,
            min_latency: summary.min,
            max_latency: summary.max,
            avg_latency: summary.avg,
            timeout_count: summary.timeout_count,
            sample_count: summary.sample_count,
            timeout_policy: policy,
        })
    }

    /// Number of probes issued in the round
    pub fn count(&self) -> usize {
        self.outcomes.len()
    }

    /// Percentage of probes that got any reply
    pub fn reply_rate(&self) -> f64 {
        if self.outcomes.is_empty() {
            0.0
        } else {
            let replies = self.outcomes.iter().filter(|o| !o.is_timed_out()).count();
            (replies as f64 / self.outcomes.len() as f64) * 100.0
        }
    }

    pub fn min_ms(&self) -> f64 {
        self.min_latency.as_secs_f64() * 1000.0
    }

    pub fn max_ms(&self) -> f64 {
        self.max_latency.as_secs_f64() * 1000.0
    }

    pub fn avg_ms(&self) -> f64 {
        self.avg_latency.as_secs_f64() * 1000.0
    }
}
