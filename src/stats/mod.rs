//! Round statistics: reduces a round's probe outcomes to min/avg/max latency

use crate::{
    error::{AppError, Result},
    models::probe::ProbeOutcome,
    types::TimeoutPolicy,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Aggregated latency for one round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LatencySummary {
    /// Smallest latency among the samples
    pub min: Duration,
    /// Largest latency among the samples
    pub max: Duration,
    /// Sum of sample latencies divided by the sample count
    pub avg: Duration,
    /// Number of outcomes that fed min/max/avg
    pub sample_count: usize,
    /// Number of timed-out outcomes in the input
    pub timeout_count: usize,
}

/// Reduce a non-empty outcome sequence to min/max/avg.
///
/// With [`TimeoutPolicy::ExcludeTimeouts`] timed-out outcomes are only
/// counted; when nothing replied every aggregate is zero. With
/// [`TimeoutPolicy::ZeroLatency`] they contribute zero latency and the average
/// is taken over the full count.
pub fn aggregate(outcomes: &[ProbeOutcome], policy: TimeoutPolicy) -> Result<LatencySummary> {
    if outcomes.is_empty() {
        return Err(AppError::statistics("Cannot aggregate an empty round"));
    }

    let timeout_count = outcomes.iter().filter(|o| o.is_timed_out()).count();

    let samples: Vec<Duration> = match policy {
        TimeoutPolicy::ZeroLatency => outcomes.iter().map(|o| o.latency).collect(),
        TimeoutPolicy::ExcludeTimeouts => outcomes
            .iter()
            .filter(|o| !o.is_timed_out())
            .map(|o| o.latency)
            .collect(),
    };

    if samples.is_empty() {
        return Ok(LatencySummary {
            timeout_count,
            ..LatencySummary::default()
        });
    }

    let min = samples.iter().copied().min().unwrap_or_default();
    let max = samples.iter().copied().max().unwrap_or_default();
    let total_nanos: u128 = samples.iter().map(Duration::as_nanos).sum();
    let avg_nanos = total_nanos / samples.len() as u128;

    Ok(LatencySummary {
        min,
        max,
        avg: Duration::from_nanos(u64::try_from(avg_nanos).unwrap_or(u64::MAX)),
        sample_count: samples.len(),
        timeout_count,
    })
}
