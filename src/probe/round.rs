//! Probe rounds: `count` sequential probes against one destination

use super::prober::EchoProber;
use crate::logging::ProbeLogger;
use crate::models::{Destination, ProbeOutcome};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::Instant;

/// Outcomes of one round plus what is needed to report it
#[derive(Debug, Clone)]
pub struct RoundRecord {
    /// Groups the round's log lines
    pub correlation_id: String,
    /// Wall-clock time the round started
    pub started_at: DateTime<Utc>,
    pub outcomes: Vec<ProbeOutcome>,
}

/// Runs rounds against a shared deadline of `probe_budget * count`.
///
/// A slow probe eats into the time left for the ones after it; once the
/// deadline has passed the remaining probes time out without being sent.
pub struct RoundRunner {
    prober: EchoProber,
    probe_budget: Duration,
    logger: ProbeLogger,
}

impl RoundRunner {
    pub fn new(prober: EchoProber, probe_budget: Duration, logger: ProbeLogger) -> Self {
        Self {
            prober,
            probe_budget,
            logger,
        }
    }

    /// Run one round and return exactly `count` outcomes in probe order
    pub async fn run_round(&self, destination: &Destination, count: u32) -> Vec<ProbeOutcome> {
        self.run_recorded(destination, count).await.outcomes
    }

    /// Run one round, keeping its correlation id and start time
    pub async fn run_recorded(&self, destination: &Destination, count: u32) -> RoundRecord {
        let started_at = Utc::now();
        let budget = self.probe_budget.saturating_mul(count);
        let deadline = Instant::now() + budget;
        let correlation_id = self.logger.start_round(destination, count, budget).await;

        let mut outcomes = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let attempt = self.prober.probe_attempt(destination, deadline).await;

            if let Some(error) = &attempt.error {
                self.logger.log_probe_failure(destination, error, &correlation_id).await;
            }
            self.logger
                .log_probe_outcome(destination, attempt.sequence(), &attempt.outcome, &correlation_id)
                .await;

            outcomes.push(attempt.outcome);
        }

        RoundRecord {
            correlation_id,
            started_at,
            outcomes,
        }
    }

    pub fn probe_budget(&self) -> Duration {
        self.probe_budget
    }
}
