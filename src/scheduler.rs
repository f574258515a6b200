//! Periodic scheduler
//!
//! Every interval, each destination gets one round in configuration order.
//! Rounds never overlap: a tick that outlasts the interval is logged and the
//! next tick starts late instead of bursting to catch up.

use crate::logging::ProbeLogger;
use crate::models::{Config, Destination, RoundResult};
use crate::probe::RoundRunner;
use crate::sink::TelemetrySink;
use crate::types::TimeoutPolicy;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

pub struct Scheduler {
    destinations: Vec<Destination>,
    count: u32,
    interval: Duration,
    policy: TimeoutPolicy,
    runner: RoundRunner,
    sink: Arc<dyn TelemetrySink>,
    logger: ProbeLogger,
}

impl Scheduler {
    pub fn new(config: &Config, runner: RoundRunner, sink: Arc<dyn TelemetrySink>, logger: ProbeLogger) -> Self {
        Self {
            destinations: config.targets.iter().map(Destination::new).collect(),
            count: config.ping_count,
            interval: config.ping_interval(),
            policy: config.timeout_policy,
            runner,
            sink,
            logger,
        }
    }

    pub fn destinations(&self) -> &[Destination] {
        &self.destinations
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run forever. The first tick fires one interval after start.
    pub async fn run(&self) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut tick: u64 = 0;
        loop {
            ticker.tick().await;
            tick += 1;

            let started = Instant::now();
            self.run_tick(tick).await;
            let elapsed = started.elapsed();

            if elapsed > self.interval {
                self.logger.log_overrun(tick, elapsed, self.interval).await;
            }
        }
    }

    /// One pass over every destination.
    ///
    /// Sink failures are logged and skipped; the published results are
    /// returned for inspection.
    pub async fn run_tick(&self, tick: u64) -> Vec<RoundResult> {
        self.logger
            .logger()
            .debug(&format!("tick {}: probing {} destinations", tick, self.destinations.len()))
            .field("tick", tick)
            .log()
            .await;

        let mut results = Vec::with_capacity(self.destinations.len());
        for destination in &self.destinations {
            let record = self.runner.run_recorded(destination, self.count).await;

            let result = match RoundResult::from_outcomes(
                destination.clone(),
                record.started_at,
                record.outcomes,
                self.policy,
            ) {
                Ok(result) => result,
                Err(e) => {
                    self.logger
                        .logger()
                        .error(&format!("could not aggregate round for {}", destination))
                        .correlation_id(&record.correlation_id)
                        .error_info(&e)
                        .log()
                        .await;
                    continue;
                }
            };

            self.logger.log_round_result(&result, &record.correlation_id).await;

            if let Err(e) = self.sink.publish(&result).await {
                self.logger.log_sink_failure(destination, &e, &record.correlation_id).await;
            }

            results.push(result);
        }

        results
    }
}
