//! Telemetry sinks: where finished rounds are delivered

pub mod elasticsearch;

pub use elasticsearch::{weekly_index, ElasticsearchSink, PingDocument};

use crate::error::Result;
use crate::logging::Logger;
use crate::models::RoundResult;
use async_trait::async_trait;

/// Destination for aggregated round results.
///
/// A failed publish is reported to the caller and never retried here; the
/// scheduler logs it and moves on.
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn publish(&self, result: &RoundResult) -> Result<()>;

    /// Sink name for logs
    fn name(&self) -> &str;
}

/// Writes rounds to the log only (dry-run mode)
pub struct LogSink {
    logger: Logger,
}

impl LogSink {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }
}

#[async_trait]
impl TelemetrySink for LogSink {
    async fn publish(&self, result: &RoundResult) -> Result<()> {
        let document = PingDocument::from_round(result);
        self.logger
            .info(&format!("dry run, not publishing round for {}", result.destination))
            .field("document", &document)
            .log()
            .await;
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Destination, ProbeOutcome};
    use crate::types::TimeoutPolicy;
    use chrono::Utc;

    #[tokio::test]
    async fn test_log_sink_always_succeeds() {
        let sink = LogSink::new(Logger::new("SINK".to_string()));
        let result = RoundResult::from_outcomes(
            Destination::new("192.0.2.1"),
            Utc::now(),
            vec![ProbeOutcome::timed_out()],
            TimeoutPolicy::ExcludeTimeouts,
        )
        .unwrap();

        assert!(sink.publish(&result).await.is_ok());
        assert_eq!(sink.name(), "log");
    }
}
