//! Ping Monitor
//!
//! A daemon that periodically sends ICMP echo probes to a list of targets,
//! aggregates each round into min/avg/max latency, and ships the result to
//! Elasticsearch.

pub mod app;
pub mod cli;
pub mod config;
pub mod dns;
pub mod error;
pub mod logging;
pub mod models;
pub mod probe;
pub mod scheduler;
pub mod sink;
pub mod stats;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, ProbeError, Result};
pub use models::{Config, Destination, ProbeOutcome, RoundResult};
pub use probe::{EchoProber, EchoTransport, IcmpTransport, RoundRunner};
pub use scheduler::Scheduler;
pub use sink::{ElasticsearchSink, LogSink, TelemetrySink};
pub use stats::{aggregate, LatencySummary};
pub use types::{ResponseKind, TimeoutPolicy};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");

/// Build metadata recorded by build.rs
pub const BUILD_TIME: &str = env!("BUILD_TIME");
pub const GIT_COMMIT: Option<&str> = option_env!("GIT_COMMIT");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_TARGETS: &[&str] = &["8.8.8.8"];
    pub const DEFAULT_ES_SERVERS: &[&str] = &["http://localhost:9200"];
    pub const DEFAULT_PING_COUNT: u32 = 3;
    pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(60);
    /// Per-probe share of a round's deadline
    pub const DEFAULT_PROBE_BUDGET: Duration = Duration::from_secs(3);
    pub const DEFAULT_INDEX_PREFIX: &str = "ping";
    pub const DEFAULT_ENABLE_COLOR: bool = true;
    pub const MAX_PING_COUNT: u32 = 1000;
}
