//! Command-line interface

use crate::logging::LogFormat;
use crate::types::TimeoutPolicy;
use clap::Parser;

/// Ping Monitor - periodically pings targets and ships latency to Elasticsearch
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "ping-monitor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Comma-separated list of IPs or hostnames to ping
    #[arg(long, value_name = "LIST")]
    pub targets: Option<String>,

    /// Comma-separated list of Elasticsearch servers, tried in order
    #[arg(long = "es-servers", value_name = "LIST")]
    pub es_servers: Option<String>,

    /// Number of probes per target each interval
    #[arg(short = 'c', long, value_name = "N")]
    pub ping_count: Option<u32>,

    /// Seconds between rounds
    #[arg(short = 'i', long, value_name = "SECONDS", value_parser = parse_seconds)]
    pub ping_interval: Option<u64>,

    /// Seconds each probe may use; a round's deadline is this times the count
    #[arg(long, value_name = "SECONDS", value_parser = parse_seconds)]
    pub probe_budget: Option<u64>,

    /// How timed-out probes enter the aggregates (exclude-timeouts, zero-latency)
    #[arg(long, value_name = "POLICY")]
    pub timeout_policy: Option<TimeoutPolicy>,

    /// Elasticsearch index prefix; the index is <prefix>-<week start date>
    #[arg(long, value_name = "PREFIX")]
    pub index_prefix: Option<String>,

    /// Log rounds instead of publishing them
    #[arg(long)]
    pub dry_run: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Log format (console, json, compact)
    #[arg(long, value_name = "FORMAT")]
    pub log_format: Option<LogFormat>,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output (per-probe logs)
    #[arg(long)]
    pub debug: bool,

    /// Print an example .env file and exit
    #[arg(long)]
    pub example_env: bool,
}

impl Cli {
    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        !self.no_color && supports_color()
    }
}

/// Parse a positive number of seconds
fn parse_seconds(s: &str) -> Result<u64, String> {
    // Reject strings with leading + sign or other invalid formats
    if s.starts_with('+') || s.starts_with("0x") || s.starts_with("0X") {
        return Err(format!("Invalid duration: {}", s));
    }

    s.parse::<u64>()
        .map_err(|_| format!("Invalid duration: {}", s))
        .and_then(|secs| {
            if secs == 0 {
                Err("Duration must be greater than 0".to_string())
            } else {
                Ok(secs)
            }
        })
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    cfg!(unix)
}
