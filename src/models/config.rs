//! Configuration data model and validation

use crate::logging::LogFormat;
use crate::types::{AppError, Result, TimeoutPolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration.
///
/// Built once at startup and handed to the scheduler and round runner; nothing
/// mutates it afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Destinations to probe, in probing order (IP literals or hostnames)
    #[serde(default = "default_targets")]
    pub targets: Vec<String>,

    /// Elasticsearch base URLs, tried in order
    #[serde(default = "default_es_servers")]
    pub es_servers: Vec<String>,

    /// Number of probes per destination per round
    #[serde(default = "default_ping_count")]
    pub ping_count: u32,

    /// Seconds between scheduler ticks
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_seconds: u64,

    /// Per-probe share of the round deadline, in seconds
    #[serde(default = "default_probe_budget_secs")]
    pub probe_budget_seconds: u64,

    /// How timed-out probes take part in the aggregates
    #[serde(default)]
    pub timeout_policy: TimeoutPolicy,

    /// Elasticsearch index prefix; the weekly date is appended
    #[serde(default = "default_index_prefix")]
    pub index_prefix: String,

    /// Log round results instead of shipping them
    #[serde(default)]
    pub dry_run: bool,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Log format for the daemon
    #[serde(default)]
    pub log_format: LogFormat,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            targets: default_targets(),
            es_servers: default_es_servers(),
            ping_count: default_ping_count(),
            ping_interval_seconds: default_ping_interval_secs(),
            probe_budget_seconds: default_probe_budget_secs(),
            timeout_policy: TimeoutPolicy::default(),
            index_prefix: default_index_prefix(),
            dry_run: false,
            enable_color: default_enable_color(),
            log_format: LogFormat::default(),
            verbose: false,
            debug: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Interval between scheduler ticks
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_seconds)
    }

    /// Per-probe time unit used to size the round deadline
    pub fn probe_budget(&self) -> Duration {
        Duration::from_secs(self.probe_budget_seconds)
    }

    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Result<()> {
        if self.targets.is_empty() {
            return Err(AppError::config("At least one target is required"));
        }

        for target in &self.targets {
            if target.trim().is_empty() {
                return Err(AppError::config("Target cannot be empty"));
            }
            if target.chars().any(char::is_whitespace) {
                return Err(AppError::config(format!("Invalid target '{}': contains whitespace", target)));
            }
        }

        if !self.dry_run {
            if self.es_servers.is_empty() {
                return Err(AppError::config("At least one Elasticsearch server is required (or use --dry-run)"));
            }

            for server in &self.es_servers {
                match url::Url::parse(server) {
                    Ok(parsed) => {
                        if parsed.scheme() != "http" && parsed.scheme() != "https" {
                            return Err(AppError::config(format!("Elasticsearch URL must use http or https: {}", server)));
                        }
                    }
                    Err(e) => {
                        return Err(AppError::config(format!("Invalid Elasticsearch URL '{}': {}", server, e)));
                    }
                }
            }
        }

        if self.ping_count > crate::defaults::MAX_PING_COUNT {
            return Err(AppError::config(format!(
                "Ping count cannot exceed {}",
                crate::defaults::MAX_PING_COUNT
            )));
        }

        if self.ping_interval_seconds == 0 {
            return Err(AppError::config("Ping interval must be greater than 0"));
        }

        if self.ping_interval_seconds > 86_400 {
            return Err(AppError::config("Ping interval cannot exceed 86400 seconds"));
        }

        if self.probe_budget_seconds == 0 {
            return Err(AppError::config("Probe budget must be greater than 0"));
        }

        if self.probe_budget_seconds > 300 {
            return Err(AppError::config("Probe budget cannot exceed 300 seconds"));
        }

        if self.index_prefix.is_empty() {
            return Err(AppError::config("Index prefix cannot be empty"));
        }

        // Elasticsearch rejects index names with uppercase letters
        if self.index_prefix.chars().any(|c| c.is_uppercase() || c.is_whitespace() || c == '/') {
            return Err(AppError::config(format!("Invalid index prefix: {}", self.index_prefix)));
        }

        Ok(())
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(targets) = std::env::var("PING_TARGETS") {
            self.targets = split_list(&targets);
        }

        if let Ok(servers) = std::env::var("ES_SERVERS") {
            self.es_servers = split_list(&servers);
        }

        if let Ok(count) = std::env::var("PING_COUNT") {
            self.ping_count = count.parse()
                .map_err(|e| AppError::config(format!("Invalid PING_COUNT value '{}': {}", count, e)))?;
        }

        if let Ok(interval) = std::env::var("PING_INTERVAL") {
            self.ping_interval_seconds = interval.parse()
                .map_err(|e| AppError::config(format!("Invalid PING_INTERVAL value '{}': {}", interval, e)))?;
        }

        if let Ok(budget) = std::env::var("PROBE_BUDGET") {
            self.probe_budget_seconds = budget.parse()
                .map_err(|e| AppError::config(format!("Invalid PROBE_BUDGET value '{}': {}", budget, e)))?;
        }

        if let Ok(policy) = std::env::var("TIMEOUT_POLICY") {
            self.timeout_policy = policy.parse()
                .map_err(|e| AppError::config(format!("Invalid TIMEOUT_POLICY value '{}': {}", policy, e)))?;
        }

        if let Ok(prefix) = std::env::var("ES_INDEX_PREFIX") {
            self.index_prefix = prefix.trim().to_string();
        }

        if let Ok(enable_color) = std::env::var("ENABLE_COLOR") {
            self.enable_color = enable_color.parse()
                .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", enable_color, e)))?;
        }

        if let Ok(format) = std::env::var("LOG_FORMAT") {
            self.log_format = format.parse()
                .map_err(|e| AppError::config(format!("Invalid LOG_FORMAT value '{}': {}", format, e)))?;
        }

        Ok(())
    }
}

/// Split a comma-separated list, dropping blanks
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// Default value functions for serde
fn default_targets() -> Vec<String> {
    crate::defaults::DEFAULT_TARGETS
        .iter()
        .map(|&s| s.to_string())
        .collect()
}

fn default_es_servers() -> Vec<String> {
    crate::defaults::DEFAULT_ES_SERVERS
        .iter()
        .map(|&s| s.to_string())
        .collect()
}

fn default_ping_count() -> u32 {
    crate::defaults::DEFAULT_PING_COUNT
}

fn default_ping_interval_secs() -> u64 {
    crate::defaults::DEFAULT_PING_INTERVAL.as_secs()
}

fn default_probe_budget_secs() -> u64 {
    crate::defaults::DEFAULT_PROBE_BUDGET.as_secs()
}

fn default_index_prefix() -> String {
    crate::defaults::DEFAULT_INDEX_PREFIX.to_string()
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}
