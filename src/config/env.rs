//! Environment variable handling and .env file management

use crate::error::{AppError, Result};
use crate::logging::LogFormat;
use crate::types::TimeoutPolicy;
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load .env from the current directory if present; returns whether it was
    pub fn load_env_file() -> Result<bool> {
        Self::load_env_file_from(Path::new(".env"))
    }

    /// Load a specific env file if present; already-set variables win
    pub fn load_env_file_from(path: &Path) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }

        dotenv::from_path(path)
            .map_err(|e| AppError::config(format!("Failed to load {}: {}", path.display(), e)))?;
        Ok(true)
    }

    /// Create example .env file content
    pub fn create_example_env_content() -> String {
        r#"# Ping Monitor Configuration
#
# Values here are used as defaults and can be overridden by command-line
# arguments. Variables already set in the environment take precedence over
# this file.

# Targets to ping (comma-separated IPs or hostnames)
# PING_TARGETS=8.8.8.8

# Elasticsearch servers, tried in order until one accepts the document
# ES_SERVERS=http://localhost:9200

# Probes per target each interval
# PING_COUNT=3

# Seconds between rounds
# PING_INTERVAL=60

# Seconds each probe may use; a round's deadline is PROBE_BUDGET * PING_COUNT
# PROBE_BUDGET=3

# How timed-out probes enter the aggregates: exclude-timeouts or zero-latency
# TIMEOUT_POLICY=exclude-timeouts

# Index prefix; documents go to <prefix>-<YYYY-MM-DD of the week's Sunday>
# ES_INDEX_PREFIX=ping

# Enable colored output (true/false)
# ENABLE_COLOR=true

# Log format: console, json or compact
# LOG_FORMAT=console

# Example: watch two resolvers every 30 seconds, log as JSON
# PING_TARGETS=1.1.1.1,9.9.9.9
# PING_INTERVAL=30
# LOG_FORMAT=json
"#
        .to_string()
    }

    /// Save example .env file to disk
    pub fn save_example_env_file(path: &Path) -> Result<()> {
        let content = Self::create_example_env_content();
        std::fs::write(path, content)
            .map_err(|e| AppError::config(format!("Failed to write example .env file: {}", e)))?;

        Ok(())
    }

    /// Validate environment variable format before parsing
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        match key {
            "PING_TARGETS" => {
                if value.split(',').all(|t| t.trim().is_empty()) {
                    return Err(AppError::config("PING_TARGETS must name at least one target"));
                }
            }
            "ES_SERVERS" => {
                for server in value.split(',') {
                    let server = server.trim();
                    if server.is_empty() {
                        continue;
                    }
                    let parsed = url::Url::parse(server)
                        .map_err(|e| AppError::config(format!("Invalid ES_SERVERS entry '{}': {}", server, e)))?;
                    if !matches!(parsed.scheme(), "http" | "https") {
                        return Err(AppError::config(format!("Elasticsearch server must use http or https: {}", server)));
                    }
                }
            }
            "PING_COUNT" => {
                let count: u32 = value.parse()
                    .map_err(|e| AppError::config(format!("Invalid PING_COUNT value '{}': {}", value, e)))?;
                if count > crate::defaults::MAX_PING_COUNT {
                    return Err(AppError::config(format!(
                        "PING_COUNT cannot exceed {}, got: {}",
                        crate::defaults::MAX_PING_COUNT,
                        count
                    )));
                }
            }
            "PING_INTERVAL" | "PROBE_BUDGET" => {
                let seconds: u64 = value.parse()
                    .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
                if seconds == 0 {
                    return Err(AppError::config(format!("{} must be greater than 0", key)));
                }
            }
            "TIMEOUT_POLICY" => {
                value.parse::<TimeoutPolicy>()
                    .map_err(|e| AppError::config(format!("Invalid TIMEOUT_POLICY value '{}': {}", value, e)))?;
            }
            "LOG_FORMAT" => {
                value.parse::<LogFormat>()
                    .map_err(|e| AppError::config(format!("Invalid LOG_FORMAT value '{}': {}", value, e)))?;
            }
            "ENABLE_COLOR" => {
                value.parse::<bool>()
                    .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", value, e)))?;
            }
            _ => {
                // Unknown environment variable, ignore
            }
        }

        Ok(())
    }

    /// Get list of all supported environment variables with descriptions
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("PING_TARGETS", "Comma-separated list of targets to ping", "8.8.8.8,example.com"),
            ("ES_SERVERS", "Comma-separated list of Elasticsearch servers", "http://localhost:9200"),
            ("PING_COUNT", "Probes per target each interval", "3"),
            ("PING_INTERVAL", "Seconds between rounds", "60"),
            ("PROBE_BUDGET", "Seconds each probe may use", "3"),
            ("TIMEOUT_POLICY", "exclude-timeouts or zero-latency", "exclude-timeouts"),
            ("ES_INDEX_PREFIX", "Elasticsearch index prefix", "ping"),
            ("ENABLE_COLOR", "Enable colored output", "true"),
            ("LOG_FORMAT", "console, json or compact", "console"),
        ]
    }

    /// Validate all currently set environment variables
    pub fn validate_current_env() -> Vec<String> {
        Self::get_supported_env_vars()
            .into_iter()
            .filter_map(|(var_name, _, _)| {
                let value = std::env::var(var_name).ok()?;
                Self::validate_env_var(var_name, &value).err().map(|e| e.to_string())
            })
            .collect()
    }
}
