//! Structured logging for the ping monitor
//!
//! Every entry carries a level, the emitting component and optional
//! key/value fields. Probes of one round share a correlation id so a round
//! can be followed through console, compact or JSON output.

use crate::error::{AppError, ProbeError, Result};
use crate::models::{Config, Destination, ProbeOutcome, RoundResult};
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Severity of a log entry, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    fn painted(&self) -> String {
        let label = format!("{:>5}", self.as_str());
        match self {
            LogLevel::Debug => label.cyan().to_string(),
            LogLevel::Info => label.green().to_string(),
            LogLevel::Warn => label.yellow().to_string(),
            LogLevel::Error => label.red().bold().to_string(),
        }
    }
}

/// One structured log record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    /// Emitting component, e.g. `PROBE` or `SINK`
    pub logger: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, serde_json::Value>,
    /// `file:line` of the call site, kept only in debug mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable console format
    #[default]
    Console,
    /// One JSON object per line
    Json,
    /// Compact single-line format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "console" => Ok(LogFormat::Console),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(AppError::parse(format!("Invalid log format: {}", s))),
        }
    }
}

/// Logger writing info and debug to stdout, warnings and errors to stderr
#[derive(Debug, Clone)]
pub struct Logger {
    min_level: LogLevel,
    use_color: bool,
    include_location: bool,
    format: LogFormat,
    name: String,
    session_id: Option<Arc<str>>,
}

impl Logger {
    /// Console logger at info level
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            min_level: LogLevel::Info,
            use_color: false,
            include_location: false,
            format: LogFormat::Console,
            name: name.into(),
            session_id: None,
        }
    }

    /// Logger following the configured format, colors and verbosity
    pub fn with_config(name: impl Into<String>, config: &Config) -> Self {
        // Info stays on without --verbose; a daemon is silent otherwise
        let min_level = if config.debug { LogLevel::Debug } else { LogLevel::Info };

        Self {
            min_level,
            use_color: config.enable_color && config.log_format == LogFormat::Console,
            include_location: config.debug,
            format: config.log_format,
            name: name.into(),
            session_id: None,
        }
    }

    /// Tag every entry with the process session id
    pub fn with_session(mut self, session_id: Arc<str>) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn log(&self, level: LogLevel, message: &str) -> LogEntryBuilder<'_> {
        LogEntryBuilder::new(self, level, message.to_string())
    }

    pub fn debug(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Debug, message)
    }

    pub fn info(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Info, message)
    }

    pub fn warn(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Warn, message)
    }

    pub fn error(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Error, message)
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    async fn write_entry(&self, mut entry: LogEntry) {
        if !self.enabled(entry.level) {
            return;
        }

        if let Some(session_id) = &self.session_id {
            entry
                .fields
                .insert("session_id".to_string(), serde_json::Value::from(session_id.as_ref()));
        }

        let output = self.format_entry(&entry);
        if entry.level >= LogLevel::Warn {
            let _ = writeln!(io::stderr().lock(), "{}", output);
        } else {
            let _ = writeln!(io::stdout().lock(), "{}", output);
        }
    }

    fn format_entry(&self, entry: &LogEntry) -> String {
        match self.format {
            LogFormat::Console => self.format_console(entry),
            LogFormat::Json => serde_json::to_string(entry)
                .unwrap_or_else(|e| format!("{{\"level\":\"ERROR\",\"message\":\"unserializable log entry: {}\"}}", e)),
            LogFormat::Compact => format_compact(entry),
        }
    }

    fn format_console(&self, entry: &LogEntry) -> String {
        let level = if self.use_color {
            entry.level.painted()
        } else {
            format!("{:>5}", entry.level.as_str())
        };

        let mut output = format!(
            "{} {} [{}] {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            level,
            entry.logger,
            entry.message
        );

        if let Some(correlation_id) = &entry.correlation_id {
            let short = correlation_id.get(..8).unwrap_or(correlation_id);
            output.push_str(&format!(" [{}]", short));
        }

        if !entry.fields.is_empty() {
            let fields: Vec<String> = entry.fields.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            output.push_str(&format!(" {{{}}}", fields.join(", ")));
        }

        if self.include_location {
            if let Some(location) = &entry.location {
                output.push_str(&format!(" @ {}", location));
            }
        }

        output
    }
}

fn format_compact(entry: &LogEntry) -> String {
    let mut output = format!(
        "{} {} {}: {}",
        entry.timestamp.format("%H:%M:%S"),
        &entry.level.as_str()[..1],
        entry.logger,
        entry.message
    );
    if let Some(correlation_id) = &entry.correlation_id {
        output.push_str(&format!(" ({})", correlation_id.get(..8).unwrap_or(correlation_id)));
    }
    output
}

/// Builder for a single log entry; nothing is written until `log()`
pub struct LogEntryBuilder<'a> {
    logger: &'a Logger,
    entry: LogEntry,
}

impl<'a> LogEntryBuilder<'a> {
    fn new(logger: &'a Logger, level: LogLevel, message: String) -> Self {
        Self {
            logger,
            entry: LogEntry {
                timestamp: Utc::now(),
                level,
                message,
                logger: logger.name.clone(),
                correlation_id: None,
                fields: BTreeMap::new(),
                location: None,
            },
        }
    }

    pub fn correlation_id(mut self, id: &str) -> Self {
        self.entry.correlation_id = Some(id.to_string());
        self
    }

    /// Add a structured field; values that fail to serialize are dropped
    pub fn field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.entry.fields.insert(key.to_string(), json_value);
        }
        self
    }

    pub fn location(mut self, file: &str, line: u32) -> Self {
        self.entry.location = Some(format!("{}:{}", file, line));
        self
    }

    pub fn outcome(self, outcome: &ProbeOutcome) -> Self {
        self.field("kind", outcome.kind.as_str())
            .field("latency_ms", outcome.latency_ms())
    }

    pub fn round(self, result: &RoundResult) -> Self {
        self.field("destination", result.destination.as_str())
            .field("count", result.count())
            .field("min_ms", result.min_ms())
            .field("avg_ms", result.avg_ms())
            .field("max_ms", result.max_ms())
            .field("timeouts", result.timeout_count)
            .field("reply_rate", result.reply_rate())
            .field("timeout_policy", result.timeout_policy.as_str())
    }

    pub fn error_info(self, error: &AppError) -> Self {
        self.field("error_category", error.category())
            .field("error_recoverable", error.is_recoverable())
            .field("error", error.to_string())
    }

    pub async fn log(self) {
        self.logger.write_entry(self.entry).await;
    }
}

/// Logger for the probe path: rounds, outcomes, sink failures and overruns
#[derive(Debug, Clone)]
pub struct ProbeLogger {
    logger: Logger,
}

impl ProbeLogger {
    pub fn new(config: &Config) -> Self {
        Self {
            logger: Logger::with_config("PROBE", config),
        }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Announce a round and return its correlation id
    pub async fn start_round(&self, destination: &Destination, count: u32, deadline: Duration) -> String {
        let correlation_id = Uuid::new_v4().to_string();

        self.logger
            .debug(&format!("pinging {}", destination))
            .correlation_id(&correlation_id)
            .field("destination", destination.as_str())
            .field("count", count)
            .field("deadline_ms", deadline.as_millis() as u64)
            .log()
            .await;

        correlation_id
    }

    pub async fn log_probe_outcome(
        &self,
        destination: &Destination,
        sequence: u16,
        outcome: &ProbeOutcome,
        correlation_id: &str,
    ) {
        let message = if outcome.is_timed_out() {
            format!("probe {} to {} timed out", sequence, destination)
        } else {
            format!("{} from {} in {:.3}ms", outcome.kind, destination, outcome.latency_ms())
        };

        self.logger
            .debug(&message)
            .correlation_id(correlation_id)
            .field("destination", destination.as_str())
            .field("sequence", sequence)
            .outcome(outcome)
            .log()
            .await;
    }

    /// A probe attempt that failed before any reply
    pub async fn log_probe_failure(&self, destination: &Destination, error: &ProbeError, correlation_id: &str) {
        self.logger
            .warn(&format!("probe to {} abandoned: {}", destination, error))
            .correlation_id(correlation_id)
            .field("destination", destination.as_str())
            .field("failure", error.kind())
            .log()
            .await;
    }

    pub async fn log_round_result(&self, result: &RoundResult, correlation_id: &str) {
        let message = format!(
            "pinged {} {} times: min={:.3}ms avg={:.3}ms max={:.3}ms timeouts={}",
            result.destination,
            result.count(),
            result.min_ms(),
            result.avg_ms(),
            result.max_ms(),
            result.timeout_count,
        );

        self.logger
            .info(&message)
            .correlation_id(correlation_id)
            .round(result)
            .log()
            .await;
    }

    pub async fn log_sink_failure(&self, destination: &Destination, error: &AppError, correlation_id: &str) {
        self.logger
            .error(&format!("failed to publish round for {}", destination))
            .correlation_id(correlation_id)
            .field("destination", destination.as_str())
            .error_info(error)
            .log()
            .await;
    }

    pub async fn log_overrun(&self, tick: u64, elapsed: Duration, interval: Duration) {
        self.logger
            .warn(&format!(
                "tick {} took {:.3}s, longer than the {}s interval; next tick starts late",
                tick,
                elapsed.as_secs_f64(),
                interval.as_secs()
            ))
            .field("tick", tick)
            .field("elapsed_ms", elapsed.as_millis() as u64)
            .field("interval_ms", interval.as_millis() as u64)
            .log()
            .await;
    }
}

/// Hands out loggers sharing one session id
pub struct LoggerFactory {
    config: Config,
    session_id: Arc<str>,
}

impl LoggerFactory {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            session_id: Uuid::new_v4().to_string().into(),
        }
    }

    pub fn create_logger(&self, name: &str) -> Logger {
        Logger::with_config(name, &self.config).with_session(self.session_id.clone())
    }

    pub fn create_probe_logger(&self) -> ProbeLogger {
        ProbeLogger {
            logger: self.create_logger("PROBE"),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)*) => {
        $logger.info(&format!($($arg)*))
            .location(file!(), line!())
            .log()
            .await
    };
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)*) => {
        $logger.warn(&format!($($arg)*))
            .location(file!(), line!())
            .log()
            .await
    };
}
