//! Error handling for the ping monitor

use thiserror::Error;

/// Failure of a single probe attempt.
///
/// None of these escape the round runner: each one degrades the attempt to a
/// timed-out outcome.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The raw ICMP socket could not be opened (usually missing CAP_NET_RAW)
    #[error("ICMP transport unavailable: {0}")]
    TransportUnavailable(String),

    #[error("failed to send echo request: {0}")]
    SendFailure(String),

    #[error("failed to receive reply: {0}")]
    ReceiveFailure(String),

    #[error("failed to parse reply: {0}")]
    ParseFailure(String),

    #[error("failed to resolve {host}: {reason}")]
    Resolve { host: String, reason: String },

    #[error("unsupported destination address {0} (only IPv4 is probed)")]
    UnsupportedAddress(std::net::IpAddr),
}

impl ProbeError {
    /// Short machine-friendly label for log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TransportUnavailable(_) => "transport_unavailable",
            Self::SendFailure(_) => "send_failure",
            Self::ReceiveFailure(_) => "receive_failure",
            Self::ParseFailure(_) => "parse_failure",
            Self::Resolve { .. } => "resolve_failure",
            Self::UnsupportedAddress(_) => "unsupported_address",
        }
    }
}

/// Application-level errors; each maps to a category and a process exit code
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection-level failure talking to a remote service
    #[error("Network error: {0}")]
    Network(String),

    #[error("DNS resolution error: {0}")]
    DnsResolution(String),

    /// Every configured Elasticsearch server rejected or missed a document
    #[error("Sink error: {0}")]
    Sink(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Parsing error: {0}")]
    Parse(String),

    #[error("Statistics error: {0}")]
    Statistics(String),
}

impl AppError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network(message.into())
    }

    pub fn dns_resolution<S: Into<String>>(message: S) -> Self {
        Self::DnsResolution(message.into())
    }

    pub fn sink<S: Into<String>>(message: S) -> Self {
        Self::Sink(message.into())
    }

    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    pub fn statistics<S: Into<String>>(message: S) -> Self {
        Self::Statistics(message.into())
    }

    /// Category tag used in log fields and console output
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::Network(_) => "NETWORK",
            Self::DnsResolution(_) => "DNS",
            Self::Sink(_) => "SINK",
            Self::Io(_) => "IO",
            Self::Parse(_) => "PARSE",
            Self::Statistics(_) => "STATS",
        }
    }

    /// Whether the next tick may succeed without operator action
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::DnsResolution(_) | Self::Sink(_))
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Parse(_) => 1,
            Self::Network(_) | Self::DnsResolution(_) | Self::Sink(_) => 2,
            Self::Io(_) => 5,
            Self::Statistics(_) => 6,
        }
    }

    /// `[CATEGORY] message`, colored by severity when `use_color` is set
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();
        if !use_color {
            return format!("[{}] {}", category, message);
        }

        use colored::{Color, Colorize};
        let color = match self {
            Self::Config(_) | Self::Parse(_) => Color::Red,
            Self::Network(_) | Self::DnsResolution(_) | Self::Sink(_) => Color::Yellow,
            Self::Io(_) | Self::Statistics(_) => Color::Cyan,
        };
        format!("[{}] {}", category.color(color).bold(), message.color(color))
    }
}

// Standard library error conversions
impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(error: url::ParseError) -> Self {
        Self::parse(format!("URL parse error: {}", error))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::parse(format!("JSON parse error: {}", error))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_connect() || error.is_timeout() || error.is_request() {
            Self::network(error.to_string())
        } else {
            Self::sink(error.to_string())
        }
    }
}

impl From<trust_dns_resolver::error::ResolveError> for AppError {
    fn from(error: trust_dns_resolver::error::ResolveError) -> Self {
        Self::dns_resolution(error.to_string())
    }
}

impl From<dotenv::Error> for AppError {
    fn from(error: dotenv::Error) -> Self {
        Self::config(format!("Environment file error: {}", error))
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(error: std::num::ParseIntError) -> Self {
        Self::parse(format!("Integer parse error: {}", error))
    }
}

/// Custom Result type for the application
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_error = AppError::config("Invalid configuration");
        assert_eq!(config_error.category(), "CONFIG");
        assert!(!config_error.is_recoverable());
        assert_eq!(config_error.exit_code(), 1);

        let sink_error = AppError::sink("index rejected");
        assert_eq!(sink_error.category(), "SINK");
        assert!(sink_error.is_recoverable());
        assert_eq!(sink_error.exit_code(), 2);
    }

    #[test]
    fn test_error_display() {
        let error = AppError::config("Test configuration error");
        let display = error.to_string();
        assert!(display.contains("Configuration error"));
        assert!(display.contains("Test configuration error"));
    }

    #[test]
    fn test_error_categories() {
        let errors = [
            AppError::config("config"),
            AppError::network("network"),
            AppError::dns_resolution("dns"),
            AppError::sink("sink"),
            AppError::io("io"),
            AppError::parse("parse"),
            AppError::statistics("stats"),
        ];

        let expected_categories = [
            "CONFIG", "NETWORK", "DNS", "SINK", "IO", "PARSE", "STATS",
        ];

        for (error, expected) in errors.iter().zip(expected_categories.iter()) {
            assert_eq!(error.category(), *expected);
        }
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(AppError::config("test").exit_code(), 1);
        assert_eq!(AppError::network("test").exit_code(), 2);
        assert_eq!(AppError::io("test").exit_code(), 5);
        assert_eq!(AppError::statistics("test").exit_code(), 6);
    }

    #[test]
    fn test_error_conversions() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "raw socket");
        let app_error: AppError = io_error.into();
        assert_eq!(app_error.category(), "IO");

        let parse_error = "not_a_number".parse::<u32>().unwrap_err();
        let app_error: AppError = parse_error.into();
        assert_eq!(app_error.category(), "PARSE");

        let url_error = url::Url::parse("not a url").unwrap_err();
        let app_error: AppError = url_error.into();
        assert!(app_error.to_string().contains("URL parse error"));
    }

    #[test]
    fn test_dotenv_error_conversion() {
        let dotenv_error = dotenv::Error::LineParse(".env".to_string(), 1);
        let app_error: AppError = dotenv_error.into();
        assert_eq!(app_error.category(), "CONFIG");
        assert!(app_error.to_string().contains("Environment file error"));
    }

    #[test]
    fn test_console_formatting() {
        let error = AppError::config("count too large");
        let plain = error.format_for_console(false);
        assert_eq!(plain, "[CONFIG] Configuration error: count too large");
        assert!(error.format_for_console(true).contains("count too large"));
    }

    #[test]
    fn test_probe_error_kinds() {
        let error = ProbeError::Resolve { host: "nowhere.invalid".into(), reason: "NXDOMAIN".into() };
        assert_eq!(error.kind(), "resolve_failure");
        assert!(error.to_string().contains("nowhere.invalid"));

        let error = ProbeError::UnsupportedAddress("::1".parse().unwrap());
        assert_eq!(error.kind(), "unsupported_address");
        assert_eq!(ProbeError::SendFailure("EPERM".into()).kind(), "send_failure");
    }
}
