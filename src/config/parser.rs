//! Configuration parsing from CLI arguments and environment variables
//!
//! Priority, highest first: command-line arguments, environment variables,
//! `.env` file, built-in defaults.

use crate::{
    cli::Cli,
    config::env::EnvManager,
    error::Result,
    models::{config::split_list, Config},
};

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<Config> {
        let mut config = Config::default();

        EnvManager::load_env_file()?;
        config.merge_from_env()?;
        self.apply_cli_overrides(&mut config);

        config.validate()?;
        Ok(config)
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(&self, config: &mut Config) {
        if let Some(ref targets) = self.cli.targets {
            config.targets = split_list(targets);
        }

        if let Some(ref servers) = self.cli.es_servers {
            config.es_servers = split_list(servers);
        }

        if let Some(count) = self.cli.ping_count {
            config.ping_count = count;
        }

        if let Some(interval) = self.cli.ping_interval {
            config.ping_interval_seconds = interval;
        }

        if let Some(budget) = self.cli.probe_budget {
            config.probe_budget_seconds = budget;
        }

        if let Some(policy) = self.cli.timeout_policy {
            config.timeout_policy = policy;
        }

        if let Some(ref prefix) = self.cli.index_prefix {
            config.index_prefix = prefix.trim().to_string();
        }

        if let Some(format) = self.cli.log_format {
            config.log_format = format;
        }

        if self.cli.no_color {
            config.enable_color = false;
        }

        // CLI-only switches
        config.dry_run = self.cli.dry_run;
        config.verbose = self.cli.verbose;
        config.debug = self.cli.debug;
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Configuration summary logged at startup
pub fn display_config_summary(config: &Config) -> String {
    let mut summary = Vec::new();

    summary.push(format!("Targets: {}", config.targets.join(", ")));
    if config.dry_run {
        summary.push("Elasticsearch: disabled (dry run)".to_string());
    } else {
        summary.push(format!("Elasticsearch: {}", config.es_servers.join(", ")));
    }
    summary.push(format!("Index Prefix: {}", config.index_prefix));
    summary.push(format!("Ping Count: {}", config.ping_count));
    summary.push(format!("Interval: {}s", config.ping_interval_seconds));
    summary.push(format!("Probe Budget: {}s", config.probe_budget_seconds));
    summary.push(format!("Timeout Policy: {}", config.timeout_policy));
    summary.push(format!("Log Format: {:?}", config.log_format));

    summary.join("\n")
}
