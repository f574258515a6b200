//! Main application orchestration: wires configuration into the scheduler

use crate::{
    config::{display_config_summary, EnvManager},
    dns::DnsManager,
    error::Result,
    log_info, log_warn,
    logging::LoggerFactory,
    models::Config,
    probe::{EchoProber, EchoTransport, IcmpTransport, RoundRunner},
    scheduler::Scheduler,
    sink::{ElasticsearchSink, LogSink, TelemetrySink},
};
use std::sync::Arc;

/// Main application struct that coordinates all components
pub struct App {
    config: Config,
    loggers: LoggerFactory,
}

impl App {
    /// Create a new application instance from a validated configuration
    pub fn new(config: Config) -> Self {
        let loggers = LoggerFactory::new(config.clone());
        Self { config, loggers }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Sink selected by the configuration
    pub async fn build_sink(&self) -> Result<Arc<dyn TelemetrySink>> {
        if self.config.dry_run {
            let logger = self.loggers.create_logger("SINK");
            return Ok(Arc::new(LogSink::new(logger)));
        }

        let sink = ElasticsearchSink::new(&self.config.es_servers, &self.config.index_prefix)?;
        Ok(Arc::new(sink))
    }

    /// Assemble the scheduler on top of `transport`
    pub async fn build_scheduler(&self, transport: Arc<dyn EchoTransport>) -> Result<Scheduler> {
        let probe_logger = self.loggers.create_probe_logger();
        let prober = EchoProber::new(transport, DnsManager::new());
        let runner = RoundRunner::new(prober, self.config.probe_budget(), probe_logger.clone());
        let sink = self.build_sink().await?;

        Ok(Scheduler::new(&self.config, runner, sink, probe_logger))
    }

    /// Run until interrupted
    pub async fn run(self) -> Result<()> {
        let logger = self.loggers.create_logger("APP");

        logger
            .info(&format!("{} v{} starting", crate::PKG_NAME, crate::VERSION))
            .field("build_time", crate::BUILD_TIME)
            .field("git_commit", crate::GIT_COMMIT.unwrap_or("unknown"))
            .log()
            .await;
        if self.config.verbose || self.config.debug {
            for line in display_config_summary(&self.config).lines() {
                log_info!(logger, "{}", line);
            }
        }

        for warning in EnvManager::validate_current_env() {
            log_warn!(logger, "{}", warning);
        }

        let transport = IcmpTransport::new();
        if let Err(e) = transport.check_available() {
            // Keep running: every probe will time out until privileges are fixed
            logger
                .warn(&format!("{}; probes will time out (run as root or grant CAP_NET_RAW)", e))
                .field("transport", transport.name())
                .log()
                .await;
        }

        let scheduler = self.build_scheduler(Arc::new(transport)).await?;
        logger
            .info(&format!(
                "probing {} targets every {}s",
                scheduler.destinations().len(),
                scheduler.interval().as_secs()
            ))
            .field("sink", if self.config.dry_run { "log" } else { "elasticsearch" })
            .log()
            .await;

        tokio::select! {
            _ = scheduler.run() => {}
            signal = tokio::signal::ctrl_c() => {
                signal?;
                logger.info("interrupted, shutting down").log().await;
            }
        }

        Ok(())
    }
}
