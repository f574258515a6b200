//! Elasticsearch sink
//!
//! Each round becomes one document in a weekly index named
//! `{prefix}-{YYYY-MM-DD}`, the date being the Sunday that starts the week
//! (UTC). Servers are tried in order and the first 2xx answer wins.

use super::TelemetrySink;
use crate::error::{AppError, Result};
use crate::models::RoundResult;
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Days, Utc};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use url::Url;

/// Timeout for one index request
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Document layout stored per round; latencies are nanoseconds
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PingDocument {
    pub target: String,
    pub count: usize,
    pub latency: Vec<u64>,
    pub kinds: Vec<&'static str>,
    pub avg_latency: u64,
    pub max_latency: u64,
    pub min_latency: u64,
    pub timeout_count: usize,
    #[serde(rename = "@timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl PingDocument {
    pub fn from_round(result: &RoundResult) -> Self {
        Self {
            target: result.destination.to_string(),
            count: result.count(),
            latency: result.outcomes.iter().map(|o| nanos(o.latency)).collect(),
            kinds: result.outcomes.iter().map(|o| o.kind.as_str()).collect(),
            avg_latency: nanos(result.avg_latency),
            max_latency: nanos(result.max_latency),
            min_latency: nanos(result.min_latency),
            timeout_count: result.timeout_count,
            timestamp: result.timestamp,
        }
    }
}

fn nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

/// Index for the week containing `at`
pub fn weekly_index(prefix: &str, at: DateTime<Utc>) -> String {
    let date = at.date_naive();
    let sunday = date
        .checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_sunday())))
        .unwrap_or(date);
    format!("{}-{}", prefix, sunday.format("%Y-%m-%d"))
}

/// Posts round documents to the first reachable Elasticsearch server
pub struct ElasticsearchSink {
    client: Client,
    servers: Vec<Url>,
    index_prefix: String,
}

impl ElasticsearchSink {
    pub fn new(servers: &[String], index_prefix: &str) -> Result<Self> {
        if servers.is_empty() {
            return Err(AppError::config("At least one Elasticsearch server is required"));
        }

        let servers = servers
            .iter()
            .map(|s| Url::parse(s.trim()))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(format!("ping-monitor/{}", crate::VERSION))
            .build()
            .map_err(|e| AppError::sink(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            servers,
            index_prefix: index_prefix.to_string(),
        })
    }

    pub fn servers(&self) -> &[Url] {
        &self.servers
    }

    /// Document endpoint on `server` for a round taken at `at`
    fn document_url(&self, server: &Url, at: DateTime<Utc>) -> String {
        format!(
            "{}/{}/_doc",
            server.as_str().trim_end_matches('/'),
            weekly_index(&self.index_prefix, at)
        )
    }
}

#[async_trait]
impl TelemetrySink for ElasticsearchSink {
    async fn publish(&self, result: &RoundResult) -> Result<()> {
        let document = PingDocument::from_round(result);
        let mut failures = Vec::with_capacity(self.servers.len());

        for server in &self.servers {
            let url = self.document_url(server, result.timestamp);
            match self.client.post(&url).json(&document).send().await {
                Ok(response) if response.status().is_success() => return Ok(()),
                Ok(response) => failures.push(format!("{} answered {}", server, response.status())),
                Err(e) => failures.push(format!("{}: {}", server, e)),
            }
        }

        Err(AppError::sink(format!(
            "No Elasticsearch server accepted the document ({})",
            failures.join("; ")
        )))
    }

    fn name(&self) -> &str {
        "elasticsearch"
    }
}
