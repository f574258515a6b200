//! End-to-end round scenarios through the public API
//!
//! A scripted transport replaces raw sockets and tokio's paused clock makes
//! latencies and deadlines exact.

use async_trait::async_trait;
use ping_monitor::{
    dns::DnsManager,
    logging::ProbeLogger,
    probe::{EchoReply, EchoRequest},
    Config, Destination, EchoProber, EchoTransport, ProbeError, ResponseKind, RoundResult,
    RoundRunner, TimeoutPolicy,
};
use std::collections::VecDeque;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{sleep, sleep_until, Instant};
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};

/// Reply after the given delay, or `None` for silence
struct Script {
    kind: ResponseKind,
    replies: Mutex<VecDeque<Option<u64>>>,
    calls: AtomicUsize,
}

impl Script {
    fn new(replies: &[Option<u64>]) -> Arc<Self> {
        Self::answering(ResponseKind::EchoReply, replies)
    }

    fn answering(kind: ResponseKind, replies: &[Option<u64>]) -> Arc<Self> {
        Arc::new(Self {
            kind,
            replies: Mutex::new(replies.iter().copied().collect()),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl EchoTransport for Script {
    async fn exchange(
        &self,
        target: IpAddr,
        _request: EchoRequest,
        deadline: Instant,
    ) -> Result<EchoReply, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.replies.lock().unwrap().pop_front().flatten();
        let sent_at = Instant::now();

        match next {
            Some(ms) => {
                sleep(Duration::from_millis(ms)).await;
                Ok(EchoReply {
                    kind: self.kind,
                    source: target,
                    sent_at,
                    received_at: Instant::now(),
                })
            }
            None => {
                sleep_until(deadline + Duration::from_millis(1)).await;
                Err(ProbeError::ReceiveFailure("silent".to_string()))
            }
        }
    }

    fn name(&self) -> &'static str {
        "script"
    }
}

fn runner(script: &Arc<Script>) -> RoundRunner {
    let dns = DnsManager::with_config(ResolverConfig::new(), ResolverOpts::default());
    let prober = EchoProber::new(script.clone(), dns);
    RoundRunner::new(prober, Duration::from_secs(3), ProbeLogger::new(&Config::default()))
}

async fn round(script: &Arc<Script>, count: u32, policy: TimeoutPolicy) -> RoundResult {
    let destination = Destination::new("198.51.100.7");
    let record = runner(script).run_recorded(&destination, count).await;
    RoundResult::from_outcomes(destination, record.started_at, record.outcomes, policy).unwrap()
}

#[tokio::test(start_paused = true)]
async fn scenario_all_replies() {
    let script = Script::new(&[Some(10), Some(20), Some(30)]);
    let result = round(&script, 3, TimeoutPolicy::ExcludeTimeouts).await;

    assert_eq!(result.min_latency, Duration::from_millis(10));
    assert_eq!(result.avg_latency, Duration::from_millis(20));
    assert_eq!(result.max_latency, Duration::from_millis(30));
    assert_eq!(result.timeout_count, 0);
}

#[tokio::test(start_paused = true)]
async fn scenario_silent_destination() {
    let script = Script::new(&[]);
    let start = Instant::now();
    let result = round(&script, 3, TimeoutPolicy::ExcludeTimeouts).await;

    assert_eq!(Instant::now() - start, Duration::from_secs(9));
    assert_eq!(result.count(), 3);
    assert!(result.outcomes.iter().all(|o| o.kind == ResponseKind::TimedOut));
    assert_eq!(result.min_latency, Duration::ZERO);
    assert_eq!(result.avg_latency, Duration::ZERO);
    assert_eq!(result.max_latency, Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn scenario_reply_then_silence() {
    let script = Script::new(&[Some(5), None]);
    let result = round(&script, 3, TimeoutPolicy::ZeroLatency).await;

    assert_eq!(result.outcomes[0].kind, ResponseKind::EchoReply);
    assert_eq!(result.outcomes[1].kind, ResponseKind::TimedOut);
    assert_eq!(result.outcomes[2].kind, ResponseKind::TimedOut);
    // The third probe is never sent
    assert_eq!(script.calls.load(Ordering::SeqCst), 2);

    assert_eq!(result.min_latency, Duration::ZERO);
    assert_eq!(result.max_latency, Duration::from_millis(5));
    assert_eq!(result.avg_latency, Duration::from_millis(5) / 3);
}

#[tokio::test(start_paused = true)]
async fn scenario_reply_then_silence_excluding_timeouts() {
    let script = Script::new(&[Some(5), None]);
    let result = round(&script, 3, TimeoutPolicy::ExcludeTimeouts).await;

    assert_eq!(result.min_latency, Duration::from_millis(5));
    assert_eq!(result.avg_latency, Duration::from_millis(5));
    assert_eq!(result.max_latency, Duration::from_millis(5));
    assert_eq!(result.timeout_count, 2);
}

#[tokio::test(start_paused = true)]
async fn scenario_unreachable_replies_keep_latency() {
    let script = Script::answering(ResponseKind::Unreachable, &[Some(12), Some(14), Some(16)]);
    let result = round(&script, 3, TimeoutPolicy::ExcludeTimeouts).await;

    assert!(result.outcomes.iter().all(|o| o.kind == ResponseKind::Unreachable));
    assert_eq!(result.min_latency, Duration::from_millis(12));
    assert_eq!(result.avg_latency, Duration::from_millis(14));
    assert_eq!(result.max_latency, Duration::from_millis(16));
    assert_eq!(result.timeout_count, 0);
}

#[tokio::test(start_paused = true)]
async fn scenario_zero_count() {
    let script = Script::new(&[Some(1)]);
    let result = round(&script, 0, TimeoutPolicy::ExcludeTimeouts).await;

    assert!(result.outcomes.is_empty());
    assert_eq!(result.avg_latency, Duration::ZERO);
    assert_eq!(script.calls.load(Ordering::SeqCst), 0);
}
