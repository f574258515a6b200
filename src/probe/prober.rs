//! Single echo probe with a hard deadline
//!
//! The exchange runs in its own task and reports over a oneshot channel. The
//! caller races that channel against the deadline; whichever loses is
//! dropped. A late reply finds the receiver gone, its send fails immediately
//! and the task ends without ever blocking.

use super::icmp::EchoRequest;
use super::transport::{EchoReply, EchoTransport};
use crate::dns::DnsManager;
use crate::error::ProbeError;
use crate::models::{Destination, ProbeOutcome};
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::time::{timeout_at, Instant};
use uuid::Uuid;

/// What happened to one probe, including why it failed if it did
#[derive(Debug)]
pub struct ProbeAttempt {
    pub outcome: ProbeOutcome,
    /// Wire identity; `None` when nothing was sent
    pub request: Option<EchoRequest>,
    /// Failure that degraded the attempt to a timeout
    pub error: Option<ProbeError>,
}

impl ProbeAttempt {
    fn replied(request: EchoRequest, reply: EchoReply) -> Self {
        Self {
            outcome: ProbeOutcome::reply(reply.kind, reply.latency()),
            request: Some(request),
            error: None,
        }
    }

    fn timed_out(request: Option<EchoRequest>) -> Self {
        Self {
            outcome: ProbeOutcome::timed_out(),
            request,
            error: None,
        }
    }

    fn failed(request: EchoRequest, error: ProbeError) -> Self {
        Self {
            outcome: ProbeOutcome::timed_out(),
            request: Some(request),
            error: Some(error),
        }
    }

    /// Sequence number used on the wire, 0 if nothing was sent
    pub fn sequence(&self) -> u16 {
        self.request.map(|r| r.sequence).unwrap_or(0)
    }
}

/// Sends echo requests to one destination at a time
pub struct EchoProber {
    transport: Arc<dyn EchoTransport>,
    dns: DnsManager,
    sequence: AtomicU16,
}

impl EchoProber {
    pub fn new(transport: Arc<dyn EchoTransport>, dns: DnsManager) -> Self {
        Self {
            transport,
            dns,
            sequence: AtomicU16::new(1),
        }
    }

    /// Probe `destination` once, never returning later than `deadline`
    pub async fn probe(&self, destination: &Destination, deadline: Instant) -> ProbeOutcome {
        self.probe_attempt(destination, deadline).await.outcome
    }

    /// Like [`probe`](Self::probe) but keeps the wire identity and failure
    pub async fn probe_attempt(&self, destination: &Destination, deadline: Instant) -> ProbeAttempt {
        if Instant::now() >= deadline {
            return ProbeAttempt::timed_out(None);
        }

        let request = self.next_request();
        let (tx, rx) = oneshot::channel();
        let transport = Arc::clone(&self.transport);
        let dns = self.dns.clone();
        let destination = destination.clone();

        tokio::spawn(async move {
            let result = exchange(transport, dns, &destination, request, deadline).await;
            // Err means the caller already gave up; the result is dropped here
            let _ = tx.send(result);
        });

        match timeout_at(deadline, rx).await {
            Ok(Ok(Ok(reply))) => ProbeAttempt::replied(request, reply),
            Ok(Ok(Err(error))) => ProbeAttempt::failed(request, error),
            Ok(Err(_)) => ProbeAttempt::failed(
                request,
                ProbeError::ReceiveFailure("probe task ended without a result".to_string()),
            ),
            Err(_) => ProbeAttempt::timed_out(Some(request)),
        }
    }

    fn next_request(&self) -> EchoRequest {
        let identifier = (Uuid::new_v4().as_u128() & 0xffff) as u16;
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        EchoRequest::new(identifier, sequence)
    }
}

async fn exchange(
    transport: Arc<dyn EchoTransport>,
    dns: DnsManager,
    destination: &Destination,
    request: EchoRequest,
    deadline: Instant,
) -> Result<EchoReply, ProbeError> {
    let target = dns
        .resolve(destination.as_str())
        .await
        .map_err(|e| ProbeError::Resolve {
            host: destination.to_string(),
            reason: e.to_string(),
        })?;

    transport.exchange(target, request, deadline).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::testing::{ScriptedTransport, Step};
    use crate::types::ResponseKind;
    use std::time::Duration;

    fn prober(transport: &Arc<ScriptedTransport>) -> EchoProber {
        EchoProber::new(transport.clone(), crate::probe::testing::offline_dns())
    }

    #[tokio::test(start_paused = true)]
    async fn test_reply_before_deadline() {
        let transport = Arc::new(ScriptedTransport::new(vec![Step::reply(ResponseKind::EchoReply, 10)]));
        let prober = prober(&transport);

        let deadline = Instant::now() + Duration::from_secs(3);
        let outcome = prober.probe(&Destination::new("192.0.2.1"), deadline).await;

        assert_eq!(outcome, ProbeOutcome::reply(ResponseKind::EchoReply, Duration::from_millis(10)));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_wins_and_late_reply_is_discarded() {
        let transport = Arc::new(ScriptedTransport::new(vec![Step::reply(ResponseKind::EchoReply, 5_000)]));
        let prober = prober(&transport);

        let start = Instant::now();
        let deadline = start + Duration::from_secs(3);
        let attempt = prober.probe_attempt(&Destination::new("192.0.2.1"), deadline).await;

        assert!(attempt.outcome.is_timed_out());
        assert!(attempt.error.is_none());
        assert_eq!(Instant::now() - start, Duration::from_secs(3));

        // The exchange finishes later and hands its result to nobody
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(transport.completed(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_deadline_sends_nothing() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let prober = prober(&transport);

        let attempt = prober.probe_attempt(&Destination::new("192.0.2.1"), Instant::now()).await;

        assert!(attempt.outcome.is_timed_out());
        assert!(attempt.request.is_none());
        assert_eq!(attempt.sequence(), 0);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_becomes_timeout() {
        let transport = Arc::new(ScriptedTransport::new(vec![Step::fail("Operation not permitted")]));
        let prober = prober(&transport);

        let start = Instant::now();
        let attempt = prober
            .probe_attempt(&Destination::new("192.0.2.1"), start + Duration::from_secs(3))
            .await;

        assert!(attempt.outcome.is_timed_out());
        assert_eq!(attempt.outcome.latency, Duration::ZERO);
        assert!(matches!(attempt.error, Some(ProbeError::SendFailure(_))));
        // Failure is reported immediately, not at the deadline
        assert_eq!(Instant::now(), start);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_replies_are_classified() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Step::reply(ResponseKind::Unreachable, 12),
            Step::reply(ResponseKind::TimeExceeded, 4),
        ]));
        let prober = prober(&transport);
        let destination = Destination::new("192.0.2.1");
        let deadline = Instant::now() + Duration::from_secs(6);

        let first = prober.probe(&destination, deadline).await;
        let second = prober.probe(&destination, deadline).await;

        assert_eq!(first.kind, ResponseKind::Unreachable);
        assert_eq!(first.latency, Duration::from_millis(12));
        assert_eq!(second.kind, ResponseKind::TimeExceeded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequence_numbers_increase() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Step::reply(ResponseKind::EchoReply, 1),
            Step::reply(ResponseKind::EchoReply, 1),
            Step::reply(ResponseKind::EchoReply, 1),
        ]));
        let prober = prober(&transport);
        let destination = Destination::new("192.0.2.1");
        let deadline = Instant::now() + Duration::from_secs(9);

        for _ in 0..3 {
            prober.probe(&destination, deadline).await;
        }

        let sequences: Vec<u16> = transport.requests().iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ipv6_destination_is_reported_by_transport() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let prober = prober(&transport);

        let attempt = prober
            .probe_attempt(&Destination::new("::1"), Instant::now() + Duration::from_secs(1))
            .await;

        assert!(attempt.outcome.is_timed_out());
        assert!(matches!(attempt.error, Some(ProbeError::UnsupportedAddress(_))));
    }
}
