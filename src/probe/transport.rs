//! Echo transports: the seam between the prober and the network
//!
//! [`IcmpTransport`] talks raw ICMPv4 through pnet and needs `CAP_NET_RAW`
//! (or root). Tests substitute scripted transports behind the same trait.

use super::icmp::{build_echo_request, classify_reply, EchoRequest};
use crate::dns::as_ipv4;
use crate::error::ProbeError;
use crate::types::ResponseKind;
use async_trait::async_trait;
use pnet::packet::icmp::IcmpPacket;
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::packet::Packet;
use pnet::transport::{icmp_packet_iter, transport_channel, TransportChannelType::Layer4, TransportProtocol::Ipv4};
use std::io;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use tokio::time::Instant;

/// Receive buffer for the raw socket
const RECV_BUFFER_SIZE: usize = 4096;

/// A message that answered one echo request
#[derive(Debug, Clone, PartialEq)]
pub struct EchoReply {
    pub kind: ResponseKind,
    /// Address the reply came from (a router for time exceeded)
    pub source: IpAddr,
    pub sent_at: Instant,
    pub received_at: Instant,
}

impl EchoReply {
    /// Round-trip time of the exchange
    pub fn latency(&self) -> Duration {
        self.received_at.saturating_duration_since(self.sent_at)
    }
}

/// Sends one echo request and waits for the message that answers it
#[async_trait]
pub trait EchoTransport: Send + Sync + 'static {
    /// Perform one request/reply exchange.
    ///
    /// Implementations must give up on their own once `deadline` passes so a
    /// caller that stopped waiting never leaves work running indefinitely.
    async fn exchange(
        &self,
        target: IpAddr,
        request: EchoRequest,
        deadline: Instant,
    ) -> Result<EchoReply, ProbeError>;

    /// Transport name for logs
    fn name(&self) -> &'static str;
}

/// Raw-socket ICMPv4 transport.
///
/// Every exchange opens its own socket so concurrent probes never read each
/// other's backlog; the socket is closed when the exchange returns.
#[derive(Debug, Clone, Default)]
pub struct IcmpTransport;

impl IcmpTransport {
    pub fn new() -> Self {
        Self
    }

    /// Open and immediately close a raw socket to surface missing privileges
    /// at startup rather than on the first tick
    pub fn check_available(&self) -> Result<(), ProbeError> {
        transport_channel(RECV_BUFFER_SIZE, Layer4(Ipv4(IpNextHeaderProtocols::Icmp)))
            .map(|_| ())
            .map_err(|e| ProbeError::TransportUnavailable(e.to_string()))
    }
}

#[async_trait]
impl EchoTransport for IcmpTransport {
    async fn exchange(
        &self,
        target: IpAddr,
        request: EchoRequest,
        deadline: Instant,
    ) -> Result<EchoReply, ProbeError> {
        let target = as_ipv4(target).ok_or(ProbeError::UnsupportedAddress(target))?;
        let deadline = deadline.into_std();

        tokio::task::spawn_blocking(move || blocking_exchange(target, request, deadline))
            .await
            .map_err(|e| ProbeError::ReceiveFailure(format!("receive task failed: {}", e)))?
    }

    fn name(&self) -> &'static str {
        "icmp"
    }
}

fn blocking_exchange(
    target: Ipv4Addr,
    request: EchoRequest,
    deadline: std::time::Instant,
) -> Result<EchoReply, ProbeError> {
    let protocol = Layer4(Ipv4(IpNextHeaderProtocols::Icmp));
    let (mut tx, mut rx) = transport_channel(RECV_BUFFER_SIZE, protocol)
        .map_err(|e| ProbeError::TransportUnavailable(e.to_string()))?;

    let bytes = build_echo_request(&request)?;
    let packet = IcmpPacket::new(&bytes)
        .ok_or_else(|| ProbeError::ParseFailure("echo request shorter than an ICMP header".to_string()))?;

    let sent_at = std::time::Instant::now();
    tx.send_to(packet, IpAddr::V4(target))
        .map_err(|e| ProbeError::SendFailure(e.to_string()))?;

    let mut incoming = icmp_packet_iter(&mut rx);
    loop {
        let remaining = deadline.saturating_duration_since(std::time::Instant::now());
        if remaining.is_zero() {
            return Err(ProbeError::ReceiveFailure(format!(
                "no reply to sequence {} before the deadline",
                request.sequence
            )));
        }

        match incoming.next_with_timeout(remaining) {
            Ok(Some((message, source))) => {
                let received_at = std::time::Instant::now();
                if let Some(kind) = classify_reply(message.packet(), &request) {
                    return Ok(EchoReply {
                        kind,
                        source,
                        sent_at: Instant::from_std(sent_at),
                        received_at: Instant::from_std(received_at),
                    });
                }
            }
            Ok(None) => continue,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ProbeError::ReceiveFailure(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv6Addr;

    #[test]
    fn test_reply_latency() {
        let sent_at = Instant::now();
        let reply = EchoReply {
            kind: ResponseKind::EchoReply,
            source: IpAddr::V4(Ipv4Addr::LOCALHOST),
            sent_at,
            received_at: sent_at + Duration::from_millis(42),
        };
        assert_eq!(reply.latency(), Duration::from_millis(42));
    }

    #[test]
    fn test_reply_latency_never_negative() {
        let received_at = Instant::now();
        let reply = EchoReply {
            kind: ResponseKind::EchoReply,
            source: IpAddr::V4(Ipv4Addr::LOCALHOST),
            sent_at: received_at + Duration::from_millis(5),
            received_at,
        };
        assert_eq!(reply.latency(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_icmp_transport_rejects_ipv6_before_opening_a_socket() {
        let transport = IcmpTransport::new();
        let result = transport
            .exchange(
                IpAddr::V6(Ipv6Addr::LOCALHOST),
                EchoRequest::new(1, 1),
                Instant::now() + Duration::from_secs(1),
            )
            .await;

        assert!(matches!(result, Err(ProbeError::UnsupportedAddress(_))));
    }
}
