//! ICMPv4 echo encoding and reply correlation
//!
//! Raw ICMP sockets see every ICMP message delivered to the host, so a reply
//! only counts when it carries our identifier and sequence number. Error
//! messages (unreachable, time exceeded, ...) are matched through the copy of
//! the original echo header they embed.

use crate::error::ProbeError;
use crate::types::ResponseKind;
use pnet::packet::icmp::echo_reply::EchoReplyPacket;
use pnet::packet::icmp::echo_request::{EchoRequestPacket, MutableEchoRequestPacket};
use pnet::packet::icmp::{self, IcmpCode, IcmpPacket, IcmpTypes};
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::packet::ipv4::Ipv4Packet;
use pnet::packet::Packet;

/// Payload carried by every echo request, easy to spot in packet captures
pub const PAYLOAD_MARKER: &[u8] = b"HELLO-R-U-THERE";

/// Type, code, checksum, identifier, sequence
pub const ECHO_HEADER_LEN: usize = 8;

/// ICMP error messages: type, code, checksum and 4 unused bytes precede the
/// embedded IPv4 header
const ERROR_HEADER_LEN: usize = 8;

/// Identity of one echo request on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EchoRequest {
    pub identifier: u16,
    pub sequence: u16,
}

impl EchoRequest {
    pub fn new(identifier: u16, sequence: u16) -> Self {
        Self { identifier, sequence }
    }

    fn matches(&self, identifier: u16, sequence: u16) -> bool {
        self.identifier == identifier && self.sequence == sequence
    }
}

/// Encode an echo request with a valid checksum
pub fn build_echo_request(request: &EchoRequest) -> Result<Vec<u8>, ProbeError> {
    let mut buffer = vec![0u8; ECHO_HEADER_LEN + PAYLOAD_MARKER.len()];

    {
        let mut packet = MutableEchoRequestPacket::new(&mut buffer)
            .ok_or_else(|| ProbeError::ParseFailure("echo request buffer too small".to_string()))?;
        packet.set_icmp_type(IcmpTypes::EchoRequest);
        packet.set_icmp_code(IcmpCode::new(0));
        packet.set_identifier(request.identifier);
        packet.set_sequence_number(request.sequence);
        packet.set_payload(PAYLOAD_MARKER);

        let checksum = IcmpPacket::new(packet.packet())
            .map(|p| icmp::checksum(&p))
            .ok_or_else(|| ProbeError::ParseFailure("echo request too short for checksum".to_string()))?;
        packet.set_checksum(checksum);
    }

    Ok(buffer)
}

/// Classify an ICMP message received on the raw socket.
///
/// Returns `None` for anything that does not refer to `request`: other
/// processes' traffic, our own request looped back, truncated packets.
pub fn classify_reply(bytes: &[u8], request: &EchoRequest) -> Option<ResponseKind> {
    let packet = IcmpPacket::new(bytes)?;

    match packet.get_icmp_type() {
        IcmpTypes::EchoReply => {
            let reply = EchoReplyPacket::new(bytes)?;
            request
                .matches(reply.get_identifier(), reply.get_sequence_number())
                .then_some(ResponseKind::EchoReply)
        }
        IcmpTypes::EchoRequest => None,
        IcmpTypes::DestinationUnreachable => {
            embedded_request_matches(bytes, request).then_some(ResponseKind::Unreachable)
        }
        IcmpTypes::TimeExceeded => {
            embedded_request_matches(bytes, request).then_some(ResponseKind::TimeExceeded)
        }
        _ => embedded_request_matches(bytes, request).then_some(ResponseKind::Other),
    }
}

/// Whether an ICMP error message quotes our echo request
fn embedded_request_matches(bytes: &[u8], request: &EchoRequest) -> bool {
    let Some(quoted) = bytes.get(ERROR_HEADER_LEN..) else {
        return false;
    };
    let Some(ip) = Ipv4Packet::new(quoted) else {
        return false;
    };
    if ip.get_version() != 4 || ip.get_next_level_protocol() != IpNextHeaderProtocols::Icmp {
        return false;
    }

    let header_len = usize::from(ip.get_header_length()) * 4;
    let Some(original) = quoted.get(header_len..) else {
        return false;
    };

    match EchoRequestPacket::new(original) {
        Some(echo) => {
            echo.get_icmp_type() == IcmpTypes::EchoRequest
                && request.matches(echo.get_identifier(), echo.get_sequence_number())
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pnet::packet::icmp::echo_reply::MutableEchoReplyPacket;
    use pnet::packet::icmp::{IcmpType, MutableIcmpPacket};
    use pnet::packet::ipv4::MutableIpv4Packet;

    const REQUEST: EchoRequest = EchoRequest { identifier: 0xbeef, sequence: 7 };

    fn echo_reply(identifier: u16, sequence: u16) -> Vec<u8> {
        let mut buffer = vec![0u8; ECHO_HEADER_LEN + PAYLOAD_MARKER.len()];
        let mut packet = MutableEchoReplyPacket::new(&mut buffer).unwrap();
        packet.set_icmp_type(IcmpTypes::EchoReply);
        packet.set_identifier(identifier);
        packet.set_sequence_number(sequence);
        packet.set_payload(PAYLOAD_MARKER);
        buffer
    }

    /// ICMP error message quoting `quoted_icmp` inside a minimal IPv4 header
    fn error_message(icmp_type: IcmpType, quoted_icmp: &[u8]) -> Vec<u8> {
        let ip_len = 20 + quoted_icmp.len();
        let mut ip_buffer = vec![0u8; ip_len];
        {
            let mut ip = MutableIpv4Packet::new(&mut ip_buffer).unwrap();
            ip.set_version(4);
            ip.set_header_length(5);
            ip.set_total_length(ip_len as u16);
            ip.set_ttl(1);
            ip.set_next_level_protocol(IpNextHeaderProtocols::Icmp);
            ip.set_payload(quoted_icmp);
        }

        let mut buffer = vec![0u8; ERROR_HEADER_LEN + ip_len];
        {
            let mut packet = MutableIcmpPacket::new(&mut buffer).unwrap();
            packet.set_icmp_type(icmp_type);
            packet.set_icmp_code(IcmpCode::new(1));
        }
        buffer[ERROR_HEADER_LEN..].copy_from_slice(&ip_buffer);
        buffer
    }

    #[test]
    fn test_build_echo_request_layout() {
        let bytes = build_echo_request(&REQUEST).unwrap();
        let packet = EchoRequestPacket::new(&bytes).unwrap();

        assert_eq!(packet.get_icmp_type(), IcmpTypes::EchoRequest);
        assert_eq!(packet.get_icmp_code(), IcmpCode::new(0));
        assert_eq!(packet.get_identifier(), 0xbeef);
        assert_eq!(packet.get_sequence_number(), 7);
        assert_eq!(packet.payload(), PAYLOAD_MARKER);
    }

    #[test]
    fn test_build_echo_request_checksum_is_valid() {
        let bytes = build_echo_request(&REQUEST).unwrap();
        let packet = IcmpPacket::new(&bytes).unwrap();
        assert_eq!(packet.get_checksum(), icmp::checksum(&packet));
        assert_ne!(packet.get_checksum(), 0);
    }

    #[test]
    fn test_matching_echo_reply() {
        let bytes = echo_reply(0xbeef, 7);
        assert_eq!(classify_reply(&bytes, &REQUEST), Some(ResponseKind::EchoReply));
    }

    #[test]
    fn test_echo_reply_for_other_probe_is_ignored() {
        assert_eq!(classify_reply(&echo_reply(0xbeef, 8), &REQUEST), None);
        assert_eq!(classify_reply(&echo_reply(0x1234, 7), &REQUEST), None);
    }

    #[test]
    fn test_own_request_looped_back_is_ignored() {
        let bytes = build_echo_request(&REQUEST).unwrap();
        assert_eq!(classify_reply(&bytes, &REQUEST), None);
    }

    #[test]
    fn test_destination_unreachable_quoting_our_request() {
        let quoted = build_echo_request(&REQUEST).unwrap();
        let bytes = error_message(IcmpTypes::DestinationUnreachable, &quoted);
        assert_eq!(classify_reply(&bytes, &REQUEST), Some(ResponseKind::Unreachable));
    }

    #[test]
    fn test_time_exceeded_quoting_our_request() {
        let quoted = build_echo_request(&REQUEST).unwrap();
        let bytes = error_message(IcmpTypes::TimeExceeded, &quoted);
        assert_eq!(classify_reply(&bytes, &REQUEST), Some(ResponseKind::TimeExceeded));
    }

    #[test]
    fn test_other_error_quoting_our_request() {
        let quoted = build_echo_request(&REQUEST).unwrap();
        let bytes = error_message(IcmpTypes::ParameterProblem, &quoted);
        assert_eq!(classify_reply(&bytes, &REQUEST), Some(ResponseKind::Other));
    }

    #[test]
    fn test_error_quoting_someone_else_is_ignored() {
        let quoted = build_echo_request(&EchoRequest::new(0xbeef, 99)).unwrap();
        let bytes = error_message(IcmpTypes::DestinationUnreachable, &quoted);
        assert_eq!(classify_reply(&bytes, &REQUEST), None);
    }

    #[test]
    fn test_truncated_error_is_ignored() {
        let quoted = build_echo_request(&REQUEST).unwrap();
        let bytes = error_message(IcmpTypes::DestinationUnreachable, &quoted);
        assert_eq!(classify_reply(&bytes[..ERROR_HEADER_LEN + 24], &REQUEST), None);
        assert_eq!(classify_reply(&[0u8; 2], &REQUEST), None);
    }
}
