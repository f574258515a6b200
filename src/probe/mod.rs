//! ICMP echo probing
//!
//! - [`icmp`]: echo request encoding and reply correlation
//! - [`transport`]: the network seam, raw sockets in production
//! - [`prober`]: one probe raced against a deadline
//! - [`round`]: `count` sequential probes sharing one deadline

pub mod icmp;
pub mod prober;
pub mod round;
pub mod transport;

pub use icmp::{EchoRequest, PAYLOAD_MARKER};
pub use prober::{EchoProber, ProbeAttempt};
pub use round::{RoundRecord, RoundRunner};
pub use transport::{EchoReply, EchoTransport, IcmpTransport};
