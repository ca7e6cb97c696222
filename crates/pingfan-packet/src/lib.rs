//! Packet construction and parsing for the `ICMP` and `ICMPv6` echo packets
//! used by `pingfan`.
//!
//! Packets operate over user supplied byte buffers.  `EchoRequest` packets
//! are built over a mutable buffer which is then handed to the socket layer
//! for sending, whereas `EchoReply` and `IPv4` packets are read-only views
//! over received bytes and never copy.
//!
//! # Examples
//!
//! Build an `ICMP` `EchoRequest` packet:
//!
//! ```rust
//! use hex_literal::hex;
//! use pingfan_packet::checksum::icmp_checksum;
//! use pingfan_packet::icmpv4::echo_request::EchoRequestPacket;
//! use pingfan_packet::icmpv4::{IcmpCode, IcmpType};
//!
//! # fn main() -> Result<(), pingfan_packet::error::Error> {
//! let mut buf = [0_u8; EchoRequestPacket::minimum_packet_size()];
//! let mut packet = EchoRequestPacket::new(&mut buf)?;
//! packet.set_icmp_type(IcmpType::EchoRequest);
//! packet.set_icmp_code(IcmpCode(0));
//! packet.set_identifier(1234);
//! packet.set_sequence(10);
//! let checksum = icmp_checksum(&[packet.packet()]);
//! packet.set_checksum(checksum);
//! assert_eq!(hex!("08 00 f3 23 04 d2 00 0a"), packet.packet());
//! # Ok(())
//! # }
//! ```
//!
//! Parse an `ICMP` `EchoReply` packet:
//!
//! ```rust
//! use hex_literal::hex;
//! use pingfan_packet::icmpv4::echo_reply::EchoReplyPacket;
//! use pingfan_packet::icmpv4::IcmpType;
//!
//! # fn main() -> Result<(), pingfan_packet::error::Error> {
//! let buf = hex!("00 00 f3 23 04 d2 00 0a");
//! let packet = EchoReplyPacket::new_view(&buf)?;
//! assert_eq!(IcmpType::EchoReply, packet.get_icmp_type());
//! assert_eq!(1234, packet.get_identifier());
//! assert_eq!(10, packet.get_sequence());
//! # Ok(())
//! # }
//! ```
#![warn(clippy::all, clippy::pedantic, clippy::nursery, rust_2018_idioms)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation
)]
#![forbid(unsafe_code)]

/// The internet checksum.
pub mod checksum;

/// Packet errors.
pub mod error;

/// `ICMP` packets.
pub mod icmpv4;

/// `ICMPv6` packets.
pub mod icmpv6;

/// `IPv4` packets.
pub mod ipv4;

use itertools::Itertools;

/// The `IP` protocol.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq)]
pub enum IpProtocol {
    Icmp,
    IcmpV6,
    Other(u8),
}

impl IpProtocol {
    #[must_use]
    pub const fn id(&self) -> u8 {
        match self {
            Self::Icmp => 1,
            Self::IcmpV6 => 58,
            Self::Other(id) => *id,
        }
    }
}

impl From<u8> for IpProtocol {
    fn from(id: u8) -> Self {
        match id {
            1 => Self::Icmp,
            58 => Self::IcmpV6,
            p => Self::Other(p),
        }
    }
}

/// Format a payload for display as space separated hex octets.
pub(crate) fn fmt_payload(bytes: &[u8]) -> String {
    format!("{:02x}", bytes.iter().format(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ip_protocol() {
        assert_eq!(1, IpProtocol::Icmp.id());
        assert_eq!(58, IpProtocol::IcmpV6.id());
        assert_eq!(17, IpProtocol::Other(17).id());
        assert_eq!(IpProtocol::Icmp, IpProtocol::from(1));
        assert_eq!(IpProtocol::IcmpV6, IpProtocol::from(58));
        assert_eq!(IpProtocol::Other(6), IpProtocol::from(6));
    }

    #[test]
    fn test_fmt_payload() {
        assert_eq!("00 01 ff", fmt_payload(&[0x00, 0x01, 0xff]));
        assert_eq!("", fmt_payload(&[]));
    }
}
