use crate::error::{Error, Result};
use crate::fmt_payload;
use std::fmt::{Debug, Formatter};

/// The type of `ICMPv6` packet.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq)]
pub enum IcmpType {
    EchoRequest,
    EchoReply,
    Other(u8),
}

impl IcmpType {
    #[must_use]
    pub const fn id(&self) -> u8 {
        match self {
            Self::EchoRequest => 128,
            Self::EchoReply => 129,
            Self::Other(id) => *id,
        }
    }
}

impl From<u8> for IcmpType {
    fn from(val: u8) -> Self {
        match val {
            128 => Self::EchoRequest,
            129 => Self::EchoReply,
            id => Self::Other(id),
        }
    }
}

/// The `ICMPv6` code.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq)]
pub struct IcmpCode(pub u8);

impl From<u8> for IcmpCode {
    fn from(val: u8) -> Self {
        Self(val)
    }
}

const TYPE_OFFSET: usize = 0;
const CODE_OFFSET: usize = 1;
const CHECKSUM_OFFSET: usize = 2;
const IDENTIFIER_OFFSET: usize = 4;
const SEQUENCE_OFFSET: usize = 6;

/// The `ICMPv6` echo header size in bytes.
const ECHO_HEADER_SIZE: usize = 8;

pub mod echo_request {
    use super::{
        Error, IcmpCode, IcmpType, Result, CHECKSUM_OFFSET, CODE_OFFSET, ECHO_HEADER_SIZE,
        IDENTIFIER_OFFSET, SEQUENCE_OFFSET, TYPE_OFFSET,
    };
    use crate::fmt_payload;
    use std::fmt::{Debug, Formatter};

    /// Represents an `ICMPv6` `EchoRequest` packet.
    ///
    /// The checksum field covers a pseudo-header which includes the source and
    /// destination addresses and so cannot be calculated from the packet
    /// alone; the kernel calculates and fills in the definitive value for raw
    /// `ICMPv6` sockets and any value set here is indicative only.
    pub struct EchoRequestPacket<'a> {
        buf: &'a mut [u8],
    }

    impl<'a> EchoRequestPacket<'a> {
        pub fn new(packet: &'a mut [u8]) -> Result<Self> {
            if packet.len() >= Self::minimum_packet_size() {
                Ok(Self { buf: packet })
            } else {
                Err(Error::InsufficientPacketBuffer(
                    String::from("EchoRequest"),
                    Self::minimum_packet_size(),
                    packet.len(),
                ))
            }
        }

        #[must_use]
        pub const fn minimum_packet_size() -> usize {
            ECHO_HEADER_SIZE
        }

        #[must_use]
        pub fn get_icmp_type(&self) -> IcmpType {
            IcmpType::from(self.buf[TYPE_OFFSET])
        }

        #[must_use]
        pub fn get_icmp_code(&self) -> IcmpCode {
            IcmpCode::from(self.buf[CODE_OFFSET])
        }

        #[must_use]
        pub fn get_checksum(&self) -> u16 {
            u16::from_be_bytes([self.buf[CHECKSUM_OFFSET], self.buf[CHECKSUM_OFFSET + 1]])
        }

        #[must_use]
        pub fn get_identifier(&self) -> u16 {
            u16::from_be_bytes([self.buf[IDENTIFIER_OFFSET], self.buf[IDENTIFIER_OFFSET + 1]])
        }

        #[must_use]
        pub fn get_sequence(&self) -> u16 {
            u16::from_be_bytes([self.buf[SEQUENCE_OFFSET], self.buf[SEQUENCE_OFFSET + 1]])
        }

        pub fn set_icmp_type(&mut self, val: IcmpType) {
            self.buf[TYPE_OFFSET] = val.id();
        }

        pub fn set_icmp_code(&mut self, val: IcmpCode) {
            self.buf[CODE_OFFSET] = val.0;
        }

        pub fn set_checksum(&mut self, val: u16) {
            self.buf[CHECKSUM_OFFSET..=CHECKSUM_OFFSET + 1].copy_from_slice(&val.to_be_bytes());
        }

        pub fn set_identifier(&mut self, val: u16) {
            self.buf[IDENTIFIER_OFFSET..=IDENTIFIER_OFFSET + 1].copy_from_slice(&val.to_be_bytes());
        }

        pub fn set_sequence(&mut self, val: u16) {
            self.buf[SEQUENCE_OFFSET..=SEQUENCE_OFFSET + 1].copy_from_slice(&val.to_be_bytes());
        }

        pub fn set_payload(&mut self, vals: &[u8]) -> Result<()> {
            let capacity = self.buf.len() - ECHO_HEADER_SIZE;
            if vals.len() > capacity {
                return Err(Error::PayloadTooLarge(vals.len(), capacity));
            }
            self.buf[ECHO_HEADER_SIZE..ECHO_HEADER_SIZE + vals.len()].copy_from_slice(vals);
            Ok(())
        }

        #[must_use]
        pub fn packet(&self) -> &[u8] {
            self.buf
        }

        #[must_use]
        pub fn payload(&self) -> &[u8] {
            &self.buf[ECHO_HEADER_SIZE..]
        }
    }

    impl Debug for EchoRequestPacket<'_> {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("EchoRequestPacket")
                .field("icmp_type", &self.get_icmp_type())
                .field("icmp_code", &self.get_icmp_code())
                .field("checksum", &self.get_checksum())
                .field("identifier", &self.get_identifier())
                .field("sequence", &self.get_sequence())
                .field("payload", &fmt_payload(self.payload()))
                .finish()
        }
    }

}

pub mod echo_reply {
    use super::{
        Error, IcmpCode, IcmpType, Result, CHECKSUM_OFFSET, CODE_OFFSET, ECHO_HEADER_SIZE,
        IDENTIFIER_OFFSET, SEQUENCE_OFFSET, TYPE_OFFSET,
    };
    use crate::fmt_payload;
    use std::fmt::{Debug, Formatter};

    /// Represents an `ICMPv6` `EchoReply` packet.
    pub struct EchoReplyPacket<'a> {
        buf: &'a [u8],
    }

    impl<'a> EchoReplyPacket<'a> {
        pub fn new_view(packet: &'a [u8]) -> Result<Self> {
            if packet.len() >= Self::minimum_packet_size() {
                Ok(Self { buf: packet })
            } else {
                Err(Error::InsufficientPacketBuffer(
                    String::from("EchoReply"),
                    Self::minimum_packet_size(),
                    packet.len(),
                ))
            }
        }

        #[must_use]
        pub const fn minimum_packet_size() -> usize {
            ECHO_HEADER_SIZE
        }

        #[must_use]
        pub fn get_icmp_type(&self) -> IcmpType {
            IcmpType::from(self.buf[TYPE_OFFSET])
        }

        #[must_use]
        pub fn get_icmp_code(&self) -> IcmpCode {
            IcmpCode::from(self.buf[CODE_OFFSET])
        }

        #[must_use]
        pub fn get_checksum(&self) -> u16 {
            u16::from_be_bytes([self.buf[CHECKSUM_OFFSET], self.buf[CHECKSUM_OFFSET + 1]])
        }

        #[must_use]
        pub fn get_identifier(&self) -> u16 {
            u16::from_be_bytes([self.buf[IDENTIFIER_OFFSET], self.buf[IDENTIFIER_OFFSET + 1]])
        }

        #[must_use]
        pub fn get_sequence(&self) -> u16 {
            u16::from_be_bytes([self.buf[SEQUENCE_OFFSET], self.buf[SEQUENCE_OFFSET + 1]])
        }

        #[must_use]
        pub fn packet(&self) -> &[u8] {
            self.buf
        }

        #[must_use]
        pub fn payload(&self) -> &[u8] {
            &self.buf[ECHO_HEADER_SIZE..]
        }
    }

    impl Debug for EchoReplyPacket<'_> {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("EchoReplyPacket")
                .field("icmp_type", &self.get_icmp_type())
                .field("icmp_code", &self.get_icmp_code())
                .field("checksum", &self.get_checksum())
                .field("identifier", &self.get_identifier())
                .field("sequence", &self.get_sequence())
                .field("payload", &fmt_payload(self.payload()))
                .finish()
        }
    }

}

/// An `ICMPv6` packet header view used to inspect packets of any type.
pub struct IcmpPacket<'a> {
    buf: &'a [u8],
}

impl<'a> IcmpPacket<'a> {
    pub fn new_view(packet: &'a [u8]) -> Result<Self> {
        if packet.len() >= Self::minimum_packet_size() {
            Ok(Self { buf: packet })
        } else {
            Err(Error::InsufficientPacketBuffer(
                String::from("IcmpPacket"),
                Self::minimum_packet_size(),
                packet.len(),
            ))
        }
    }

    #[must_use]
    pub const fn minimum_packet_size() -> usize {
        ECHO_HEADER_SIZE
    }

    #[must_use]
    pub fn get_icmp_type(&self) -> IcmpType {
        IcmpType::from(self.buf[TYPE_OFFSET])
    }

    #[must_use]
    pub fn get_icmp_code(&self) -> IcmpCode {
        IcmpCode::from(self.buf[CODE_OFFSET])
    }

    #[must_use]
    pub fn packet(&self) -> &[u8] {
        self.buf
    }
}

impl Debug for IcmpPacket<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IcmpPacket")
            .field("icmp_type", &self.get_icmp_type())
            .field("icmp_code", &self.get_icmp_code())
            .field("payload", &fmt_payload(&self.buf[ECHO_HEADER_SIZE..]))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_icmp_type_view() {
        let buf = hex!("80 00 00 00 00 00 00 00");
        let packet = IcmpPacket::new_view(&buf).unwrap();
        assert_eq!(IcmpType::EchoRequest, packet.get_icmp_type());
        let buf = hex!("81 00 00 00 00 00 00 00");
        let packet = IcmpPacket::new_view(&buf).unwrap();
        assert_eq!(IcmpType::EchoReply, packet.get_icmp_type());
        let buf = hex!("03 00 00 00 00 00 00 00");
        let packet = IcmpPacket::new_view(&buf).unwrap();
        assert_eq!(IcmpType::Other(3), packet.get_icmp_type());
    }
}
