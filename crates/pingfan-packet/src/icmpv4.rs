use crate::error::{Error, Result};
use crate::fmt_payload;
use std::fmt::{Debug, Formatter};

/// The type of `ICMP` packet.
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
            Self::EchoRequest => 8,
            Self::EchoReply => 0,
            Self::Other(id) => *id,
        }
    }
}

impl From<u8> for IcmpType {
    fn from(val: u8) -> Self {
        match val {
            8 => Self::EchoRequest,
            0 => Self::EchoReply,
            id => Self::Other(id),
        }
    }
}

/// The `ICMP` code.
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

/// The `ICMP` echo header size in bytes.
const ECHO_HEADER_SIZE: usize = 8;

pub mod echo_request {
    use super::{
        Error, IcmpCode, IcmpType, Result, CHECKSUM_OFFSET, CODE_OFFSET, ECHO_HEADER_SIZE,
        IDENTIFIER_OFFSET, SEQUENCE_OFFSET, TYPE_OFFSET,
    };
    use crate::fmt_payload;
    use std::fmt::{Debug, Formatter};

    /// Represents an `ICMP` `EchoRequest` packet.
    ///
    /// The internal representation is held in network byte order (big-endian)
    /// and all accessor methods take and return data in host byte order,
    /// converting as necessary for the given architecture.
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

    /// Represents an `ICMP` `EchoReply` packet.
    ///
    /// An `EchoReplyPacket` is a read-only view over a received packet and
    /// performs no validation beyond the minimum packet length; callers are
    /// expected to check the `ICMP` type and code.
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

    #[cfg(test)]
    mod tests {
        use super::*;
        use hex_literal::hex;

        #[test]
        fn test_view() {
            let buf = hex!("00 00 f3 23 04 d2 00 0a 61 62");
            let packet = EchoReplyPacket::new_view(&buf).unwrap();
            assert_eq!(IcmpType::EchoReply, packet.get_icmp_type());
            assert_eq!(IcmpCode(0), packet.get_icmp_code());
            assert_eq!(0xf323, packet.get_checksum());
            assert_eq!(1234, packet.get_identifier());
            assert_eq!(10, packet.get_sequence());
            assert_eq!([0x61, 0x62], packet.payload());
        }

        #[test]
        fn test_view_empty_payload() {
            let buf = hex!("00 00 f7 ff 04 d2 03 2e");
            let packet = EchoReplyPacket::new_view(&buf).unwrap();
            assert_eq!(IcmpType::EchoReply, packet.get_icmp_type());
            assert_eq!(0xf7ff, packet.get_checksum());
            assert_eq!(1234, packet.get_identifier());
            assert_eq!(814, packet.get_sequence());
            assert!(packet.payload().is_empty());
        }

        #[test]
        fn test_view_non_echo_reply() {
            let buf = hex!("03 01 00 00 00 00 00 00");
            let packet = EchoReplyPacket::new_view(&buf).unwrap();
            assert_eq!(IcmpType::Other(3), packet.get_icmp_type());
            assert_eq!(IcmpCode(1), packet.get_icmp_code());
        }

        #[test]
        fn test_insufficient_buffer() {
            let buf = hex!("00 00 f3 23 04 d2 00");
            let err = EchoReplyPacket::new_view(&buf).unwrap_err();
            assert_eq!(
                Error::InsufficientPacketBuffer(String::from("EchoReply"), 8, 7),
                err
            );
        }
    }
}

/// An `ICMP` packet header view used to inspect packets of any type.
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
