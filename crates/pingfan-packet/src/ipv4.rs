use crate::error::{Error, Result};
use crate::IpProtocol;
use std::fmt::{Debug, Formatter};
use std::net::Ipv4Addr;

const VERSION_OFFSET: usize = 0;
const TOTAL_LENGTH_OFFSET: usize = 2;
const TTL_OFFSET: usize = 8;
const PROTOCOL_OFFSET: usize = 9;
const SOURCE_OFFSET: usize = 12;
const DESTINATION_OFFSET: usize = 16;

/// The minimum `IPv4` header size in bytes.
const HEADER_SIZE: usize = 20;

/// Represents an `IPv4` packet.
///
/// An `Ipv4Packet` is a read-only view over a received packet.  The header
/// length field is untrusted and the payload is clamped to the buffer, so a
/// malformed header yields a short or empty payload rather than a panic.
pub struct Ipv4Packet<'a> {
    buf: &'a [u8],
}

impl<'a> Ipv4Packet<'a> {
    pub fn new_view(packet: &'a [u8]) -> Result<Self> {
        if packet.len() >= Self::minimum_packet_size() {
            Ok(Self { buf: packet })
        } else {
            Err(Error::InsufficientPacketBuffer(
                String::from("Ipv4"),
                Self::minimum_packet_size(),
                packet.len(),
            ))
        }
    }

    #[must_use]
    pub const fn minimum_packet_size() -> usize {
        HEADER_SIZE
    }

    #[must_use]
    pub fn get_version(&self) -> u8 {
        self.buf[VERSION_OFFSET] >> 4
    }

    /// The header length in 32-bit words.
    #[must_use]
    pub fn get_header_length(&self) -> u8 {
        self.buf[VERSION_OFFSET] & 0x0f
    }

    #[must_use]
    pub fn get_total_length(&self) -> u16 {
        u16::from_be_bytes([
            self.buf[TOTAL_LENGTH_OFFSET],
            self.buf[TOTAL_LENGTH_OFFSET + 1],
        ])
    }

    #[must_use]
    pub fn get_ttl(&self) -> u8 {
        self.buf[TTL_OFFSET]
    }

    #[must_use]
    pub fn get_protocol(&self) -> IpProtocol {
        IpProtocol::from(self.buf[PROTOCOL_OFFSET])
    }

    #[must_use]
    pub fn get_source(&self) -> Ipv4Addr {
        Ipv4Addr::new(
            self.buf[SOURCE_OFFSET],
            self.buf[SOURCE_OFFSET + 1],
            self.buf[SOURCE_OFFSET + 2],
            self.buf[SOURCE_OFFSET + 3],
        )
    }

    #[must_use]
    pub fn get_destination(&self) -> Ipv4Addr {
        Ipv4Addr::new(
            self.buf[DESTINATION_OFFSET],
            self.buf[DESTINATION_OFFSET + 1],
            self.buf[DESTINATION_OFFSET + 2],
            self.buf[DESTINATION_OFFSET + 3],
        )
    }

    #[must_use]
    pub fn packet(&self) -> &[u8] {
        self.buf
    }

    #[must_use]
    pub fn payload(&self) -> &[u8] {
        let offset = (usize::from(self.get_header_length()) * 4).min(self.buf.len());
        &self.buf[offset..]
    }
}

impl Debug for Ipv4Packet<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ipv4Packet")
            .field("version", &self.get_version())
            .field("header_length", &self.get_header_length())
            .field("total_length", &self.get_total_length())
            .field("ttl", &self.get_ttl())
            .field("protocol", &self.get_protocol())
            .field("source", &self.get_source())
            .field("destination", &self.get_destination())
            .finish()
    }
}
