use crate::error::{Error, ErrorKind, Result};
use crate::net::channel::MAX_PACKET_SIZE;
use crate::net::socket::Socket;
use crate::probe::ProbeResponse;
use crate::types::{ProbeId, Sequence};
use pingfan_packet::checksum::icmp_checksum;
use pingfan_packet::icmpv6::echo_reply::EchoReplyPacket;
use pingfan_packet::icmpv6::echo_request::EchoRequestPacket;
use pingfan_packet::icmpv6::{IcmpCode, IcmpPacket, IcmpType};
use std::io;
use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::time::Instant;
use tracing::instrument;

/// Dispatch an `ICMPv6` echo request and return the timestamp taken
/// immediately before the send.
///
/// The checksum set here is indicative only; the kernel computes the
/// definitive checksum over the pseudo header when the packet is sent.
#[instrument(skip(socket, payload), level = "trace")]
pub fn dispatch_icmp_probe<S: Socket>(
    socket: &mut S,
    dest_addr: Ipv6Addr,
    identifier: ProbeId,
    sequence: Sequence,
    payload: &[u8],
) -> Result<Instant> {
    let mut icmp_buf = [0_u8; MAX_PACKET_SIZE];
    let packet_size = EchoRequestPacket::minimum_packet_size() + payload.len();
    let mut icmp = EchoRequestPacket::new(&mut icmp_buf[..packet_size])?;
    icmp.set_icmp_type(IcmpType::EchoRequest);
    icmp.set_icmp_code(IcmpCode(0));
    icmp.set_identifier(identifier.0);
    icmp.set_sequence(sequence.0);
    icmp.set_payload(payload)?;
    icmp.set_checksum(0);
    icmp.set_checksum(icmp_checksum(&[icmp.packet()]));
    let remote_addr = SocketAddr::new(IpAddr::V6(dest_addr), 0);
    let sent_at = Instant::now();
    socket
        .send_to(icmp.packet(), remote_addr)
        .map_err(Error::ProbeFailed)?;
    Ok(sent_at)
}

/// Attempt to receive a single `ICMPv6` echo reply.
///
/// Anything other than a well formed echo reply is discarded and `None`
/// returned, as is a receive which would block.  Errors are only returned
/// for failures of the socket itself.
#[instrument(skip(socket), level = "trace")]
pub fn recv_icmp_probe<S: Socket>(socket: &mut S) -> Result<Option<ProbeResponse>> {
    let mut buf = [0_u8; MAX_PACKET_SIZE];
    match socket.recv_from(&mut buf) {
        Ok((bytes_read, addr)) => {
            let received = Instant::now();
            Ok(extract_probe_response(&buf[..bytes_read], addr, received))
        }
        Err(err) => {
            if err.kind() == ErrorKind::Std(io::ErrorKind::WouldBlock) {
                Ok(None)
            } else {
                Err(Error::IoError(err))
            }
        }
    }
}

/// Decode an echo reply from a received `ICMPv6` packet.
///
/// Unlike `IPv4`, a raw `ICMPv6` socket delivers the `ICMPv6` packet without
/// the enclosing `IPv6` header and so the responder is only knowable from
/// the socket address of the sender.
fn extract_probe_response(
    buf: &[u8],
    addr: Option<SocketAddr>,
    received: Instant,
) -> Option<ProbeResponse> {
    let icmp = IcmpPacket::new_view(buf).ok()?;
    if icmp.get_icmp_type() != IcmpType::EchoReply || icmp.get_icmp_code() != IcmpCode(0) {
        return None;
    }
    let echo_reply = EchoReplyPacket::new_view(buf).ok()?;
    let responder = addr?.ip();
    Some(ProbeResponse {
        received,
        responder,
        identifier: echo_reply.get_identifier(),
        sequence: echo_reply.get_sequence(),
    })
}
