use crate::error::{Error, ErrorKind, Result};
use crate::net::channel::MAX_PACKET_SIZE;
use crate::net::socket::Socket;
use crate::probe::ProbeResponse;
use crate::types::{ProbeId, Sequence};
use pingfan_packet::checksum::icmp_checksum;
use pingfan_packet::icmpv4::echo_reply::EchoReplyPacket;
use pingfan_packet::icmpv4::echo_request::EchoRequestPacket;
use pingfan_packet::icmpv4::{IcmpCode, IcmpPacket, IcmpType};
use pingfan_packet::ipv4::Ipv4Packet;
use pingfan_packet::IpProtocol;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Instant;
use tracing::instrument;

/// Dispatch an `ICMP` echo request and return the timestamp taken
/// immediately before the send.
#[instrument(skip(socket, payload), level = "trace")]
pub fn dispatch_icmp_probe<S: Socket>(
    socket: &mut S,
    dest_addr: Ipv4Addr,
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
    let remote_addr = SocketAddr::new(IpAddr::V4(dest_addr), 0);
    let sent_at = Instant::now();
    socket
        .send_to(icmp.packet(), remote_addr)
        .map_err(Error::ProbeFailed)?;
    Ok(sent_at)
}

/// Attempt to receive a single `ICMP` echo reply.
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

/// Decode an echo reply from a received `IPv4` packet.
///
/// A raw `ICMP` socket delivers the full `IPv4` packet and so the header
/// must be stepped over.  The responder is taken from the socket address of
/// the sender, falling back to the source field of the header.
fn extract_probe_response(
    buf: &[u8],
    addr: Option<SocketAddr>,
    received: Instant,
) -> Option<ProbeResponse> {
    let ipv4 = Ipv4Packet::new_view(buf).ok()?;
    if ipv4.get_version() != 4 || ipv4.get_protocol() != IpProtocol::Icmp {
        return None;
    }
    let icmp = IcmpPacket::new_view(ipv4.payload()).ok()?;
    if icmp.get_icmp_type() != IcmpType::EchoReply || icmp.get_icmp_code() != IcmpCode(0) {
        return None;
    }
    let echo_reply = EchoReplyPacket::new_view(ipv4.payload()).ok()?;
    let responder = addr.map_or_else(|| IpAddr::V4(ipv4.get_source()), |addr| addr.ip());
    Some(ProbeResponse {
        received,
        responder,
        identifier: echo_reply.get_identifier(),
        sequence: echo_reply.get_sequence(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{IoError, IoOperation};
    use crate::net::socket::MockSocket;
    use hex_literal::hex;
    use std::str::FromStr;

    fn echo_reply_bytes(identifier: u16, sequence: u16) -> Vec<u8> {
        let mut buf = hex!(
            "
            45 00 00 1c 00 01 00 00 40 01 b6 8c c0 a8 01 01
            c0 a8 01 02 00 00 00 00 00 00 00 00
            "
        )
        .to_vec();
        buf[24..26].copy_from_slice(&identifier.to_be_bytes());
        buf[26..28].copy_from_slice(&sequence.to_be_bytes());
        buf
    }

    #[test]
    fn test_dispatch_icmp_probe() {
        let expected_send_to_buf = hex!("08 00 91 c1 04 d2 00 0a 61 62");
        let expected_send_to_addr = SocketAddr::from_str("192.0.2.1:0").unwrap();
        let mut mocket = MockSocket::new();
        mocket
            .expect_send_to()
            .withf(move |packet, addr| {
                packet == expected_send_to_buf && addr == &expected_send_to_addr
            })
            .times(1)
            .returning(|_, _| Ok(()));
        let before = Instant::now();
        let sent_at = dispatch_icmp_probe(
            &mut mocket,
            Ipv4Addr::from_str("192.0.2.1").unwrap(),
            ProbeId(1234),
            Sequence(10),
            &[0x61, 0x62],
        )
        .unwrap();
        assert!(sent_at >= before);
    }

    #[test]
    fn test_dispatch_icmp_probe_send_failure() {
        let mut mocket = MockSocket::new();
        mocket
            .expect_send_to()
            .times(1)
            .returning(|_, addr| Err(IoError::SendTo(ErrorKind::HostUnreachable.into(), addr)));
        let err = dispatch_icmp_probe(
            &mut mocket,
            Ipv4Addr::from_str("192.0.2.1").unwrap(),
            ProbeId(1234),
            Sequence(10),
            &[0x61, 0x62],
        )
        .unwrap_err();
        assert!(matches!(err, Error::ProbeFailed(_)));
    }

    #[test]
    fn test_recv_icmp_probe() {
        let addr = SocketAddr::from_str("192.168.1.1:0").unwrap();
        let mut mocket = MockSocket::new();
        mocket.expect_recv_from().times(1).returning(move |buf| {
            let reply = echo_reply_bytes(1234, 10);
            buf[..reply.len()].copy_from_slice(&reply);
            Ok((reply.len(), Some(addr)))
        });
        let resp = recv_icmp_probe(&mut mocket).unwrap().unwrap();
        assert_eq!(IpAddr::from_str("192.168.1.1").unwrap(), resp.responder);
        assert_eq!(1234, resp.identifier);
        assert_eq!(10, resp.sequence);
    }

    #[test]
    fn test_recv_icmp_probe_responder_from_header() {
        let mut mocket = MockSocket::new();
        mocket.expect_recv_from().times(1).returning(move |buf| {
            let reply = echo_reply_bytes(1234, 10);
            buf[..reply.len()].copy_from_slice(&reply);
            Ok((reply.len(), None))
        });
        let resp = recv_icmp_probe(&mut mocket).unwrap().unwrap();
        assert_eq!(IpAddr::from_str("192.168.1.1").unwrap(), resp.responder);
    }

    #[test]
    fn test_recv_icmp_probe_would_block() {
        let mut mocket = MockSocket::new();
        mocket.expect_recv_from().times(1).returning(|_| {
            Err(IoError::Other(
                ErrorKind::Std(io::ErrorKind::WouldBlock).into(),
                IoOperation::RecvFrom,
            ))
        });
        assert_eq!(None, recv_icmp_probe(&mut mocket).unwrap());
    }

    #[test]
    fn test_recv_icmp_probe_fatal_error() {
        let mut mocket = MockSocket::new();
        mocket.expect_recv_from().times(1).returning(|_| {
            Err(IoError::Other(
                ErrorKind::Std(io::ErrorKind::ConnectionReset).into(),
                IoOperation::RecvFrom,
            ))
        });
        let err = recv_icmp_probe(&mut mocket).unwrap_err();
        assert!(matches!(err, Error::IoError(_)));
    }

    #[test]
    fn test_recv_icmp_probe_discards_truncated() {
        let mut mocket = MockSocket::new();
        mocket.expect_recv_from().times(1).returning(|buf| {
            let reply = hex!("45 00 00 1c 00 01");
            buf[..reply.len()].copy_from_slice(&reply);
            Ok((reply.len(), None))
        });
        assert_eq!(None, recv_icmp_probe(&mut mocket).unwrap());
    }

    #[test]
    fn test_recv_icmp_probe_discards_non_icmp() {
        let mut mocket = MockSocket::new();
        mocket.expect_recv_from().times(1).returning(|buf| {
            let mut reply = echo_reply_bytes(1234, 10);
            // UDP
            reply[9] = 17;
            buf[..reply.len()].copy_from_slice(&reply);
            Ok((reply.len(), None))
        });
        assert_eq!(None, recv_icmp_probe(&mut mocket).unwrap());
    }

    #[test]
    fn test_recv_icmp_probe_discards_non_echo_reply() {
        let mut mocket = MockSocket::new();
        mocket.expect_recv_from().times(1).returning(|buf| {
            let mut reply = echo_reply_bytes(1234, 10);
            // TimeExceeded
            reply[20] = 11;
            buf[..reply.len()].copy_from_slice(&reply);
            Ok((reply.len(), None))
        });
        assert_eq!(None, recv_icmp_probe(&mut mocket).unwrap());
    }
}
