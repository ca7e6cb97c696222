use crate::error::IoResult;
use std::net::SocketAddr;
use std::os::fd::RawFd;

/// A raw ICMP socket.
///
/// Send and receive never block; a receive with nothing queued fails with
/// `WouldBlock`.
#[cfg_attr(test, mockall::automock)]
pub trait Socket
where
    Self: Sized,
{
    /// Create a socket for sending and receiving `ICMP`.
    fn new_icmp_ipv4() -> IoResult<Self>;
    /// Create a socket for sending and receiving `ICMPv6`.
    fn new_icmp_ipv6() -> IoResult<Self>;
    /// Set the time-to-live of outgoing `IPv4` packets.
    fn set_ttl(&mut self, ttl: u32) -> IoResult<()>;
    /// Set the hop limit of outgoing `IPv6` packets.
    fn set_unicast_hops_v6(&mut self, hops: u8) -> IoResult<()>;
    fn send_to(&mut self, buf: &[u8], addr: SocketAddr) -> IoResult<()>;
    fn recv_from(&mut self, buf: &mut [u8]) -> IoResult<(usize, Option<SocketAddr>)>;
    /// The descriptor for readiness multiplexing.
    fn raw_fd(&self) -> RawFd;
}
