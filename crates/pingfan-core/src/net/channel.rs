use crate::config::{AddrFamily, ChannelConfig};
use crate::error::{Error, Result};
use crate::net::socket::Socket;
use crate::net::{ipv4, ipv6};
use crate::probe::ProbeResponse;
use crate::types::{ProbeId, Sequence};
use std::fmt;
use std::net::IpAddr;
use std::os::fd::RawFd;
use std::time::Instant;
use tracing::instrument;

/// The maximum size of any packet sent or received.
pub const MAX_PACKET_SIZE: usize = 1024;

/// A pair of raw `ICMP` sockets, one per address family.
///
/// Either socket may be absent, because the configuration excludes the
/// family, because the socket could not be opened, or because it has been
/// closed after a fatal receive error.  Dispatching to a target without a
/// socket for its family fails per probe rather than per run.
pub struct NetworkPair<S: Socket> {
    ipv4: Option<S>,
    ipv6: Option<S>,
}

impl<S: Socket> fmt::Debug for NetworkPair<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkPair")
            .field("ipv4", &self.ipv4.is_some())
            .field("ipv6", &self.ipv6.is_some())
            .finish()
    }
}

impl<S: Socket> NetworkPair<S> {
    /// Open the sockets for the configured address families.
    ///
    /// When probing both families a family whose socket cannot be opened is
    /// disabled with a warning and the run carries on; only failing to open
    /// both sockets is an error.  When a single family is requested its
    /// socket must open.
    #[instrument(skip_all, level = "trace")]
    pub fn open(config: &ChannelConfig) -> Result<Self> {
        tracing::debug!(?config);
        match config.addr_family {
            AddrFamily::Ipv4 => Ok(Self {
                ipv4: Some(make_icmp_socket_ipv4(config)?),
                ipv6: None,
            }),
            AddrFamily::Ipv6 => Ok(Self {
                ipv4: None,
                ipv6: Some(make_icmp_socket_ipv6(config)?),
            }),
            AddrFamily::Dual => {
                let ipv4 = match make_icmp_socket_ipv4(config) {
                    Ok(socket) => Some(socket),
                    Err(err) => {
                        tracing::warn!(
                            %err,
                            "cannot open IPv4 socket, IPv4 targets will not be probed"
                        );
                        None
                    }
                };
                let ipv6 = match make_icmp_socket_ipv6(config) {
                    Ok(socket) => Some(socket),
                    Err(err) => {
                        tracing::warn!(
                            %err,
                            "cannot open IPv6 socket, IPv6 targets will not be probed"
                        );
                        None
                    }
                };
                if ipv4.is_none() && ipv6.is_none() {
                    Err(Error::SocketUnavailable)
                } else {
                    Ok(Self { ipv4, ipv6 })
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) const fn from_sockets(ipv4: Option<S>, ipv6: Option<S>) -> Self {
        Self { ipv4, ipv6 }
    }

    /// Send an echo request to `dest` and return the send timestamp.
    #[instrument(skip(self, payload), level = "trace")]
    pub fn dispatch(
        &mut self,
        dest: IpAddr,
        identifier: ProbeId,
        sequence: Sequence,
        payload: &[u8],
    ) -> Result<Instant> {
        match dest {
            IpAddr::V4(addr) => match self.ipv4.as_mut() {
                Some(socket) => {
                    ipv4::dispatch_icmp_probe(socket, addr, identifier, sequence, payload)
                }
                None => Err(Error::MissingSocket("IPv4")),
            },
            IpAddr::V6(addr) => match self.ipv6.as_mut() {
                Some(socket) => {
                    ipv6::dispatch_icmp_probe(socket, addr, identifier, sequence, payload)
                }
                None => Err(Error::MissingSocket("IPv6")),
            },
        }
    }

    /// One receive attempt on the `IPv4` socket.
    pub fn recv_ipv4(&mut self) -> Result<Option<ProbeResponse>> {
        match self.ipv4.as_mut() {
            Some(socket) => ipv4::recv_icmp_probe(socket),
            None => Ok(None),
        }
    }

    /// One receive attempt on the `IPv6` socket.
    pub fn recv_ipv6(&mut self) -> Result<Option<ProbeResponse>> {
        match self.ipv6.as_mut() {
            Some(socket) => ipv6::recv_icmp_probe(socket),
            None => Ok(None),
        }
    }

    pub fn ipv4_fd(&self) -> Option<RawFd> {
        self.ipv4.as_ref().map(Socket::raw_fd)
    }

    pub fn ipv6_fd(&self) -> Option<RawFd> {
        self.ipv6.as_ref().map(Socket::raw_fd)
    }

    /// Close the `IPv4` socket after a fatal receive error.
    pub fn close_ipv4(&mut self) {
        self.ipv4 = None;
    }

    /// Close the `IPv6` socket after a fatal receive error.
    pub fn close_ipv6(&mut self) {
        self.ipv6 = None;
    }
}

#[instrument(skip_all, level = "trace")]
fn make_icmp_socket_ipv4<S: Socket>(config: &ChannelConfig) -> Result<S> {
    let mut socket = S::new_icmp_ipv4()?;
    if let Some(ttl) = config.ttl {
        socket.set_ttl(u32::from(ttl.0))?;
    }
    Ok(socket)
}

#[instrument(skip_all, level = "trace")]
fn make_icmp_socket_ipv6<S: Socket>(config: &ChannelConfig) -> Result<S> {
    let mut socket = S::new_icmp_ipv6()?;
    if let Some(ttl) = config.ttl {
        socket.set_unicast_hops_v6(ttl.0)?;
    }
    Ok(socket)
}
