mod socket {
    use crate::error::{ErrorKind, IoError, IoOperation, IoResult};
    use crate::net::socket::Socket;
    use itertools::Itertools;
    use socket2::{Domain, Protocol, SockAddr, Type};
    use std::io;
    use std::net::SocketAddr;
    use std::os::fd::{AsRawFd, RawFd};
    use tracing::instrument;

    /// A raw ICMP socket.
    pub struct SocketImpl {
        inner: socket2::Socket,
    }

    impl SocketImpl {
        fn new(domain: Domain, ty: Type, protocol: Protocol) -> IoResult<Self> {
            Ok(Self {
                inner: socket2::Socket::new(domain, ty, Some(protocol))
                    .map_err(|err| IoError::Other(err, IoOperation::NewSocket))?,
            })
        }

        fn new_raw_ipv4(protocol: Protocol) -> IoResult<Self> {
            Self::new(Domain::IPV4, Type::RAW, protocol)
        }

        fn new_raw_ipv6(protocol: Protocol) -> IoResult<Self> {
            Self::new(Domain::IPV6, Type::RAW, protocol)
        }

        fn set_nonblocking(&self, nonblocking: bool) -> IoResult<()> {
            self.inner
                .set_nonblocking(nonblocking)
                .map_err(|err| IoError::Other(err, IoOperation::SetNonBlocking))
        }

        fn set_header_included(&self, included: bool) -> IoResult<()> {
            self.inner
                .set_header_included_v4(included)
                .map_err(|err| IoError::Other(err, IoOperation::SetHeaderIncluded))
        }

        /// Restrict the kernel to queueing only echo replies on this socket.
        ///
        /// Without the filter a raw `ICMP` socket also receives every other
        /// `ICMP` message arriving at the host.
        #[cfg(target_os = "linux")]
        #[expect(unsafe_code)]
        fn set_icmp_filter(&self) -> IoResult<()> {
            use nix::libc;
            // From <linux/icmp.h>, not exposed by the libc crate.
            const ICMP_FILTER: libc::c_int = 1;
            const ICMP_ECHOREPLY: u32 = 0;
            const ICMP_ECHO: u32 = 8;
            #[repr(C)]
            struct IcmpFilter {
                data: u32,
            }
            // A set bit filters that type out.
            let filter = IcmpFilter {
                data: !((1 << ICMP_ECHO) | (1 << ICMP_ECHOREPLY)),
            };
            // Safety: the value is a repr(C) struct of the length given.
            let res = unsafe {
                libc::setsockopt(
                    self.inner.as_raw_fd(),
                    libc::SOL_RAW,
                    ICMP_FILTER,
                    std::ptr::addr_of!(filter).cast(),
                    std::mem::size_of::<IcmpFilter>() as libc::socklen_t,
                )
            };
            if res == -1 {
                Err(IoError::Other(
                    io::Error::last_os_error(),
                    IoOperation::SetIcmpFilter,
                ))
            } else {
                Ok(())
            }
        }
    }

    impl Socket for SocketImpl {
        #[instrument(level = "trace")]
        fn new_icmp_ipv4() -> IoResult<Self> {
            let socket = Self::new_raw_ipv4(Protocol::ICMPV4)?;
            socket.set_nonblocking(true)?;
            socket.set_header_included(false)?;
            #[cfg(target_os = "linux")]
            socket.set_icmp_filter()?;
            Ok(socket)
        }

        #[instrument(level = "trace")]
        fn new_icmp_ipv6() -> IoResult<Self> {
            let socket = Self::new_raw_ipv6(Protocol::ICMPV6)?;
            socket.set_nonblocking(true)?;
            Ok(socket)
        }

        #[instrument(skip(self), level = "trace")]
        fn set_ttl(&mut self, ttl: u32) -> IoResult<()> {
            self.inner
                .set_ttl_v4(ttl)
                .map_err(|err| IoError::Other(err, IoOperation::SetTtl))
        }

        #[instrument(skip(self), level = "trace")]
        fn set_unicast_hops_v6(&mut self, hops: u8) -> IoResult<()> {
            self.inner
                .set_unicast_hops_v6(u32::from(hops))
                .map_err(|err| IoError::Other(err, IoOperation::SetUnicastHopsV6))
        }

        #[instrument(skip(self), level = "trace")]
        fn send_to(&mut self, buf: &[u8], addr: SocketAddr) -> IoResult<()> {
            tracing::trace!(buf = format!("{:02x?}", buf.iter().format(" ")), ?addr);
            self.inner
                .send_to(buf, &SockAddr::from(addr))
                .map_err(|err| IoError::SendTo(err, addr))?;
            Ok(())
        }

        #[instrument(skip(self, buf), level = "trace")]
        fn recv_from(&mut self, buf: &mut [u8]) -> IoResult<(usize, Option<SocketAddr>)> {
            let (bytes_read, addr) = self
                .inner
                .recv_from_into_buf(buf)
                .map_err(|err| IoError::Other(err, IoOperation::RecvFrom))?;
            tracing::trace!(
                buf = format!("{:02x?}", buf[..bytes_read].iter().format(" ")),
                bytes_read,
                ?addr
            );
            Ok((bytes_read, addr.as_socket()))
        }

        fn raw_fd(&self) -> RawFd {
            self.inner.as_raw_fd()
        }
    }

    impl From<&io::Error> for ErrorKind {
        fn from(value: &io::Error) -> Self {
            if value.raw_os_error() == Some(nix::libc::EHOSTUNREACH) {
                Self::HostUnreachable
            } else if value.raw_os_error() == Some(nix::libc::ENETUNREACH) {
                Self::NetUnreachable
            } else {
                Self::Std(value.kind())
            }
        }
    }

    // only used for unit tests
    #[cfg(test)]
    impl From<ErrorKind> for io::Error {
        fn from(value: ErrorKind) -> Self {
            match value {
                ErrorKind::HostUnreachable => Self::from_raw_os_error(nix::libc::EHOSTUNREACH),
                ErrorKind::NetUnreachable => Self::from_raw_os_error(nix::libc::ENETUNREACH),
                ErrorKind::Std(kind) => Self::from(kind),
            }
        }
    }

    // A workaround for https://github.com/rust-lang/socket2/issues/223.
    trait RecvFrom {
        fn recv_from_into_buf(&self, buf: &mut [u8]) -> io::Result<(usize, SockAddr)>;
    }

    impl RecvFrom for socket2::Socket {
        #![allow(unsafe_code)]
        fn recv_from_into_buf(&self, buf: &mut [u8]) -> io::Result<(usize, SockAddr)> {
            // Safety: the `recv` implementation promises not to write uninitialised
            // bytes to the `buf`fer, so this casting is safe.
            let buf = unsafe { &mut *(buf as *mut [u8] as *mut [std::mem::MaybeUninit<u8>]) };
            self.recv_from(buf)
        }
    }
}

pub use socket::SocketImpl;
