use itertools::Itertools;
use std::fmt::{Display, Formatter};
use std::net::IpAddr;
use thiserror::Error;

/// A resolver error result.
pub type Result<T> = std::result::Result<T, Error>;

/// A resolver error.
#[derive(Error, Debug)]
pub enum Error {
    #[error("DNS lookup failed: {0}")]
    LookupFailed(Box<dyn std::error::Error + Send + Sync + 'static>),
}

/// The outcome of a reverse DNS resolution.
///
/// Every resolution submitted to the resolver eventually completes with
/// exactly one `DnsEntry`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DnsEntry {
    /// The `IpAddr` was resolved to one or more hostnames.
    Resolved(IpAddr, Vec<String>),
    /// The `IpAddr` has no reverse DNS entry.
    NotFound(IpAddr),
    /// The reverse DNS resolution of `IpAddr` failed.
    Failed(IpAddr),
    /// The reverse DNS resolution of `IpAddr` timed out.
    Timeout(IpAddr),
}

impl DnsEntry {
    /// The `IpAddr` this entry is for.
    #[must_use]
    pub const fn addr(&self) -> IpAddr {
        match self {
            Self::Resolved(addr, _)
            | Self::NotFound(addr)
            | Self::Failed(addr)
            | Self::Timeout(addr) => *addr,
        }
    }
}

impl Display for DnsEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resolved(_, hostnames) => write!(f, "{}", hostnames.iter().format(", ")),
            Self::NotFound(addr) => write!(f, "{addr}"),
            Self::Failed(addr) => write!(f, "Failed: {addr}"),
            Self::Timeout(addr) => write!(f, "Timeout: {addr}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn addr() -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(1, 1, 1, 1))
    }

    #[test]
    fn test_entry_addr() {
        assert_eq!(addr(), DnsEntry::Resolved(addr(), vec![]).addr());
        assert_eq!(addr(), DnsEntry::NotFound(addr()).addr());
        assert_eq!(addr(), DnsEntry::Failed(addr()).addr());
        assert_eq!(addr(), DnsEntry::Timeout(addr()).addr());
    }

    #[test]
    fn test_display_resolved() {
        let entry = DnsEntry::Resolved(
            addr(),
            vec![String::from("one.one.one.one"), String::from("example.com")],
        );
        assert_eq!("one.one.one.one, example.com", format!("{entry}"));
    }

    #[test]
    fn test_display_not_found() {
        assert_eq!("1.1.1.1", format!("{}", DnsEntry::NotFound(addr())));
    }

    #[test]
    fn test_display_failed() {
        assert_eq!("Failed: 1.1.1.1", format!("{}", DnsEntry::Failed(addr())));
    }

    #[test]
    fn test_display_timeout() {
        assert_eq!("Timeout: 1.1.1.1", format!("{}", DnsEntry::Timeout(addr())));
    }
}
