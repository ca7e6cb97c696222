use std::cell::RefCell;
use std::net::IpAddr;
use std::os::fd::RawFd;

/// The placeholder name reported when resolution fails.
pub const UNRESOLVED_NAME: &str = "???";

/// A completed name resolution.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Resolution {
    /// The token the lookup was submitted with.
    pub token: u64,
    /// The display name for the address.
    pub name: String,
}

/// A source of display names for probed addresses.
///
/// Lookups are submitted with an opaque token and completed out of order.
/// An implementation which resolves asynchronously exposes a descriptor
/// which becomes readable when completions are available; draining never
/// blocks.  Every submitted lookup completes exactly once, with a
/// placeholder name if the lookup fails.
#[cfg_attr(test, mockall::automock)]
pub trait NameSource {
    /// Submit a lookup for `addr`.
    ///
    /// If `numeric` is true the address is formatted without consulting DNS.
    fn submit(&self, token: u64, addr: IpAddr, numeric: bool);

    /// A descriptor which becomes readable when lookups have completed.
    ///
    /// `None` if completions are available immediately after submission.
    fn wait_fd(&self) -> Option<RawFd>;

    /// Take all completed lookups without blocking.
    fn drain(&self) -> Vec<Resolution>;

    /// The number of submitted lookups which have not yet been drained.
    fn pending(&self) -> usize;
}

/// A `NameSource` which formats addresses numerically without consulting
/// DNS.
///
/// Lookups complete at the moment they are submitted and so no wait
/// descriptor is needed.
#[derive(Debug, Default)]
pub struct NumericNames {
    completed: RefCell<Vec<Resolution>>,
}

impl NameSource for NumericNames {
    fn submit(&self, token: u64, addr: IpAddr, _numeric: bool) {
        self.completed.borrow_mut().push(Resolution {
            token,
            name: addr.to_string(),
        });
    }

    fn wait_fd(&self) -> Option<RawFd> {
        None
    }

    fn drain(&self) -> Vec<Resolution> {
        self.completed.borrow_mut().drain(..).collect()
    }

    fn pending(&self) -> usize {
        self.completed.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn test_numeric_names_complete_immediately() {
        let names = NumericNames::default();
        assert_eq!(0, names.pending());
        names.submit(3, IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)), false);
        names.submit(9, IpAddr::V6(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1)), true);
        assert_eq!(2, names.pending());
        assert_eq!(None, names.wait_fd());
        let completed = names.drain();
        assert_eq!(
            vec![
                Resolution {
                    token: 3,
                    name: String::from("192.0.2.1")
                },
                Resolution {
                    token: 9,
                    name: String::from("2001:db8::1")
                },
            ],
            completed
        );
        assert_eq!(0, names.pending());
        assert!(names.drain().is_empty());
    }
}
