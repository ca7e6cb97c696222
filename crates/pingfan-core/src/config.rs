use crate::types::{ProbeId, TimeToLive};
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Default configuration values.
pub mod defaults {
    use super::AddrFamily;
    use std::time::Duration;

    /// The default address families to probe.
    pub const DEFAULT_ADDR_FAMILY: AddrFamily = AddrFamily::Dual;

    /// The default delay between successive echo requests.
    pub const DEFAULT_SEND_INTERVAL: Duration = Duration::from_secs(1);

    /// The default period to wait for replies after the final echo request.
    pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_millis(10);

    /// The default size of the echo request payload in bytes.
    pub const DEFAULT_PAYLOAD_SIZE: usize = 56;
}

/// The maximum size of the echo request payload in bytes.
///
/// The payload, the echo header and the largest possible IPv4 header must
/// together fit in `MAX_PACKET_SIZE`.
pub const MAX_PAYLOAD_SIZE: usize = 956;

/// The address families to open probe sockets for.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AddrFamily {
    /// Probe both IPv4 and IPv6 targets.
    Dual,
    /// Probe IPv4 targets only.
    Ipv4,
    /// Probe IPv6 targets only.
    Ipv6,
}

impl Display for AddrFamily {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dual => write!(f, "dual"),
            Self::Ipv4 => write!(f, "ipv4"),
            Self::Ipv6 => write!(f, "ipv6"),
        }
    }
}

/// Configuration for the probe sockets.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ChannelConfig {
    pub addr_family: AddrFamily,
    pub ttl: Option<TimeToLive>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            addr_family: defaults::DEFAULT_ADDR_FAMILY,
            ttl: None,
        }
    }
}

/// Configuration for the probe strategy.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct StrategyConfig {
    pub identifier: ProbeId,
    pub interval: Duration,
    pub reply_timeout: Duration,
    pub numeric: bool,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            identifier: ProbeId(0),
            interval: defaults::DEFAULT_SEND_INTERVAL,
            reply_timeout: defaults::DEFAULT_REPLY_TIMEOUT,
            numeric: false,
        }
    }
}
