use crate::config::{defaults, AddrFamily, ChannelConfig, StrategyConfig, MAX_PAYLOAD_SIZE};
use crate::error::{Error, Result};
use crate::pinger::Pinger;
use crate::types::{ProbeId, TimeToLive};
use std::net::IpAddr;
use std::time::Duration;

/// Build a [`Pinger`].
///
/// # Examples
///
/// Probe a target with a 100ms interval between echo requests:
///
/// ```no_run
/// # fn main() -> anyhow::Result<()> {
/// # use std::net::IpAddr;
/// # use std::str::FromStr;
/// # use std::time::Duration;
/// use pingfan_core::Builder;
///
/// let targets = vec![IpAddr::from_str("1.1.1.1")?];
/// let pinger = Builder::new(targets)
///     .interval(Duration::from_millis(100))
///     .build()?;
/// pinger.run(|report| println!("{report}"))?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Builder {
    targets: Vec<IpAddr>,
    interval: Duration,
    reply_timeout: Duration,
    payload_size: usize,
    payload: Option<Vec<u8>>,
    ttl: Option<TimeToLive>,
    addr_family: AddrFamily,
    identifier: Option<ProbeId>,
    numeric: bool,
}

impl Builder {
    /// Build a `Pinger` for the given targets.
    pub fn new<I: IntoIterator<Item = IpAddr>>(targets: I) -> Self {
        Self {
            targets: targets.into_iter().collect(),
            interval: defaults::DEFAULT_SEND_INTERVAL,
            reply_timeout: defaults::DEFAULT_REPLY_TIMEOUT,
            payload_size: defaults::DEFAULT_PAYLOAD_SIZE,
            payload: None,
            ttl: None,
            addr_family: defaults::DEFAULT_ADDR_FAMILY,
            identifier: None,
            numeric: false,
        }
    }

    /// Set the delay between successive echo requests.
    #[must_use]
    pub fn interval(self, interval: Duration) -> Self {
        Self { interval, ..self }
    }

    /// Set the period to wait for replies after the final echo request.
    #[must_use]
    pub fn reply_timeout(self, reply_timeout: Duration) -> Self {
        Self {
            reply_timeout,
            ..self
        }
    }

    /// Set the size of the generated echo request payload in bytes.
    #[must_use]
    pub fn payload_size(self, payload_size: usize) -> Self {
        Self {
            payload_size,
            ..self
        }
    }

    /// Set a literal echo request payload, overriding the payload size.
    #[must_use]
    pub fn payload(self, payload: Vec<u8>) -> Self {
        Self {
            payload: Some(payload),
            ..self
        }
    }

    /// Set the time-to-live (hop limit) of outgoing echo requests.
    #[must_use]
    pub fn time_to_live(self, ttl: u8) -> Self {
        Self {
            ttl: Some(TimeToLive(ttl)),
            ..self
        }
    }

    /// Set the address families to open probe sockets for.
    #[must_use]
    pub const fn addr_family(mut self, addr_family: AddrFamily) -> Self {
        self.addr_family = addr_family;
        self
    }

    /// Set the echo request identifier, by default derived from the process
    /// id.
    #[must_use]
    pub fn identifier(self, identifier: u16) -> Self {
        Self {
            identifier: Some(ProbeId(identifier)),
            ..self
        }
    }

    /// Report addresses numerically without consulting DNS.
    #[must_use]
    pub fn numeric(self, numeric: bool) -> Self {
        Self { numeric, ..self }
    }

    /// Build the `Pinger`, validating the configuration.
    pub fn build(self) -> Result<Pinger> {
        if self.targets.is_empty() {
            return Err(Error::BadConfig(String::from("no targets")));
        }
        if self.targets.len() > usize::from(u16::MAX) {
            return Err(Error::BadConfig(format!(
                "too many targets: {}",
                self.targets.len()
            )));
        }
        let payload = self
            .payload
            .unwrap_or_else(|| default_payload(self.payload_size));
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(Error::BadConfig(format!(
                "payload of {} bytes exceeds the maximum of {MAX_PAYLOAD_SIZE} bytes",
                payload.len()
            )));
        }
        let identifier = self.identifier.unwrap_or_else(process_identifier);
        Ok(Pinger::new(
            self.targets,
            payload,
            StrategyConfig {
                identifier,
                interval: self.interval,
                reply_timeout: self.reply_timeout,
                numeric: self.numeric,
            },
            ChannelConfig {
                addr_family: self.addr_family,
                ttl: self.ttl,
            },
        ))
    }
}

/// The generated payload: a repeating ramp of the printable ASCII
/// characters.
fn default_payload(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 95 + 32) as u8).collect()
}

/// Derive the echo request identifier from the process id.
fn process_identifier() -> ProbeId {
    ProbeId((std::process::id() % u32::from(u16::MAX)) as u16)
}
