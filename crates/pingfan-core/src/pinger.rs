use crate::config::{ChannelConfig, StrategyConfig};
use crate::error::Result;
use crate::net::{NetworkPair, SocketImpl};
use crate::probe::ProbeReport;
use crate::resolve::{NameSource, NumericNames};
use crate::strategy::PingStrategy;
use std::net::IpAddr;
use tracing::instrument;

/// A concurrent echo prober.
///
/// Each run sends a single echo request to every target, paced by the send
/// interval, and publishes one report per target once its outcome and the
/// name of its responder are known.  Reports are published in name
/// resolution completion order, not target order.
///
/// Raw `ICMP` sockets are opened for the run and so the process requires
/// `CAP_NET_RAW` or an effective uid of root.
#[derive(Debug, Clone)]
pub struct Pinger {
    targets: Vec<IpAddr>,
    payload: Vec<u8>,
    strategy: StrategyConfig,
    channel: ChannelConfig,
}

impl Pinger {
    pub(crate) const fn new(
        targets: Vec<IpAddr>,
        payload: Vec<u8>,
        strategy: StrategyConfig,
        channel: ChannelConfig,
    ) -> Self {
        Self {
            targets,
            payload,
            strategy,
            channel,
        }
    }

    /// Probe all targets, resolving responder names with `names`.
    #[instrument(skip_all, level = "trace")]
    pub fn run_with<N: NameSource, F: FnMut(&ProbeReport)>(
        &self,
        names: &N,
        publish: F,
    ) -> Result<()> {
        let network = NetworkPair::<SocketImpl>::open(&self.channel)?;
        PingStrategy::new(
            &self.strategy,
            self.targets.clone(),
            self.payload.clone(),
            publish,
        )
        .run(network, names)
    }

    /// Probe all targets, reporting addresses numerically.
    pub fn run<F: FnMut(&ProbeReport)>(&self, publish: F) -> Result<()> {
        self.run_with(&NumericNames::default(), publish)
    }

    #[must_use]
    pub fn targets(&self) -> &[IpAddr] {
        &self.targets
    }

    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    #[must_use]
    pub const fn strategy(&self) -> &StrategyConfig {
        &self.strategy
    }

    #[must_use]
    pub const fn channel(&self) -> &ChannelConfig {
        &self.channel
    }
}
