use self::state::{Phase, RunState};
use crate::config::StrategyConfig;
use crate::error::{Error, Result};
use crate::net::NetworkPair;
use crate::net::socket::Socket;
use crate::probe::{Outcome, Probe, ProbeReport, ProbeResponse};
use crate::resolve::{NameSource, UNRESOLVED_NAME};
use crate::signal::InterruptSource;
use crate::table::ProbeTable;
use crate::timer::CountdownTimer;
use crate::wait::WaitSet;
use std::net::IpAddr;
use std::os::fd::AsRawFd;
use tracing::instrument;

/// The event sources multiplexed by the probe loop.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Wake {
    Interrupt,
    SocketV4,
    SocketV6,
    Resolver,
    Timer,
}

/// Probe a set of targets concurrently and publish one report per target.
///
/// The strategy runs a single threaded event loop around a blocking
/// readiness wait.  A periodic timer paces echo requests, one per target
/// per expiration, and replies are decoded and matched against the probe
/// table as they arrive so that any number of probes may be in flight at
/// once.  Once the final request has been dispatched the timer is re-armed
/// as a one-shot reply timeout, on expiry of which every probe still
/// awaiting a reply is finalized as timed out.
///
/// Completing a probe, by reply or by timeout, submits the responding
/// address for name resolution.  A probe is published, in resolution
/// completion order, once its name is known; the run finishes when every
/// probe has been published.  An interrupt finalizes all outstanding probes
/// immediately, so a cancelled run still publishes every target.
///
/// A failure to send one probe or a failure of one address family's socket
/// does not abort the run; affected probes simply time out.  The first such
/// socket failure is returned once the run has otherwise completed.
pub struct PingStrategy<F> {
    config: StrategyConfig,
    targets: Vec<IpAddr>,
    payload: Vec<u8>,
    publish: F,
}

impl<F: FnMut(&ProbeReport)> PingStrategy<F> {
    #[instrument(skip_all, level = "trace")]
    pub fn new(
        config: &StrategyConfig,
        targets: Vec<IpAddr>,
        payload: Vec<u8>,
        publish: F,
    ) -> Self {
        tracing::debug!(?config);
        Self {
            config: *config,
            targets,
            payload,
            publish,
        }
    }

    /// Run the probe loop to completion.
    #[instrument(skip_all, level = "trace")]
    pub fn run<S: Socket, N: NameSource>(
        mut self,
        network: NetworkPair<S>,
        names: &N,
    ) -> Result<()> {
        let mut state = RunState::new(ProbeTable::new(&self.targets, self.config.identifier));
        let mut network = Some(network);
        let timer = CountdownTimer::new()?;
        let mut signals = InterruptSource::new()?;
        let mut wait = WaitSet::new();
        timer.arm_periodic(self.config.interval)?;
        while !state.finished() {
            wait.clear();
            wait.insert(signals.as_raw_fd(), Wake::Interrupt);
            if state.phase() != Phase::Draining {
                if let Some(pair) = network.as_ref() {
                    if let Some(fd) = pair.ipv4_fd() {
                        wait.insert(fd, Wake::SocketV4);
                    }
                    if let Some(fd) = pair.ipv6_fd() {
                        wait.insert(fd, Wake::SocketV6);
                    }
                }
            }
            if names.pending() > 0 {
                // A source without a descriptor completed at submission.
                let Some(fd) = names.wait_fd() else {
                    self.handle_resolutions(&mut state, names);
                    continue;
                };
                wait.insert(fd, Wake::Resolver);
            }
            if state.phase() != Phase::Draining {
                wait.insert(timer.as_raw_fd(), Wake::Timer);
            }
            for wake in wait.wait()? {
                match wake {
                    Wake::Interrupt => self.handle_interrupt(&mut signals, &mut state, names)?,
                    Wake::SocketV4 => self.handle_recv_ipv4(network.as_mut(), &mut state, names),
                    Wake::SocketV6 => self.handle_recv_ipv6(network.as_mut(), &mut state, names),
                    Wake::Resolver => self.handle_resolutions(&mut state, names),
                    Wake::Timer => self.handle_tick(&timer, network.as_mut(), &mut state, names)?,
                }
            }
            self.update_phase(&timer, &mut network, &mut state)?;
        }
        state.take_deferred().map_or(Ok(()), Err)
    }

    /// Handle timer expirations.
    ///
    /// While sending, each expiration dispatches one echo request and missed
    /// periods are made up for by dispatching once per accumulated
    /// expiration.  Dispatching the final request re-arms the timer as the
    /// one-shot reply timeout.  While waiting, an expiration is the reply
    /// timeout and finalizes every outstanding probe.
    fn handle_tick<S: Socket, N: NameSource>(
        &mut self,
        timer: &CountdownTimer,
        network: Option<&mut NetworkPair<S>>,
        state: &mut RunState,
        names: &N,
    ) -> Result<()> {
        let ticks = timer.ticks()?;
        if ticks == 0 {
            return Ok(());
        }
        match state.phase() {
            Phase::Sending => {
                let Some(network) = network else {
                    return Ok(());
                };
                for _ in 0..ticks {
                    if !self.dispatch_next(network, state)? {
                        break;
                    }
                    if state.table().all_dispatched() {
                        timer.arm_oneshot(self.config.reply_timeout)?;
                        state.set_phase(Phase::Waiting);
                        break;
                    }
                }
            }
            Phase::Waiting => self.finalize_outstanding(state, names),
            Phase::Draining => {}
        }
        Ok(())
    }

    /// Dispatch the next echo request, if any remain.
    ///
    /// A probe which cannot be sent is left outstanding and so is reported
    /// by the reply timeout like any other unanswered probe.
    #[instrument(skip_all, level = "trace")]
    fn dispatch_next<S: Socket>(
        &mut self,
        network: &mut NetworkPair<S>,
        state: &mut RunState,
    ) -> Result<bool> {
        let Some(index) = state.table_mut().take_next_unsent() else {
            return Ok(false);
        };
        let probe = state.table().probe(index);
        if probe.outcome() != Outcome::Pending {
            // Finalized early, e.g. by an interrupt in the same readiness
            // batch as the tick.
            return Ok(true);
        }
        let (dest, identifier, sequence) = (probe.dest(), probe.identifier(), probe.sequence());
        match network.dispatch(dest, identifier, sequence, &self.payload) {
            Ok(sent_at) => state.table_mut().probe_mut(index).mark_sent(sent_at),
            Err(Error::ProbeFailed(err)) => {
                tracing::warn!(%dest, %err, "failed to send echo request");
            }
            Err(Error::MissingSocket(family)) => {
                tracing::warn!(%dest, family, "no socket for target family");
            }
            Err(err) => return Err(err),
        }
        Ok(true)
    }

    /// Finalize every probe which does not yet have an outcome as timed out
    /// and submit it for name resolution.
    fn finalize_outstanding<N: NameSource>(&mut self, state: &mut RunState, names: &N) {
        for index in 0..state.table().len() {
            let probe = state.table_mut().probe_mut(index);
            if probe.outcome() == Outcome::Pending {
                probe.complete_timed_out();
                let sequence = probe.sequence();
                let responder = probe.dest();
                names.submit(u64::from(sequence.0), responder, self.config.numeric);
            }
        }
    }

    fn handle_recv_ipv4<S: Socket, N: NameSource>(
        &mut self,
        network: Option<&mut NetworkPair<S>>,
        state: &mut RunState,
        names: &N,
    ) {
        let Some(network) = network else { return };
        match network.recv_ipv4() {
            Ok(Some(resp)) => self.handle_response(&resp, state, names),
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(%err, "IPv4 receive failed, closing the IPv4 socket");
                network.close_ipv4();
                state.defer(err);
            }
        }
    }

    fn handle_recv_ipv6<S: Socket, N: NameSource>(
        &mut self,
        network: Option<&mut NetworkPair<S>>,
        state: &mut RunState,
        names: &N,
    ) {
        let Some(network) = network else { return };
        match network.recv_ipv6() {
            Ok(Some(resp)) => self.handle_response(&resp, state, names),
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(%err, "IPv6 receive failed, closing the IPv6 socket");
                network.close_ipv6();
                state.defer(err);
            }
        }
    }

    /// Match a decoded echo reply against the probe table.
    ///
    /// A reply which does not match a probe awaiting one is discarded; this
    /// covers duplicates, replies arriving after the probe was finalized and
    /// replies belonging to another process.
    #[instrument(skip(self, state, names), level = "trace")]
    fn handle_response<N: NameSource>(
        &mut self,
        resp: &ProbeResponse,
        state: &mut RunState,
        names: &N,
    ) {
        if let Some(index) = state.table().match_response(resp) {
            let probe = state.table_mut().probe_mut(index);
            probe.complete_reply(resp.received, resp.responder);
            let sequence = probe.sequence();
            names.submit(u64::from(sequence.0), resp.responder, self.config.numeric);
        } else {
            tracing::trace!(?resp, "discarding unmatched echo reply");
        }
    }

    /// Collect completed name resolutions and publish their probes.
    fn handle_resolutions<N: NameSource>(&mut self, state: &mut RunState, names: &N) {
        for resolution in names.drain() {
            let Ok(index) = usize::try_from(resolution.token) else {
                continue;
            };
            if index >= state.table().len() || state.table().probe(index).is_reported() {
                continue;
            }
            let probe = state.table_mut().probe_mut(index);
            probe.set_hostname(resolution.name);
            probe.mark_reported();
            let report = Self::report(state.table().probe(index));
            (self.publish)(&report);
        }
    }

    /// Cancel the run on interrupt.
    ///
    /// Every outstanding probe is finalized as timed out, after which the
    /// phase update proceeds straight to draining, so a cancelled run still
    /// publishes a report for every target.
    fn handle_interrupt<N: NameSource>(
        &mut self,
        signals: &mut InterruptSource,
        state: &mut RunState,
        names: &N,
    ) -> Result<()> {
        if !signals.take()? {
            return Ok(());
        }
        tracing::debug!("interrupted, finalizing all outstanding probes");
        self.finalize_outstanding(state, names);
        Ok(())
    }

    /// Move to the draining phase once every probe has an outcome.
    ///
    /// Entering the draining phase releases the network: the timer is
    /// disarmed and the sockets are closed.  Only the resolver and
    /// interrupts are waited on thereafter.
    fn update_phase<S: Socket>(
        &mut self,
        timer: &CountdownTimer,
        network: &mut Option<NetworkPair<S>>,
        state: &mut RunState,
    ) -> Result<()> {
        if state.phase() != Phase::Draining && state.table().all_final() {
            state.set_phase(Phase::Draining);
            timer.disarm()?;
            *network = None;
            tracing::debug!("all probes final, draining name resolutions");
        }
        Ok(())
    }

    fn report(probe: &Probe) -> ProbeReport {
        ProbeReport {
            hostname: probe
                .hostname()
                .map_or_else(|| String::from(UNRESOLVED_NAME), String::from),
            dest: probe.dest(),
            responder: probe.responder(),
            round_trip: probe.round_trip(),
            replies: probe.reply_count(),
        }
    }
}

mod state {
    use crate::error::Error;
    use crate::table::ProbeTable;

    /// The phase of the probe loop.
    #[derive(Debug, Copy, Clone, Eq, PartialEq)]
    pub enum Phase {
        /// Echo requests are still being dispatched.
        Sending,
        /// All echo requests are dispatched; awaiting replies or the reply
        /// timeout.
        Waiting,
        /// All probes have outcomes; draining outstanding name resolutions.
        Draining,
    }

    /// The mutable state of a single run.
    pub struct RunState {
        table: ProbeTable,
        phase: Phase,
        deferred: Option<Error>,
    }

    impl RunState {
        pub fn new(table: ProbeTable) -> Self {
            Self {
                table,
                phase: Phase::Sending,
                deferred: None,
            }
        }

        pub const fn phase(&self) -> Phase {
            self.phase
        }

        pub fn set_phase(&mut self, phase: Phase) {
            self.phase = phase;
        }

        pub const fn table(&self) -> &ProbeTable {
            &self.table
        }

        pub fn table_mut(&mut self) -> &mut ProbeTable {
            &mut self.table
        }

        /// Record the first socket failure; the run carries on and the
        /// failure is returned once the run has otherwise completed.
        pub fn defer(&mut self, error: Error) {
            if self.deferred.is_none() {
                self.deferred = Some(error);
            }
        }

        pub fn take_deferred(&mut self) -> Option<Error> {
            self.deferred.take()
        }

        /// Whether every probe has been reported.
        pub fn finished(&self) -> bool {
            self.table.all_reported()
        }
    }
}
