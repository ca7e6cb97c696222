use crate::types::{ProbeId, Sequence};
use std::fmt::{Display, Formatter};
use std::net::IpAddr;
use std::time::{Duration, Instant};

/// The state of a single probe.
///
/// A probe is created for each target address and moves through its lifetime
/// in one direction only: it is dispatched at most once, it is completed by
/// the first matching echo reply or by the reply timeout, and it is reported
/// exactly once when the name of the responder has been resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    dest: IpAddr,
    identifier: ProbeId,
    sequence: Sequence,
    sent: Option<Instant>,
    received: Option<Instant>,
    responder: Option<IpAddr>,
    outcome: Outcome,
    hostname: Option<String>,
    reported: bool,
}

impl Probe {
    pub(crate) const fn new(dest: IpAddr, identifier: ProbeId, sequence: Sequence) -> Self {
        Self {
            dest,
            identifier,
            sequence,
            sent: None,
            received: None,
            responder: None,
            outcome: Outcome::Pending,
            hostname: None,
            reported: false,
        }
    }

    /// The address the echo request is sent to.
    #[must_use]
    pub const fn dest(&self) -> IpAddr {
        self.dest
    }

    /// The identifier of the echo request.
    #[must_use]
    pub const fn identifier(&self) -> ProbeId {
        self.identifier
    }

    /// The sequence number of the echo request.
    #[must_use]
    pub const fn sequence(&self) -> Sequence {
        self.sequence
    }

    /// The timestamp taken immediately before the echo request was sent.
    #[must_use]
    pub const fn sent(&self) -> Option<Instant> {
        self.sent
    }

    /// The outcome of the probe so far.
    #[must_use]
    pub const fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// The address the reply came from, or the target address for a probe
    /// which timed out.
    #[must_use]
    pub const fn responder(&self) -> Option<IpAddr> {
        self.responder
    }

    /// The resolved name of the responder, once known.
    #[must_use]
    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    /// Whether the probe has a final outcome.
    #[must_use]
    pub const fn is_final(&self) -> bool {
        !matches!(self.outcome, Outcome::Pending)
    }

    /// Whether the probe has been reported.
    #[must_use]
    pub const fn is_reported(&self) -> bool {
        self.reported
    }

    /// The number of replies received, `0` or `1`.
    #[must_use]
    pub const fn reply_count(&self) -> u16 {
        match self.outcome {
            Outcome::Replied => 1,
            Outcome::Pending | Outcome::TimedOut => 0,
        }
    }

    /// The round trip time, zero unless a reply was received.
    #[must_use]
    pub fn round_trip(&self) -> Duration {
        match (self.outcome, self.sent, self.received) {
            (Outcome::Replied, Some(sent), Some(received)) => {
                received.saturating_duration_since(sent)
            }
            _ => Duration::ZERO,
        }
    }

    pub(crate) fn mark_sent(&mut self, sent: Instant) {
        self.sent = Some(sent);
    }

    /// Complete the probe with a matching echo reply.
    pub(crate) fn complete_reply(&mut self, received: Instant, responder: IpAddr) {
        self.received = Some(received);
        self.responder = Some(responder);
        self.outcome = Outcome::Replied;
    }

    /// Complete the probe as timed out.
    ///
    /// The target address stands in as the responder so that the report
    /// names the host which failed to answer.
    pub(crate) fn complete_timed_out(&mut self) {
        self.responder = Some(self.dest);
        self.outcome = Outcome::TimedOut;
    }

    pub(crate) fn set_hostname(&mut self, hostname: String) {
        self.hostname = Some(hostname);
    }

    pub(crate) fn mark_reported(&mut self) {
        self.reported = true;
    }
}

/// The outcome of a probe.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Outcome {
    /// No reply has been received yet.
    Pending,
    /// A matching echo reply was received.
    Replied,
    /// No reply was received within the timeout.
    TimedOut,
}

/// A decoded echo reply.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    /// The timestamp the reply was received.
    pub received: Instant,
    /// The address the reply came from.
    pub responder: IpAddr,
    /// The identifier from the echo reply.
    pub identifier: u16,
    /// The sequence number from the echo reply.
    pub sequence: u16,
}

/// The reported result of a single probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    /// The display name of the responder.
    pub hostname: String,
    /// The address the echo request was sent to.
    pub dest: IpAddr,
    /// The address the reply came from, the target itself on timeout.
    pub responder: Option<IpAddr>,
    /// The round trip time, zero if no reply was received.
    pub round_trip: Duration,
    /// The number of replies received, `0` or `1`.
    pub replies: u16,
}

impl Display for ProbeReport {
    /// Format as `name seconds.microseconds count`.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}.{:06} {}",
            self.hostname,
            self.round_trip.as_secs(),
            self.round_trip.subsec_micros(),
            self.replies
        )
    }
}
