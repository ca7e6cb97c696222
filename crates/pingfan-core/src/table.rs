use crate::probe::{Outcome, Probe, ProbeResponse};
use crate::types::{ProbeId, Sequence};
use std::net::IpAddr;

/// The table of probes for a run.
///
/// One probe is created per target address.  The sequence number of each
/// probe is its row index and so a sequence number carried in an echo reply
/// locates the probe directly.  Probes are dispatched in row order.
#[derive(Debug)]
pub struct ProbeTable {
    probes: Vec<Probe>,
    next_unsent: usize,
}

impl ProbeTable {
    /// Create a table with one probe per target.
    pub fn new(targets: &[IpAddr], identifier: ProbeId) -> Self {
        let mut sequence = Sequence(0);
        let mut probes = Vec::with_capacity(targets.len());
        for &dest in targets {
            probes.push(Probe::new(dest, identifier, sequence));
            sequence += Sequence(1);
        }
        Self {
            probes,
            next_unsent: 0,
        }
    }

    /// Take the index of the next probe to dispatch, if any remain.
    pub fn take_next_unsent(&mut self) -> Option<usize> {
        if self.next_unsent < self.probes.len() {
            let index = self.next_unsent;
            self.next_unsent += 1;
            Some(index)
        } else {
            None
        }
    }

    /// Whether every probe has been dispatched.
    #[must_use]
    pub const fn all_dispatched(&self) -> bool {
        self.next_unsent == self.probes.len()
    }

    /// Find the probe which matches an echo reply.
    ///
    /// Only probes which have been sent and are still awaiting a reply are
    /// candidates and so duplicate and late replies never match, nor do
    /// replies destined for another process.
    #[must_use]
    pub fn match_response(&self, resp: &ProbeResponse) -> Option<usize> {
        self.probes.iter().position(|probe| {
            probe.outcome() == Outcome::Pending
                && probe.sent().is_some()
                && probe.identifier().0 == resp.identifier
                && probe.sequence().0 == resp.sequence
        })
    }

    #[must_use]
    pub fn probe(&self, index: usize) -> &Probe {
        &self.probes[index]
    }

    pub fn probe_mut(&mut self, index: usize) -> &mut Probe {
        &mut self.probes[index]
    }

    #[must_use]
    pub fn probes(&self) -> &[Probe] {
        &self.probes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.probes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    /// Whether every probe has a final outcome.
    #[must_use]
    pub fn all_final(&self) -> bool {
        self.probes.iter().all(Probe::is_final)
    }

    /// Whether every probe has been reported.
    #[must_use]
    pub fn all_reported(&self) -> bool {
        self.probes.iter().all(Probe::is_reported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};
    use std::time::Instant;

    fn targets() -> Vec<IpAddr> {
        vec![
            IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)),
            IpAddr::V6(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1)),
            IpAddr::V4(Ipv4Addr::new(192, 0, 2, 2)),
        ]
    }

    fn response(identifier: u16, sequence: u16) -> ProbeResponse {
        ProbeResponse {
            received: Instant::now(),
            responder: IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)),
            identifier,
            sequence,
        }
    }

    #[test]
    fn test_new_assigns_sequences_in_row_order() {
        let table = ProbeTable::new(&targets(), ProbeId(99));
        assert_eq!(3, table.len());
        assert!(!table.is_empty());
        for (i, probe) in table.probes().iter().enumerate() {
            assert_eq!(ProbeId(99), probe.identifier());
            assert_eq!(Sequence(u16::try_from(i).unwrap()), probe.sequence());
        }
    }

    #[test]
    fn test_take_next_unsent_exhausts_in_order() {
        let mut table = ProbeTable::new(&targets(), ProbeId(99));
        assert!(!table.all_dispatched());
        assert_eq!(Some(0), table.take_next_unsent());
        assert_eq!(Some(1), table.take_next_unsent());
        assert!(!table.all_dispatched());
        assert_eq!(Some(2), table.take_next_unsent());
        assert_eq!(None, table.take_next_unsent());
        assert!(table.all_dispatched());
    }

    #[test]
    fn test_match_response_requires_sent() {
        let mut table = ProbeTable::new(&targets(), ProbeId(99));
        assert_eq!(None, table.match_response(&response(99, 0)));
        table.probe_mut(0).mark_sent(Instant::now());
        assert_eq!(Some(0), table.match_response(&response(99, 0)));
    }

    #[test]
    fn test_match_response_rejects_mismatches() {
        let mut table = ProbeTable::new(&targets(), ProbeId(99));
        table.probe_mut(1).mark_sent(Instant::now());
        assert_eq!(Some(1), table.match_response(&response(99, 1)));
        assert_eq!(None, table.match_response(&response(98, 1)));
        assert_eq!(None, table.match_response(&response(99, 2)));
        assert_eq!(None, table.match_response(&response(99, 7)));
    }

    #[test]
    fn test_match_response_rejects_completed() {
        let mut table = ProbeTable::new(&targets(), ProbeId(99));
        let sent = Instant::now();
        table.probe_mut(0).mark_sent(sent);
        table.probe_mut(1).mark_sent(sent);
        table
            .probe_mut(0)
            .complete_reply(Instant::now(), IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)));
        table.probe_mut(1).complete_timed_out();
        assert_eq!(None, table.match_response(&response(99, 0)));
        assert_eq!(None, table.match_response(&response(99, 1)));
    }

    #[test]
    fn test_all_final_and_all_reported() {
        let mut table = ProbeTable::new(&targets(), ProbeId(99));
        assert!(!table.all_final());
        for index in 0..table.len() {
            table.probe_mut(index).mark_sent(Instant::now());
            table.probe_mut(index).complete_timed_out();
        }
        assert!(table.all_final());
        assert!(!table.all_reported());
        for index in 0..table.len() {
            table.probe_mut(index).mark_reported();
        }
        assert!(table.all_reported());
    }
}
