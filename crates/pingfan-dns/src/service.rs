use crate::config::{Config, IpAddrFamily, ResolveMethod};
use crate::resolver::{DnsEntry, Error, Result};
use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};
use hickory_resolver::config::{LookupIpStrategy, ResolverConfig, ResolverOpts};
use hickory_resolver::error::ResolveErrorKind;
use hickory_resolver::system_conf::read_system_conf;
use hickory_resolver::Resolver;
use itertools::{Either, Itertools};
use nix::unistd;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::net::IpAddr;
use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::sync::Arc;
use std::thread;

/// The number of background resolver worker threads.
const RESOLVER_WORKER_COUNT: usize = 2;

/// The maximum number of in-flight reverse DNS resolutions that may be queued.
const RESOLVER_MAX_QUEUE_SIZE: usize = 100;

/// A non-blocking forward and reverse DNS resolver.
///
/// Reverse resolutions are submitted with a caller supplied `token` and are
/// performed by a pool of background worker threads.  Completed resolutions
/// are signalled on the [`wait_fd`](Self::wait_fd) file descriptor and
/// collected, along with their tokens, via
/// [`poll_completions`](Self::poll_completions) which never blocks.
///
/// Forward lookups are performed synchronously on the calling thread.
pub struct DnsResolver {
    config: Config,
    shared: Arc<Shared>,
    tx: Sender<ResolveJob>,
    wake_rd: OwnedFd,
}

impl DnsResolver {
    /// Create and start a `DnsResolver`.
    pub fn start(config: Config) -> io::Result<Self> {
        let provider = make_provider(&config)?;
        let (wake_rd, wake_wr) =
            unistd::pipe2(nix::fcntl::OFlag::O_NONBLOCK | nix::fcntl::OFlag::O_CLOEXEC)?;
        let shared = Arc::new(Shared {
            provider,
            state: Mutex::new(State::default()),
            wake_wr,
        });
        let (tx, rx) = bounded(RESOLVER_MAX_QUEUE_SIZE);
        for i in 0..RESOLVER_WORKER_COUNT {
            let shared = Arc::clone(&shared);
            let rx: Receiver<ResolveJob> = rx.clone();
            thread::Builder::new()
                .name(format!("pingfan-dns-{i}"))
                .spawn(move || resolver_queue_processor(&rx, &shared))?;
        }
        Ok(Self {
            config,
            shared,
            tx,
            wake_rd,
        })
    }

    /// Get the `Config`.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Perform a forward DNS lookup of a hostname.
    ///
    /// The addresses returned are ordered according to the configured
    /// `IpAddrFamily`.
    pub fn lookup(&self, hostname: &str) -> Result<Vec<IpAddr>> {
        match &self.shared.provider {
            DnsProvider::TrustDns(resolver) => Ok(resolver
                .lookup_ip(hostname)
                .map_err(|err| Error::LookupFailed(Box::new(err)))?
                .iter()
                .collect()),
            DnsProvider::DnsLookup => {
                let all = dns_lookup::lookup_host(hostname)
                    .map_err(|err| Error::LookupFailed(Box::new(err)))?;
                Ok(order_by_family(all, self.config.addr_family))
            }
        }
    }

    /// Submit a reverse DNS resolution of `addr` to the worker pool.
    ///
    /// Every submission is guaranteed to eventually produce exactly one
    /// completion carrying the same `token`.  If the queue is full or the
    /// worker pool has shut down then a `DnsEntry::Failed` completion is
    /// synthesized immediately.
    ///
    /// If `numeric` is true the resolution completes with the numeric form of
    /// the address without performing a DNS query.
    pub fn submit(&self, token: u64, addr: IpAddr, numeric: bool) {
        self.shared.state.lock().pending += 1;
        match self.tx.try_send(ResolveJob {
            token,
            addr,
            numeric,
        }) {
            Ok(()) => {}
            Err(TrySendError::Full(_) | TrySendError::Disconnected(_)) => {
                self.shared.complete(token, DnsEntry::Failed(addr));
            }
        }
    }

    /// The number of submitted resolutions which have not yet been collected.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.shared.state.lock().pending
    }

    /// A file descriptor which becomes readable when completions are waiting.
    #[must_use]
    pub fn wait_fd(&self) -> RawFd {
        self.wake_rd.as_raw_fd()
    }

    /// Collect all completed resolutions without blocking.
    pub fn poll_completions(&self) -> Vec<(u64, DnsEntry)> {
        // Drain the wake pipe before the queue so a completion which arrives
        // mid-poll leaves its wake byte behind for the next wait.
        let mut buf = [0_u8; 16];
        while let Ok(n) = unistd::read(self.wake_rd.as_raw_fd(), &mut buf) {
            if n < buf.len() {
                break;
            }
        }
        let mut state = self.shared.state.lock();
        let completed = state.completed.drain(..).collect::<Vec<_>>();
        state.pending -= completed.len();
        completed
    }
}

#[derive(Debug, Clone)]
struct ResolveJob {
    token: u64,
    addr: IpAddr,
    numeric: bool,
}

#[derive(Default)]
struct State {
    completed: VecDeque<(u64, DnsEntry)>,
    pending: usize,
}

struct Shared {
    provider: DnsProvider,
    state: Mutex<State>,
    wake_wr: OwnedFd,
}

impl Shared {
    fn complete(&self, token: u64, entry: DnsEntry) {
        self.state.lock().completed.push_back((token, entry));
        // A full pipe means readiness is already signalled.
        let _ = unistd::write(&self.wake_wr, &[1]);
    }
}

enum DnsProvider {
    TrustDns(Arc<Resolver>),
    DnsLookup,
}

/// Create the provider which will perform the DNS queries.
fn make_provider(config: &Config) -> io::Result<DnsProvider> {
    if matches!(config.resolve_method, ResolveMethod::System) {
        Ok(DnsProvider::DnsLookup)
    } else {
        let mut options = ResolverOpts::default();
        #[expect(clippy::match_same_arms)]
        let ip_strategy = match config.addr_family {
            IpAddrFamily::Ipv4Only => LookupIpStrategy::Ipv4Only,
            IpAddrFamily::Ipv6Only => LookupIpStrategy::Ipv6Only,
            IpAddrFamily::Ipv6thenIpv4 => LookupIpStrategy::Ipv6thenIpv4,
            IpAddrFamily::Ipv4thenIpv6 => LookupIpStrategy::Ipv4thenIpv6,
            IpAddrFamily::System => LookupIpStrategy::Ipv4thenIpv6,
        };
        options.timeout = config.timeout;
        options.ip_strategy = ip_strategy;
        let resolver = match config.resolve_method {
            ResolveMethod::Resolv => {
                let (resolver_cfg, mut options) = read_system_conf()?;
                options.timeout = config.timeout;
                options.ip_strategy = ip_strategy;
                Resolver::new(resolver_cfg, options)
            }
            ResolveMethod::Google => Resolver::new(ResolverConfig::google(), options),
            ResolveMethod::Cloudflare => Resolver::new(ResolverConfig::cloudflare(), options),
            ResolveMethod::System => unreachable!(),
        }?;
        Ok(DnsProvider::TrustDns(Arc::new(resolver)))
    }
}

/// Order forward lookup results by the configured address family.
fn order_by_family(all: Vec<IpAddr>, addr_family: IpAddrFamily) -> Vec<IpAddr> {
    if addr_family == IpAddrFamily::System {
        return all;
    }
    let (ipv4, ipv6): (Vec<IpAddr>, Vec<IpAddr>) =
        all.into_iter().partition_map(|ip| match ip {
            IpAddr::V4(_) => Either::Left(ip),
            IpAddr::V6(_) => Either::Right(ip),
        });
    match addr_family {
        IpAddrFamily::Ipv4Only => ipv4,
        IpAddrFamily::Ipv6Only => ipv6,
        IpAddrFamily::Ipv6thenIpv4 => {
            if ipv6.is_empty() {
                ipv4
            } else {
                ipv6
            }
        }
        IpAddrFamily::Ipv4thenIpv6 => {
            if ipv4.is_empty() {
                ipv6
            } else {
                ipv4
            }
        }
        IpAddrFamily::System => unreachable!(),
    }
}

/// Process jobs from the resolve queue until the submitting side shuts down.
fn resolver_queue_processor(rx: &Receiver<ResolveJob>, shared: &Shared) {
    for job in rx.iter() {
        let token = job.token;
        let entry = process_job(&shared.provider, job);
        shared.complete(token, entry);
    }
}

/// Perform the reverse DNS lookup for a single job.
fn process_job(provider: &DnsProvider, job: ResolveJob) -> DnsEntry {
    if job.numeric {
        return DnsEntry::Resolved(job.addr, vec![job.addr.to_string()]);
    }
    match provider {
        DnsProvider::DnsLookup => {
            // We can't distinguish between a failed lookup or a genuine error
            // and so we just assume all failures are `DnsEntry::NotFound`.
            match dns_lookup::lookup_addr(&job.addr) {
                Ok(dns) => DnsEntry::Resolved(job.addr, vec![dns]),
                Err(_) => DnsEntry::NotFound(job.addr),
            }
        }
        DnsProvider::TrustDns(resolver) => match resolver.reverse_lookup(job.addr) {
            Ok(name) => {
                let hostnames = name
                    .into_iter()
                    .map(|ptr| ptr.to_string().trim_end_matches('.').to_string())
                    .collect();
                DnsEntry::Resolved(job.addr, hostnames)
            }
            Err(err) => match err.kind() {
                ResolveErrorKind::NoRecordsFound { .. } => DnsEntry::NotFound(job.addr),
                ResolveErrorKind::Timeout => DnsEntry::Timeout(job.addr),
                _ => DnsEntry::Failed(job.addr),
            },
        },
    }
}
