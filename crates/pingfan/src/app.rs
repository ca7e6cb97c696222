use crate::args::{Args, LogFormat, LogSpanEvents};
use crate::privilege;
use anyhow::{anyhow, Context};
use pingfan_core::{
    block_signals, AddrFamily, Builder, NameSource, Pinger, Resolution, UNRESOLVED_NAME,
};
use pingfan_dns::{DnsEntry, DnsResolver, IpAddrFamily};
use std::net::IpAddr;
use std::os::fd::RawFd;
use std::str::FromStr;
use tracing::warn;
use tracing_subscriber::fmt::format::FmtSpan;

/// Run the pingfan application.
pub fn run_pingfan(args: &Args) -> anyhow::Result<()> {
    configure_logging(args);
    // Worker threads inherit the signal mask so this must precede the
    // resolver pool.
    block_signals()?;
    check_privileges()?;
    let resolver = start_dns_resolver(args)?;
    let targets = resolve_targets(args, &resolver)?;
    let pinger = make_pinger(args, targets)?;
    pinger.run_with(&DnsNames::new(&resolver), |report| println!("{report}"))?;
    Ok(())
}

/// Acquire raw socket privileges and warn when they are absent.
///
/// Missing privileges are not fatal here; the socket open reports the
/// definitive error.
fn check_privileges() -> anyhow::Result<()> {
    privilege::acquire_privileges()?;
    if !privilege::has_privileges()? {
        warn!("raw sockets require CAP_NET_RAW or an effective uid of root");
    }
    Ok(())
}

/// Start the DNS resolver.
fn start_dns_resolver(args: &Args) -> anyhow::Result<DnsResolver> {
    Ok(DnsResolver::start(
        pingfan_dns::Config::builder()
            .resolve_method(args.dns_resolve_method.into())
            .addr_family(make_lookup_family(args))
            .timeout(args.dns_timeout)
            .build(),
    )?)
}

/// Resolve each target to the single address it will be probed at.
///
/// Each target contributes exactly one record and duplicate addresses
/// across targets are permitted.  With `--numeric-targets` every target
/// must be a literal IP address of the selected family.
fn resolve_targets(args: &Args, resolver: &DnsResolver) -> anyhow::Result<Vec<IpAddr>> {
    args.targets
        .iter()
        .map(|target| resolve_target(args, resolver, target))
        .collect()
}

/// Resolve a single target to an address.
fn resolve_target(args: &Args, resolver: &DnsResolver, target: &str) -> anyhow::Result<IpAddr> {
    if args.numeric_targets {
        let addr = IpAddr::from_str(target)
            .with_context(|| format!("{target} is not a valid IP address"))?;
        if family_allows(args, addr) {
            Ok(addr)
        } else {
            Err(no_address_error(args, target))
        }
    } else {
        resolver
            .lookup(target)
            .map_err(|err| anyhow!("failed to resolve target: {target} ({err})"))?
            .first()
            .copied()
            .ok_or_else(|| no_address_error(args, target))
    }
}

fn no_address_error(args: &Args, target: &str) -> anyhow::Error {
    anyhow!(
        "no address for {} for address family {}",
        target,
        make_addr_family(args)
    )
}

/// Does the family filter allow probing `addr`?
const fn family_allows(args: &Args, addr: IpAddr) -> bool {
    match addr {
        IpAddr::V4(_) => !args.ipv6,
        IpAddr::V6(_) => !args.ipv4,
    }
}

/// The socket address family implied by the family filter.
const fn make_addr_family(args: &Args) -> AddrFamily {
    if args.ipv4 {
        AddrFamily::Ipv4
    } else if args.ipv6 {
        AddrFamily::Ipv6
    } else {
        AddrFamily::Dual
    }
}

/// The forward lookup address family implied by the family filter.
///
/// Unfiltered lookups prefer IPv4 and fall back to IPv6, either of which
/// the dual-stack probe can serve.
const fn make_lookup_family(args: &Args) -> IpAddrFamily {
    if args.ipv4 {
        IpAddrFamily::Ipv4Only
    } else if args.ipv6 {
        IpAddrFamily::Ipv6Only
    } else {
        IpAddrFamily::Ipv4thenIpv6
    }
}

/// Build the pinger from the parsed arguments.
fn make_pinger(args: &Args, targets: Vec<IpAddr>) -> anyhow::Result<Pinger> {
    let mut builder = Builder::new(targets)
        .interval(args.interval)
        .reply_timeout(args.timeout)
        .addr_family(make_addr_family(args))
        .numeric(args.numeric);
    builder = match &args.data {
        Some(data) => builder.payload(data.clone().into_bytes()),
        None => builder.payload_size(args.size),
    };
    if let Some(ttl) = args.ttl {
        builder = builder.time_to_live(ttl);
    }
    Ok(builder.build()?)
}

/// A `NameSource` which resolves names via the shared DNS resolver.
struct DnsNames<'a> {
    resolver: &'a DnsResolver,
}

impl<'a> DnsNames<'a> {
    const fn new(resolver: &'a DnsResolver) -> Self {
        Self { resolver }
    }
}

impl NameSource for DnsNames<'_> {
    fn submit(&self, token: u64, addr: IpAddr, numeric: bool) {
        self.resolver.submit(token, addr, numeric);
    }

    fn wait_fd(&self) -> Option<RawFd> {
        Some(self.resolver.wait_fd())
    }

    fn drain(&self) -> Vec<Resolution> {
        self.resolver
            .poll_completions()
            .into_iter()
            .map(|(token, entry)| Resolution {
                token,
                name: display_name(&entry),
            })
            .collect()
    }

    fn pending(&self) -> usize {
        self.resolver.pending()
    }
}

/// The display name for a completed reverse resolution.
///
/// A missing reverse entry degrades to the numeric address, a failed or
/// timed out lookup to the unresolved placeholder.
fn display_name(entry: &DnsEntry) -> String {
    match entry {
        DnsEntry::Resolved(addr, hostnames) => hostnames
            .first()
            .map_or_else(|| addr.to_string(), Clone::clone),
        DnsEntry::NotFound(addr) => addr.to_string(),
        DnsEntry::Failed(_) | DnsEntry::Timeout(_) => String::from(UNRESOLVED_NAME),
    }
}

/// Install the global tracing subscriber.
fn configure_logging(args: &Args) {
    if args.verbose {
        let fmt_span = match args.log_span_events {
            LogSpanEvents::Off => FmtSpan::NONE,
            LogSpanEvents::Active => FmtSpan::ACTIVE,
            LogSpanEvents::Full => FmtSpan::FULL,
        };
        match args.log_format {
            LogFormat::Compact => {
                tracing_subscriber::fmt()
                    .with_span_events(fmt_span)
                    .with_env_filter(&args.log_filter)
                    .compact()
                    .init();
            }
            LogFormat::Pretty => {
                tracing_subscriber::fmt()
                    .with_span_events(fmt_span)
                    .with_env_filter(&args.log_filter)
                    .pretty()
                    .init();
            }
            LogFormat::Json => {
                tracing_subscriber::fmt()
                    .with_span_events(fmt_span)
                    .with_env_filter(&args.log_filter)
                    .json()
                    .init();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pingfan_core::TimeToLive;
    use std::time::Duration;
    use test_case::test_case;

    fn parse(cmd: &str) -> Args {
        Args::try_parse_from(cmd.split(' ').map(std::ffi::OsString::from)).unwrap()
    }

    fn ipv4() -> IpAddr {
        IpAddr::from_str("192.0.2.1").unwrap()
    }

    fn ipv6() -> IpAddr {
        IpAddr::from_str("2001:db8::1").unwrap()
    }

    #[test_case("pingfan example.com", AddrFamily::Dual; "default dual")]
    #[test_case("pingfan -4 example.com", AddrFamily::Ipv4; "ipv4 only")]
    #[test_case("pingfan -6 example.com", AddrFamily::Ipv6; "ipv6 only")]
    fn test_make_addr_family(cmd: &str, expected: AddrFamily) {
        assert_eq!(expected, make_addr_family(&parse(cmd)));
    }

    #[test_case("pingfan example.com", IpAddrFamily::Ipv4thenIpv6; "default prefers ipv4")]
    #[test_case("pingfan -4 example.com", IpAddrFamily::Ipv4Only; "ipv4 only")]
    #[test_case("pingfan -6 example.com", IpAddrFamily::Ipv6Only; "ipv6 only")]
    fn test_make_lookup_family(cmd: &str, expected: IpAddrFamily) {
        assert_eq!(expected, make_lookup_family(&parse(cmd)));
    }

    #[test]
    fn test_family_allows() {
        assert!(family_allows(&parse("pingfan x"), ipv4()));
        assert!(family_allows(&parse("pingfan x"), ipv6()));
        assert!(family_allows(&parse("pingfan -4 x"), ipv4()));
        assert!(!family_allows(&parse("pingfan -4 x"), ipv6()));
        assert!(!family_allows(&parse("pingfan -6 x"), ipv4()));
        assert!(family_allows(&parse("pingfan -6 x"), ipv6()));
    }

    #[test]
    fn test_make_pinger_config() -> anyhow::Result<()> {
        let args = parse("pingfan -i 0.5 -w 100ms -t 64 -n 192.0.2.1");
        let pinger = make_pinger(&args, vec![ipv4()])?;
        assert_eq!(vec![ipv4()], pinger.targets());
        assert_eq!(Duration::from_millis(500), pinger.strategy().interval);
        assert_eq!(Duration::from_millis(100), pinger.strategy().reply_timeout);
        assert!(pinger.strategy().numeric);
        assert_eq!(Some(TimeToLive(64)), pinger.channel().ttl);
        Ok(())
    }

    #[test]
    fn test_make_pinger_payload_size() -> anyhow::Result<()> {
        let pinger = make_pinger(&parse("pingfan -s 4 192.0.2.1"), vec![ipv4()])?;
        assert_eq!(vec![32, 33, 34, 35], pinger.payload());
        Ok(())
    }

    #[test]
    fn test_make_pinger_payload_data() -> anyhow::Result<()> {
        let pinger = make_pinger(&parse("pingfan -d hello -s 4 192.0.2.1"), vec![ipv4()])?;
        assert_eq!(b"hello".to_vec(), pinger.payload());
        Ok(())
    }

    #[test]
    fn test_resolve_numeric_targets() -> anyhow::Result<()> {
        let resolver = DnsResolver::start(pingfan_dns::Config::default())?;
        let args = parse("pingfan -N 192.0.2.1 2001:db8::1");
        let addrs = resolve_targets(&args, &resolver)?;
        assert_eq!(vec![ipv4(), ipv6()], addrs);
        Ok(())
    }

    #[test]
    fn test_resolve_numeric_targets_rejects_hostname() -> anyhow::Result<()> {
        let resolver = DnsResolver::start(pingfan_dns::Config::default())?;
        let args = parse("pingfan -N example.com");
        let err = resolve_targets(&args, &resolver).unwrap_err();
        assert_eq!("example.com is not a valid IP address", err.to_string());
        Ok(())
    }

    #[test]
    fn test_resolve_numeric_targets_rejects_family_mismatch() -> anyhow::Result<()> {
        let resolver = DnsResolver::start(pingfan_dns::Config::default())?;
        let args = parse("pingfan -N -6 192.0.2.1");
        let err = resolve_targets(&args, &resolver).unwrap_err();
        assert_eq!(
            "no address for 192.0.2.1 for address family ipv6",
            err.to_string()
        );
        Ok(())
    }

    #[test]
    fn test_display_name_resolved() {
        let entry = DnsEntry::Resolved(
            ipv4(),
            vec![String::from("example.com"), String::from("example.net")],
        );
        assert_eq!("example.com", display_name(&entry));
    }

    #[test]
    fn test_display_name_resolved_empty() {
        let entry = DnsEntry::Resolved(ipv4(), vec![]);
        assert_eq!("192.0.2.1", display_name(&entry));
    }

    #[test]
    fn test_display_name_not_found() {
        assert_eq!("192.0.2.1", display_name(&DnsEntry::NotFound(ipv4())));
    }

    #[test]
    fn test_display_name_failed() {
        assert_eq!("???", display_name(&DnsEntry::Failed(ipv4())));
        assert_eq!("???", display_name(&DnsEntry::Timeout(ipv6())));
    }
}
