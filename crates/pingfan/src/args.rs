use clap::builder::Styles;
use clap::{Parser, ValueEnum};
use pingfan_core::defaults;
use std::time::Duration;

/// Ping all targets concurrently and report each round trip
#[expect(clippy::doc_markdown)]
#[derive(Parser, Debug)]
#[command(name = "pingfan", author, version, about, long_about = None, arg_required_else_help(true), styles = Styles::styled())]
pub struct Args {
    /// A space delimited list of hostnames and IPs to ping
    #[arg(required = true)]
    pub targets: Vec<String>,

    /// The period of time between each echo request
    #[arg(short = 'i', long, default_value = "1s", value_parser = parse_duration)]
    pub interval: Duration,

    /// The period of time to wait for replies after the last echo request
    #[arg(short = 'w', long, default_value = "10ms", value_parser = parse_duration)]
    pub timeout: Duration,

    /// The size of the echo request payload in bytes
    #[arg(short = 's', long, default_value_t = defaults::DEFAULT_PAYLOAD_SIZE)]
    pub size: usize,

    /// The literal echo request payload, overrides --size
    #[arg(short = 'd', long)]
    pub data: Option<String>,

    /// The time-to-live of outgoing packets [default: OS default]
    #[arg(short = 't', long)]
    pub ttl: Option<u8>,

    /// Do not reverse resolve responder addresses to hostnames
    #[arg(short = 'n', long)]
    pub numeric: bool,

    /// Require targets to be IP addresses, do not forward resolve
    #[arg(short = 'N', long)]
    pub numeric_targets: bool,

    /// Ping IPv4 targets only
    #[arg(short = '4', long, conflicts_with = "ipv6")]
    pub ipv4: bool,

    /// Ping IPv6 targets only
    #[arg(short = '6', long, conflicts_with = "ipv4")]
    pub ipv6: bool,

    /// How to perform DNS queries
    #[arg(value_enum, short = 'r', long, default_value = "system")]
    pub dns_resolve_method: DnsResolveMethod,

    /// The maximum time to wait to perform DNS queries
    #[arg(long, default_value = "5s", value_parser = parse_duration)]
    pub dns_timeout: Duration,

    /// The debug log format
    #[arg(value_enum, long, default_value = "compact")]
    pub log_format: LogFormat,

    /// The debug log filter
    #[arg(long, default_value = "pingfan=debug")]
    pub log_filter: String,

    /// The debug log span events
    #[arg(value_enum, long, default_value = "off")]
    pub log_span_events: LogSpanEvents,

    /// Enable verbose debug logging
    #[arg(short = 'v', long, default_value_t = false)]
    pub verbose: bool,
}

/// How DNS queries will be resolved.
#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
pub enum DnsResolveMethod {
    /// Resolve using the OS resolver.
    System,
    /// Resolve using the `/etc/resolv.conf` DNS configuration.
    Resolv,
    /// Resolve using the Google `8.8.8.8` DNS service.
    Google,
    /// Resolve using the Cloudflare `1.1.1.1` DNS service.
    Cloudflare,
}

impl From<DnsResolveMethod> for pingfan_dns::ResolveMethod {
    fn from(value: DnsResolveMethod) -> Self {
        match value {
            DnsResolveMethod::System => Self::System,
            DnsResolveMethod::Resolv => Self::Resolv,
            DnsResolveMethod::Google => Self::Google,
            DnsResolveMethod::Cloudflare => Self::Cloudflare,
        }
    }
}

/// How to format log data.
#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
pub enum LogFormat {
    /// Display log data in a compact format.
    Compact,
    /// Display log data in a pretty format.
    Pretty,
    /// Display log data in a json format.
    Json,
}

/// How to log event spans.
#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
pub enum LogSpanEvents {
    /// Do not display event spans.
    Off,
    /// Display enter and exit event spans.
    Active,
    /// Display all event spans.
    Full,
}

/// Parse a duration from either a humantime form or bare fractional seconds.
fn parse_duration(value: &str) -> anyhow::Result<Duration> {
    match humantime::parse_duration(value) {
        Ok(duration) => Ok(duration),
        Err(_) => Ok(Duration::try_from_secs_f64(value.parse()?)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn parse(cmd: &str) -> anyhow::Result<Args> {
        Ok(Args::try_parse_from(
            cmd.split(' ').map(std::ffi::OsString::from),
        )?)
    }

    #[test]
    fn test_default() -> anyhow::Result<()> {
        let args = parse("pingfan example.com")?;
        assert_eq!(vec![String::from("example.com")], args.targets);
        assert_eq!(Duration::from_secs(1), args.interval);
        assert_eq!(Duration::from_millis(10), args.timeout);
        assert_eq!(56, args.size);
        assert_eq!(None, args.data);
        assert_eq!(None, args.ttl);
        assert!(!args.numeric);
        assert!(!args.numeric_targets);
        assert!(!args.ipv4);
        assert!(!args.ipv6);
        assert_eq!(DnsResolveMethod::System, args.dns_resolve_method);
        assert_eq!(Duration::from_secs(5), args.dns_timeout);
        assert_eq!(LogFormat::Compact, args.log_format);
        assert_eq!("pingfan=debug", args.log_filter);
        assert_eq!(LogSpanEvents::Off, args.log_span_events);
        assert!(!args.verbose);
        Ok(())
    }

    #[test]
    fn test_multiple_targets() -> anyhow::Result<()> {
        let args = parse("pingfan example.com 192.0.2.1 2001:db8::1")?;
        assert_eq!(
            vec![
                String::from("example.com"),
                String::from("192.0.2.1"),
                String::from("2001:db8::1")
            ],
            args.targets
        );
        Ok(())
    }

    #[test]
    fn test_no_targets() {
        assert!(parse("pingfan").is_err());
    }

    #[test_case("pingfan -w 250ms example.com", Duration::from_millis(250); "humantime short")]
    #[test_case("pingfan --timeout 2s example.com", Duration::from_secs(2); "humantime long")]
    #[test_case("pingfan -w 0.5 example.com", Duration::from_millis(500); "fractional seconds")]
    #[test_case("pingfan -w 3 example.com", Duration::from_secs(3); "whole seconds")]
    fn test_timeout(cmd: &str, expected: Duration) {
        assert_eq!(expected, parse(cmd).unwrap().timeout);
    }

    #[test_case("pingfan -i 100ms example.com", Duration::from_millis(100); "humantime short")]
    #[test_case("pingfan --interval 0.25 example.com", Duration::from_millis(250); "fractional seconds")]
    fn test_interval(cmd: &str, expected: Duration) {
        assert_eq!(expected, parse(cmd).unwrap().interval);
    }

    #[test_case("pingfan -w abc example.com"; "not a duration")]
    #[test_case("pingfan --timeout=-1 example.com"; "negative seconds")]
    fn test_invalid_duration(cmd: &str) {
        assert!(parse(cmd).is_err());
    }

    #[test]
    fn test_payload_size() -> anyhow::Result<()> {
        assert_eq!(120, parse("pingfan -s 120 example.com")?.size);
        Ok(())
    }

    #[test]
    fn test_payload_data() -> anyhow::Result<()> {
        let args = parse("pingfan -d hello -s 10 example.com")?;
        assert_eq!(Some(String::from("hello")), args.data);
        assert_eq!(10, args.size);
        Ok(())
    }

    #[test]
    fn test_ttl() -> anyhow::Result<()> {
        assert_eq!(Some(64), parse("pingfan -t 64 example.com")?.ttl);
        assert!(parse("pingfan -t 256 example.com").is_err());
        Ok(())
    }

    #[test]
    fn test_numeric_flags() -> anyhow::Result<()> {
        let args = parse("pingfan -n -N example.com")?;
        assert!(args.numeric);
        assert!(args.numeric_targets);
        Ok(())
    }

    #[test_case("pingfan -4 example.com", true, false; "ipv4 only")]
    #[test_case("pingfan -6 example.com", false, true; "ipv6 only")]
    fn test_addr_family(cmd: &str, ipv4: bool, ipv6: bool) {
        let args = parse(cmd).unwrap();
        assert_eq!(ipv4, args.ipv4);
        assert_eq!(ipv6, args.ipv6);
    }

    #[test]
    fn test_addr_family_conflict() {
        assert!(parse("pingfan -4 -6 example.com").is_err());
    }

    #[test_case("pingfan -r system example.com", DnsResolveMethod::System; "system")]
    #[test_case("pingfan -r resolv example.com", DnsResolveMethod::Resolv; "resolv")]
    #[test_case("pingfan -r google example.com", DnsResolveMethod::Google; "google")]
    #[test_case("pingfan --dns-resolve-method cloudflare example.com", DnsResolveMethod::Cloudflare; "cloudflare")]
    fn test_dns_resolve_method(cmd: &str, expected: DnsResolveMethod) {
        assert_eq!(expected, parse(cmd).unwrap().dns_resolve_method);
    }

    #[test_case(DnsResolveMethod::System, pingfan_dns::ResolveMethod::System; "system")]
    #[test_case(DnsResolveMethod::Resolv, pingfan_dns::ResolveMethod::Resolv; "resolv")]
    #[test_case(DnsResolveMethod::Google, pingfan_dns::ResolveMethod::Google; "google")]
    #[test_case(DnsResolveMethod::Cloudflare, pingfan_dns::ResolveMethod::Cloudflare; "cloudflare")]
    fn test_resolve_method_conversion(
        method: DnsResolveMethod,
        expected: pingfan_dns::ResolveMethod,
    ) {
        assert_eq!(expected, pingfan_dns::ResolveMethod::from(method));
    }

    #[test]
    fn test_logging_flags() -> anyhow::Result<()> {
        let args = parse(
            "pingfan -v --log-format json --log-filter pingfan=trace --log-span-events full example.com",
        )?;
        assert!(args.verbose);
        assert_eq!(LogFormat::Json, args.log_format);
        assert_eq!("pingfan=trace", args.log_filter);
        assert_eq!(LogSpanEvents::Full, args.log_span_events);
        Ok(())
    }
}
