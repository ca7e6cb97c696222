use std::time::Duration;

/// The default method used to resolve DNS queries.
pub const DEFAULT_RESOLVE_METHOD: ResolveMethod = ResolveMethod::System;

/// The default address family used for forward lookups.
pub const DEFAULT_ADDR_FAMILY: IpAddrFamily = IpAddrFamily::Ipv4thenIpv6;

/// The default timeout for DNS queries.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// How DNS queries will be resolved.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ResolveMethod {
    /// Resolve using the OS resolver.
    System,
    /// Resolve using the `/etc/resolv.conf` DNS configuration.
    Resolv,
    /// Resolve using the Google `8.8.8.8` DNS service.
    Google,
    /// Resolve using the Cloudflare `1.1.1.1` DNS service.
    Cloudflare,
}

/// How to resolve IP addresses.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum IpAddrFamily {
    /// Lookup IPv4 only.
    Ipv4Only,
    /// Lookup IPv6 only.
    Ipv6Only,
    /// Lookup IPv6 with a fallback to IPv4.
    Ipv6thenIpv4,
    /// Lookup IPv4 with a fallback to IPv6.
    Ipv4thenIpv6,
    /// Use the address ordering returned by the OS resolver when using
    /// `ResolveMethod::System`, otherwise lookup IPv4 with a fallback to IPv6.
    System,
}

/// Build a resolver `Config`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Builder {
    config: Config,
}

impl Builder {
    /// Create a resolver config `Builder`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            config: Config::new(),
        }
    }

    /// Set the method used to resolve DNS queries.
    #[must_use]
    pub const fn resolve_method(self, resolve_method: ResolveMethod) -> Self {
        Self {
            config: Config {
                resolve_method,
                ..self.config
            },
        }
    }

    /// Set the address family used for forward lookups.
    #[must_use]
    pub const fn addr_family(self, addr_family: IpAddrFamily) -> Self {
        Self {
            config: Config {
                addr_family,
                ..self.config
            },
        }
    }

    /// Set the timeout for DNS queries.
    #[must_use]
    pub const fn timeout(self, timeout: Duration) -> Self {
        Self {
            config: Config {
                timeout,
                ..self.config
            },
        }
    }

    /// Build the resolver `Config`.
    #[must_use]
    pub const fn build(self) -> Config {
        self.config
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

/// The resolver configuration.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Config {
    /// The method used to resolve DNS queries.
    pub resolve_method: ResolveMethod,
    /// The address family used for forward lookups.
    pub addr_family: IpAddrFamily,
    /// The timeout for DNS queries.
    pub timeout: Duration,
}

impl Config {
    /// Create a `Config` with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            resolve_method: DEFAULT_RESOLVE_METHOD,
            addr_family: DEFAULT_ADDR_FAMILY,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create a resolver config `Builder`.
    #[must_use]
    pub const fn builder() -> Builder {
        Builder::new()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(ResolveMethod::System, config.resolve_method);
        assert_eq!(IpAddrFamily::Ipv4thenIpv6, config.addr_family);
        assert_eq!(Duration::from_secs(5), config.timeout);
    }

    #[test]
    fn test_config_builder() {
        let config = Config::builder()
            .resolve_method(ResolveMethod::Cloudflare)
            .addr_family(IpAddrFamily::Ipv6Only)
            .timeout(Duration::from_millis(100))
            .build();
        assert_eq!(ResolveMethod::Cloudflare, config.resolve_method);
        assert_eq!(IpAddrFamily::Ipv6Only, config.addr_family);
        assert_eq!(Duration::from_millis(100), config.timeout);
    }
}
