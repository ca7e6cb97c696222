//! An asynchronous forward and reverse DNS resolver for `pingfan`.
//!
//! Reverse resolutions are performed by a pool of background worker threads
//! and never block the caller.  Each submission carries a caller supplied
//! token which is returned with the completion, and completed resolutions are
//! signalled on a file descriptor so that callers may multiplex the resolver
//! with other event sources.
//!
//! # Example
//!
//! Submit a reverse resolution and collect the completion:
//!
//! ```no_run
//! use pingfan_dns::{Config, DnsResolver};
//! use std::net::{IpAddr, Ipv4Addr};
//!
//! # fn main() -> anyhow::Result<()> {
//! let resolver = DnsResolver::start(Config::default())?;
//! resolver.submit(1, IpAddr::V4(Ipv4Addr::new(1, 1, 1, 1)), false);
//! while resolver.pending() > 0 {
//!     for (token, entry) in resolver.poll_completions() {
//!         println!("{token}: {entry}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The [`DnsResolver::wait_fd`] file descriptor becomes readable when
//! completions are waiting and may be added to a `select` or `poll` set to
//! avoid the busy wait shown above.
#![warn(clippy::all, clippy::pedantic, clippy::nursery, rust_2018_idioms)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![forbid(unsafe_code)]

mod config;
mod resolver;
mod service;

pub use config::{
    Builder, Config, IpAddrFamily, ResolveMethod, DEFAULT_ADDR_FAMILY, DEFAULT_RESOLVE_METHOD,
    DEFAULT_TIMEOUT,
};
pub use resolver::{DnsEntry, Error, Result};
pub use service::DnsResolver;
