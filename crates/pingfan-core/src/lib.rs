//! Pingfan - a concurrent ping library.
//!
//! This crate provides the core probing facility used by the standalone
//! `pingfan` application.
//!
//! A single run sends one `ICMP` (or `ICMPv6`) echo request to each of a
//! set of target addresses, paced by a send interval, and collects the
//! replies concurrently rather than waiting for each target in turn.  Every
//! target produces exactly one report carrying the resolved name of the
//! responder, the round trip time and the reply count, whether it answered,
//! timed out or the run was interrupted.
//!
//! # Example
//!
//! The following example builds and runs a pinger with default
//! configuration and prints the report for each target:
//!
//! ```no_run
//! # fn main() -> anyhow::Result<()> {
//! # use std::net::IpAddr;
//! # use std::str::FromStr;
//! use pingfan_core::Builder;
//!
//! let targets = vec![IpAddr::from_str("1.1.1.1")?, IpAddr::from_str("8.8.8.8")?];
//! Builder::new(targets)
//!     .build()?
//!     .run(|report| println!("{report}"))?;
//! # Ok(())
//! # }
//! ```
//!
//! Hostname resolution is pluggable via the [`NameSource`] trait so that
//! reports can carry reverse resolved names; [`Pinger::run`] uses the
//! built-in [`NumericNames`] source which formats addresses numerically.
//!
//! Raw sockets are used for `ICMP` and so the process requires
//! `CAP_NET_RAW` (or root) on Linux.
//!
//! # See Also
//!
//! - [`Builder`] - Build a [`Pinger`].
//! - [`Pinger::run`] - Run the pinger with numeric reports.
//! - [`Pinger::run_with`] - Run the pinger with a custom name source.
#![warn(clippy::all, clippy::pedantic, clippy::nursery, rust_2018_idioms)]
#![allow(
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::use_self,
    clippy::option_if_let_else,
    clippy::missing_const_for_fn,
    clippy::cast_possible_truncation,
    clippy::missing_errors_doc
)]
#![deny(unsafe_code)]

mod builder;
mod config;
mod error;
mod net;
mod pinger;
mod probe;
mod resolve;
mod signal;
mod strategy;
mod table;
mod timer;
mod types;
mod wait;

pub use builder::Builder;
pub use config::{defaults, AddrFamily, ChannelConfig, StrategyConfig, MAX_PAYLOAD_SIZE};
pub use error::{Error, ErrorKind, IoError, IoOperation, IoResult, Result};
pub use pinger::Pinger;
pub use probe::{Outcome, Probe, ProbeReport, ProbeResponse};
pub use resolve::{NameSource, NumericNames, Resolution, UNRESOLVED_NAME};
pub use signal::block_signals;
pub use types::{ProbeId, Sequence, TimeToLive};
