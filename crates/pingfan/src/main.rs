#![warn(clippy::all, clippy::pedantic, clippy::nursery, rust_2018_idioms)]
#![allow(
    clippy::module_name_repetitions,
    clippy::option_if_let_else,
    clippy::missing_const_for_fn,
    clippy::struct_excessive_bools
)]
#![forbid(unsafe_code)]

use crate::args::Args;
use clap::Parser;

mod app;
mod args;
mod privilege;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    app::run_pingfan(&args)
}
