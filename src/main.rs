//! Scrobble Charts - weekly and yearly charts from Last.fm listening history.
//!
//! Imports a user's scrobbles one ISO year at a time into a local SQLite
//! database, then ranks tracks per week by plays and per year by weekly
//! chart points.

pub mod calendar;
pub mod charts;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod import;
pub mod model;
pub mod source;
#[cfg(test)]
pub mod test_utils;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("scrobble_charts=info".parse()?))
        .init();

    cli::run_command(&args)
}
