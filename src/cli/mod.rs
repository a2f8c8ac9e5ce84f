//! Command-line interface for scrobble-charts.
//!
//! This module provides the `import`, `weekly` and `yearly` commands.

mod commands;

pub use commands::{Cli, Commands, run_command};
