//! Command-line interface for awesome-foamlib.
//!
//! Provides commands for running OpenFOAM commands in containers, pulling the
//! image, inspecting container stats and fetching tutorial cases.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli, Commands};
