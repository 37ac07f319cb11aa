//! Container command runner for OpenFOAM cases.
//!
//! # Architecture
//!
//! ```text
//! case dir + command → validate dir → resolve uid:gid → compose bootstrap command
//!                    → create → start → stream logs → wait → remove
//! ```
//!
//! The container is removed on every path once it has been created.
//!
//! # Example
//!
//! ```ignore
//! use awesome_foamlib::runner::blocking::FoamRunner;
//!
//! let runner = FoamRunner::connect_default()?;
//! runner.pull_image()?;
//! runner.run("./cavity", "blockMesh", None)?;
//! let result = runner.run("./cavity", "icoFoam", None)?;
//! println!("{}", result.output);
//! ```

pub mod blocking;
pub mod config;
pub mod executor;
mod guard;
pub mod identity;
pub mod result;

#[cfg(test)]
mod fake;

pub use config::RunnerConfig;
pub use executor::{FoamRunner, RUN_LABEL};
pub use identity::{resolve_user, HostIdentity};
pub use result::{RunRequest, RunResult};
