//! awesome-foamlib: run OpenFOAM commands in short-lived Docker containers.
//!
//! The [`runner`] mounts a case directory into an OpenFOAM image, runs a
//! command under the caller's uid:gid with the OpenFOAM environment sourced,
//! and removes the container afterwards. The Docker daemon is reached through
//! the [`execution::ContainerRuntime`] trait.

pub mod cli;
pub mod error;
pub mod execution;
pub mod runner;
pub mod tutorial;

// Re-export commonly used types
pub use error::{RunnerError, TutorialError};
pub use execution::{ContainerRuntime, DockerRuntime};
pub use runner::{FoamRunner, RunRequest, RunResult, RunnerConfig};
