//! The container runtime capability consumed by the runner.
//!
//! The runner only needs a handful of daemon operations. Keeping them behind
//! [`ContainerRuntime`] lets identity resolution, command composition and the
//! cleanup guarantee be exercised against an in-memory runtime.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::RunnerError;

/// Raw resource metrics reported by the runtime for one container.
pub type ContainerStats = serde_json::Map<String, serde_json::Value>;

/// Everything the runtime needs to create one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    /// Unique container name.
    pub name: String,
    /// Image to create the container from.
    pub image: String,
    /// Command argv.
    pub cmd: Vec<String>,
    /// Working directory inside the container.
    pub working_dir: String,
    /// Host directories mounted into the container.
    pub mounts: Vec<BindMount>,
    /// User to run as (e.g., "1000:1000").
    pub user: String,
    /// Labels attached to the container.
    pub labels: HashMap<String, String>,
}

/// A host directory exposed inside the container.
///
/// Kept structured so paths containing `:` survive intact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindMount {
    /// Absolute host path.
    pub source: String,
    /// Absolute path inside the container.
    pub target: String,
    pub read_only: bool,
}

/// Output collected from a container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerLogs {
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
    /// Both streams, interleaved in arrival order.
    pub combined: String,
}

impl ContainerLogs {
    /// Appends a stdout chunk.
    pub fn push_stdout(&mut self, chunk: &str) {
        self.stdout.push_str(chunk);
        self.combined.push_str(chunk);
    }

    /// Appends a stderr chunk.
    pub fn push_stderr(&mut self, chunk: &str) {
        self.stderr.push_str(chunk);
        self.combined.push_str(chunk);
    }
}

/// Daemon operations used by the runner.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Checks that the daemon answers.
    async fn ping(&self) -> Result<(), RunnerError>;

    /// Returns true when the image is available locally.
    async fn image_exists(&self, image: &str) -> Result<bool, RunnerError>;

    /// Pulls an image from its registry.
    async fn pull_image(&self, image: &str) -> Result<(), RunnerError>;

    /// Creates a container and returns its ID.
    async fn create_container(&self, spec: &ContainerSpec) -> Result<String, RunnerError>;

    /// Starts a created container.
    async fn start_container(&self, id: &str) -> Result<(), RunnerError>;

    /// Follows the container's output until it exits.
    async fn container_logs(&self, id: &str) -> Result<ContainerLogs, RunnerError>;

    /// Waits for the container to stop and returns its exit code.
    async fn wait_container(&self, id: &str) -> Result<i64, RunnerError>;

    /// Removes the container. Removing an already-gone container succeeds.
    async fn remove_container(&self, id: &str) -> Result<(), RunnerError>;

    /// Takes a one-shot resource snapshot of a container.
    async fn container_stats(&self, id: &str) -> Result<ContainerStats, RunnerError>;
}
