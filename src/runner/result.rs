//! Requests and results of container command runs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A single command to run against a case directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    /// Host directory mounted into the container.
    pub working_directory: PathBuf,
    /// Command executed after the environment bootstrap.
    pub command: String,
    /// Image override; the runner's configured image when unset.
    pub image: Option<String>,
    /// `uid:gid` to run as; the host identity when unset.
    pub user: Option<String>,
}

impl RunRequest {
    /// Creates a request using the runner's image and the host identity.
    pub fn new(working_directory: impl Into<PathBuf>, command: impl Into<String>) -> Self {
        Self {
            working_directory: working_directory.into(),
            command: command.into(),
            image: None,
            user: None,
        }
    }

    /// Sets the image for this request only.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Sets the user to run as.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }
}

/// Outcome of a command that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    /// ID of the (already removed) container.
    pub container_id: String,
    /// Exit code of the command.
    pub exit_code: i64,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
    /// Both streams interleaved.
    pub output: String,
}

impl RunResult {
    /// Returns true if the command exited with code 0.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}
