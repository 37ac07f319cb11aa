//! Error types for awesome-foamlib operations.
//!
//! Defines error types for the two subsystems:
//! - Container command execution (runner and runtime)
//! - Tutorial case fetching

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while running commands in containers.
///
/// Every variant propagates to the caller; the runner never retries on its own.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Container runtime not reachable: {0}")]
    Connection(String),

    #[error("Image '{image}' not found")]
    ImageNotFound { image: String },

    #[error("Command exited with non-zero code {exit_code}")]
    Container { exit_code: i64, output: String },

    #[error("Invalid working directory '{}': {reason}", path.display())]
    Path { path: PathBuf, reason: String },

    #[error("Container '{id}' not found")]
    ContainerNotFound { id: String },

    #[error("Container runtime error: {0}")]
    Runtime(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl RunnerError {
    /// Returns true when pulling the image and retrying could succeed.
    pub fn is_image_not_found(&self) -> bool {
        matches!(self, RunnerError::ImageNotFound { .. })
    }

    /// Exit code reported by the container, if the command ran at all.
    pub fn exit_code(&self) -> Option<i64> {
        match self {
            RunnerError::Container { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }

    /// Captured container output for failed commands.
    pub fn output(&self) -> Option<&str> {
        match self {
            RunnerError::Container { output, .. } => Some(output),
            _ => None,
        }
    }
}

/// Errors that can occur while fetching tutorial cases.
#[derive(Debug, Error)]
pub enum TutorialError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to download tutorial: {0}")]
    Download(String),
}
