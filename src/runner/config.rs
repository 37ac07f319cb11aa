//! Configuration for the container command runner.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RunnerError;

/// Default OpenFOAM image.
pub const DEFAULT_IMAGE: &str = "opencfd/openfoam-default:2406";

/// Path inside the container where the case directory is mounted.
pub const DEFAULT_MOUNT_TARGET: &str = "/home/openfoam/project";

/// Shell used to run the composite command.
pub const DEFAULT_SHELL: &str = "/bin/bash";

/// Sources the OpenFOAM environment; the wildcard matches the versioned install dir.
pub const DEFAULT_BOOTSTRAP: &str = "source /usr/lib/openfoam/openfoam*/etc/bashrc";

/// Prefix for generated container names.
pub const DEFAULT_CONTAINER_PREFIX: &str = "foam-run";

/// Runner configuration, fixed once the runner is constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Docker image to run commands in.
    pub image: String,
    /// Mount point of the case directory inside the container.
    pub mount_target: String,
    /// Shell invoked with `-c`.
    pub shell: String,
    /// Environment prologue executed before every command.
    pub bootstrap: String,
    /// Prefix for container names.
    pub container_prefix: String,
}

impl RunnerConfig {
    /// Creates a configuration using the given image and defaults elsewhere.
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            ..Self::default()
        }
    }

    /// Loads a configuration from a YAML file. Missing fields take their defaults.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, RunnerError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            RunnerError::Config(format!("Failed to read '{}': {e}", path.display()))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parses a configuration from YAML text.
    pub fn from_yaml_str(content: &str) -> Result<Self, RunnerError> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| RunnerError::Config(format!("Failed to parse YAML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the Docker image.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Sets the in-container mount point.
    pub fn with_mount_target(mut self, target: impl Into<String>) -> Self {
        self.mount_target = target.into();
        self
    }

    /// Sets the shell used to run commands.
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    /// Sets the environment bootstrap prologue.
    pub fn with_bootstrap(mut self, bootstrap: impl Into<String>) -> Self {
        self.bootstrap = bootstrap.into();
        self
    }

    /// Sets the prefix of generated container names.
    pub fn with_container_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.container_prefix = prefix.into();
        self
    }

    /// Checks that the configuration can produce a runnable container.
    pub fn validate(&self) -> Result<(), RunnerError> {
        if self.image.trim().is_empty() {
            return Err(RunnerError::Config("image cannot be empty".to_string()));
        }
        if !self.mount_target.starts_with('/') {
            return Err(RunnerError::Config(format!(
                "mount_target '{}' must be an absolute path",
                self.mount_target
            )));
        }
        if self.shell.trim().is_empty() {
            return Err(RunnerError::Config("shell cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Builds the argv executed in the container: the bootstrap, then the command.
    pub fn compose_command(&self, command: &str) -> Vec<String> {
        let script = if self.bootstrap.trim().is_empty() {
            command.to_string()
        } else {
            format!("{} && {}", self.bootstrap, command)
        };
        vec![self.shell.clone(), "-c".to_string(), script]
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            image: DEFAULT_IMAGE.to_string(),
            mount_target: DEFAULT_MOUNT_TARGET.to_string(),
            shell: DEFAULT_SHELL.to_string(),
            bootstrap: DEFAULT_BOOTSTRAP.to_string(),
            container_prefix: DEFAULT_CONTAINER_PREFIX.to_string(),
        }
    }
}
