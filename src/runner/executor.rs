//! Container command runner.
//!
//! Each call to [`FoamRunner::run`] creates one container, runs the command
//! in it and removes it again, whatever the outcome.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::RunnerError;
use crate::execution::{
    BindMount, ContainerLogs, ContainerRuntime, ContainerSpec, ContainerStats, DockerRuntime,
};
use crate::runner::config::RunnerConfig;
use crate::runner::guard::ContainerGuard;
use crate::runner::identity::resolve_user;
use crate::runner::result::{RunRequest, RunResult};

/// Label attached to every container the runner creates.
pub const RUN_LABEL: &str = "awesome-foamlib.run";

/// Runs OpenFOAM commands in short-lived containers.
pub struct FoamRunner<R = DockerRuntime> {
    runtime: Arc<R>,
    config: RunnerConfig,
}

impl FoamRunner<DockerRuntime> {
    /// Connects to the local Docker daemon.
    ///
    /// # Errors
    ///
    /// Returns `RunnerError::Connection` if the daemon is unreachable and
    /// `RunnerError::Config` if the configuration is invalid.
    pub async fn connect(config: RunnerConfig) -> Result<Self, RunnerError> {
        config.validate()?;
        let runtime = DockerRuntime::connect().await?;
        info!(image = %config.image, "Connected to Docker daemon");
        Ok(Self {
            runtime: Arc::new(runtime),
            config,
        })
    }
}

impl<R: ContainerRuntime + 'static> FoamRunner<R> {
    /// Creates a runner on top of an existing runtime.
    pub fn with_runtime(runtime: R, config: RunnerConfig) -> Result<Self, RunnerError> {
        config.validate()?;
        Ok(Self {
            runtime: Arc::new(runtime),
            config,
        })
    }

    /// Returns the runner configuration.
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Returns the configured image.
    pub fn image(&self) -> &str {
        &self.config.image
    }

    /// Returns the underlying runtime.
    pub fn runtime(&self) -> &R {
        self.runtime.as_ref()
    }

    /// Pulls the configured image unless it is already available locally.
    ///
    /// # Errors
    ///
    /// Returns `RunnerError::ImageNotFound` if the registry has no such image.
    pub async fn pull_image(&self) -> Result<(), RunnerError> {
        let image = self.config.image.as_str();

        if self.runtime.image_exists(image).await? {
            info!(image = %image, "Image already present");
            return Ok(());
        }

        info!(image = %image, "Pulling image");
        match self.runtime.pull_image(image).await {
            Ok(()) => {
                info!(image = %image, "Successfully pulled image");
                Ok(())
            }
            Err(e) => {
                error!(image = %image, error = %e, "Failed to pull image");
                Err(e)
            }
        }
    }

    /// Runs `command` with `working_directory` mounted into the container.
    ///
    /// When `user` is `None` the container runs as the host's effective
    /// `uid:gid`.
    ///
    /// The runner does not retry. If the image is missing, callers can pull
    /// and try again:
    ///
    /// ```ignore
    /// let result = match runner.run(&case, "blockMesh", None).await {
    ///     Err(e) if e.is_image_not_found() => {
    ///         runner.pull_image().await?;
    ///         runner.run(&case, "blockMesh", None).await?
    ///     }
    ///     other => other?,
    /// };
    /// ```
    ///
    /// # Errors
    ///
    /// - `RunnerError::Path` if the directory is missing, not a directory, or
    ///   not valid UTF-8
    /// - `RunnerError::ImageNotFound` if the image is not available locally
    /// - `RunnerError::Container` if the command exits non-zero
    /// - `RunnerError::Runtime` for other daemon failures
    pub async fn run(
        &self,
        working_directory: impl AsRef<Path>,
        command: &str,
        user: Option<&str>,
    ) -> Result<RunResult, RunnerError> {
        let mut request = RunRequest::new(working_directory.as_ref(), command);
        request.user = user.map(str::to_string);
        self.run_request(&request).await
    }

    /// Runs a fully specified request. See [`FoamRunner::run`].
    pub async fn run_request(&self, request: &RunRequest) -> Result<RunResult, RunnerError> {
        let case_dir = validate_working_directory(&request.working_directory)?;
        let user = resolve_user(request.user.as_deref())?;
        let spec = self.container_spec(request, &case_dir, user);

        info!(
            command = %request.command,
            image = %spec.image,
            user = %spec.user,
            case = %case_dir,
            "Starting command"
        );

        let id = self.runtime.create_container(&spec).await.map_err(|e| {
            error!(container = %spec.name, error = %e, "Failed to create container");
            e
        })?;

        // From here on the guard owns the container; cancelling this future
        // at any await point still removes it.
        let guard = ContainerGuard::new(Arc::clone(&self.runtime), id.clone());
        let outcome = self.execute(guard.id()).await;
        let removal = guard.remove().await;

        let (exit_code, logs) = match (outcome, removal) {
            (Ok(done), Ok(())) => done,
            (Ok(_), Err(removal)) => {
                error!(container = %id, error = %removal, "Failed to remove container");
                return Err(removal);
            }
            (Err(e), Ok(())) => {
                error!(container = %id, error = %e, "Container run failed");
                return Err(e);
            }
            (Err(e), Err(removal)) => {
                warn!(container = %id, error = %removal, "Failed to remove container");
                error!(container = %id, error = %e, "Container run failed");
                return Err(e);
            }
        };

        if exit_code != 0 {
            warn!(container = %id, exit_code, command = %request.command, "Command failed");
            return Err(RunnerError::Container {
                exit_code,
                output: logs.combined,
            });
        }

        info!(container = %id, command = %request.command, "Command finished");

        Ok(RunResult {
            container_id: id,
            exit_code,
            stdout: logs.stdout,
            stderr: logs.stderr,
            output: logs.combined,
        })
    }

    /// Returns a point-in-time resource snapshot of a container.
    pub async fn get_container_stats(
        &self,
        container_id: &str,
    ) -> Result<ContainerStats, RunnerError> {
        self.runtime.container_stats(container_id).await
    }

    async fn execute(&self, id: &str) -> Result<(i64, ContainerLogs), RunnerError> {
        self.runtime.start_container(id).await?;
        let logs = self.runtime.container_logs(id).await?;
        let exit_code = self.runtime.wait_container(id).await?;
        Ok((exit_code, logs))
    }

    fn container_spec(
        &self,
        request: &RunRequest,
        case_dir: &str,
        user: String,
    ) -> ContainerSpec {
        let run_id = Uuid::new_v4();
        let image = request
            .image
            .clone()
            .unwrap_or_else(|| self.config.image.clone());

        let mut labels = HashMap::new();
        labels.insert(RUN_LABEL.to_string(), run_id.to_string());

        ContainerSpec {
            name: format!("{}-{}", self.config.container_prefix, run_id.simple()),
            image,
            cmd: self.config.compose_command(&request.command),
            working_dir: self.config.mount_target.clone(),
            mounts: vec![BindMount {
                source: case_dir.to_string(),
                target: self.config.mount_target.clone(),
                read_only: false,
            }],
            user,
            labels,
        }
    }
}

/// Resolves the case directory to an absolute path, rejecting anything that
/// is not an existing directory or cannot be handed to the daemon as UTF-8.
fn validate_working_directory(path: &Path) -> Result<String, RunnerError> {
    let resolved = std::fs::canonicalize(path).map_err(|e| RunnerError::Path {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    if !resolved.is_dir() {
        return Err(RunnerError::Path {
            path: path.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }

    resolved
        .into_os_string()
        .into_string()
        .map_err(|_| RunnerError::Path {
            path: path.to_path_buf(),
            reason: "path is not valid UTF-8".to_string(),
        })
}
