//! Docker API wrapper using the bollard crate.
//!
//! [`DockerRuntime`] implements [`ContainerRuntime`] against a real Docker
//! daemon and translates bollard errors into [`RunnerError`] kinds.

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, LogOutput, LogsOptions, RemoveContainerOptions,
    StartContainerOptions, StatsOptions, WaitContainerOptions,
};
use bollard::errors::Error as BollardError;
use bollard::image::CreateImageOptions;
use bollard::models::{HostConfig, Mount, MountTypeEnum};
use bollard::Docker;
use futures::StreamExt;
use tracing::debug;

use crate::error::RunnerError;
use crate::execution::runtime::{ContainerLogs, ContainerRuntime, ContainerSpec, ContainerStats};

/// Docker-backed container runtime.
#[derive(Clone)]
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connects to the local Docker daemon and checks that it answers.
    ///
    /// `DOCKER_HOST` is honored through bollard's local defaults.
    ///
    /// # Errors
    ///
    /// Returns `RunnerError::Connection` if the daemon is not accessible.
    pub async fn connect() -> Result<Self, RunnerError> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| RunnerError::Connection(format!("Failed to connect: {e}")))?;

        let runtime = Self { docker };
        runtime.ping().await?;
        Ok(runtime)
    }

    /// Wraps an existing bollard Docker instance without contacting the daemon.
    pub fn from_docker(docker: Docker) -> Self {
        Self { docker }
    }

    /// Returns the underlying bollard client.
    pub fn docker(&self) -> &Docker {
        &self.docker
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn ping(&self) -> Result<(), RunnerError> {
        self.docker
            .ping()
            .await
            .map_err(|e| RunnerError::Connection(format!("Docker daemon did not answer: {e}")))?;
        Ok(())
    }

    async fn image_exists(&self, image: &str) -> Result<bool, RunnerError> {
        match self.docker.inspect_image(image).await {
            Ok(_) => Ok(true),
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) => Err(RunnerError::Runtime(format!(
                "Failed to inspect image '{image}': {e}"
            ))),
        }
    }

    async fn pull_image(&self, image: &str) -> Result<(), RunnerError> {
        let options = CreateImageOptions {
            from_image: image,
            ..Default::default()
        };

        let mut stream = self.docker.create_image(Some(options), None, None);

        while let Some(result) = stream.next().await {
            let info = result.map_err(|e| pull_error(image, e))?;
            if let Some(error) = info.error {
                return Err(if looks_like_missing_image(&error) {
                    RunnerError::ImageNotFound {
                        image: image.to_string(),
                    }
                } else {
                    RunnerError::Runtime(format!("Failed to pull image '{image}': {error}"))
                });
            }
            if let Some(status) = info.status {
                debug!(image = %image, progress = ?info.progress, "{status}");
            }
        }

        Ok(())
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String, RunnerError> {
        let container_config = Config {
            image: Some(spec.image.clone()),
            cmd: Some(spec.cmd.clone()),
            working_dir: Some(spec.working_dir.clone()),
            user: Some(spec.user.clone()),
            labels: Some(spec.labels.clone()),
            host_config: Some(host_config(spec)),
            tty: Some(false),
            attach_stdin: Some(false),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            ..Default::default()
        };

        let options = CreateContainerOptions {
            name: spec.name.clone(),
            platform: None,
        };

        let response = self
            .docker
            .create_container(Some(options), container_config)
            .await
            .map_err(|e| {
                if is_not_found(&e) {
                    RunnerError::ImageNotFound {
                        image: spec.image.clone(),
                    }
                } else {
                    RunnerError::Runtime(format!("Failed to create container: {e}"))
                }
            })?;

        for warning in &response.warnings {
            tracing::warn!(container = %spec.name, "{warning}");
        }

        Ok(response.id)
    }

    async fn start_container(&self, id: &str) -> Result<(), RunnerError> {
        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| container_error(id, "start container", e))?;

        Ok(())
    }

    async fn container_logs(&self, id: &str) -> Result<ContainerLogs, RunnerError> {
        let options = LogsOptions::<String> {
            follow: true,
            stdout: true,
            stderr: true,
            timestamps: false,
            ..Default::default()
        };

        let mut stream = self.docker.logs(id, Some(options));
        let mut logs = ContainerLogs::default();

        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(LogOutput::StdOut { message }) | Ok(LogOutput::Console { message }) => {
                    let text = String::from_utf8_lossy(&message);
                    for line in text.lines() {
                        debug!(container = %id, stream = "stdout", "{line}");
                    }
                    logs.push_stdout(&text);
                }
                Ok(LogOutput::StdErr { message }) => {
                    let text = String::from_utf8_lossy(&message);
                    for line in text.lines() {
                        debug!(container = %id, stream = "stderr", "{line}");
                    }
                    logs.push_stderr(&text);
                }
                Ok(LogOutput::StdIn { .. }) => {}
                Err(e) => return Err(container_error(id, "read logs", e)),
            }
        }

        Ok(logs)
    }

    async fn wait_container(&self, id: &str) -> Result<i64, RunnerError> {
        let options = WaitContainerOptions {
            condition: "not-running",
        };

        let mut stream = self.docker.wait_container(id, Some(options));

        match stream.next().await {
            Some(Ok(response)) => Ok(response.status_code),
            // bollard reports a non-zero exit as an error; it is still an exit code.
            Some(Err(BollardError::DockerContainerWaitError { code, .. })) => Ok(code),
            Some(Err(e)) => Err(container_error(id, "wait for container", e)),
            None => Err(RunnerError::Runtime(format!(
                "Wait stream for container '{id}' ended without a status"
            ))),
        }
    }

    async fn remove_container(&self, id: &str) -> Result<(), RunnerError> {
        let options = RemoveContainerOptions {
            force: true,
            v: true,
            ..Default::default()
        };

        match self.docker.remove_container(id, Some(options)).await {
            Ok(()) => Ok(()),
            Err(e) if is_not_found(&e) => Ok(()),
            Err(e) => Err(RunnerError::Runtime(format!(
                "Failed to remove container '{id}': {e}"
            ))),
        }
    }

    async fn container_stats(&self, id: &str) -> Result<ContainerStats, RunnerError> {
        let options = StatsOptions {
            stream: false,
            one_shot: true,
        };

        let mut stream = self.docker.stats(id, Some(options));

        let stats = match stream.next().await {
            Some(result) => result.map_err(|e| container_error(id, "read stats", e))?,
            None => {
                return Err(RunnerError::Runtime(format!(
                    "No stats returned for container '{id}'"
                )))
            }
        };

        match serde_json::to_value(stats) {
            Ok(serde_json::Value::Object(map)) => Ok(map),
            Ok(other) => Err(RunnerError::Runtime(format!(
                "Unexpected stats payload: {other}"
            ))),
            Err(e) => Err(RunnerError::Runtime(format!(
                "Failed to encode stats: {e}"
            ))),
        }
    }
}

/// Mounts are passed as structured bind mounts rather than `binds` strings,
/// which cannot represent host paths containing `:`.
fn host_config(spec: &ContainerSpec) -> HostConfig {
    let mounts: Vec<Mount> = spec
        .mounts
        .iter()
        .map(|m| Mount {
            typ: Some(MountTypeEnum::BIND),
            source: Some(m.source.clone()),
            target: Some(m.target.clone()),
            read_only: Some(m.read_only),
            ..Default::default()
        })
        .collect();

    HostConfig {
        mounts: if mounts.is_empty() { None } else { Some(mounts) },
        ..Default::default()
    }
}

fn is_not_found(error: &BollardError) -> bool {
    match error {
        BollardError::DockerResponseServerError { status_code, .. } => *status_code == 404,
        _ => false,
    }
}

fn container_error(id: &str, operation: &str, error: BollardError) -> RunnerError {
    if is_not_found(&error) {
        RunnerError::ContainerNotFound { id: id.to_string() }
    } else {
        RunnerError::Runtime(format!("Failed to {operation} '{id}': {error}"))
    }
}

fn pull_error(image: &str, error: BollardError) -> RunnerError {
    let message = error.to_string();
    if is_not_found(&error) || looks_like_missing_image(&message) {
        RunnerError::ImageNotFound {
            image: image.to_string(),
        }
    } else {
        RunnerError::Runtime(format!("Failed to pull image '{image}': {message}"))
    }
}

/// Registries report unknown tags inside the pull stream rather than as a 404.
fn looks_like_missing_image(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("manifest unknown")
        || message.contains("not found")
        || message.contains("repository does not exist")
}
