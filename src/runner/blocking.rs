//! Blocking facade over [`crate::runner::FoamRunner`].
//!
//! Every method blocks the calling thread until the daemon has answered. The
//! facade owns a current-thread tokio runtime, so it must not be used from
//! inside another async runtime.

use std::future::Future;
use std::path::Path;

use tokio::runtime::{Builder, Runtime};

use crate::error::RunnerError;
use crate::execution::{ContainerRuntime, ContainerStats, DockerRuntime};
use crate::runner::config::RunnerConfig;
use crate::runner::executor;
use crate::runner::result::{RunRequest, RunResult};

/// Synchronous runner, Docker-backed by default.
pub struct FoamRunner<R = DockerRuntime> {
    rt: Runtime,
    inner: executor::FoamRunner<R>,
}

fn current_thread_runtime() -> Result<Runtime, RunnerError> {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| RunnerError::Runtime(format!("Failed to start async runtime: {e}")))
}

impl FoamRunner<DockerRuntime> {
    /// Connects to the local Docker daemon using the given configuration.
    pub fn connect(config: RunnerConfig) -> Result<Self, RunnerError> {
        let rt = current_thread_runtime()?;
        let inner = rt.block_on(executor::FoamRunner::connect(config))?;
        Ok(Self { rt, inner })
    }

    /// Connects with the default OpenFOAM image.
    pub fn connect_default() -> Result<Self, RunnerError> {
        Self::connect(RunnerConfig::default())
    }
}

impl<R: ContainerRuntime + 'static> FoamRunner<R> {
    /// Creates a blocking runner on top of an existing runtime.
    pub fn with_runtime(runtime: R, config: RunnerConfig) -> Result<Self, RunnerError> {
        let rt = current_thread_runtime()?;
        let inner = executor::FoamRunner::with_runtime(runtime, config)?;
        Ok(Self { rt, inner })
    }

    /// Returns the runner configuration.
    pub fn config(&self) -> &RunnerConfig {
        self.inner.config()
    }

    /// Returns the underlying runtime.
    pub fn runtime(&self) -> &R {
        self.inner.runtime()
    }

    /// See [`executor::FoamRunner::pull_image`].
    pub fn pull_image(&self) -> Result<(), RunnerError> {
        self.block_on(self.inner.pull_image())
    }

    /// See [`executor::FoamRunner::run`].
    pub fn run(
        &self,
        working_directory: impl AsRef<Path>,
        command: &str,
        user: Option<&str>,
    ) -> Result<RunResult, RunnerError> {
        self.block_on(self.inner.run(working_directory, command, user))
    }

    /// See [`executor::FoamRunner::run_request`].
    pub fn run_request(&self, request: &RunRequest) -> Result<RunResult, RunnerError> {
        self.block_on(self.inner.run_request(request))
    }

    /// See [`executor::FoamRunner::get_container_stats`].
    pub fn get_container_stats(&self, container_id: &str) -> Result<ContainerStats, RunnerError> {
        self.block_on(self.inner.get_container_stats(container_id))
    }

    fn block_on<T>(&self, future: impl Future<Output = T>) -> T {
        self.rt.block_on(future)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::fake::{FakeRuntime, IMAGE};

    #[test]
    fn test_blocking_run_returns_output_and_removes_container() {
        let case = tempfile::tempdir().expect("tempdir");
        let runtime = FakeRuntime::with_image(IMAGE);
        runtime.with(|s| s.stdout = "Mesh OK.\n\nEnd\n".to_string());
        let runner =
            FoamRunner::with_runtime(runtime, RunnerConfig::default()).expect("valid config");

        let result = runner
            .run(case.path(), "checkMesh", Some("1000:1000"))
            .expect("run succeeds");

        assert!(result.success());
        assert!(result.output.contains("Mesh OK."));
        runner.runtime().with(|s| {
            assert_eq!(s.created[0].user, "1000:1000");
            assert!(s.live.is_empty());
            assert_eq!(s.removed, vec![result.container_id.clone()]);
        });
    }

    #[test]
    fn test_blocking_run_reports_exit_code() {
        let case = tempfile::tempdir().expect("tempdir");
        let runtime = FakeRuntime::with_image(IMAGE);
        runtime.with(|s| s.exit_code = 2);
        let runner =
            FoamRunner::with_runtime(runtime, RunnerConfig::default()).expect("valid config");

        let err = runner.run(case.path(), "icoFoam", None).unwrap_err();

        assert_eq!(err.exit_code(), Some(2));
        runner.runtime().with(|s| assert!(s.live.is_empty()));
    }

    #[test]
    fn test_blocking_pull_image_is_idempotent() {
        let runtime = FakeRuntime::default();
        runtime.with(|s| {
            s.registry.insert(IMAGE.to_string());
        });
        let runner =
            FoamRunner::with_runtime(runtime, RunnerConfig::default()).expect("valid config");

        runner.pull_image().expect("first pull");
        runner.pull_image().expect("second pull");

        runner.runtime().with(|s| assert_eq!(s.pulls, 1));
    }

    #[test]
    fn test_blocking_container_stats() {
        let runtime = FakeRuntime::with_image(IMAGE);
        runtime.with(|s| {
            s.live.insert("abc".to_string());
        });
        let runner =
            FoamRunner::with_runtime(runtime, RunnerConfig::default()).expect("valid config");

        let stats = runner.get_container_stats("abc").expect("stats");
        assert_eq!(stats["memory_stats"]["usage"], 1024);

        let err = runner.get_container_stats("gone").unwrap_err();
        assert!(matches!(err, RunnerError::ContainerNotFound { .. }));
    }

    #[test]
    fn test_blocking_rejects_invalid_config() {
        let result = FoamRunner::with_runtime(
            FakeRuntime::default(),
            RunnerConfig::default().with_shell(""),
        );
        assert!(matches!(result, Err(RunnerError::Config(_))));
    }
}
