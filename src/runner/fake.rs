//! In-memory container runtime for runner tests.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::RunnerError;
use crate::execution::{ContainerLogs, ContainerRuntime, ContainerSpec, ContainerStats};

pub(crate) const IMAGE: &str = "opencfd/openfoam-default:2406";

#[derive(Default)]
pub(crate) struct FakeState {
    pub local_images: HashSet<String>,
    pub registry: HashSet<String>,
    pub exit_code: i64,
    pub stdout: String,
    pub stderr: String,
    pub fail_start: bool,
    pub fail_remove: bool,
    /// Log streaming never finishes, like a solver that runs forever.
    pub hang_logs: bool,
    pub created: Vec<ContainerSpec>,
    pub live: HashSet<String>,
    pub removed: Vec<String>,
    pub pulls: usize,
    pub calls: Vec<&'static str>,
}

#[derive(Default)]
pub(crate) struct FakeRuntime {
    state: Mutex<FakeState>,
}

impl FakeRuntime {
    /// Runtime with `image` available locally and in the registry.
    pub(crate) fn with_image(image: &str) -> Self {
        let runtime = Self::default();
        runtime.with(|s| {
            s.local_images.insert(image.to_string());
            s.registry.insert(image.to_string());
        });
        runtime
    }

    pub(crate) fn with<T>(&self, f: impl FnOnce(&mut FakeState) -> T) -> T {
        let mut state = self.state.lock().expect("fake state");
        f(&mut state)
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn ping(&self) -> Result<(), RunnerError> {
        self.with(|s| s.calls.push("ping"));
        Ok(())
    }

    async fn image_exists(&self, image: &str) -> Result<bool, RunnerError> {
        Ok(self.with(|s| {
            s.calls.push("image_exists");
            s.local_images.contains(image)
        }))
    }

    async fn pull_image(&self, image: &str) -> Result<(), RunnerError> {
        self.with(|s| {
            s.calls.push("pull");
            if !s.registry.contains(image) {
                return Err(RunnerError::ImageNotFound {
                    image: image.to_string(),
                });
            }
            s.pulls += 1;
            s.local_images.insert(image.to_string());
            Ok(())
        })
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String, RunnerError> {
        self.with(|s| {
            s.calls.push("create");
            if !s.local_images.contains(&spec.image) {
                return Err(RunnerError::ImageNotFound {
                    image: spec.image.clone(),
                });
            }
            let id = format!("fake-{}", s.created.len());
            s.created.push(spec.clone());
            s.live.insert(id.clone());
            Ok(id)
        })
    }

    async fn start_container(&self, _id: &str) -> Result<(), RunnerError> {
        self.with(|s| {
            s.calls.push("start");
            if s.fail_start {
                Err(RunnerError::Runtime("connection dropped".to_string()))
            } else {
                Ok(())
            }
        })
    }

    async fn container_logs(&self, _id: &str) -> Result<ContainerLogs, RunnerError> {
        let hang = self.with(|s| {
            s.calls.push("logs");
            s.hang_logs
        });
        if hang {
            std::future::pending::<()>().await;
        }

        Ok(self.with(|s| {
            let mut logs = ContainerLogs::default();
            logs.push_stdout(&s.stdout);
            logs.push_stderr(&s.stderr);
            logs
        }))
    }

    async fn wait_container(&self, _id: &str) -> Result<i64, RunnerError> {
        Ok(self.with(|s| {
            s.calls.push("wait");
            s.exit_code
        }))
    }

    async fn remove_container(&self, id: &str) -> Result<(), RunnerError> {
        self.with(|s| {
            s.calls.push("remove");
            if s.fail_remove {
                return Err(RunnerError::Runtime("removal failed".to_string()));
            }
            s.live.remove(id);
            s.removed.push(id.to_string());
            Ok(())
        })
    }

    async fn container_stats(&self, id: &str) -> Result<ContainerStats, RunnerError> {
        self.with(|s| {
            if !s.live.contains(id) {
                return Err(RunnerError::ContainerNotFound { id: id.to_string() });
            }
            let mut stats = ContainerStats::new();
            stats.insert("id".to_string(), serde_json::json!(id));
            stats.insert(
                "memory_stats".to_string(),
                serde_json::json!({ "usage": 1024 }),
            );
            Ok(stats)
        })
    }
}
