//! Scoped ownership of a created container.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::RunnerError;
use crate::execution::ContainerRuntime;

/// Removes its container when dropped unless [`ContainerGuard::remove`]
/// already completed.
///
/// A `run` future that is cancelled (timeout, Ctrl-C, dropped task) never
/// reaches the explicit removal; the guard covers that path.
pub(crate) struct ContainerGuard<R: ContainerRuntime + 'static> {
    runtime: Arc<R>,
    id: String,
    armed: bool,
}

impl<R: ContainerRuntime + 'static> ContainerGuard<R> {
    pub(crate) fn new(runtime: Arc<R>, id: String) -> Self {
        Self {
            runtime,
            id,
            armed: true,
        }
    }

    pub(crate) fn id(&self) -> &str {
        &self.id
    }

    /// Removes the container and disarms the guard.
    ///
    /// The guard stays armed until the removal call returns, so cancelling
    /// this future still leaves cleanup to `Drop`.
    pub(crate) async fn remove(mut self) -> Result<(), RunnerError> {
        let result = self.runtime.remove_container(&self.id).await;
        self.armed = false;
        result
    }
}

impl<R: ContainerRuntime + 'static> Drop for ContainerGuard<R> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let runtime = Arc::clone(&self.runtime);
        let id = std::mem::take(&mut self.id);
        debug!(container = %id, "Removing container of an abandoned run");

        let cleanup = async move {
            if let Err(e) = runtime.remove_container(&id).await {
                warn!(container = %id, error = %e, "Failed to remove abandoned container");
            }
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(cleanup);
            }
            // Dropped outside any runtime: clean up on a thread of its own.
            Err(_) => {
                std::thread::spawn(move || {
                    match tokio::runtime::Builder::new_current_thread()
                        .enable_all()
                        .build()
                    {
                        Ok(rt) => rt.block_on(cleanup),
                        Err(e) => warn!(error = %e, "No runtime for container cleanup"),
                    }
                });
            }
        }
    }
}
