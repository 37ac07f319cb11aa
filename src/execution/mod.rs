//! Container runtime layer for awesome-foamlib.
//!
//! This module defines the daemon operations the runner depends on and the
//! bollard-backed implementation used in production.
//!
//! # Example
//!
//! ```ignore
//! use awesome_foamlib::execution::{ContainerRuntime, DockerRuntime};
//!
//! let runtime = DockerRuntime::connect().await?;
//! if !runtime.image_exists("opencfd/openfoam-default:2406").await? {
//!     runtime.pull_image("opencfd/openfoam-default:2406").await?;
//! }
//! ```

pub mod docker_client;
pub mod runtime;

pub use docker_client::DockerRuntime;
pub use runtime::{BindMount, ContainerLogs, ContainerRuntime, ContainerSpec, ContainerStats};
