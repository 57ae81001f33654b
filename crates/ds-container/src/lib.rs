//! Docker-backed execution environments.
//!
//! [`runtime::DockerRuntime`] wraps the container CLI for lifecycle calls and
//! `cp`; [`container::Container`] ties one named container to those calls,
//! stages binary transfers through the host filesystem and opens shell
//! sessions whose prompt sentinel is the container name.

pub mod container;
pub mod error;
pub mod runtime;
pub mod staging;

pub use container::{create_container_from_image, Container};
pub use error::{ContainerError, Result};
pub use runtime::{DockerRuntime, LifecycleManager};
