//! Container runtime trait and implementations for boxgate
//!
//! This crate provides the abstraction the gateway dispatches lifecycle
//! calls against, with a Docker implementation. The runtime owns container
//! processes and authoritative state; the gateway never caches either.

mod docker;
mod error;
#[cfg(feature = "test-support")]
pub mod test_support;
mod types;

pub use docker::DockerRuntime;
pub use error::*;
pub use types::*;

use async_trait::async_trait;

/// Trait for container runtimes (Docker today; anything speaking the same
/// lifecycle tomorrow)
///
/// Every method is addressed by the opaque [`ContainerId`] the runtime
/// allocated at create time. Transition legality is decided here, not by
/// callers: a runtime is free to reject a start on a closed container, and
/// callers must surface that failure rather than mask it.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Create a container from a spec, returning the new id
    async fn create(&self, spec: &ContainerSpec) -> Result<ContainerId>;

    /// Start a created or stopped container
    async fn start(&self, id: &ContainerId) -> Result<()>;

    /// Suspend a running container
    async fn suspend(&self, id: &ContainerId) -> Result<()>;

    /// Stop a running or suspended container
    async fn stop(&self, id: &ContainerId) -> Result<()>;

    /// Close a container, freeing runtime-held resources. Terminal.
    async fn close(&self, id: &ContainerId) -> Result<()>;

    /// Report the container's current state. Read-only and safe to call
    /// repeatedly and concurrently.
    async fn inspect(&self, id: &ContainerId) -> Result<ContainerHandle>;

    /// Check that the runtime is reachable
    async fn ping(&self) -> Result<()>;

    /// Get runtime information
    fn info(&self) -> RuntimeInfo;
}

/// Connect the Docker runtime configured in the gateway config
pub async fn connect_runtime(
    settings: &boxgate_config::RuntimeSettings,
) -> Result<Box<dyn ContainerRuntime>> {
    let runtime = DockerRuntime::new(&settings.socket).await?;
    Ok(Box::new(runtime))
}
