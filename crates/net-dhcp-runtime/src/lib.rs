//! net-dhcp-runtime: Container Runtime Client
//!
//! The plugin never talks to the container runtime directly; it goes through
//! the [`RuntimeClient`] trait so the server can be driven by fakes in tests.
//! [`DockerClient`] is the production implementation and speaks the Docker
//! Engine API over the daemon's Unix socket.

pub mod docker;
pub mod error;

pub use docker::{DockerClient, Ipam, IpamConfig, NetworkSummary};
pub use error::{Result, RuntimeError};

use async_trait::async_trait;

/// Well-known Docker daemon socket
pub const DEFAULT_DOCKER_SOCKET: &str = "/run/docker.sock";

/// Engine API version the plugin negotiates with the daemon
pub const DEFAULT_API_VERSION: &str = "1.41";

/// Handle to the container runtime, shared by every request task.
#[async_trait]
pub trait RuntimeClient: Send + Sync {
    /// List the networks the runtime currently knows about
    async fn list_networks(&self) -> Result<Vec<NetworkSummary>>;

    /// Release the handle. Calls made after this fail with [`RuntimeError::Closed`].
    async fn close(&self) -> Result<()>;
}
