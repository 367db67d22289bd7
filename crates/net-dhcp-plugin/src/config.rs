//! Plugin configuration

use net_dhcp_runtime::{DEFAULT_API_VERSION, DEFAULT_DOCKER_SOCKET};
use std::path::PathBuf;

/// Where the plugin finds the container runtime
#[derive(Clone, Debug)]
pub struct PluginConfig {
    /// Runtime daemon socket
    pub docker_socket: PathBuf,
    /// Engine API version to negotiate
    pub api_version: String,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            docker_socket: PathBuf::from(DEFAULT_DOCKER_SOCKET),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }
}

impl PluginConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn docker_socket(mut self, path: impl Into<PathBuf>) -> Self {
        self.docker_socket = path.into();
        self
    }

    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }
}
