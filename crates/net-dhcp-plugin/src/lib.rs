//! net-dhcp-plugin: Docker Network Driver Plugin Server
//!
//! Serves the remote `NetworkDriver` protocol over HTTP/1.1 on a Unix socket.
//!
//! Architecture:
//! ```text
//! Plugin (this crate)
//!     ├── runtime client (net_dhcp_runtime::DockerClient)
//!     └── UnixListener ── hyper http1 ── access log ── router
//!             ├── /NetworkDriver.GetCapabilities → capabilities::get_capabilities
//!             ├── /NetworkDriver.CreateNetwork   → network::create_network ─┐
//!             └── /NetworkDriver.DeleteNetwork   → network::delete_network ─┴→ NetworkBackend
//! ```

pub mod backend;
pub mod capabilities;
pub mod config;
pub mod error;
pub mod middleware;
pub mod network;
pub mod protocol;
pub mod router;
pub mod server;

// Re-export main types
pub use backend::{BridgeNetworks, NetworkBackend, NetworkRecord, NetworkSpec};
pub use capabilities::{Capabilities, Scope, CAPABILITIES};
pub use config::PluginConfig;
pub use error::{CloseError, CloseErrors, NetworkError, PluginError, Result};
pub use protocol::{DRIVER_NAME, OPTIONS_KEY, OPTION_BRIDGE};
pub use router::{create_logged_router, create_router, PluginState};
pub use server::Plugin;

pub use net_dhcp_runtime::{DEFAULT_API_VERSION, DEFAULT_DOCKER_SOCKET};
