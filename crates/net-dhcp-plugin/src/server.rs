//! Plugin Server
//!
//! Owns the runtime client and the logged protocol router, serves HTTP/1.1 on
//! a Unix socket and tears both down in `close`.
//!
//! Lifecycle:
//! ```text
//! connect() ──> Idle ──listen()──> Serving ──close()──> Closed
//!                 └────────────close()────────────────────┘
//! ```

use axum::Router;
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use hyper_util::service::TowerToHyperService;
use net_dhcp_network::NetlinkBridges;
use net_dhcp_runtime::{DockerClient, RuntimeClient};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::UnixListener;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::backend::{BridgeNetworks, NetworkBackend};
use crate::config::PluginConfig;
use crate::error::{CloseError, CloseErrors, PluginError, Result};
use crate::router::{create_logged_router, PluginState};

enum ListenerState {
    Idle,
    Serving {
        socket_path: PathBuf,
        shutdown: watch::Sender<bool>,
    },
    Closed,
}

/// The network driver plugin
pub struct Plugin {
    runtime: Arc<dyn RuntimeClient>,
    router: Router,
    listener: Mutex<ListenerState>,
}

impl Plugin {
    /// Connect to the runtime described by `config` and build the plugin.
    /// No socket is bound until [`Plugin::listen`].
    pub async fn connect(config: PluginConfig) -> Result<Self> {
        let client = DockerClient::connect(&config.docker_socket, &config.api_version)
            .await
            .map_err(PluginError::BackendUnavailable)?;
        info!(
            "Connected to runtime at {} (API v{})",
            client.socket_path().display(),
            client.api_version()
        );

        let runtime: Arc<dyn RuntimeClient> = Arc::new(client);
        let networks = Arc::new(BridgeNetworks::new(
            Arc::clone(&runtime),
            Arc::new(NetlinkBridges::new()),
        ));
        Ok(Self::with_backends(runtime, networks))
    }

    /// Build a plugin around already-acquired collaborators
    pub fn with_backends(
        runtime: Arc<dyn RuntimeClient>,
        networks: Arc<dyn NetworkBackend>,
    ) -> Self {
        Self {
            runtime,
            router: create_logged_router(PluginState::new(networks)),
            listener: Mutex::new(ListenerState::Idle),
        }
    }

    /// Bind `bind_sock` and serve until [`Plugin::close`] or an accept error.
    pub async fn listen(&self, bind_sock: impl AsRef<Path>) -> Result<()> {
        let path = bind_sock.as_ref();

        let (listener, mut shutdown) = {
            let mut state = self.listener.lock().await;
            match &*state {
                ListenerState::Idle => {}
                ListenerState::Serving { socket_path, .. } => {
                    return Err(PluginError::AlreadyListening(socket_path.clone()))
                }
                ListenerState::Closed => return Err(PluginError::Closed),
            }

            let listener = UnixListener::bind(path).map_err(|source| PluginError::Bind {
                path: path.to_path_buf(),
                source,
            })?;
            let (tx, rx) = watch::channel(false);
            *state = ListenerState::Serving {
                socket_path: path.to_path_buf(),
                shutdown: tx,
            };
            (listener, rx)
        };

        info!("Plugin listening on unix:{}", path.display());

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!("Plugin stopped listening on unix:{}", path.display());
                    return Ok(());
                }
                accepted = listener.accept() => {
                    let (stream, _) = accepted.map_err(PluginError::Accept)?;
                    let service = TowerToHyperService::new(self.router.clone());
                    let mut closing = shutdown.clone();

                    // Open connections are dropped on close, keep-alive included
                    tokio::spawn(async move {
                        let conn = http1::Builder::new()
                            .serve_connection(TokioIo::new(stream), service);
                        tokio::select! {
                            biased;
                            _ = closing.changed() => debug!("Dropping connection on close"),
                            served = conn => {
                                if let Err(e) = served {
                                    debug!("Connection error: {}", e);
                                }
                            }
                        }
                    });
                }
            }
        }
    }

    /// Release the runtime client and stop the listener.
    ///
    /// Both steps always run; every failure is reported. Open connections
    /// are dropped and the socket node is removed. Calling `close` again is
    /// a no-op.
    pub async fn close(&self) -> Result<()> {
        let previous = {
            let mut state = self.listener.lock().await;
            std::mem::replace(&mut *state, ListenerState::Closed)
        };

        if matches!(previous, ListenerState::Closed) {
            debug!("Plugin already closed");
            return Ok(());
        }

        let mut errors = Vec::new();

        if let Err(e) = self.runtime.close().await {
            warn!("Failed to close runtime client: {}", e);
            errors.push(CloseError::Backend(e));
        }

        if let ListenerState::Serving {
            socket_path,
            shutdown,
        } = previous
        {
            // The serve loop may already be gone after an accept error
            let _ = shutdown.send(true);

            match tokio::fs::remove_file(&socket_path).await {
                Ok(()) => debug!("Removed socket {}", socket_path.display()),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    warn!("Failed to remove socket {}: {}", socket_path.display(), e);
                    errors.push(CloseError::Server(e));
                }
            }
        }

        if errors.is_empty() {
            info!("Plugin closed");
            Ok(())
        } else {
            Err(PluginError::Close(CloseErrors(errors)))
        }
    }
}
