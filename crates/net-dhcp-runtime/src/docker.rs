//! Docker Engine API client
//! Talks HTTP/1.1 directly to the daemon's unix socket, one connection per call.

use crate::error::{Result, RuntimeError};
use crate::RuntimeClient;
use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{header, Method, Request, StatusCode};
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::net::UnixStream;
use tracing::debug;

/// Upper bound on a response body read from the daemon
const MAX_RESPONSE_BYTES: usize = 16 * 1024 * 1024;

/// A network as reported by `GET /networks`
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkSummary {
    #[serde(rename = "Id", default)]
    pub id: String,

    #[serde(rename = "Name", default)]
    pub name: String,

    #[serde(rename = "Driver", default)]
    pub driver: String,

    #[serde(rename = "IPAM", default)]
    pub ipam: Ipam,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ipam {
    #[serde(rename = "Driver", default)]
    pub driver: String,

    /// The daemon sends `null` for networks without IPAM config
    #[serde(rename = "Config", default)]
    pub config: Option<Vec<IpamConfig>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IpamConfig {
    #[serde(rename = "Subnet", default)]
    pub subnet: Option<String>,

    #[serde(rename = "Gateway", default)]
    pub gateway: Option<String>,
}

impl NetworkSummary {
    /// Subnets reserved by this network's IPAM configuration
    pub fn subnets(&self) -> impl Iterator<Item = &str> {
        self.ipam
            .config
            .iter()
            .flatten()
            .filter_map(|c| c.subnet.as_deref())
    }
}

/// Docker Engine API client bound to one socket and API version
pub struct DockerClient {
    socket_path: PathBuf,
    api_version: String,
    closed: AtomicBool,
}

impl DockerClient {
    /// Connect to the daemon and confirm it accepts `api_version`.
    pub async fn connect(
        socket_path: impl Into<PathBuf>,
        api_version: impl Into<String>,
    ) -> Result<Self> {
        let client = Self {
            socket_path: socket_path.into(),
            api_version: api_version.into(),
            closed: AtomicBool::new(false),
        };

        if !client.socket_path.exists() {
            return Err(RuntimeError::SocketNotFound(client.socket_path));
        }

        let (status, body) = client.get("/version").await?;
        if !status.is_success() {
            return Err(RuntimeError::VersionRejected {
                version: client.api_version,
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        debug!(
            "Connected to runtime at {} (API v{})",
            client.socket_path.display(),
            client.api_version
        );
        Ok(client)
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    async fn get(&self, endpoint: &str) -> Result<(StatusCode, Bytes)> {
        if self.closed.load(Ordering::Acquire) {
            return Err(RuntimeError::Closed);
        }

        let stream = UnixStream::connect(&self.socket_path)
            .await
            .map_err(|source| RuntimeError::Connect {
                path: self.socket_path.clone(),
                source,
            })?;

        let (mut sender, connection) = http1::handshake(TokioIo::new(stream)).await?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                debug!("Runtime connection error: {}", e);
            }
        });

        let request = Request::builder()
            .method(Method::GET)
            .uri(format!("/v{}{}", self.api_version, endpoint))
            .header(header::HOST, "docker")
            .body(Body::empty())?;

        debug!("Runtime request: GET {}", request.uri());
        let response = sender.send_request(request).await?;
        let status = response.status();
        let body = axum::body::to_bytes(Body::new(response.into_body()), MAX_RESPONSE_BYTES)
            .await
            .map_err(|e| RuntimeError::Body(e.to_string()))?;

        Ok((status, body))
    }
}

#[async_trait]
impl RuntimeClient for DockerClient {
    async fn list_networks(&self) -> Result<Vec<NetworkSummary>> {
        let (status, body) = self.get("/networks").await?;
        if !status.is_success() {
            return Err(RuntimeError::Api {
                endpoint: "/networks".to_string(),
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        Ok(serde_json::from_slice(&body)?)
    }

    async fn close(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!("Closed runtime client for {}", self.socket_path.display());
        }
        Ok(())
    }
}

/// The daemon reports failures as `{"message": "..."}`
fn error_message(body: &[u8]) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: String,
    }

    serde_json::from_slice::<ErrorBody>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| String::from_utf8_lossy(body).trim().to_string())
}
