//! Runtime client error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors talking to the container runtime
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("runtime socket not found at {0}")]
    SocketNotFound(PathBuf),

    #[error("failed to connect to runtime socket {path}: {source}")]
    Connect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("runtime rejected API version {version} (status {status}): {message}")]
    VersionRejected {
        version: String,
        status: u16,
        message: String,
    },

    #[error("runtime request {endpoint} failed with status {status}: {message}")]
    Api {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    #[error("invalid request: {0}")]
    Request(#[from] axum::http::Error),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("runtime client is closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
