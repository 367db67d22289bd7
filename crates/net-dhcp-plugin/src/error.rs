//! Plugin error types
//!
//! Two families live here. [`PluginError`] covers the server lifecycle
//! (construct, listen, close) and is returned to whoever drives the plugin.
//! [`NetworkError`] is produced per request and is rendered into the
//! response body as `{"Err": "..."}`; it never reaches the serve loop.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use net_dhcp_runtime::RuntimeError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::protocol::ErrorResponse;

/// Server lifecycle errors
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("failed to create runtime client: {0}")]
    BackendUnavailable(#[source] RuntimeError),

    #[error("failed to bind {path}: {source}")]
    Bind {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("plugin is already listening on {0}")]
    AlreadyListening(PathBuf),

    #[error("plugin is closed")]
    Closed,

    #[error("failed to accept connection: {0}")]
    Accept(#[source] std::io::Error),

    #[error("{0}")]
    Close(CloseErrors),
}

impl PluginError {
    /// True for every error that prevents `listen` from serving
    pub fn is_bind_error(&self) -> bool {
        matches!(
            self,
            PluginError::Bind { .. } | PluginError::AlreadyListening(_) | PluginError::Closed
        )
    }
}

/// One failed release step during `close`
#[derive(Debug, Error)]
pub enum CloseError {
    #[error("failed to close runtime client: {0}")]
    Backend(#[source] RuntimeError),

    #[error("failed to close plugin server: {0}")]
    Server(#[source] std::io::Error),
}

/// Every release step that failed during a single `close` call
#[derive(Debug)]
pub struct CloseErrors(pub Vec<CloseError>);

impl CloseErrors {
    pub fn iter(&self) -> impl Iterator<Item = &CloseError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CloseErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

pub type Result<T> = std::result::Result<T, PluginError>;

/// Per-request errors from the network lifecycle handlers
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    AllocationFailed(String),

    #[error("network {0} not found")]
    NotFound(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl NetworkError {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        NetworkError::InvalidRequest(msg.into())
    }

    pub fn allocation_failed(msg: impl Into<String>) -> Self {
        NetworkError::AllocationFailed(msg.into())
    }

    pub fn not_found(network_id: impl Into<String>) -> Self {
        NetworkError::NotFound(network_id.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        NetworkError::Backend(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            NetworkError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            NetworkError::NotFound(_) => StatusCode::NOT_FOUND,
            NetworkError::AllocationFailed(_) => StatusCode::CONFLICT,
            NetworkError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RuntimeError> for NetworkError {
    fn from(err: RuntimeError) -> Self {
        NetworkError::Backend(err.to_string())
    }
}

impl From<net_dhcp_network::NetlinkError> for NetworkError {
    fn from(err: net_dhcp_network::NetlinkError) -> Self {
        NetworkError::Backend(err.to_string())
    }
}

impl IntoResponse for NetworkError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_status() {
        assert_eq!(
            NetworkError::invalid_request("No bridge provided").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(NetworkError::not_found("net1").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            NetworkError::allocation_failed("taken").status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            NetworkError::from(RuntimeError::Closed).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_close_errors_lists_every_step() {
        let errors = CloseErrors(vec![
            CloseError::Backend(RuntimeError::Closed),
            CloseError::Server(std::io::Error::other("socket busy")),
        ]);
        assert_eq!(errors.len(), 2);
        assert!(!errors.is_empty());
        assert!(CloseErrors(Vec::new()).is_empty());
        assert_eq!(
            PluginError::Close(errors).to_string(),
            "failed to close runtime client: runtime client is closed; \
             failed to close plugin server: socket busy"
        );
    }
}
