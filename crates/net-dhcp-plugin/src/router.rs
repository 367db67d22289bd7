//! Router configuration for the NetworkDriver protocol
//!
//! Exactly three routes and no fallback: anything else gets the
//! transport's 404 and never reaches a handler.

use axum::{routing::post, Router};
use std::sync::Arc;

use crate::backend::NetworkBackend;
use crate::capabilities::get_capabilities;
use crate::middleware::with_access_log;
use crate::network::{create_network, delete_network};
use crate::protocol::{CREATE_NETWORK, DELETE_NETWORK, GET_CAPABILITIES};

/// State shared by the lifecycle handlers
#[derive(Clone)]
pub struct PluginState {
    pub networks: Arc<dyn NetworkBackend>,
}

impl PluginState {
    pub fn new(networks: Arc<dyn NetworkBackend>) -> Self {
        Self { networks }
    }
}

/// Create the protocol router
pub fn create_router(state: PluginState) -> Router {
    Router::new()
        .route(GET_CAPABILITIES, post(get_capabilities))
        .route(CREATE_NETWORK, post(create_network))
        .route(DELETE_NETWORK, post(delete_network))
        .with_state(state)
}

/// Protocol router wrapped with the access logger
pub fn create_logged_router(state: PluginState) -> Router {
    with_access_log(create_router(state))
}
