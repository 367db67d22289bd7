//! Network lifecycle handlers

use axum::extract::State;
use axum::Json;
use tracing::warn;

use crate::backend::NetworkSpec;
use crate::error::NetworkError;
use crate::protocol::{CreateNetworkRequest, DeleteNetworkRequest, EmptyResponse, PluginJson};
use crate::router::PluginState;

/// POST /NetworkDriver.CreateNetwork
pub async fn create_network(
    State(state): State<PluginState>,
    PluginJson(request): PluginJson<CreateNetworkRequest>,
) -> Result<Json<EmptyResponse>, NetworkError> {
    let network_id = request.network_id.clone();
    let result = match NetworkSpec::try_from(request) {
        Ok(spec) => state.networks.create_network(spec).await,
        Err(e) => Err(e),
    };

    if let Err(ref e) = result {
        warn!("Failed to create network \"{}\": {}", network_id, e);
    }
    result.map(|()| Json(EmptyResponse {}))
}

/// POST /NetworkDriver.DeleteNetwork
pub async fn delete_network(
    State(state): State<PluginState>,
    PluginJson(request): PluginJson<DeleteNetworkRequest>,
) -> Result<Json<EmptyResponse>, NetworkError> {
    if request.network_id.is_empty() {
        return Err(NetworkError::invalid_request("NetworkID is required"));
    }

    state
        .networks
        .delete_network(&request.network_id)
        .await
        .map_err(|e| {
            warn!("Failed to delete network \"{}\": {}", request.network_id, e);
            e
        })?;

    Ok(Json(EmptyResponse {}))
}
