//! NetworkDriver wire types
//!
//! Field names follow the daemon's remote driver protocol (`NetworkID`,
//! `IPv4Data`, ...), hence the explicit renames.

use axum::async_trait;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::NetworkError;

/// Capability discovery
pub const GET_CAPABILITIES: &str = "/NetworkDriver.GetCapabilities";
/// Network creation
pub const CREATE_NETWORK: &str = "/NetworkDriver.CreateNetwork";
/// Network deletion
pub const DELETE_NETWORK: &str = "/NetworkDriver.DeleteNetwork";

/// Name the driver is registered under with the daemon
pub const DRIVER_NAME: &str = "net-dhcp";
/// Options object the daemon passes `--opt` values through
pub const OPTIONS_KEY: &str = "com.docker.network.generic";
/// Option naming the host bridge a network attaches to
pub const OPTION_BRIDGE: &str = "devplayer0.net-dhcp.bridge";

/// IPAM pool data the daemon attaches to a network
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IpamData {
    #[serde(rename = "AddressSpace", default)]
    pub address_space: String,

    #[serde(rename = "Pool", default)]
    pub pool: String,

    #[serde(rename = "Gateway", default)]
    pub gateway: String,

    #[serde(rename = "AuxAddresses", default)]
    pub aux_addresses: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateNetworkRequest {
    #[serde(rename = "NetworkID", default)]
    pub network_id: String,

    #[serde(rename = "Options", default)]
    pub options: Option<HashMap<String, Value>>,

    #[serde(rename = "IPv4Data", default)]
    pub ipv4_data: Option<Vec<IpamData>>,

    #[serde(rename = "IPv6Data", default)]
    pub ipv6_data: Option<Vec<IpamData>>,
}

impl CreateNetworkRequest {
    /// The bridge named in the generic options, if any
    pub fn bridge(&self) -> Result<Option<String>, NetworkError> {
        let Some(generic) = self.options.as_ref().and_then(|o| o.get(OPTIONS_KEY)) else {
            return Ok(None);
        };

        match generic.get(OPTION_BRIDGE) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(name)) if !name.is_empty() => Ok(Some(name.clone())),
            Some(other) => Err(NetworkError::invalid_request(format!(
                "Invalid value for {OPTION_BRIDGE}: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteNetworkRequest {
    #[serde(rename = "NetworkID", default)]
    pub network_id: String,
}

/// `{}` acknowledgement
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EmptyResponse {}

/// `{"Err": "..."}` failure body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "Err")]
    pub err: String,
}

impl ErrorResponse {
    pub fn new(err: impl Into<String>) -> Self {
        Self { err: err.into() }
    }
}

/// JSON body extractor that ignores `Content-Type`.
///
/// The daemon posts `application/vnd.docker.plugins.v1.x+json` and older
/// clients send no content type at all.
#[derive(Debug, Clone)]
pub struct PluginJson<T>(pub T);

#[derive(Debug)]
pub enum ProtocolRejection {
    Body(BytesRejection),
    Json(serde_json::Error),
}

impl IntoResponse for ProtocolRejection {
    fn into_response(self) -> Response {
        match self {
            ProtocolRejection::Body(rejection) => rejection.into_response(),
            ProtocolRejection::Json(err) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(format!("Malformed request body: {err}"))),
            )
                .into_response(),
        }
    }
}

#[async_trait]
impl<T, S> FromRequest<S> for PluginJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ProtocolRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(ProtocolRejection::Body)?;
        serde_json::from_slice(&bytes)
            .map(PluginJson)
            .map_err(ProtocolRejection::Json)
    }
}
