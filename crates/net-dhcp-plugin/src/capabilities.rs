//! Capability Handler

use axum::Json;
use serde::{Deserialize, Serialize};

/// Reach of a network as the daemon understands it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Local,
    Global,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    #[serde(rename = "Scope")]
    pub scope: Scope,

    #[serde(rename = "ConnectivityScope")]
    pub connectivity_scope: Scope,
}

/// Networks are managed per host, but containers on them reach the
/// bridge's real L2 segment.
pub const CAPABILITIES: Capabilities = Capabilities {
    scope: Scope::Local,
    connectivity_scope: Scope::Global,
};

/// POST /NetworkDriver.GetCapabilities
pub async fn get_capabilities() -> Json<Capabilities> {
    Json(CAPABILITIES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_wire_format() {
        assert_eq!(
            serde_json::to_string(&CAPABILITIES).unwrap(),
            r#"{"Scope":"local","ConnectivityScope":"global"}"#
        );
    }
}
