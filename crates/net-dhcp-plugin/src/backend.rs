//! Network backend
//!
//! The lifecycle handlers hand every create/delete to a [`NetworkBackend`].
//! [`BridgeNetworks`] is the default one: it checks the requested host
//! bridge against the kernel and the runtime's own networks, then keeps the
//! record in memory.

use async_trait::async_trait;
use net_dhcp_network::{BridgeInspector, Subnet};
use net_dhcp_runtime::RuntimeClient;
use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::NetworkError;
use crate::protocol::{CreateNetworkRequest, IpamData, DRIVER_NAME};

/// A validated create request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkSpec {
    pub network_id: String,
    pub bridge: Option<String>,
    pub ipv4_data: Vec<IpamData>,
    pub ipv6_data: Vec<IpamData>,
}

impl TryFrom<CreateNetworkRequest> for NetworkSpec {
    type Error = NetworkError;

    fn try_from(request: CreateNetworkRequest) -> Result<Self, Self::Error> {
        let bridge = request.bridge()?;
        Ok(Self {
            network_id: request.network_id,
            bridge,
            ipv4_data: request.ipv4_data.unwrap_or_default(),
            ipv6_data: request.ipv6_data.unwrap_or_default(),
        })
    }
}

/// What the backend remembers about a created network
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkRecord {
    pub network_id: String,
    pub bridge: Option<String>,
}

#[async_trait]
pub trait NetworkBackend: Send + Sync {
    async fn create_network(&self, spec: NetworkSpec) -> Result<(), NetworkError>;

    /// Fails with [`NetworkError::NotFound`] for identifiers never created
    async fn delete_network(&self, network_id: &str) -> Result<(), NetworkError>;
}

/// Networks attached to existing host bridges
pub struct BridgeNetworks {
    runtime: Arc<dyn RuntimeClient>,
    bridges: Arc<dyn BridgeInspector>,
    networks: RwLock<HashMap<String, NetworkRecord>>,
}

impl BridgeNetworks {
    pub fn new(runtime: Arc<dyn RuntimeClient>, bridges: Arc<dyn BridgeInspector>) -> Self {
        Self {
            runtime,
            bridges,
            networks: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, network_id: &str) -> Option<NetworkRecord> {
        self.networks.read().await.get(network_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.networks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.networks.read().await.is_empty()
    }

    /// Host bridges not already carrying a subnet of a runtime-managed network
    pub async fn available_bridges(&self) -> Result<Vec<String>, NetworkError> {
        let reserved: HashSet<Subnet> = self
            .runtime
            .list_networks()
            .await?
            .iter()
            .filter(|n| n.driver != DRIVER_NAME)
            .flat_map(|n| n.subnets())
            .filter_map(|s| s.parse().ok())
            .collect();
        debug!("Subnets reserved by the runtime: {:?}", reserved);

        let bridges = self.bridges.list_bridges().await?;
        Ok(bridges
            .into_iter()
            .filter(|b| !b.subnets().any(|s| reserved.contains(&s)))
            .map(|b| b.name)
            .collect())
    }

    async fn ensure_bridge_available(&self, bridge: &str) -> Result<(), NetworkError> {
        if self.available_bridges().await?.iter().any(|b| b == bridge) {
            Ok(())
        } else {
            Err(NetworkError::invalid_request(format!(
                "Bridge \"{bridge}\" not found (or the specified bridge is already used by Docker)"
            )))
        }
    }
}

#[async_trait]
impl NetworkBackend for BridgeNetworks {
    async fn create_network(&self, spec: NetworkSpec) -> Result<(), NetworkError> {
        if spec.network_id.is_empty() {
            return Err(NetworkError::invalid_request("NetworkID is required"));
        }

        if let Some(ref bridge) = spec.bridge {
            self.ensure_bridge_available(bridge).await?;
        }

        let mut networks = self.networks.write().await;
        match networks.entry(spec.network_id.clone()) {
            Entry::Occupied(_) => Err(NetworkError::allocation_failed(format!(
                "network {} already exists",
                spec.network_id
            ))),
            Entry::Vacant(slot) => {
                match spec.bridge {
                    Some(ref bridge) => info!(
                        "Creating network \"{}\" (using bridge \"{}\")",
                        spec.network_id, bridge
                    ),
                    None => info!("Creating network \"{}\"", spec.network_id),
                }
                slot.insert(NetworkRecord {
                    network_id: spec.network_id,
                    bridge: spec.bridge,
                });
                Ok(())
            }
        }
    }

    async fn delete_network(&self, network_id: &str) -> Result<(), NetworkError> {
        match self.networks.write().await.remove(network_id) {
            Some(record) => {
                info!("Deleted network \"{}\"", record.network_id);
                Ok(())
            }
            None => Err(NetworkError::not_found(network_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use net_dhcp_network::{Bridge, InterfaceAddress, NetlinkError};
    use net_dhcp_runtime::{Ipam, IpamConfig, NetworkSummary, RuntimeError};

    struct FakeRuntime {
        networks: Vec<NetworkSummary>,
    }

    #[async_trait]
    impl RuntimeClient for FakeRuntime {
        async fn list_networks(&self) -> net_dhcp_runtime::Result<Vec<NetworkSummary>> {
            Ok(self.networks.clone())
        }

        async fn close(&self) -> net_dhcp_runtime::Result<()> {
            Ok(())
        }
    }

    struct FailingRuntime;

    #[async_trait]
    impl RuntimeClient for FailingRuntime {
        async fn list_networks(&self) -> net_dhcp_runtime::Result<Vec<NetworkSummary>> {
            Err(RuntimeError::Closed)
        }

        async fn close(&self) -> net_dhcp_runtime::Result<()> {
            Ok(())
        }
    }

    struct FakeBridges(Vec<Bridge>);

    #[async_trait]
    impl BridgeInspector for FakeBridges {
        async fn list_bridges(&self) -> net_dhcp_network::Result<Vec<Bridge>> {
            Ok(self.0.clone())
        }
    }

    struct NoNetlink;

    #[async_trait]
    impl BridgeInspector for NoNetlink {
        async fn list_bridges(&self) -> net_dhcp_network::Result<Vec<Bridge>> {
            Err(NetlinkError::Connection(std::io::Error::other("no netlink")))
        }
    }

    fn network(driver: &str, subnet: &str) -> NetworkSummary {
        NetworkSummary {
            id: format!("{driver}-id"),
            name: driver.to_string(),
            driver: driver.to_string(),
            ipam: Ipam {
                driver: "default".to_string(),
                config: Some(vec![IpamConfig {
                    subnet: Some(subnet.to_string()),
                    gateway: None,
                }]),
            },
        }
    }

    fn bridge(name: &str, index: u32, addr: &str, prefix_len: u8) -> Bridge {
        Bridge {
            name: name.to_string(),
            index,
            addresses: vec![InterfaceAddress {
                address: addr.parse().unwrap(),
                prefix_len,
            }],
        }
    }

    fn backend() -> BridgeNetworks {
        let runtime = FakeRuntime {
            networks: vec![
                network("bridge", "172.17.0.0/16"),
                network(DRIVER_NAME, "10.10.0.0/24"),
            ],
        };
        let bridges = FakeBridges(vec![
            bridge("docker0", 3, "172.17.0.1", 16),
            bridge("br0", 4, "10.10.0.1", 24),
        ]);
        BridgeNetworks::new(Arc::new(runtime), Arc::new(bridges))
    }

    fn spec(network_id: &str, bridge: Option<&str>) -> NetworkSpec {
        NetworkSpec {
            network_id: network_id.to_string(),
            bridge: bridge.map(str::to_string),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_available_bridges_skips_runtime_subnets() {
        let backend = backend();
        assert_eq!(backend.available_bridges().await.unwrap(), vec!["br0"]);
    }

    #[tokio::test]
    async fn test_create_and_delete() {
        let backend = backend();
        backend.create_network(spec("net1", Some("br0"))).await.unwrap();
        assert_eq!(
            backend.get("net1").await,
            Some(NetworkRecord {
                network_id: "net1".to_string(),
                bridge: Some("br0".to_string()),
            })
        );

        backend.delete_network("net1").await.unwrap();
        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn test_create_without_bridge_skips_host_lookup() {
        let backend = BridgeNetworks::new(Arc::new(FailingRuntime), Arc::new(NoNetlink));
        backend.create_network(spec("net1", None)).await.unwrap();
        assert_eq!(backend.len().await, 1);
    }

    #[tokio::test]
    async fn test_bridge_used_by_runtime_is_rejected() {
        let err = backend()
            .create_network(spec("net1", Some("docker0")))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Bridge \"docker0\" not found (or the specified bridge is already used by Docker)"
        );
        assert!(matches!(err, NetworkError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_unknown_bridge_is_rejected() {
        let err = backend()
            .create_network(spec("net1", Some("br9")))
            .await
            .unwrap_err();
        assert!(matches!(err, NetworkError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_empty_network_id_is_rejected() {
        let err = backend().create_network(spec("", None)).await.unwrap_err();
        assert!(matches!(err, NetworkError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_duplicate_network_id() {
        let backend = backend();
        backend.create_network(spec("net1", None)).await.unwrap();
        let err = backend.create_network(spec("net1", None)).await.unwrap_err();
        assert!(matches!(err, NetworkError::AllocationFailed(_)));
    }

    #[tokio::test]
    async fn test_delete_unknown_network() {
        let err = backend().delete_network("ghost").await.unwrap_err();
        assert!(matches!(err, NetworkError::NotFound(ref id) if id == "ghost"));
    }

    #[tokio::test]
    async fn test_lookup_failures_are_backend_errors() {
        let backend = BridgeNetworks::new(Arc::new(FailingRuntime), Arc::new(NoNetlink));
        let err = backend
            .create_network(spec("net1", Some("br0")))
            .await
            .unwrap_err();
        assert!(matches!(err, NetworkError::Backend(_)));
    }

    #[tokio::test]
    async fn test_concurrent_creates_with_distinct_ids() {
        let backend = Arc::new(backend());
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let backend = Arc::clone(&backend);
                tokio::spawn(async move {
                    backend
                        .create_network(spec(&format!("net{i}"), Some("br0")))
                        .await
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(backend.len().await, 16);
    }
}
