//! Bridge discovery - native rtnetlink queries for bridge links and their addresses

use crate::error::{NetlinkError, Result};
use crate::subnet::Subnet;
use async_trait::async_trait;
use futures::TryStreamExt;
use netlink_packet_route::address::AddressAttribute;
use netlink_packet_route::link::{InfoKind, LinkAttribute, LinkInfo};
use rtnetlink::new_connection;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use tracing::{debug, warn};

/// A Linux bridge on the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bridge {
    pub name: String,
    pub index: u32,
    pub addresses: Vec<InterfaceAddress>,
}

/// IP address on an interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceAddress {
    pub address: IpAddr,
    pub prefix_len: u8,
}

impl InterfaceAddress {
    /// The subnet this address lives in
    pub fn subnet(&self) -> Option<Subnet> {
        Subnet::new(self.address, self.prefix_len).ok()
    }
}

impl Bridge {
    /// Subnets of every address assigned to the bridge
    pub fn subnets(&self) -> impl Iterator<Item = Subnet> + '_ {
        self.addresses.iter().filter_map(InterfaceAddress::subnet)
    }
}

/// Source of bridge information, so the plugin can run without netlink in tests.
#[async_trait]
pub trait BridgeInspector: Send + Sync {
    async fn list_bridges(&self) -> Result<Vec<Bridge>>;
}

/// Lists bridges straight from the kernel over rtnetlink
#[derive(Debug, Clone, Default)]
pub struct NetlinkBridges;

impl NetlinkBridges {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BridgeInspector for NetlinkBridges {
    async fn list_bridges(&self) -> Result<Vec<Bridge>> {
        let (connection, handle, _) = new_connection().map_err(NetlinkError::Connection)?;
        tokio::spawn(connection);

        let mut bridges = Vec::new();
        let mut links = handle.link().get().execute();

        while let Some(link) = links.try_next().await? {
            let mut name = None;
            let mut is_bridge = false;

            for attr in &link.attributes {
                match attr {
                    LinkAttribute::IfName(n) => name = Some(n.clone()),
                    LinkAttribute::LinkInfo(infos) => {
                        is_bridge |= infos
                            .iter()
                            .any(|info| matches!(info, LinkInfo::Kind(InfoKind::Bridge)));
                    }
                    _ => {}
                }
            }

            let Some(name) = name.filter(|_| is_bridge) else {
                continue;
            };

            let index = link.header.index;
            let addresses = match get_interface_addresses(&handle, index).await {
                Ok(addrs) => addrs,
                Err(e) => {
                    warn!("Failed to get addresses for bridge {}: {}", name, e);
                    Vec::new()
                }
            };

            bridges.push(Bridge {
                name,
                index,
                addresses,
            });
        }

        debug!("Found {} bridges", bridges.len());
        Ok(bridges)
    }
}

/// Get addresses for a specific interface
async fn get_interface_addresses(
    handle: &rtnetlink::Handle,
    ifindex: u32,
) -> Result<Vec<InterfaceAddress>> {
    let mut addresses = Vec::new();
    let mut addr_stream = handle
        .address()
        .get()
        .set_link_index_filter(ifindex)
        .execute();

    while let Some(addr_msg) = addr_stream.try_next().await? {
        for attr in &addr_msg.attributes {
            if let AddressAttribute::Address(addr) = attr {
                addresses.push(InterfaceAddress {
                    address: *addr,
                    prefix_len: addr_msg.header.prefix_len,
                });
            }
        }
    }

    Ok(addresses)
}
