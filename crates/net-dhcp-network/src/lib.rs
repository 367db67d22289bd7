//! net-dhcp-network: Host Network Inspection
//!
//! This crate provides:
//! - Linux bridge discovery over rtnetlink ([`NetlinkBridges`])
//! - The [`BridgeInspector`] seam the plugin uses to validate bridge options
//! - CIDR subnet arithmetic for matching bridge addresses against reserved subnets

pub mod bridges;
pub mod error;
pub mod subnet;

pub use error::{NetlinkError, Result};
pub use bridges::{Bridge, BridgeInspector, InterfaceAddress, NetlinkBridges};
pub use subnet::Subnet;
