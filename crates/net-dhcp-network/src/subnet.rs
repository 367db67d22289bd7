//! CIDR subnets

use crate::error::{NetlinkError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// A network prefix with host bits cleared, e.g. `10.0.0.0/24`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subnet {
    network: IpAddr,
    prefix_len: u8,
}

impl Subnet {
    /// Build the subnet containing `addr`. Fails if `prefix_len` is too long
    /// for the address family.
    pub fn new(addr: IpAddr, prefix_len: u8) -> Result<Self> {
        let network = match addr {
            IpAddr::V4(v4) if prefix_len <= 32 => {
                let mask = u32::MAX.checked_shl(32 - u32::from(prefix_len)).unwrap_or(0);
                IpAddr::V4(Ipv4Addr::from(u32::from(v4) & mask))
            }
            IpAddr::V6(v6) if prefix_len <= 128 => {
                let mask = u128::MAX.checked_shl(128 - u32::from(prefix_len)).unwrap_or(0);
                IpAddr::V6(Ipv6Addr::from(u128::from(v6) & mask))
            }
            _ => return Err(NetlinkError::InvalidSubnet(format!("{addr}/{prefix_len}"))),
        };

        Ok(Self {
            network,
            prefix_len,
        })
    }

    pub fn network(&self) -> IpAddr {
        self.network
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }
}

impl FromStr for Subnet {
    type Err = NetlinkError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || NetlinkError::InvalidSubnet(s.to_string());
        let (addr, prefix) = s.trim().split_once('/').ok_or_else(invalid)?;
        let addr: IpAddr = addr.parse().map_err(|_| invalid())?;
        let prefix_len: u8 = prefix.parse().map_err(|_| invalid())?;
        Self::new(addr, prefix_len)
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_bits_are_cleared() {
        let subnet: Subnet = "192.168.1.77/24".parse().unwrap();
        assert_eq!(subnet.to_string(), "192.168.1.0/24");
        assert_eq!(subnet, "192.168.1.0/24".parse().unwrap());
    }

    #[test]
    fn test_edge_prefixes() {
        assert_eq!("10.1.2.3/0".parse::<Subnet>().unwrap().to_string(), "0.0.0.0/0");
        assert_eq!("10.1.2.3/32".parse::<Subnet>().unwrap().to_string(), "10.1.2.3/32");
        assert_eq!(
            "fd00:1:2::5/64".parse::<Subnet>().unwrap().to_string(),
            "fd00:1:2::/64"
        );
    }

    #[test]
    fn test_invalid_subnets() {
        for s in ["10.0.0.0", "10.0.0.0/33", "fd00::/129", "nope/8", "10.0.0.0/x"] {
            assert!(s.parse::<Subnet>().is_err(), "{s} should not parse");
        }
    }
}
