//! Host networking errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetlinkError {
    #[error("Failed to open rtnetlink connection: {0}")]
    Connection(#[source] std::io::Error),

    #[error("Netlink request failed: {0}")]
    Request(#[from] ::rtnetlink::Error),

    #[error("Invalid subnet '{0}'")]
    InvalidSubnet(String),
}

pub type Result<T> = std::result::Result<T, NetlinkError>;
