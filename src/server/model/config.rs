use derive_more::Display;
use std::net::SocketAddrV4;
use std::str::FromStr;
use std::time::Duration;

/// Server configs
#[derive(Debug)]
pub(crate) struct ServerConfig {
    pub addr: SocketAddrV4,
    pub store: StoreConfig,
    pub pricing: PricingSource,
}

impl ServerConfig {
    pub fn new(addr: SocketAddrV4, store: StoreConfig, pricing: PricingSource) -> Self {
        Self {
            addr,
            store,
            pricing,
        }
    }
}

#[derive(Debug)]
pub(crate) struct StoreConfig {
    pub backend: StoreBackend,
    pub conn_str: String,
    pub pool_size: usize,
    /// budget of every single store call
    pub timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub(crate) enum StoreBackend {
    #[display("postgres")]
    Postgres,
    #[display("memory")]
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "postgres" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            s => Err(format!("Invalid store backend: {s}")),
        }
    }
}

/// Where line item amounts come from when an order is summarized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
pub(crate) enum PricingSource {
    /// current food catalog price, one unit per line item
    #[default]
    #[display("catalog")]
    Catalog,
    /// unit price stored on the line item, times its quantity
    #[display("line_item")]
    LineItem,
}

impl FromStr for PricingSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "catalog" => Ok(Self::Catalog),
            "line_item" => Ok(Self::LineItem),
            s => Err(format!("Invalid pricing source: {s}")),
        }
    }
}
