use std::net::SocketAddr;
use std::time::Duration;

use liveswap_frame::DEFAULT_MAX_PAYLOAD;
use liveswap_transport::DEFAULT_ADDR;

use crate::document::DocumentFilter;

/// Per-connection write deadline applied to every accepted consumer.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for [`BroadcastServer`](crate::BroadcastServer).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on. Default: `127.0.0.1:6000`.
    pub bind_addr: SocketAddr,
    /// Write deadline per consumer. `None` blocks for as long as the OS
    /// lets a write block.
    pub write_timeout: Option<Duration>,
    /// Which change events lead to a broadcast, and of which file.
    pub filter: DocumentFilter,
    /// Largest document that will be pushed or request that will be read.
    pub max_payload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_ADDR,
            write_timeout: Some(DEFAULT_WRITE_TIMEOUT),
            filter: DocumentFilter::default(),
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}
