use std::net::SocketAddr;
use std::time::Duration;

use liveswap_frame::{FrameConfig, DEFAULT_MAX_PAYLOAD};
use liveswap_transport::DEFAULT_ADDR;

use crate::identity::DEFAULT_IDENTITY_ATTRIBUTE;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for a consumer connection.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Producer address. Default: `127.0.0.1:6000`.
    pub server_addr: SocketAddr,
    /// Give up connecting after this long. `None` uses the OS default.
    pub connect_timeout: Option<Duration>,
    /// Attribute whose value names the document's target.
    pub identity_attribute: String,
    /// Largest document accepted from the producer.
    pub max_payload_size: usize,
}

impl ClientConfig {
    pub fn new(server_addr: SocketAddr) -> Self {
        Self {
            server_addr,
            ..Self::default()
        }
    }

    pub(crate) fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            max_payload_size: self.max_payload_size,
            // The receive loop waits for as long as the producer stays up.
            read_timeout: None,
            write_timeout: None,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: DEFAULT_ADDR,
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
            identity_attribute: DEFAULT_IDENTITY_ATTRIBUTE.to_string(),
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}
