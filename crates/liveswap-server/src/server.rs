use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use liveswap_frame::{FrameConfig, FrameError, FrameKind, FrameReader};
use liveswap_transport::{local_hostname, LiveStream, TcpTransport};
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::document::read_document;
use crate::error::{Result, ServerError};
use crate::registry::{ConnectionHandle, ConnectionRegistry};
use crate::responder;

/// Pause after a failed accept so a persistent failure (e.g. descriptor
/// exhaustion) does not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// Accepts consumers and pushes changed documents to all of them.
pub struct BroadcastServer {
    transport: Arc<TcpTransport>,
    registry: Arc<ConnectionRegistry<LiveStream>>,
    hostname: Arc<str>,
    config: ServerConfig,
}

impl BroadcastServer {
    /// Bind the listening socket.
    pub fn bind(config: ServerConfig) -> Result<Self> {
        let transport = TcpTransport::bind(config.bind_addr)?;
        Ok(Self {
            transport: Arc::new(transport),
            registry: Arc::new(ConnectionRegistry::new()),
            hostname: Arc::from(local_hostname()),
            config,
        })
    }

    /// Override the host name reported to consumers.
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Arc::from(hostname.into());
        self
    }

    /// Address actually bound (resolves port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.transport.local_addr()
    }

    /// The live consumer connections.
    pub fn registry(&self) -> &Arc<ConnectionRegistry<LiveStream>> {
        &self.registry
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Accept consumers on a background thread, indefinitely.
    ///
    /// Accepting never blocks change handling: the loop owns its own thread
    /// and only touches the registry to append.
    pub fn spawn_accept_loop(&self) -> Result<JoinHandle<()>> {
        let acceptor = self.acceptor();
        let name = "liveswap-accept".to_string();
        std::thread::Builder::new()
            .name(name.clone())
            .spawn(move || acceptor.run())
            .map_err(|source| ServerError::Spawn { name, source })
    }

    /// Accept exactly one consumer on the calling thread.
    pub fn accept_one(&self) -> Result<ConnectionHandle> {
        self.acceptor().accept_one()
    }

    /// Handle a "document changed" notification for `path`.
    ///
    /// Returns `Ok(None)` when the change is filtered out, the document
    /// could not be read, or it exceeds the payload maximum (the next change
    /// gets another chance), and
    /// `Ok(Some(n))` with the number of consumers reached otherwise. Only a
    /// broadcast failure that is not a consumer going away is an error.
    pub fn document_changed(&self, path: &Path) -> Result<Option<usize>> {
        let Some(document) = self.config.filter.resolve(path) else {
            debug!(path = %path.display(), "change ignored by filter");
            return Ok(None);
        };

        let text = match read_document(&document) {
            Ok(text) => text,
            Err(err) => {
                warn!(path = %document.display(), error = %err, "could not read changed document");
                return Ok(None);
            }
        };

        if text.len() > self.config.max_payload_size {
            warn!(
                path = %document.display(),
                size = text.len(),
                max = self.config.max_payload_size,
                "changed document too large to push"
            );
            return Ok(None);
        }

        info!(path = %document.display(), size = text.len(), "document changed");
        self.broadcast_document(&text).map(Some)
    }

    /// Push `text` to every consumer as a `DOCUMENT_UPDATED` frame.
    ///
    /// A document larger than the configured maximum is refused with
    /// `FrameError::PayloadTooLarge` and nothing is sent, since consumers
    /// treat an oversized frame as a broken stream.
    pub fn broadcast_document(&self, text: &str) -> Result<usize> {
        if text.len() > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: text.len(),
                max: self.config.max_payload_size,
            }
            .into());
        }
        self.registry
            .broadcast(FrameKind::DocumentUpdated, text.as_bytes())
    }

    fn acceptor(&self) -> Acceptor {
        Acceptor {
            transport: Arc::clone(&self.transport),
            registry: Arc::clone(&self.registry),
            hostname: Arc::clone(&self.hostname),
            frame_config: FrameConfig {
                max_payload_size: self.config.max_payload_size,
                read_timeout: None,
                write_timeout: self.config.write_timeout,
            },
        }
    }
}

struct Acceptor {
    transport: Arc<TcpTransport>,
    registry: Arc<ConnectionRegistry<LiveStream>>,
    hostname: Arc<str>,
    frame_config: FrameConfig,
}

impl Acceptor {
    fn run(self) {
        loop {
            if let Err(err) = self.accept_one() {
                error!(error = %err, "failed to accept consumer");
                std::thread::sleep(ACCEPT_BACKOFF);
            }
        }
    }

    fn accept_one(&self) -> Result<ConnectionHandle> {
        let stream = self.transport.accept()?;
        stream.set_nodelay(true)?;
        stream.set_write_timeout(self.frame_config.write_timeout)?;

        let label = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let reader = FrameReader::with_config_live(stream.try_clone()?, self.frame_config.clone())?;

        let handle = self.registry.register(stream, label);
        if let Err(err) = responder::spawn(
            reader,
            handle.clone(),
            Arc::clone(&self.registry),
            Arc::clone(&self.hostname),
        ) {
            handle.mark_closed();
            return Err(err);
        }

        Ok(handle)
    }
}

impl std::fmt::Debug for BroadcastServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastServer")
            .field("addr", &self.transport.local_addr())
            .field("consumers", &self.registry.len())
            .field("filter", &self.config.filter)
            .finish()
    }
}
