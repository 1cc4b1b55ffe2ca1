//! The consumer's receive loop.
//!
//! [`enable`] connects to the producer once and, on a background thread,
//! turns every `DOCUMENT_UPDATED` frame into a hot swap of the matching live
//! node. Swaps are awaited one at a time so they land in arrival order.

use std::io::Read;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use liveswap_frame::{Frame, FrameConfig, FrameKind, FrameReader, FrameWriter};
use liveswap_transport::{LiveStream, TcpTransport};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::identity::IdentityExtractor;
use crate::locate::find;
use crate::swap::HotSwap;
use crate::tree::LiveTree;

/// What became of one received frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Not a document frame.
    Ignored(FrameKind),
    /// The document carries no identity.
    NoIdentity,
    /// Nothing on screen has the document's identity.
    NotFound(String),
    Swapped(String),
    /// The swap ran and failed; the node's state was restored.
    SwapFailed { identity: String, reason: String },
}

/// Everything the receive loop needs on the consumer side.
#[derive(Debug)]
pub struct ClientSession {
    tree: Arc<LiveTree>,
    swap: HotSwap,
    extractor: IdentityExtractor,
}

impl ClientSession {
    pub fn new(tree: Arc<LiveTree>, swap: HotSwap) -> Self {
        Self {
            tree,
            swap,
            extractor: IdentityExtractor::default(),
        }
    }

    /// Session using the identity attribute from `config`.
    pub fn from_config(tree: Arc<LiveTree>, swap: HotSwap, config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            tree,
            swap,
            extractor: IdentityExtractor::new(&config.identity_attribute)?,
        })
    }

    pub fn tree(&self) -> &Arc<LiveTree> {
        &self.tree
    }

    /// Act on one frame from the producer.
    ///
    /// Never fails: every per-frame problem is logged and reported in the
    /// outcome so the loop can carry on with the next frame.
    pub fn handle_frame(&self, frame: &Frame) -> FrameOutcome {
        if frame.kind != FrameKind::DocumentUpdated {
            debug!(kind = %frame.kind, size = frame.payload.len(), "ignoring frame");
            return FrameOutcome::Ignored(frame.kind);
        }

        let text = frame.text();
        let Some(identity) = self.extractor.extract(&text) else {
            debug!(size = text.len(), "document has no identity, skipping");
            return FrameOutcome::NoIdentity;
        };

        let Some(target) = self.tree.root().and_then(|root| find(&root, identity)) else {
            debug!(identity, "no live instance for document");
            return FrameOutcome::NotFound(identity.to_string());
        };

        match self.swap.apply(target, &*text).wait() {
            Ok(()) => {
                info!(identity, size = text.len(), "hot swapped");
                FrameOutcome::Swapped(identity.to_string())
            }
            Err(err) => {
                warn!(identity, error = %err, "hot swap failed");
                FrameOutcome::SwapFailed {
                    identity: identity.to_string(),
                    reason: err.to_string(),
                }
            }
        }
    }
}

/// Handle frames from `reader` until the producer goes away.
///
/// A clean close or a reset ends the loop with `Ok`. Any other read failure
/// is returned.
pub fn receive_loop<R: Read>(reader: &mut FrameReader<R>, session: &ClientSession) -> Result<()> {
    loop {
        let frame = match reader.read_frame() {
            Ok(frame) => frame,
            Err(err) if err.is_disconnect() => {
                info!(error = %err, "producer connection ended");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };
        session.handle_frame(&frame);
    }
}

/// Connect to the producer and start receiving on a background thread.
///
/// The connection is made once, on the background thread; there is no
/// reconnection. `on_failure` is called at most once, with the connect error
/// or the read error that ended the loop. A clean close does not call it.
pub fn enable<F>(
    config: &ClientConfig,
    session: Arc<ClientSession>,
    on_failure: F,
) -> Result<JoinHandle<()>>
where
    F: FnOnce(ClientError) + Send + 'static,
{
    let addr = config.server_addr;
    let connect_timeout = config.connect_timeout;
    let frame_config = config.frame_config();
    let name = "liveswap-receive".to_string();

    std::thread::Builder::new()
        .name(name.clone())
        .spawn(move || {
            let result = connect(addr, connect_timeout, frame_config)
                .and_then(|mut reader| receive_loop(&mut reader, &session));
            if let Err(err) = result {
                warn!(addr = %addr, error = %err, "live reload stopped");
                on_failure(err);
            }
        })
        .map_err(|source| ClientError::Spawn { name, source })
}

fn connect(
    addr: SocketAddr,
    timeout: Option<Duration>,
    config: FrameConfig,
) -> Result<FrameReader<LiveStream>> {
    let stream = match timeout {
        Some(timeout) => TcpTransport::connect_timeout(addr, timeout)?,
        None => TcpTransport::connect(addr)?,
    };
    stream.set_nodelay(true)?;
    info!(addr = %addr, "connected to producer");
    Ok(FrameReader::with_config_live(stream, config)?)
}

/// Ask the producer at `addr` for its host name.
///
/// Documents broadcast while waiting are skipped.
pub fn query_hostname(addr: SocketAddr, timeout: Duration) -> Result<String> {
    let config = FrameConfig {
        read_timeout: Some(timeout),
        write_timeout: Some(timeout),
        ..FrameConfig::default()
    };
    let stream = TcpTransport::connect_timeout(addr, timeout)?;
    let mut writer = FrameWriter::with_config_live(stream.try_clone()?, config.clone())?;
    let mut reader = FrameReader::with_config_live(stream, config)?;

    writer.send(FrameKind::RequestHostname, &[])?;
    loop {
        let frame = reader.read_frame()?;
        match frame.kind {
            FrameKind::HostnameResponse => return Ok(frame.text().into_owned()),
            FrameKind::DocumentUpdated => debug!("skipping document while awaiting hostname"),
            other => return Err(ClientError::UnexpectedResponse(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor};
    use std::sync::Mutex;

    use bytes::BytesMut;
    use liveswap_frame::encode_frame;

    use super::*;
    use crate::dispatch::InlineDispatcher;
    use crate::error::LoadError;
    use crate::swap::MarkupLoader;
    use crate::tree::testing::TestNode;
    use crate::tree::LiveNode;

    /// Records every document it loads; rejects documents containing "broken".
    #[derive(Default)]
    struct RecordingLoader {
        loaded: Mutex<Vec<(String, String)>>,
    }

    impl MarkupLoader for RecordingLoader {
        fn load(&self, node: &dyn LiveNode, markup: &str) -> std::result::Result<(), LoadError> {
            if markup.contains("broken") {
                return Err("broken markup".into());
            }
            self.loaded
                .lock()
                .unwrap()
                .push((node.identity().to_string(), markup.to_string()));
            Ok(())
        }
    }

    fn session(loader: Arc<RecordingLoader>) -> ClientSession {
        let tree = Arc::new(LiveTree::with_root(TestNode::new("App.MainPage").into_ref()));
        ClientSession::new(tree, HotSwap::new(loader, Arc::new(InlineDispatcher)))
    }

    fn wire(frames: &[(FrameKind, &str)]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for (kind, text) in frames {
            encode_frame(*kind, text.as_bytes(), &mut buf).unwrap();
        }
        buf.to_vec()
    }

    #[test]
    fn outcomes_per_frame() {
        let loader = Arc::new(RecordingLoader::default());
        let session = session(loader.clone());

        assert_eq!(
            session.handle_frame(&Frame::new(FrameKind::HostnameResponse, "devbox")),
            FrameOutcome::Ignored(FrameKind::HostnameResponse)
        );
        assert_eq!(
            session.handle_frame(&Frame::document("<Page/>")),
            FrameOutcome::NoIdentity
        );
        assert_eq!(
            session.handle_frame(&Frame::document(r#"<Page x:Class="App.Other"/>"#)),
            FrameOutcome::NotFound("App.Other".to_string())
        );
        assert_eq!(
            session.handle_frame(&Frame::document(r#"<Page x:Class="App.MainPage"/>"#)),
            FrameOutcome::Swapped("App.MainPage".to_string())
        );
        assert!(matches!(
            session.handle_frame(&Frame::document(r#"<Page x:Class="App.MainPage" broken"#)),
            FrameOutcome::SwapFailed { .. }
        ));
        assert_eq!(loader.loaded.lock().unwrap().len(), 1);
    }

    #[test]
    fn no_root_means_not_found() {
        let loader = Arc::new(RecordingLoader::default());
        let session = ClientSession::new(
            Arc::new(LiveTree::new()),
            HotSwap::new(loader, Arc::new(InlineDispatcher)),
        );
        assert_eq!(
            session.handle_frame(&Frame::document(r#"<Page x:Class="App.MainPage"/>"#)),
            FrameOutcome::NotFound("App.MainPage".to_string())
        );
    }

    #[test]
    fn loop_continues_past_frames_without_identity() {
        let loader = Arc::new(RecordingLoader::default());
        let session = session(loader.clone());
        let bytes = wire(&[
            (FrameKind::DocumentUpdated, "<Page/>"),
            (FrameKind::Other(42), "future"),
            (FrameKind::DocumentUpdated, r#"<Page x:Class="App.MainPage" broken"#),
            (FrameKind::DocumentUpdated, r#"<Page x:Class="App.MainPage">v2</Page>"#),
        ]);

        let mut reader = FrameReader::new(Cursor::new(bytes));
        receive_loop(&mut reader, &session).unwrap();

        let loaded = loader.loaded.lock().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].1, r#"<Page x:Class="App.MainPage">v2</Page>"#);
    }

    #[test]
    fn swaps_apply_in_arrival_order() {
        let loader = Arc::new(RecordingLoader::default());
        let session = session(loader.clone());
        let bytes = wire(&[
            (FrameKind::DocumentUpdated, r#"<Page x:Class="App.MainPage">1</Page>"#),
            (FrameKind::DocumentUpdated, r#"<Page x:Class="App.MainPage">2</Page>"#),
            (FrameKind::DocumentUpdated, r#"<Page x:Class="App.MainPage">3</Page>"#),
        ]);

        receive_loop(&mut FrameReader::new(Cursor::new(bytes)), &session).unwrap();

        let bodies: Vec<_> = loader
            .loaded
            .lock()
            .unwrap()
            .iter()
            .map(|(_, markup)| markup.clone())
            .collect();
        assert!(bodies[0].contains(">1<"));
        assert!(bodies[1].contains(">2<"));
        assert!(bodies[2].contains(">3<"));
    }

    #[test]
    fn truncated_stream_is_a_failure() {
        let loader = Arc::new(RecordingLoader::default());
        let session = session(loader);
        let mut bytes = wire(&[(FrameKind::DocumentUpdated, r#"<Page x:Class="App.MainPage"/>"#)]);
        bytes.truncate(bytes.len() - 3);

        let err = receive_loop(&mut FrameReader::new(Cursor::new(bytes)), &session).unwrap_err();
        assert!(matches!(
            err,
            ClientError::Frame(liveswap_frame::FrameError::Truncated { .. })
        ));
    }

    #[test]
    fn reset_ends_loop_quietly() {
        struct ResetReader;

        impl Read for ResetReader {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::from(io::ErrorKind::ConnectionReset))
            }
        }

        let session = session(Arc::new(RecordingLoader::default()));
        receive_loop(&mut FrameReader::new(ResetReader), &session).unwrap();
    }

    #[test]
    fn custom_identity_attribute() {
        let loader = Arc::new(RecordingLoader::default());
        let tree = Arc::new(LiveTree::with_root(TestNode::new("App.MainPage").into_ref()));
        let config = ClientConfig {
            identity_attribute: "data-view".to_string(),
            ..ClientConfig::default()
        };
        let session = ClientSession::from_config(
            tree,
            HotSwap::new(loader, Arc::new(InlineDispatcher)),
            &config,
        )
        .unwrap();

        assert_eq!(
            session.handle_frame(&Frame::document(r#"<div data-view="App.MainPage"/>"#)),
            FrameOutcome::Swapped("App.MainPage".to_string())
        );
    }
}
