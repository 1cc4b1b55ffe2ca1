//! Per-connection reader on the producer side.
//!
//! Consumers mostly listen, but they may ask for the producer's host name.
//! Each accepted connection gets a responder that reads consumer→producer
//! frames, answers hostname requests through the registry, and marks the
//! connection closed once the consumer goes away.

use std::io::Read;
use std::sync::Arc;
use std::thread::JoinHandle;

use liveswap_frame::{FrameKind, FrameReader};
use tracing::{debug, warn};

use crate::error::{Result, ServerError};
use crate::registry::{ConnectionHandle, ConnectionRegistry, Outbound};

/// Start the responder thread for one connection.
pub fn spawn<R, W>(
    reader: FrameReader<R>,
    handle: ConnectionHandle,
    registry: Arc<ConnectionRegistry<W>>,
    hostname: Arc<str>,
) -> Result<JoinHandle<()>>
where
    R: Read + Send + 'static,
    W: Outbound + 'static,
{
    let name = format!("liveswap-conn-{}", handle.id());
    std::thread::Builder::new()
        .name(name.clone())
        .spawn(move || serve_requests(reader, &handle, &registry, &hostname))
        .map_err(|source| ServerError::Spawn { name, source })
}

/// Answer requests until the consumer disconnects, then mark it closed.
pub fn serve_requests<R: Read, W: Outbound>(
    mut reader: FrameReader<R>,
    handle: &ConnectionHandle,
    registry: &ConnectionRegistry<W>,
    hostname: &str,
) {
    loop {
        let frame = match reader.read_frame() {
            Ok(frame) => frame,
            Err(err) if err.is_disconnect() => {
                debug!(id = handle.id(), "consumer disconnected");
                break;
            }
            Err(err) => {
                warn!(id = handle.id(), error = %err, "consumer stream failed");
                break;
            }
        };

        match frame.kind {
            FrameKind::RequestHostname => {
                match registry.send_to(handle.id(), FrameKind::HostnameResponse, hostname.as_bytes())
                {
                    Ok(true) => debug!(id = handle.id(), "answered hostname request"),
                    Ok(false) => break,
                    Err(err) => {
                        warn!(id = handle.id(), error = %err, "hostname response failed");
                        break;
                    }
                }
            }
            other => debug!(id = handle.id(), kind = %other, "ignoring frame from consumer"),
        }
    }

    handle.mark_closed();
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};
    use std::sync::Mutex;

    use bytes::BytesMut;
    use liveswap_frame::{encode_frame, Frame};

    use super::*;

    #[derive(Clone, Default)]
    struct Sink(Arc<Mutex<Vec<u8>>>);

    impl Write for Sink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Outbound for Sink {}

    fn requests(kinds: &[FrameKind]) -> FrameReader<Cursor<Vec<u8>>> {
        let mut wire = BytesMut::new();
        for kind in kinds {
            encode_frame(*kind, b"", &mut wire).unwrap();
        }
        FrameReader::new(Cursor::new(wire.to_vec()))
    }

    #[test]
    fn answers_hostname_and_marks_closed_at_eof() {
        let registry = ConnectionRegistry::new();
        let sink = Sink::default();
        let handle = registry.register(sink.clone(), "consumer");

        serve_requests(
            requests(&[FrameKind::RequestHostname, FrameKind::Other(9)]),
            &handle,
            &registry,
            "devbox",
        );

        let bytes = sink.0.lock().unwrap().clone();
        let mut reader = FrameReader::new(Cursor::new(bytes));
        assert_eq!(
            reader.read_frame().unwrap(),
            Frame::new(FrameKind::HostnameResponse, &b"devbox"[..])
        );
        assert!(reader.read_frame().is_err());
        assert!(!handle.is_open());
        assert_eq!(registry.prune_closed(), 1);
    }

    #[test]
    fn truncated_request_ends_responder() {
        let registry = ConnectionRegistry::new();
        let handle = registry.register(Sink::default(), "consumer");

        serve_requests(
            FrameReader::new(Cursor::new(vec![1u8, 0, 0])),
            &handle,
            &registry,
            "devbox",
        );

        assert!(!handle.is_open());
    }
}
