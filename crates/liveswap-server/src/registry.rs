use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use liveswap_frame::{encode_to_bytes, write_wire, FrameError, FrameKind};
use liveswap_transport::{is_peer_reset, is_write_deadline, LiveStream};
use tracing::{debug, info, warn};

use crate::error::{Result, ServerError};

/// Identifier assigned to a connection at registration.
pub type ConnectionId = u64;

/// The write half of a registered connection.
pub trait Outbound: Write + Send {
    /// Tear down the connection after it has been dropped from the registry.
    fn disconnect(&self) {}
}

impl Outbound for LiveStream {
    fn disconnect(&self) {
        if let Err(err) = self.shutdown() {
            debug!(error = %err, "shutdown after removal failed");
        }
    }
}

/// Shared view of one registered connection.
///
/// The responder thread marks the connection closed when it sees the peer
/// go away; the next broadcast then prunes it without writing.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    open: Arc<AtomicBool>,
}

impl ConnectionHandle {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    pub fn mark_closed(&self) {
        self.open.store(false, Ordering::SeqCst);
    }
}

struct Connection<W> {
    id: ConnectionId,
    label: String,
    writer: W,
    open: Arc<AtomicBool>,
}

/// How a failed write affects the connection it was sent to.
enum WriteFailure {
    /// The consumer is gone or stalled past its deadline; drop it.
    Gone,
    /// Something the caller has to hear about.
    Fatal,
}

fn classify(err: &FrameError) -> WriteFailure {
    match err {
        FrameError::ConnectionClosed => WriteFailure::Gone,
        FrameError::Io(io) if is_peer_reset(io) || is_write_deadline(io) => WriteFailure::Gone,
        _ => WriteFailure::Fatal,
    }
}

/// The set of live consumer connections.
///
/// A single mutex guards the set: registration comes from the accept
/// thread, broadcasts from the change-event thread, directed replies from
/// responder threads.
pub struct ConnectionRegistry<W> {
    connections: Mutex<Vec<Connection<W>>>,
    next_id: AtomicU64,
}

impl<W: Outbound> ConnectionRegistry<W> {
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Add a connection. There is no upper bound on the count.
    pub fn register(&self, writer: W, label: impl Into<String>) -> ConnectionHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let open = Arc::new(AtomicBool::new(true));
        let label = label.into();

        let mut connections = self.lock();
        connections.push(Connection {
            id,
            label: label.clone(),
            writer,
            open: Arc::clone(&open),
        });
        info!(connection = %label, id, total = connections.len(), "consumer registered");

        ConnectionHandle { id, open }
    }

    /// Send one frame to every registered connection, in registration order.
    ///
    /// The frame is encoded once and the same bytes go to everyone.
    /// Connections already marked closed are pruned first. A connection
    /// whose write fails because the peer reset it, or whose write deadline
    /// expired, is removed and does not fail the call. Any other write
    /// failure is returned; connections after the failing one are not
    /// written to.
    ///
    /// Returns how many connections received the frame.
    pub fn broadcast(&self, kind: FrameKind, payload: &[u8]) -> Result<usize> {
        let wire = encode_to_bytes(kind, payload)?;
        let mut connections = self.lock();
        prune(&mut connections);

        let mut delivered = 0usize;
        let mut index = 0usize;
        while index < connections.len() {
            let conn = &mut connections[index];
            match write_wire(&mut conn.writer, &wire) {
                Ok(()) => {
                    delivered += 1;
                    index += 1;
                }
                Err(err) => match classify(&err) {
                    WriteFailure::Gone => {
                        info!(connection = %conn.label, error = %err, "dropping consumer");
                        let removed = connections.remove(index);
                        removed.open.store(false, Ordering::SeqCst);
                        removed.writer.disconnect();
                    }
                    WriteFailure::Fatal => {
                        return Err(ServerError::Broadcast {
                            connection: conn.label.clone(),
                            source: err,
                        });
                    }
                },
            }
        }

        debug!(%kind, size = payload.len(), delivered, "broadcast complete");
        Ok(delivered)
    }

    /// Send one frame to a single connection.
    ///
    /// Goes through the same lock as [`broadcast`](Self::broadcast), so the
    /// two never interleave bytes on a socket. Returns `Ok(false)` if the
    /// connection is no longer registered or went away during the write.
    pub fn send_to(&self, id: ConnectionId, kind: FrameKind, payload: &[u8]) -> Result<bool> {
        let wire = encode_to_bytes(kind, payload)?;
        let mut connections = self.lock();

        let Some(index) = connections.iter().position(|conn| conn.id == id) else {
            return Ok(false);
        };

        let conn = &mut connections[index];
        match write_wire(&mut conn.writer, &wire) {
            Ok(()) => Ok(true),
            Err(err) => match classify(&err) {
                WriteFailure::Gone => {
                    warn!(connection = %conn.label, error = %err, "dropping consumer");
                    let removed = connections.remove(index);
                    removed.open.store(false, Ordering::SeqCst);
                    removed.writer.disconnect();
                    Ok(false)
                }
                WriteFailure::Fatal => Err(ServerError::Broadcast {
                    connection: conn.label.clone(),
                    source: err,
                }),
            },
        }
    }

    /// Drop every connection already marked closed. Returns how many went.
    pub fn prune_closed(&self) -> usize {
        prune(&mut self.lock())
    }

    /// Number of registered connections, closed-but-not-yet-pruned included.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Labels of the registered connections, in registration order.
    pub fn labels(&self) -> Vec<String> {
        self.lock().iter().map(|conn| conn.label.clone()).collect()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Connection<W>>> {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Outbound> Default for ConnectionRegistry<W> {
    fn default() -> Self {
        Self::new()
    }
}

fn prune<W: Outbound>(connections: &mut Vec<Connection<W>>) -> usize {
    let before = connections.len();
    connections.retain(|conn| {
        let open = conn.open.load(Ordering::SeqCst);
        if !open {
            debug!(connection = %conn.label, "pruning closed consumer");
            conn.writer.disconnect();
        }
        open
    });
    before - connections.len()
}
