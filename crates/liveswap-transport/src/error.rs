use std::io::ErrorKind;
use std::net::SocketAddr;

/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to bind to the specified address.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// Failed to connect to the specified address.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// Failed to accept an incoming connection.
    #[error("failed to accept connection: {0}")]
    Accept(std::io::Error),

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;

/// Returns true if the error means the remote end is gone.
///
/// Linux reports a write to a socket whose peer already closed as
/// `BrokenPipe` and a read after an RST as `ConnectionReset`; Windows uses
/// `ConnectionAborted` for locally torn-down sockets. All three mean the
/// connection has reached the end of its useful life.
pub fn is_peer_reset(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::ConnectionReset | ErrorKind::BrokenPipe | ErrorKind::ConnectionAborted
    )
}

/// Returns true if the error is an expired socket read/write deadline.
///
/// Unix reports an elapsed `SO_SNDTIMEO`/`SO_RCVTIMEO` as `WouldBlock`,
/// Windows as `TimedOut`.
pub fn is_write_deadline(err: &std::io::Error) -> bool {
    matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}
