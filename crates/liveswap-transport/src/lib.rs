//! Loopback TCP transport for liveswap.
//!
//! This is the lowest layer of liveswap. The producer binds a
//! [`TcpTransport`] and accepts consumers; consumers connect once. Every
//! connected socket is wrapped in a [`LiveStream`], which is what the frame
//! layer reads from and writes to.
//!
//! The module also owns the classification of I/O failures into "the peer
//! went away" versus "something is actually wrong", since both sides of the
//! protocol make the same distinction.

pub mod error;
pub mod host;
pub mod stream;
pub mod tcp;

pub use error::{is_peer_reset, is_write_deadline, Result, TransportError};
pub use host::local_hostname;
pub use stream::LiveStream;
pub use tcp::{TcpTransport, DEFAULT_ADDR, DEFAULT_PORT};
