//! Producer side of liveswap.
//!
//! A [`BroadcastServer`] accepts consumer connections on a loopback port and,
//! whenever it is told a document changed, reads the document and pushes it
//! to every connected consumer as a `DOCUMENT_UPDATED` frame. The
//! [`ConnectionRegistry`] owns the consumer connections and drops the ones
//! that went away. [`DocumentWatcher`] turns filesystem notifications into
//! change events.

pub mod config;
pub mod document;
pub mod error;
pub mod registry;
pub mod responder;
pub mod server;
pub mod watcher;

pub use config::{ServerConfig, DEFAULT_WRITE_TIMEOUT};
pub use document::{read_document, DocumentFilter, DEFAULT_GENERATION_MARKER};
pub use error::{Result, ServerError};
pub use registry::{ConnectionHandle, ConnectionId, ConnectionRegistry, Outbound};
pub use server::BroadcastServer;
pub use watcher::DocumentWatcher;
