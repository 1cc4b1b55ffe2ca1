/// Errors that can occur on the producer side.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] liveswap_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] liveswap_frame::FrameError),

    /// A write to a consumer failed for a reason other than the consumer
    /// going away.
    #[error("broadcast to {connection} failed: {source}")]
    Broadcast {
        connection: String,
        #[source]
        source: liveswap_frame::FrameError,
    },

    /// The filesystem watcher could not be set up.
    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),

    /// A background thread could not be started.
    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ServerError>;
