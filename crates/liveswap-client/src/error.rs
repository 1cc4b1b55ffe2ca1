use liveswap_frame::FrameKind;

/// Boxed error returned by a [`MarkupLoader`](crate::MarkupLoader).
pub type LoadError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur on the consumer side.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] liveswap_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] liveswap_frame::FrameError),

    /// The identity attribute does not produce a usable pattern.
    #[error("invalid identity pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// The producer answered with a frame of the wrong kind.
    #[error("unexpected {0} frame from producer")]
    UnexpectedResponse(FrameKind),

    /// A background thread could not be started.
    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Why a hot swap did not take effect.
///
/// In every case the node's data context has been put back.
#[derive(Debug, thiserror::Error)]
pub enum SwapError {
    /// The loader rejected the document.
    #[error("markup load failed: {0}")]
    Load(#[source] LoadError),

    /// The loader or layout pass panicked on the UI thread.
    #[error("hot swap panicked: {0}")]
    Panicked(String),

    /// The dispatcher dropped the job without running it.
    #[error("hot swap was never run on the UI thread")]
    Abandoned,
}

pub type Result<T> = std::result::Result<T, ClientError>;
