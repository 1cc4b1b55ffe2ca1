/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The header declares a negative payload length.
    #[error("invalid payload length {0} in frame header")]
    InvalidLength(i32),

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended cleanly between two frames.
    #[error("connection closed")]
    ConnectionClosed,

    /// The stream ended partway through a frame.
    #[error("truncated frame ({received} of {expected} bytes received)")]
    Truncated { expected: usize, received: usize },
}

impl FrameError {
    /// True if this is an I/O failure caused by the peer resetting the
    /// connection.
    pub fn is_peer_reset(&self) -> bool {
        matches!(self, FrameError::Io(err) if liveswap_transport::is_peer_reset(err))
    }

    /// True if the connection is over without anything having gone wrong:
    /// a clean close between frames or a peer reset.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, FrameError::ConnectionClosed) || self.is_peer_reset()
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;

#[cfg(test)]
mod tests {
    use std::io::ErrorKind;

    use super::*;

    #[test]
    fn reset_io_is_disconnect() {
        let err = FrameError::Io(std::io::Error::from(ErrorKind::ConnectionReset));
        assert!(err.is_peer_reset());
        assert!(err.is_disconnect());
    }

    #[test]
    fn truncation_is_not_disconnect() {
        let err = FrameError::Truncated {
            expected: 8,
            received: 3,
        };
        assert!(!err.is_disconnect());
        assert_eq!(err.to_string(), "truncated frame (3 of 8 bytes received)");
    }

    #[test]
    fn clean_close_is_disconnect() {
        assert!(FrameError::ConnectionClosed.is_disconnect());
        assert!(!FrameError::ConnectionClosed.is_peer_reset());
    }
}
