//! Frame kinds.
//!
//! The kind is a 32-bit signed discriminator. Values outside the known set
//! are preserved as [`FrameKind::Other`] so that a receiver can skip them
//! without failing the stream.

/// What a frame is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// Unset kind (0).
    None,
    /// Consumer asks the producer for its host name (1).
    RequestHostname,
    /// Producer's answer to [`FrameKind::RequestHostname`] (2).
    HostnameResponse,
    /// Producer pushes the new text of a changed document (3).
    DocumentUpdated,
    /// Any other wire value.
    Other(i32),
}

impl FrameKind {
    /// Wire value of this kind.
    pub fn as_i32(self) -> i32 {
        match self {
            FrameKind::None => 0,
            FrameKind::RequestHostname => 1,
            FrameKind::HostnameResponse => 2,
            FrameKind::DocumentUpdated => 3,
            FrameKind::Other(value) => value,
        }
    }

    /// Human-readable name for logs and CLI output.
    pub fn name(self) -> &'static str {
        match self {
            FrameKind::None => "NONE",
            FrameKind::RequestHostname => "REQUEST_HOSTNAME",
            FrameKind::HostnameResponse => "HOSTNAME_RESPONSE",
            FrameKind::DocumentUpdated => "DOCUMENT_UPDATED",
            FrameKind::Other(_) => "OTHER",
        }
    }

    /// Returns true if the kind is one this protocol defines.
    pub fn is_known(self) -> bool {
        !matches!(self, FrameKind::Other(_))
    }
}

impl From<i32> for FrameKind {
    fn from(value: i32) -> Self {
        match value {
            0 => FrameKind::None,
            1 => FrameKind::RequestHostname,
            2 => FrameKind::HostnameResponse,
            3 => FrameKind::DocumentUpdated,
            other => FrameKind::Other(other),
        }
    }
}

impl From<FrameKind> for i32 {
    fn from(kind: FrameKind) -> Self {
        kind.as_i32()
    }
}

impl std::fmt::Display for FrameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameKind::Other(value) => write!(f, "OTHER({value})"),
            known => f.write_str(known.name()),
        }
    }
}
