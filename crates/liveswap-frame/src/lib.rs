//! Kind + length prefixed message framing for liveswap.
//!
//! Every message on the wire is framed with:
//! - A 4-byte little-endian signed frame kind
//! - A 4-byte little-endian signed payload length
//! - Exactly that many payload bytes
//!
//! Framing is driven by the byte count in the header, never by end of
//! stream. Readers cope with arbitrarily short reads; callers always get
//! complete frames or a typed error.

#[cfg(feature = "async")]
pub mod async_codec;
pub mod codec;
pub mod error;
pub mod kind;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub use async_codec::LiveSwapCodec;
pub use codec::{
    decode_frame, decode_header, encode_frame, encode_to_bytes, Frame, FrameConfig, Header,
    DEFAULT_MAX_PAYLOAD, HEADER_SIZE,
};
pub use error::{FrameError, Result};
pub use kind::FrameKind;
pub use reader::FrameReader;
pub use writer::{write_wire, FrameWriter};
