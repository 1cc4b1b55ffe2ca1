//! `tokio_util::codec` adapter for the liveswap wire format.
//!
//! Lets async consumers drive a socket through `FramedRead`/`FramedWrite`
//! with the same header handling and truncation rules as [`FrameReader`].
//!
//! [`FrameReader`]: crate::reader::FrameReader

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{
    decode_header, encode_frame, take_frame, Frame, Header, DEFAULT_MAX_PAYLOAD, HEADER_SIZE,
};
use crate::error::FrameError;

/// Frame codec for `tokio_util::codec::Framed*`.
#[derive(Debug, Clone)]
pub struct LiveSwapCodec {
    max_payload: usize,
    header: Option<Header>,
}

impl LiveSwapCodec {
    pub fn new() -> Self {
        Self::with_max_payload(DEFAULT_MAX_PAYLOAD)
    }

    pub fn with_max_payload(max_payload: usize) -> Self {
        Self {
            max_payload,
            header: None,
        }
    }
}

impl Default for LiveSwapCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LiveSwapCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, FrameError> {
        if self.header.is_none() {
            self.header = decode_header(src, self.max_payload)?;
        }

        let Some(header) = self.header else {
            return Ok(None);
        };

        match take_frame(src, header) {
            Some(frame) => {
                self.header = None;
                Ok(Some(frame))
            }
            None => {
                src.reserve(header.frame_len() - src.len());
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, FrameError> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        if src.is_empty() {
            return Ok(None);
        }
        let expected = self
            .header
            .map(|header| header.frame_len())
            .unwrap_or(HEADER_SIZE);
        Err(FrameError::Truncated {
            expected,
            received: src.len(),
        })
    }
}

impl Encoder<Frame> for LiveSwapCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), FrameError> {
        if item.payload.len() > self.max_payload {
            return Err(FrameError::PayloadTooLarge {
                size: item.payload.len(),
                max: self.max_payload,
            });
        }
        encode_frame(item.kind, &item.payload, dst)
    }
}
