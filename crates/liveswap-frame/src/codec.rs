use std::borrow::Cow;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::kind::FrameKind;

/// Frame header: kind (4) + length (4) = 8 bytes.
pub const HEADER_SIZE: usize = 8;

/// Default maximum payload size: 16 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 16 * 1024 * 1024;

/// A framed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// What the frame is for.
    pub kind: FrameKind,
    /// The message payload.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(kind: FrameKind, payload: impl Into<Bytes>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }

    /// A [`FrameKind::DocumentUpdated`] frame carrying `text` as UTF-8.
    pub fn document(text: impl Into<String>) -> Self {
        Self::new(FrameKind::DocumentUpdated, Bytes::from(text.into()))
    }

    /// The payload as text, replacing invalid UTF-8 sequences.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }

    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

/// A parsed frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub kind: FrameKind,
    pub payload_len: usize,
}

impl Header {
    /// Header plus payload.
    pub fn frame_len(&self) -> usize {
        HEADER_SIZE + self.payload_len
    }
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────────┬──────────────────┐
/// │ Kind (4B LE) │ Length       │ Payload          │
/// │ signed       │ (4B LE, ≥ 0) │ (Length bytes)   │
/// └──────────────┴──────────────┴──────────────────┘
/// ```
pub fn encode_frame(kind: FrameKind, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    let len = i32::try_from(payload.len()).map_err(|_| FrameError::PayloadTooLarge {
        size: payload.len(),
        max: i32::MAX as usize,
    })?;
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_i32_le(kind.as_i32());
    dst.put_i32_le(len);
    dst.put_slice(payload);
    Ok(())
}

/// Encode a single frame into a fresh buffer.
pub fn encode_to_bytes(kind: FrameKind, payload: &[u8]) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    encode_frame(kind, payload, &mut buf)?;
    Ok(buf.freeze())
}

/// Parse the header at the front of `src`.
///
/// Returns `Ok(None)` while fewer than [`HEADER_SIZE`] bytes are available.
/// Does not consume anything.
pub fn decode_header(src: &[u8], max_payload: usize) -> Result<Option<Header>> {
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }

    let kind = i32::from_le_bytes([src[0], src[1], src[2], src[3]]);
    let len = i32::from_le_bytes([src[4], src[5], src[6], src[7]]);

    let payload_len = usize::try_from(len).map_err(|_| FrameError::InvalidLength(len))?;
    if payload_len > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    Ok(Some(Header {
        kind: FrameKind::from(kind),
        payload_len,
    }))
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes exactly the frame's bytes from the buffer.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Frame>> {
    let Some(header) = decode_header(src, max_payload)? else {
        return Ok(None);
    };
    Ok(take_frame(src, header))
}

/// Split a complete frame described by `header` off the front of `src`.
pub(crate) fn take_frame(src: &mut BytesMut, header: Header) -> Option<Frame> {
    if src.len() < header.frame_len() {
        return None;
    }

    src.advance(HEADER_SIZE);
    let payload = src.split_to(header.payload_len).freeze();

    Some(Frame {
        kind: header.kind,
        payload,
    })
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: 16 MiB.
    pub max_payload_size: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_roundtrip() {
        let mut buf = BytesMut::new();
        let payload = b"<Page x:Class=\"App.MainPage\"/>";

        encode_frame(FrameKind::DocumentUpdated, payload, &mut buf).unwrap();
        assert_eq!(buf.len(), HEADER_SIZE + payload.len());

        let frame = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .unwrap();

        assert_eq!(frame.kind, FrameKind::DocumentUpdated);
        assert_eq!(frame.payload.as_ref(), payload);
        assert!(buf.is_empty());
    }

    #[test]
    fn header_layout_is_kind_then_length_little_endian() {
        let wire = encode_to_bytes(FrameKind::DocumentUpdated, b"abc").unwrap();
        assert_eq!(&wire[..4], &[3, 0, 0, 0]);
        assert_eq!(&wire[4..8], &[3, 0, 0, 0]);
        assert_eq!(&wire[8..], b"abc");
    }

    #[test]
    fn empty_payload() {
        let mut buf = BytesMut::new();
        encode_frame(FrameKind::RequestHostname, b"", &mut buf).unwrap();
        assert_eq!(buf.len(), HEADER_SIZE);

        let frame = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .unwrap();
        assert_eq!(frame.kind, FrameKind::RequestHostname);
        assert!(frame.payload.is_empty());
    }

    #[test]
    fn unknown_kind_roundtrips() {
        let mut buf = BytesMut::new();
        encode_frame(FrameKind::Other(42), b"x", &mut buf).unwrap();
        let frame = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .unwrap();
        assert_eq!(frame.kind, FrameKind::Other(42));
    }

    #[test]
    fn decode_incomplete_header() {
        let mut buf = BytesMut::from(&[0x03, 0x00, 0x00][..]);
        let result = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap();
        assert!(result.is_none());
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn decode_incomplete_payload() {
        let mut buf = BytesMut::new();
        encode_frame(FrameKind::DocumentUpdated, b"hello", &mut buf).unwrap();
        buf.truncate(HEADER_SIZE + 2);

        let result = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap();
        assert!(result.is_none());
        assert_eq!(buf.len(), HEADER_SIZE + 2);
    }

    #[test]
    fn decode_negative_length() {
        let mut buf = BytesMut::new();
        buf.put_i32_le(3);
        buf.put_i32_le(-1);

        let result = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD);
        assert!(matches!(result, Err(FrameError::InvalidLength(-1))));
    }

    #[test]
    fn decode_payload_too_large() {
        let mut buf = BytesMut::new();
        buf.put_i32_le(3);
        buf.put_i32_le(32 * 1024 * 1024);

        let result = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD);
        assert!(matches!(result, Err(FrameError::PayloadTooLarge { .. })));
    }

    #[test]
    fn multiple_frames_back_to_back() {
        let mut buf = BytesMut::new();
        encode_frame(FrameKind::DocumentUpdated, b"first", &mut buf).unwrap();
        encode_frame(FrameKind::HostnameResponse, b"second", &mut buf).unwrap();

        let f1 = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .unwrap();
        assert_eq!(f1.kind, FrameKind::DocumentUpdated);
        assert_eq!(f1.payload.as_ref(), b"first");

        let f2 = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .unwrap();
        assert_eq!(f2.kind, FrameKind::HostnameResponse);
        assert_eq!(f2.payload.as_ref(), b"second");

        assert!(buf.is_empty());
    }

    #[test]
    fn frame_helpers() {
        let frame = Frame::document("<Page/>");
        assert_eq!(frame.kind, FrameKind::DocumentUpdated);
        assert_eq!(frame.text(), "<Page/>");
        assert_eq!(frame.wire_size(), HEADER_SIZE + 7);

        let binary = Frame::new(FrameKind::DocumentUpdated, vec![0x66, 0xff, 0x6f]);
        assert_eq!(binary.text(), "f\u{fffd}o");
    }
}
