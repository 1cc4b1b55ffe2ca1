use std::io::{ErrorKind, Read};

use bytes::BytesMut;
use liveswap_transport::LiveStream;
use tracing::trace;

use crate::codec::{decode_header, take_frame, Frame, FrameConfig, Header, HEADER_SIZE};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 4 * 1024;

/// Reads complete frames from any `Read` stream.
///
/// Handles partial reads internally; callers always get complete frames.
/// The header of the frame in progress is parsed once and kept until its
/// payload has fully arrived.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    header: Option<Header>,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            header: None,
            config,
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when the stream ends
    /// between frames and `Err(FrameError::Truncated { .. })` when it ends
    /// partway through one. A read timeout surfaces as `FrameError::Io`;
    /// anything already received stays buffered and the next call resumes.
    pub fn read_frame(&mut self) -> Result<Frame> {
        loop {
            if self.header.is_none() {
                self.header = decode_header(&self.buf, self.config.max_payload_size)?;
            }

            if let Some(header) = self.header {
                if let Some(frame) = take_frame(&mut self.buf, header) {
                    self.header = None;
                    trace!(kind = %frame.kind, size = frame.payload.len(), "decoded frame");
                    return Ok(frame);
                }
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(self.end_of_stream());
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    fn end_of_stream(&self) -> FrameError {
        if self.buf.is_empty() {
            return FrameError::ConnectionClosed;
        }
        let expected = self
            .header
            .map(|header| header.frame_len())
            .unwrap_or(HEADER_SIZE);
        FrameError::Truncated {
            expected,
            received: self.buf.len(),
        }
    }

    /// Number of bytes received but not yet returned as part of a frame.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update maximum payload size for subsequent frame decoding.
    pub fn set_max_payload_size(&mut self, max_payload_size: usize) {
        self.config.max_payload_size = max_payload_size;
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameReader<LiveStream> {
    /// Create a frame reader for `LiveStream` and apply read timeout from config.
    pub fn with_config_live(inner: LiveStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

pub(crate) fn transport_to_frame_error(err: liveswap_transport::TransportError) -> FrameError {
    match err {
        liveswap_transport::TransportError::Io(io)
        | liveswap_transport::TransportError::Accept(io) => FrameError::Io(io),
        liveswap_transport::TransportError::Bind { source, .. }
        | liveswap_transport::TransportError::Connect { source, .. } => FrameError::Io(source),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::{BufMut, BytesMut};

    use super::*;
    use crate::codec::encode_frame;
    use crate::kind::FrameKind;

    fn wire(frames: &[(FrameKind, &[u8])]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for (kind, payload) in frames {
            encode_frame(*kind, payload, &mut buf).unwrap();
        }
        buf.to_vec()
    }

    #[test]
    fn read_single_frame() {
        let bytes = wire(&[(FrameKind::DocumentUpdated, b"hello")]);

        let mut reader = FrameReader::new(Cursor::new(bytes));
        let frame = reader.read_frame().unwrap();

        assert_eq!(frame.kind, FrameKind::DocumentUpdated);
        assert_eq!(frame.payload.as_ref(), b"hello");
    }

    #[test]
    fn read_multiple_frames() {
        let bytes = wire(&[
            (FrameKind::DocumentUpdated, b"one"),
            (FrameKind::None, b""),
            (FrameKind::HostnameResponse, b"three"),
        ]);

        let mut reader = FrameReader::new(Cursor::new(bytes));

        let f1 = reader.read_frame().unwrap();
        let f2 = reader.read_frame().unwrap();
        let f3 = reader.read_frame().unwrap();

        assert_eq!(
            (f1.kind, f1.payload.as_ref()),
            (FrameKind::DocumentUpdated, b"one".as_ref())
        );
        assert_eq!((f2.kind, f2.payload.as_ref()), (FrameKind::None, b"".as_ref()));
        assert_eq!(
            (f3.kind, f3.payload.as_ref()),
            (FrameKind::HostnameResponse, b"three".as_ref())
        );
        assert!(matches!(
            reader.read_frame(),
            Err(FrameError::ConnectionClosed)
        ));
    }

    #[test]
    fn read_frame_with_large_payload() {
        let payload = vec![0xAB; 64 * 1024];
        let bytes = wire(&[(FrameKind::DocumentUpdated, &payload)]);

        let mut reader = FrameReader::new(Cursor::new(bytes));
        let frame = reader.read_frame().unwrap();

        assert_eq!(frame.payload.as_ref(), payload.as_slice());
    }

    #[test]
    fn byte_by_byte_delivery() {
        let bytes = wire(&[(FrameKind::DocumentUpdated, b"slow")]);

        let mut reader = FrameReader::new(ChunkedReader::new(bytes, vec![1]));
        let frame = reader.read_frame().unwrap();

        assert_eq!(frame.kind, FrameKind::DocumentUpdated);
        assert_eq!(frame.payload.as_ref(), b"slow");
    }

    #[test]
    fn chunk_boundaries_do_not_change_result() {
        let payload = b"<ContentPage x:Class=\"App.MainPage\"><Label Text=\"hi\"/></ContentPage>";
        let bytes = wire(&[
            (FrameKind::DocumentUpdated, payload),
            (FrameKind::HostnameResponse, b"devbox"),
        ]);

        let whole = {
            let mut reader = FrameReader::new(Cursor::new(bytes.clone()));
            (reader.read_frame().unwrap(), reader.read_frame().unwrap())
        };

        // 3 and 5 split the first header; 9 straddles the second header.
        for pattern in [vec![3], vec![5, 1], vec![7, 2, 30], vec![9], vec![1, 13, 4]] {
            let mut reader = FrameReader::new(ChunkedReader::new(bytes.clone(), pattern.clone()));
            let first = reader.read_frame().unwrap();
            let second = reader.read_frame().unwrap();
            assert_eq!(first, whole.0, "pattern {pattern:?}");
            assert_eq!(second, whole.1, "pattern {pattern:?}");
        }
    }

    #[test]
    fn surplus_bytes_stay_buffered_for_next_frame() {
        let bytes = wire(&[
            (FrameKind::DocumentUpdated, b"a"),
            (FrameKind::DocumentUpdated, b"bb"),
        ]);

        let mut reader = FrameReader::new(Cursor::new(bytes));
        let first = reader.read_frame().unwrap();
        assert_eq!(first.payload.as_ref(), b"a");
        assert_eq!(reader.buffered(), HEADER_SIZE + 2);
    }

    #[test]
    fn connection_closed_cleanly() {
        let mut reader = FrameReader::new(Cursor::new(Vec::<u8>::new()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn stream_ends_inside_header() {
        let mut reader = FrameReader::new(Cursor::new(vec![0x03, 0x00, 0x00, 0x00, 0x05]));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(
            err,
            FrameError::Truncated {
                expected: HEADER_SIZE,
                received: 5
            }
        ));
    }

    #[test]
    fn stream_ends_inside_payload() {
        let mut partial = BytesMut::new();
        partial.put_i32_le(3);
        partial.put_i32_le(16);
        partial.put_slice(b"only-part");

        let mut reader = FrameReader::new(Cursor::new(partial.to_vec()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(
            err,
            FrameError::Truncated {
                expected: 24,
                received: 17
            }
        ));
    }

    #[test]
    fn negative_length_in_stream() {
        let mut bytes = BytesMut::new();
        bytes.put_i32_le(3);
        bytes.put_i32_le(-5);
        let mut reader = FrameReader::new(Cursor::new(bytes.to_vec()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::InvalidLength(-5)));
    }

    #[test]
    fn oversized_frame_in_stream() {
        let mut bytes = BytesMut::new();
        bytes.put_i32_le(3);
        bytes.put_i32_le(1024);

        let cfg = FrameConfig {
            max_payload_size: 16,
            ..FrameConfig::default()
        };
        let mut reader = FrameReader::with_config(Cursor::new(bytes.to_vec()), cfg);
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { .. }));
    }

    #[test]
    fn interrupted_read_retries() {
        let bytes = wire(&[(FrameKind::DocumentUpdated, b"ok")]);
        let mut reader = FrameReader::new(FailOnceReader::new(bytes, ErrorKind::Interrupted));
        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.payload.as_ref(), b"ok");
    }

    #[test]
    fn reset_read_propagates_as_peer_reset() {
        let bytes = wire(&[(FrameKind::DocumentUpdated, b"ok")]);
        let mut reader = FrameReader::new(FailOnceReader::new(bytes, ErrorKind::ConnectionReset));
        let err = reader.read_frame().unwrap_err();
        assert!(err.is_peer_reset());
    }

    #[test]
    fn roundtrip_over_loopback_tcp() {
        let listener = liveswap_transport::TcpTransport::bind("127.0.0.1:0".parse().unwrap())
            .unwrap();
        let addr = listener.local_addr();

        let server = std::thread::spawn(move || {
            let stream = listener.accept().unwrap();
            let mut reader = FrameReader::with_config_live(stream, FrameConfig::default()).unwrap();
            reader.read_frame().unwrap()
        });

        let stream = liveswap_transport::TcpTransport::connect(addr).unwrap();
        let mut writer = crate::writer::FrameWriter::new(stream);
        writer.send(FrameKind::DocumentUpdated, b"tcp").unwrap();

        let frame = server.join().unwrap();
        assert_eq!(frame.kind, FrameKind::DocumentUpdated);
        assert_eq!(frame.payload.as_ref(), b"tcp");
    }

    #[test]
    fn accessors_and_into_inner() {
        let cursor = Cursor::new(Vec::<u8>::new());
        let mut reader = FrameReader::new(cursor);

        let _ = reader.get_ref();
        let _ = reader.get_mut();
        reader.set_max_payload_size(32);
        assert_eq!(reader.config().max_payload_size, 32);
        let _inner = reader.into_inner();
    }

    /// Hands out the bytes in chunks whose sizes cycle through `pattern`.
    struct ChunkedReader {
        bytes: Vec<u8>,
        pos: usize,
        pattern: Vec<usize>,
        step: usize,
    }

    impl ChunkedReader {
        fn new(bytes: Vec<u8>, pattern: Vec<usize>) -> Self {
            Self {
                bytes,
                pos: 0,
                pattern,
                step: 0,
            }
        }
    }

    impl Read for ChunkedReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            let want = self.pattern[self.step % self.pattern.len()];
            self.step += 1;
            let n = want.min(buf.len()).min(self.bytes.len() - self.pos);
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    struct FailOnceReader {
        failed: bool,
        kind: ErrorKind,
        inner: Cursor<Vec<u8>>,
    }

    impl FailOnceReader {
        fn new(bytes: Vec<u8>, kind: ErrorKind) -> Self {
            Self {
                failed: false,
                kind,
                inner: Cursor::new(bytes),
            }
        }
    }

    impl Read for FailOnceReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.failed {
                self.failed = true;
                return Err(std::io::Error::from(self.kind));
            }
            self.inner.read(buf)
        }
    }
}
