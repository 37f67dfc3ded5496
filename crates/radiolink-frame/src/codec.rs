use std::time::Duration;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame header: sync (2) + length (2) = 4 bytes.
pub const HEADER_SIZE: usize = 4;

/// First sync byte.
pub const START1: u8 = 0x94;

/// Second sync byte. A run of these also wakes a sleeping radio.
pub const START2: u8 = 0xC3;

/// Largest body the radio accepts or emits, in either direction.
pub const MAX_FRAME_SIZE: usize = 512;

/// Number of `START2` bytes in the wake sequence.
pub const WAKE_LEN: usize = 32;

/// How the reader hunts for the next header after a bad one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Resync {
    /// Drop the whole 4-byte header window and examine the next one.
    ///
    /// A frame whose sync bytes start in the middle of a dropped window is
    /// missed; the reader only realigns once noise happens to be a multiple
    /// of the header size.
    #[default]
    HeaderWindow,
    /// Drop one byte at a time until the sync bytes line up.
    Sliding,
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum body size in bytes. Default: 512.
    pub max_frame_size: usize,
    /// Resynchronization strategy after a bad header. Default: `HeaderWindow`.
    pub resync: Resync,
    /// Pause after the wake sequence. Default: 100ms.
    pub wake_delay: Duration,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_size: MAX_FRAME_SIZE,
            resync: Resync::default(),
            wake_delay: Duration::from_millis(100),
            read_timeout: None,
            write_timeout: None,
        }
    }
}

/// Encode a frame body into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────┬──────────┬──────────────┬─────────────────┐
/// │ START1   │ START2   │ Length       │ Body            │
/// │ 0x94     │ 0xC3     │ (2B BE)      │ (Length bytes)  │
/// └──────────┴──────────┴──────────────┴─────────────────┘
/// ```
pub fn encode_frame(body: &[u8], dst: &mut BytesMut) -> Result<()> {
    if body.len() > u16::MAX as usize {
        return Err(FrameError::Oversize {
            size: body.len(),
            max: u16::MAX as usize,
        });
    }
    dst.reserve(HEADER_SIZE + body.len());
    dst.put_u8(START1);
    dst.put_u8(START2);
    dst.put_u16(body.len() as u16);
    dst.put_slice(body);
    Ok(())
}

/// Discard leading bytes that cannot begin a valid frame.
///
/// A header is rejected when its sync bytes are wrong or its declared length
/// exceeds `config.max_frame_size`. Returns the number of bytes discarded.
/// Stops as soon as the buffer starts with a plausible header or holds too
/// few bytes to judge.
pub fn resync(src: &mut BytesMut, config: &FrameConfig) -> usize {
    let mut discarded = 0usize;
    match config.resync {
        Resync::HeaderWindow => {
            while src.len() >= HEADER_SIZE && !header_is_valid(src, config) {
                src.advance(HEADER_SIZE);
                discarded += HEADER_SIZE;
            }
        }
        Resync::Sliding => {
            while !src.is_empty() {
                let misaligned = src[0] != START1
                    || (src.len() >= 2 && src[1] != START2)
                    || (src.len() >= HEADER_SIZE && !header_is_valid(src, config));
                if !misaligned {
                    break;
                }
                src.advance(1);
                discarded += 1;
            }
        }
    }
    discarded
}

/// Decode a frame body from a buffer.
///
/// Resynchronizes first (see [`resync`]). Returns `None` if the buffer doesn't
/// contain a complete frame yet. On success, consumes the frame bytes from the
/// buffer.
pub fn decode_frame(src: &mut BytesMut, config: &FrameConfig) -> Option<Bytes> {
    resync(src, config);
    if src.len() < HEADER_SIZE {
        return None; // Need more data
    }

    let body_len = declared_len(src);
    if src.len() < HEADER_SIZE + body_len {
        return None; // Need more data
    }

    src.advance(HEADER_SIZE);
    Some(src.split_to(body_len).freeze())
}

fn declared_len(src: &[u8]) -> usize {
    u16::from_be_bytes([src[2], src[3]]) as usize
}

fn header_is_valid(src: &[u8], config: &FrameConfig) -> bool {
    src[0] == START1 && src[1] == START2 && declared_len(src) <= config.max_frame_size
}

/// `tokio_util` codec speaking the same wire format.
#[cfg(feature = "async")]
#[derive(Debug, Clone, Default)]
pub struct RadioCodec {
    config: FrameConfig,
    discarded: u64,
}

#[cfg(feature = "async")]
impl RadioCodec {
    /// Create a codec with explicit configuration.
    pub fn new(config: FrameConfig) -> Self {
        Self {
            config,
            discarded: 0,
        }
    }

    /// Total bytes dropped while resynchronizing.
    pub fn discarded_bytes(&self) -> u64 {
        self.discarded
    }
}

#[cfg(feature = "async")]
impl tokio_util::codec::Decoder for RadioCodec {
    type Item = Bytes;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>> {
        let dropped = resync(src, &self.config);
        if dropped > 0 {
            self.discarded += dropped as u64;
            tracing::debug!(dropped, "discarded bytes while resynchronizing");
        }
        Ok(decode_frame(src, &self.config))
    }
}

#[cfg(feature = "async")]
impl tokio_util::codec::Encoder<Bytes> for RadioCodec {
    type Error = FrameError;

    fn encode(&mut self, body: Bytes, dst: &mut BytesMut) -> Result<()> {
        if body.len() > self.config.max_frame_size {
            return Err(FrameError::Oversize {
                size: body.len(),
                max: self.config.max_frame_size,
            });
        }
        encode_frame(&body, dst)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn window() -> FrameConfig {
        FrameConfig::default()
    }

    fn sliding() -> FrameConfig {
        FrameConfig {
            resync: Resync::Sliding,
            ..FrameConfig::default()
        }
    }

    #[test]
    fn test_encode_layout() {
        let mut buf = BytesMut::new();
        encode_frame(b"abc", &mut buf).unwrap();
        assert_eq!(buf.as_ref(), &[0x94, 0xC3, 0x00, 0x03, b'a', b'b', b'c']);
    }

    #[test]
    fn test_length_is_big_endian() {
        let body = vec![0u8; 0x0102];
        let mut buf = BytesMut::new();
        encode_frame(&body, &mut buf).unwrap();
        assert_eq!(&buf[..HEADER_SIZE], &[0x94, 0xC3, 0x01, 0x02]);
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let mut buf = BytesMut::new();
        encode_frame(b"hello, radio!", &mut buf).unwrap();

        let body = decode_frame(&mut buf, &window()).unwrap();
        assert_eq!(body.as_ref(), b"hello, radio!");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_incomplete_header() {
        let mut buf = BytesMut::from(&[START1, START2, 0x00][..]);
        assert!(decode_frame(&mut buf, &window()).is_none());
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn test_decode_incomplete_body() {
        let mut buf = BytesMut::new();
        encode_frame(b"hello", &mut buf).unwrap();
        buf.truncate(HEADER_SIZE + 2);

        assert!(decode_frame(&mut buf, &window()).is_none());
        assert_eq!(buf.len(), HEADER_SIZE + 2);
    }

    #[test]
    fn test_empty_body() {
        let mut buf = BytesMut::new();
        encode_frame(b"", &mut buf).unwrap();

        let body = decode_frame(&mut buf, &window()).unwrap();
        assert!(body.is_empty());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_multiple_frames() {
        let mut buf = BytesMut::new();
        encode_frame(b"first", &mut buf).unwrap();
        encode_frame(b"second", &mut buf).unwrap();

        assert_eq!(decode_frame(&mut buf, &window()).unwrap().as_ref(), b"first");
        assert_eq!(decode_frame(&mut buf, &window()).unwrap().as_ref(), b"second");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_bad_window_before_aligned_frame_is_skipped() {
        let mut buf = BytesMut::from(&[0xFF, 0x00, 0x12, 0x34][..]);
        encode_frame(b"ok", &mut buf).unwrap();

        assert_eq!(resync(&mut buf, &window()), HEADER_SIZE);
        assert_eq!(decode_frame(&mut buf, &window()).unwrap().as_ref(), b"ok");
    }

    #[test]
    fn test_header_window_misses_misaligned_frame() {
        let mut buf = BytesMut::from(&[0x00][..]);
        encode_frame(b"ok", &mut buf).unwrap();

        // [00 94 C3 00] is dropped, leaving [02 'o' 'k'] which never completes.
        assert!(decode_frame(&mut buf, &window()).is_none());
        assert_eq!(buf.as_ref(), &[0x02, b'o', b'k']);
    }

    #[test]
    fn test_sliding_finds_misaligned_frame() {
        let mut buf = BytesMut::from(&[0x00][..]);
        encode_frame(b"ok", &mut buf).unwrap();

        assert_eq!(resync(&mut buf, &sliding()), 1);
        assert_eq!(decode_frame(&mut buf, &sliding()).unwrap().as_ref(), b"ok");
    }

    #[test]
    fn test_sliding_waits_on_partial_sync() {
        let mut buf = BytesMut::from(&[0x11, START1][..]);
        assert_eq!(resync(&mut buf, &sliding()), 1);
        assert_eq!(buf.as_ref(), &[START1]);
        assert!(decode_frame(&mut buf, &sliding()).is_none());
    }

    #[test]
    fn test_oversize_length_header_is_skipped() {
        let mut buf = BytesMut::new();
        buf.put_u8(START1);
        buf.put_u8(START2);
        buf.put_u16(MAX_FRAME_SIZE as u16 + 1);
        encode_frame(b"next", &mut buf).unwrap();

        assert_eq!(resync(&mut buf, &window()), HEADER_SIZE);
        assert_eq!(decode_frame(&mut buf, &window()).unwrap().as_ref(), b"next");
    }

    #[test]
    fn test_max_size_body_is_accepted() {
        let body = vec![0x5A; MAX_FRAME_SIZE];
        let mut buf = BytesMut::new();
        encode_frame(&body, &mut buf).unwrap();

        let decoded = decode_frame(&mut buf, &window()).unwrap();
        assert_eq!(decoded.len(), MAX_FRAME_SIZE);
    }

    #[test]
    fn test_encode_rejects_unrepresentable_length() {
        let body = vec![0u8; u16::MAX as usize + 1];
        let mut buf = BytesMut::new();
        let err = encode_frame(&body, &mut buf).unwrap_err();
        assert!(matches!(err, FrameError::Oversize { .. }));
        assert!(buf.is_empty());
    }

    proptest! {
        #[test]
        fn roundtrip_any_valid_body(body in proptest::collection::vec(any::<u8>(), 0..=MAX_FRAME_SIZE)) {
            let mut buf = BytesMut::new();
            encode_frame(&body, &mut buf).unwrap();
            let decoded = decode_frame(&mut buf, &window());
            prop_assert_eq!(decoded.as_deref(), Some(body.as_slice()));
            prop_assert!(buf.is_empty());
        }

        #[test]
        fn sliding_recovers_after_any_noise(
            noise in proptest::collection::vec(0u8..0x94, 0..=16),
            body in proptest::collection::vec(any::<u8>(), 0..=64),
        ) {
            let mut buf = BytesMut::from(noise.as_slice());
            encode_frame(&body, &mut buf).unwrap();
            let decoded = decode_frame(&mut buf, &sliding());
            prop_assert_eq!(decoded.as_deref(), Some(body.as_slice()));
        }
    }

    #[cfg(feature = "async")]
    #[test]
    fn test_tokio_codec_roundtrip() {
        use tokio_util::codec::{Decoder, Encoder};

        let mut codec = RadioCodec::default();
        let mut buf = BytesMut::from(&[0xAA, 0xBB, 0xCC, 0xDD][..]);
        codec.encode(Bytes::from_static(b"async"), &mut buf).unwrap();

        let body = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(body.as_ref(), b"async");
        assert_eq!(codec.discarded_bytes(), 4);

        let err = codec
            .encode(Bytes::from(vec![0u8; MAX_FRAME_SIZE + 1]), &mut buf)
            .unwrap_err();
        assert!(matches!(err, FrameError::Oversize { .. }));
    }
}
