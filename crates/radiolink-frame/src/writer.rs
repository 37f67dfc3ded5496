use std::io::{ErrorKind, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::BytesMut;
use radiolink_transport::RadioStream;
use tracing::{debug, trace};

use crate::codec::{encode_frame, FrameConfig, START2, WAKE_LEN};
use crate::error::{FrameError, Result};
use crate::reader::transport_to_frame_error;

const INITIAL_BUFFER_CAPACITY: usize = 2 * 1024;

/// Writes complete frames to any `Write` stream.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Encode and send one frame body (blocking).
    ///
    /// Header and body go out in a single buffer, so a frame is never split
    /// around another writer's bytes as long as writers share one
    /// `FrameWriter` (see [`SharedFrameWriter`]).
    pub fn send(&mut self, body: &[u8]) -> Result<()> {
        if body.len() > self.config.max_frame_size {
            return Err(FrameError::Oversize {
                size: body.len(),
                max: self.config.max_frame_size,
            });
        }

        self.buf.clear();
        encode_frame(body, &mut self.buf)?;
        write_all_retrying(&mut self.inner, &self.buf)?;
        trace!(len = body.len(), "frame written");

        self.flush()
    }

    /// Send the wake sequence (32 × `0xC3`) and pause for `wake_delay`.
    ///
    /// A sleeping radio discards this as noise; it is not a frame.
    pub fn wake(&mut self) -> Result<()> {
        write_all_retrying(&mut self.inner, &[START2; WAKE_LEN])?;
        self.flush()?;
        debug!(delay = ?self.config.wake_delay, "sent wake sequence");
        std::thread::sleep(self.config.wake_delay);
        Ok(())
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameWriter<RadioStream> {
    /// Create a frame writer for `RadioStream` and apply write timeout from config.
    pub fn with_config_radio(inner: RadioStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_write_timeout(config.write_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

fn write_all_retrying<T: Write>(inner: &mut T, bytes: &[u8]) -> Result<()> {
    let mut offset = 0usize;
    while offset < bytes.len() {
        match inner.write(&bytes[offset..]) {
            Ok(0) => return Err(FrameError::ConnectionClosed),
            Ok(n) => offset += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
            Err(err) => return Err(FrameError::Io(err)),
        }
    }
    Ok(())
}

/// A [`FrameWriter`] shared between threads.
///
/// Every frame is written while holding one mutex, so concurrent senders are
/// serialized rather than interleaved. Cloning shares the same writer.
pub struct SharedFrameWriter<T> {
    inner: Arc<Mutex<FrameWriter<T>>>,
}

impl<T> Clone for SharedFrameWriter<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Write> SharedFrameWriter<T> {
    /// Share an existing writer.
    pub fn new(writer: FrameWriter<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(writer)),
        }
    }

    /// Send one frame body under the write lock.
    pub fn send(&self, body: &[u8]) -> Result<()> {
        self.lock().send(body)
    }

    /// Send the wake sequence under the write lock.
    pub fn wake(&self) -> Result<()> {
        self.lock().wake()
    }

    /// Run `f` with exclusive access to the writer.
    pub fn with_writer<R>(&self, f: impl FnOnce(&mut FrameWriter<T>) -> R) -> R {
        f(&mut self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, FrameWriter<T>> {
        // A panic mid-write leaves nothing half-updated in the writer itself.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use bytes::BytesMut;
    use proptest::prelude::*;

    use super::*;
    use crate::codec::{decode_frame, HEADER_SIZE, MAX_FRAME_SIZE};

    fn decode_all(bytes: &[u8]) -> Vec<Vec<u8>> {
        let mut wire = BytesMut::from(bytes);
        let mut out = Vec::new();
        while let Some(body) = decode_frame(&mut wire, &FrameConfig::default()) {
            out.push(body.to_vec());
        }
        assert!(wire.is_empty(), "trailing bytes after last frame");
        out
    }

    #[test]
    fn write_single_frame() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.send(b"hello").unwrap();

        let bytes = writer.into_inner().into_inner();
        assert_eq!(&bytes[..HEADER_SIZE], &[0x94, 0xC3, 0x00, 0x05]);
        assert_eq!(decode_all(&bytes), vec![b"hello".to_vec()]);
    }

    #[test]
    fn write_multiple_frames() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.send(b"one").unwrap();
        writer.send(b"two").unwrap();
        writer.send(b"three").unwrap();

        let bytes = writer.into_inner().into_inner();
        assert_eq!(
            decode_all(&bytes),
            vec![b"one".to_vec(), b"two".to_vec(), b"three".to_vec()]
        );
    }

    #[test]
    fn oversize_boundary() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));

        writer.send(&vec![0u8; MAX_FRAME_SIZE]).unwrap();
        let err = writer.send(&vec![0u8; MAX_FRAME_SIZE + 1]).unwrap_err();
        assert!(matches!(
            err,
            FrameError::Oversize { size, max } if size == MAX_FRAME_SIZE + 1 && max == MAX_FRAME_SIZE
        ));

        // The rejected frame wrote nothing.
        let bytes = writer.into_inner().into_inner();
        assert_eq!(bytes.len(), HEADER_SIZE + MAX_FRAME_SIZE);
    }

    proptest! {
        #[test]
        fn oversize_bodies_are_rejected_unwritten(
            size in (MAX_FRAME_SIZE + 1)..=4096usize,
            fill in any::<u8>(),
        ) {
            let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
            let err = writer.send(&vec![fill; size]).unwrap_err();
            prop_assert!(matches!(
                err,
                FrameError::Oversize { size: got, max } if got == size && max == MAX_FRAME_SIZE
            ), "unexpected error: {:?}", err);
            prop_assert!(writer.into_inner().into_inner().is_empty());
        }
    }

    #[test]
    fn wake_sequence_is_raw_start2_bytes() {
        let cfg = FrameConfig {
            wake_delay: Duration::from_millis(1),
            ..FrameConfig::default()
        };
        let mut writer = FrameWriter::with_config(Cursor::new(Vec::<u8>::new()), cfg);
        writer.wake().unwrap();

        let bytes = writer.into_inner().into_inner();
        assert_eq!(bytes, vec![0xC3; 32]);
    }

    #[test]
    fn flush_propagates() {
        let flushed = Arc::new(AtomicBool::new(false));
        let sink = FlushTrackingWriter {
            flushed: Arc::clone(&flushed),
        };
        let mut writer = FrameWriter::new(sink);

        writer.send(b"x").unwrap();
        assert!(flushed.load(Ordering::SeqCst));
    }

    #[test]
    fn handles_interrupted_and_would_block_writes() {
        let sink = FlakyWriter {
            failures: vec![ErrorKind::Interrupted, ErrorKind::WouldBlock],
            data: Vec::new(),
        };
        let mut writer = FrameWriter::new(sink);
        writer.send(b"retry").unwrap();

        let inner = writer.into_inner();
        assert_eq!(decode_all(&inner.data), vec![b"retry".to_vec()]);
    }

    #[test]
    fn connection_closed_when_write_returns_zero() {
        let mut writer = FrameWriter::new(ZeroWriter);
        let err = writer.send(b"x").unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn io_error_propagates() {
        let sink = FlakyWriter {
            failures: vec![ErrorKind::BrokenPipe],
            data: Vec::new(),
        };
        let mut writer = FrameWriter::new(sink);
        let err = writer.send(b"x").unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::BrokenPipe));
    }

    #[test]
    fn concurrent_senders_do_not_interleave() {
        // One byte per write call maximizes the chance of interleaving if the
        // lock were not held for the whole frame.
        let shared = SharedFrameWriter::new(FrameWriter::new(TrickleWriter::default()));

        let handles: Vec<_> = (0..8u8)
            .map(|id| {
                let shared = shared.clone();
                std::thread::spawn(move || {
                    for seq in 0..16u8 {
                        shared.send(&[id, id, id, seq]).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let bytes = shared.with_writer(|w| w.get_ref().data.clone());
        let frames = decode_all(&bytes);
        assert_eq!(frames.len(), 8 * 16);
        for frame in &frames {
            assert_eq!(frame.len(), 4);
            assert!(frame[..3].iter().all(|b| *b == frame[0]));
        }
        for id in 0..8u8 {
            let seqs: Vec<u8> = frames
                .iter()
                .filter(|f| f[0] == id)
                .map(|f| f[3])
                .collect();
            assert_eq!(seqs, (0..16u8).collect::<Vec<_>>());
        }
    }

    #[test]
    #[cfg(unix)]
    fn applies_write_timeout_for_radio_stream() {
        let (left, _right) = RadioStream::pair().unwrap();
        let cfg = FrameConfig {
            write_timeout: Some(Duration::from_millis(10)),
            ..FrameConfig::default()
        };
        assert!(FrameWriter::with_config_radio(left, cfg).is_ok());
    }

    struct FlushTrackingWriter {
        flushed: Arc<AtomicBool>,
    }

    impl Write for FlushTrackingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FlakyWriter {
        failures: Vec<ErrorKind>,
        data: Vec<u8>,
    }

    impl Write for FlakyWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.failures.is_empty() {
                return Err(std::io::Error::from(self.failures.remove(0)));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct TrickleWriter {
        data: Vec<u8>,
    }

    impl Write for TrickleWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if buf.is_empty() {
                return Ok(0);
            }
            self.data.push(buf[0]);
            std::thread::yield_now();
            Ok(1)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
