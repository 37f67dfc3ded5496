use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};
use radiolink_transport::RadioStream;
use tracing::debug;

use crate::codec::{decode_frame, resync, FrameConfig};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 2 * 1024;
const READ_CHUNK_SIZE: usize = 1024;

/// Reads complete frame bodies from any `Read` stream.
///
/// Handles partial reads and line noise internally; callers always get
/// complete bodies. Bytes received before a timeout are kept, so a read that
/// times out mid-frame resumes where it stopped on the next call.
///
/// There is exactly one reader per stream; `read_frame` takes `&mut self`.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
    discarded: u64,
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
            config,
            discarded: 0,
        }
    }

    /// Read the next complete frame body (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    pub fn read_frame(&mut self) -> Result<Bytes> {
        loop {
            let dropped = resync(&mut self.buf, &self.config);
            if dropped > 0 {
                self.discarded += dropped as u64;
                debug!(
                    dropped,
                    total = self.discarded,
                    "discarded bytes while resynchronizing"
                );
            }

            if let Some(body) = decode_frame(&mut self.buf, &self.config) {
                return Ok(body);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Total bytes dropped while hunting for a valid header.
    pub fn discarded_bytes(&self) -> u64 {
        self.discarded
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

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameReader<RadioStream> {
    /// Create a frame reader for `RadioStream` and apply read timeout from config.
    pub fn with_config_radio(inner: RadioStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

pub(crate) fn transport_to_frame_error(err: radiolink_transport::TransportError) -> FrameError {
    match err {
        radiolink_transport::TransportError::Io(io)
        | radiolink_transport::TransportError::Connect { source: io, .. } => FrameError::Io(io),
        other => FrameError::Io(std::io::Error::other(other.to_string())),
    }
}
