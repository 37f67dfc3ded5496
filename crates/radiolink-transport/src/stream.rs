use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream};
#[cfg(feature = "serial")]
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::error::Result;

/// A connected radio byte stream (implements Read + Write).
///
/// Reads and writes are raw bytes; frame boundaries are recovered by
/// `radiolink-frame`. A stream is usually cloned once so that a background
/// reader and a foreground writer each own a handle to the same device.
pub struct RadioStream {
    inner: RadioStreamInner,
}

enum RadioStreamInner {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixStream),
    // Serial port handles are `Send` but not `Sync`; the mutex keeps
    // `RadioStream` shareable. Read and write go through `get_mut`.
    #[cfg(feature = "serial")]
    Serial(Mutex<Box<dyn serialport::SerialPort>>),
}

impl Read for RadioStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            RadioStreamInner::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            RadioStreamInner::Unix(stream) => stream.read(buf),
            #[cfg(feature = "serial")]
            RadioStreamInner::Serial(port) => serial_mut(port).read(buf),
        }
    }
}

impl Write for RadioStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            RadioStreamInner::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            RadioStreamInner::Unix(stream) => stream.write(buf),
            #[cfg(feature = "serial")]
            RadioStreamInner::Serial(port) => serial_mut(port).write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            RadioStreamInner::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            RadioStreamInner::Unix(stream) => stream.flush(),
            #[cfg(feature = "serial")]
            RadioStreamInner::Serial(port) => serial_mut(port).flush(),
        }
    }
}

impl RadioStream {
    /// Wrap a connected TCP stream.
    pub fn from_tcp(stream: TcpStream) -> Self {
        Self {
            inner: RadioStreamInner::Tcp(stream),
        }
    }

    /// Wrap a connected Unix stream (local bridges and simulators).
    #[cfg(unix)]
    pub fn from_unix(stream: std::os::unix::net::UnixStream) -> Self {
        Self {
            inner: RadioStreamInner::Unix(stream),
        }
    }

    /// Wrap an opened serial port.
    #[cfg(feature = "serial")]
    pub fn from_serial(port: Box<dyn serialport::SerialPort>) -> Self {
        Self {
            inner: RadioStreamInner::Serial(Mutex::new(port)),
        }
    }

    /// Create a connected in-process pair: one end for the client, one end
    /// standing in for the radio.
    #[cfg(unix)]
    pub fn pair() -> Result<(Self, Self)> {
        let (left, right) = std::os::unix::net::UnixStream::pair()?;
        Ok((Self::from_unix(left), Self::from_unix(right)))
    }

    /// Set read timeout on the underlying stream.
    ///
    /// Serial ports ignore this: their timeout is fixed when the port is
    /// opened (see `SerialSettings::read_timeout`).
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            RadioStreamInner::Tcp(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
            #[cfg(unix)]
            RadioStreamInner::Unix(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
            #[cfg(feature = "serial")]
            RadioStreamInner::Serial(_) => Ok(()),
        }
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            RadioStreamInner::Tcp(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
            #[cfg(unix)]
            RadioStreamInner::Unix(stream) => {
                stream.set_write_timeout(timeout).map_err(Into::into)
            }
            #[cfg(feature = "serial")]
            RadioStreamInner::Serial(_) => Ok(()),
        }
    }

    /// Try to clone this stream (creates a new handle to the same device).
    pub fn try_clone(&self) -> Result<Self> {
        match &self.inner {
            RadioStreamInner::Tcp(stream) => Ok(Self::from_tcp(stream.try_clone()?)),
            #[cfg(unix)]
            RadioStreamInner::Unix(stream) => Ok(Self::from_unix(stream.try_clone()?)),
            #[cfg(feature = "serial")]
            RadioStreamInner::Serial(port) => {
                let port = port.lock().unwrap_or_else(PoisonError::into_inner);
                let cloned = port.try_clone().map_err(|err| {
                    crate::TransportError::Io(std::io::Error::other(err.to_string()))
                })?;
                Ok(Self::from_serial(cloned))
            }
        }
    }

    /// Shut the stream down in both directions.
    ///
    /// Socket readers blocked in `read` observe EOF immediately. Serial ports
    /// have no shutdown primitive; their readers return at the next read
    /// timeout instead. Shutting down an already closed socket is not an error.
    pub fn shutdown(&self) -> Result<()> {
        let result = match &self.inner {
            RadioStreamInner::Tcp(stream) => stream.shutdown(Shutdown::Both),
            #[cfg(unix)]
            RadioStreamInner::Unix(stream) => stream.shutdown(Shutdown::Both),
            #[cfg(feature = "serial")]
            RadioStreamInner::Serial(_) => Ok(()),
        };
        match result {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotConnected => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        match &self.inner {
            RadioStreamInner::Tcp(_) => "tcp",
            #[cfg(unix)]
            RadioStreamInner::Unix(_) => "unix",
            #[cfg(feature = "serial")]
            RadioStreamInner::Serial(_) => "serial",
        }
    }
}

#[cfg(feature = "serial")]
fn serial_mut(
    port: &mut Mutex<Box<dyn serialport::SerialPort>>,
) -> &mut Box<dyn serialport::SerialPort> {
    port.get_mut().unwrap_or_else(PoisonError::into_inner)
}

impl std::fmt::Debug for RadioStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RadioStream")
            .field("type", &self.transport_name())
            .finish()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn stream_is_send_and_sync() {
        // Holds with every transport feature enabled, serial included.
        assert_send_sync::<RadioStream>();
    }

    #[test]
    fn pair_roundtrip() {
        let (mut left, mut right) = RadioStream::pair().unwrap();
        left.write_all(b"hello").unwrap();

        let mut buf = [0u8; 5];
        right.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello");
        assert_eq!(left.transport_name(), "unix");
    }

    #[test]
    fn clone_shares_the_connection() {
        let (left, mut right) = RadioStream::pair().unwrap();
        let mut writer = left.try_clone().unwrap();
        writer.write_all(b"ab").unwrap();

        let mut buf = [0u8; 2];
        right.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ab");
    }

    #[test]
    fn shutdown_unblocks_reader_with_eof() {
        let (left, _right) = RadioStream::pair().unwrap();
        let mut reader = left.try_clone().unwrap();

        let handle = std::thread::spawn(move || {
            let mut buf = [0u8; 4];
            reader.read(&mut buf).unwrap()
        });

        std::thread::sleep(Duration::from_millis(20));
        left.shutdown().unwrap();
        assert_eq!(handle.join().unwrap(), 0);
    }

    #[test]
    fn shutdown_twice_is_ok() {
        let (left, right) = RadioStream::pair().unwrap();
        drop(right);
        left.shutdown().unwrap();
        left.shutdown().unwrap();
    }

    #[test]
    fn read_timeout_surfaces_would_block() {
        let (mut left, _right) = RadioStream::pair().unwrap();
        left.set_read_timeout(Some(Duration::from_millis(10)))
            .unwrap();

        let mut buf = [0u8; 1];
        let err = left.read(&mut buf).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::WouldBlock | ErrorKind::TimedOut
        ));
    }

    #[test]
    fn debug_names_transport() {
        let (left, _right) = RadioStream::pair().unwrap();
        assert_eq!(format!("{left:?}"), "RadioStream { type: \"unix\" }");
    }
}
