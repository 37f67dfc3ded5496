//! Byte-stream transports for talking to a radio.
//!
//! The radio speaks the same framed protocol over a USB serial port and over
//! TCP. Both are wrapped in [`RadioStream`], a duplex stream that can be split
//! into a reader half and a writer half with [`RadioStream::try_clone`].
//!
//! This is the lowest layer of radiolink; framing lives in `radiolink-frame`.

pub mod error;
pub mod stream;
pub mod tcp;

#[cfg(feature = "serial")]
pub mod serial;

pub use error::{Result, TransportError};
pub use stream::RadioStream;
pub use tcp::DEFAULT_TCP_PORT;

#[cfg(feature = "serial")]
pub use serial::{SerialSettings, DEFAULT_BAUD_RATE};
