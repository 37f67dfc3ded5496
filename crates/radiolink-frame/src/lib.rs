//! Framing for the radio's stream protocol.
//!
//! Every message body travels inside a 4-byte header:
//! - 2 sync bytes, `0x94 0xC3`, for stream synchronization
//! - a 2-byte big-endian body length, at most [`MAX_FRAME_SIZE`]
//!
//! The reader recovers from line noise by discarding bytes until a plausible
//! header lines up again; callers always get whole frame bodies.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_frame, encode_frame, resync, FrameConfig, Resync, HEADER_SIZE, MAX_FRAME_SIZE, START1,
    START2, WAKE_LEN,
};
#[cfg(feature = "async")]
pub use codec::RadioCodec;
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::{FrameWriter, SharedFrameWriter};
