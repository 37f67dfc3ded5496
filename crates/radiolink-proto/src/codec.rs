use prost::Message;
use tracing::trace;

use crate::error::Result;
use crate::messages::{FromRadio, ToRadio};

/// Converts between frame bodies and protocol messages.
///
/// Implementations must be shareable: the client encodes on caller threads
/// while its decode thread decodes.
pub trait MessageCodec: Send + Sync + 'static {
    /// Encode an outbound message into a frame body.
    fn encode(&self, msg: &ToRadio) -> Result<Vec<u8>>;

    /// Decode one frame body.
    fn decode(&self, body: &[u8]) -> Result<FromRadio>;
}

/// Protobuf codec matching the radio firmware.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtobufCodec;

impl MessageCodec for ProtobufCodec {
    fn encode(&self, msg: &ToRadio) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(msg.encoded_len());
        msg.encode(&mut buf)?;
        Ok(buf)
    }

    fn decode(&self, body: &[u8]) -> Result<FromRadio> {
        let msg = FromRadio::decode(body)?;
        trace!(id = msg.id, kind = %msg.kind(), len = body.len(), "decoded message");
        Ok(msg)
    }
}
