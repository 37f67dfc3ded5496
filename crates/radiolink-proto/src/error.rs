/// Errors produced by a [`MessageCodec`](crate::MessageCodec).
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The frame body is not a valid message.
    #[error("decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    /// The message could not be encoded.
    #[error("encode error: {0}")]
    Encode(#[from] prost::EncodeError),
}

pub type Result<T> = std::result::Result<T, CodecError>;
