use std::time::Duration;

use radiolink_proto::MessageKind;

/// Errors returned by the client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level error (connect, open, clone).
    #[error("transport error: {0}")]
    Transport(#[from] radiolink_transport::TransportError),

    /// Frame-level error while writing to the radio.
    #[error("frame error: {0}")]
    Frame(#[from] radiolink_frame::FrameError),

    /// A message could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] radiolink_proto::CodecError),

    /// The radio did not finish streaming its configuration in time.
    #[error("configuration not complete after {0:?}")]
    Timeout(Duration),

    /// No handler is registered for a dispatched message kind.
    #[error("no handler registered for {0}")]
    NoHandler(MessageKind),

    /// `start` was already called on this client.
    #[error("client already started")]
    AlreadyStarted,

    /// The client was shut down.
    #[error("client is closed")]
    Closed,

    /// A background thread could not be spawned.
    #[error("failed to spawn thread: {0}")]
    Spawn(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;
