//! Message model for the radio protocol.
//!
//! The radio speaks protobuf: every frame it sends carries one [`FromRadio`],
//! every frame it accepts carries one [`ToRadio`]. This crate models the part
//! of that schema a client needs to run the configuration handshake and
//! exchange mesh packets. Fields and variants outside the model are skipped
//! by the decoder; a `FromRadio` whose variant is not modelled decodes with
//! kind [`MessageKind::Unknown`].

pub mod builders;
pub mod codec;
pub mod error;
pub mod kind;
pub mod messages;

pub use builders::{
    disconnect, heartbeat, text_message, want_config, BROADCAST_ADDR, DEFAULT_HOP_LIMIT,
};
pub use codec::{MessageCodec, ProtobufCodec};
pub use error::{CodecError, Result};
pub use kind::{MessageKind, ParseKindError};
pub use messages::*;
