//! Client transport for mesh radios speaking the framed serial protocol.
//!
//! # Crate Structure
//!
//! - [`transport`]: serial, TCP and in-process byte streams
//! - [`frame`]: sync-marked, length-prefixed framing
//! - [`proto`]: message model and protobuf codec
//! - [`client`]: configuration handshake, session state and event dispatch

/// Re-export transport types.
pub mod transport {
    pub use radiolink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use radiolink_frame::*;
}

/// Re-export message types.
pub mod proto {
    pub use radiolink_proto::*;
}

/// Re-export client types.
pub mod client {
    pub use radiolink_client::*;
}

pub use radiolink_client::{Client, ClientConfig, ClientError, ClientState, Event, MessageKind};
