//! Client for the radio's framed serial protocol.
//!
//! A [`Client`] owns one connection. [`Client::start`] asks the radio for its
//! configuration and blocks until the radio has streamed all of it into the
//! [`SessionState`] (or a timeout elapses). From then on every decoded message
//! is published to the handlers registered with [`Client::subscribe`].
//!
//! ```no_run
//! use std::time::Duration;
//! use radiolink_client::{connect_tcp, ClientConfig, Event, MessageKind};
//!
//! let client = connect_tcp("192.168.1.20", &ClientConfig::default())?;
//! client.subscribe(MessageKind::Packet, |event: &Event| {
//!     println!("packet {}", event.id);
//! });
//! client.start(Duration::from_secs(10))?;
//! println!("{} nodes", client.session().nodes().len());
//! # Ok::<(), radiolink_client::ClientError>(())
//! ```

pub mod client;
pub mod config;
pub mod connector;
pub mod dispatch;
pub mod error;
pub mod latch;
pub mod state;

pub use client::{Client, ClientState};
pub use config::ClientConfig;
#[cfg(feature = "serial")]
pub use connector::open_serial;
pub use connector::connect_tcp;
pub use dispatch::{
    DispatchConfig, Event, EventDispatcher, Handler, HandlerRegistry, SubscriptionId,
};
pub use error::{ClientError, Result};
pub use latch::CompletionLatch;
pub use radiolink_proto::MessageKind;
pub use state::{SessionSnapshot, SessionState};
