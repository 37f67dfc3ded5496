use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use radiolink_frame::{FrameError, FrameReader, FrameWriter, SharedFrameWriter};
use radiolink_proto::from_radio::PayloadVariant;
use radiolink_proto::{
    heartbeat, text_message, want_config, FromRadio, MessageCodec, MessageKind, ProtobufCodec,
    ToRadio,
};
use radiolink_transport::RadioStream;
use rand::RngCore;
use tracing::{debug, error, info, trace, warn};

use crate::config::ClientConfig;
use crate::dispatch::{Event, EventDispatcher, HandlerRegistry, SubscriptionId};
use crate::error::{ClientError, Result};
use crate::latch::CompletionLatch;
use crate::state::SessionState;

/// Lifecycle of a [`Client`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// Created, `start` not called yet.
    Idle,
    /// Configuration requested, radio still streaming it.
    AwaitingConfig,
    /// The radio finished streaming its configuration.
    Complete,
    /// `start` gave up waiting. The decode loop may still complete later.
    TimedOut,
    /// Shut down; the decode loop has stopped.
    Closed,
}

/// Client side of one radio connection.
///
/// `start` runs the configuration handshake and leaves a background decode
/// thread running for the life of the connection. Until the radio reports
/// the end of its configuration, decoded messages fill the [`SessionState`];
/// afterwards they are handed to subscribed handlers.
pub struct Client {
    shared: Arc<Shared>,
    reader: Mutex<Option<FrameReader<RadioStream>>>,
    decode_thread: Mutex<Option<JoinHandle<()>>>,
}

struct Shared {
    writer: SharedFrameWriter<RadioStream>,
    // Separate handle so shutdown never waits on the write lock.
    control: RadioStream,
    codec: Arc<dyn MessageCodec>,
    session: Arc<SessionState>,
    latch: CompletionLatch,
    registry: HandlerRegistry,
    state: Mutex<ClientState>,
    stop: AtomicBool,
    config: ClientConfig,
}

impl Client {
    /// Build a client over a connected stream with the protobuf codec.
    pub fn new(stream: RadioStream, config: ClientConfig) -> Result<Self> {
        Self::with_codec(stream, config, ProtobufCodec)
    }

    /// Build a client with an explicit message codec.
    pub fn with_codec<C: MessageCodec>(
        stream: RadioStream,
        config: ClientConfig,
        codec: C,
    ) -> Result<Self> {
        let reader_stream = stream.try_clone()?;
        let control = stream.try_clone()?;

        let reader = FrameReader::with_config_radio(reader_stream, config.frame.clone())?;
        let writer = FrameWriter::with_config_radio(stream, config.frame.clone())?;

        let dispatcher = Arc::new(EventDispatcher::new(config.dispatch.clone())?);
        let registry = HandlerRegistry::new(dispatcher, config.error_on_no_handler);

        debug!(transport = control.transport_name(), "client created");
        Ok(Self {
            shared: Arc::new(Shared {
                writer: SharedFrameWriter::new(writer),
                control,
                codec: Arc::new(codec),
                session: Arc::new(SessionState::new()),
                latch: CompletionLatch::new(),
                registry,
                state: Mutex::new(ClientState::Idle),
                stop: AtomicBool::new(false),
                config,
            }),
            reader: Mutex::new(Some(reader)),
            decode_thread: Mutex::new(None),
        })
    }

    /// Request the radio's configuration and wait for it to finish streaming.
    ///
    /// Starts the background decode loop. Returns `Ok` once the radio echoes
    /// the end-of-configuration marker, or [`ClientError::Timeout`] after
    /// `timeout`. The decode loop keeps running after a timeout unless
    /// `close_on_timeout` is set. Callable once per client.
    pub fn start(&self, timeout: Duration) -> Result<()> {
        {
            let mut state = self.shared.lock_state();
            match *state {
                ClientState::Idle => *state = ClientState::AwaitingConfig,
                ClientState::Closed => return Err(ClientError::Closed),
                _ => return Err(ClientError::AlreadyStarted),
            }
        }

        if let Err(err) = self.request_config() {
            self.shared.set_state(ClientState::Idle);
            return Err(err);
        }

        let reader = self
            .reader
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(ClientError::AlreadyStarted)?;
        let shared = Arc::clone(&self.shared);
        let handle = match thread::Builder::new()
            .name("radiolink-decode".into())
            .spawn(move || decode_loop(shared, reader))
        {
            Ok(handle) => handle,
            Err(err) => return Err(self.abandon_start(err)),
        };
        *self
            .decode_thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handle);

        if self.shared.latch.wait(timeout) {
            return Ok(());
        }

        self.shared.transition(ClientState::AwaitingConfig, ClientState::TimedOut);
        warn!(?timeout, "radio did not finish sending its configuration");
        if self.shared.config.close_on_timeout {
            self.shutdown()?;
        }
        Err(ClientError::Timeout(timeout))
    }

    /// The reader was consumed by the failed spawn, so the connection can
    /// never be read again: close it rather than stay in `AwaitingConfig`.
    fn abandon_start(&self, err: std::io::Error) -> ClientError {
        error!(error = %err, "failed to spawn decode thread");
        if let Err(shutdown_err) = self.shutdown() {
            debug!(error = %shutdown_err, "shutdown after failed spawn");
        }
        ClientError::Spawn(err)
    }

    fn request_config(&self) -> Result<()> {
        if self.shared.config.wake_on_start {
            self.shared.writer.wake()?;
        }
        let id = rand::thread_rng().next_u32();
        self.shared.session.set_config_id(id);
        self.send(&want_config(id))?;
        info!(config_id = id, "requested device configuration");
        Ok(())
    }

    /// Block until the configuration is complete or `timeout` elapses.
    pub fn wait_complete(&self, timeout: Duration) -> Result<()> {
        if self.shared.latch.wait(timeout) {
            Ok(())
        } else {
            Err(ClientError::Timeout(timeout))
        }
    }

    /// Encode and send one message to the radio.
    pub fn send(&self, msg: &ToRadio) -> Result<()> {
        if self.state() == ClientState::Closed {
            return Err(ClientError::Closed);
        }
        let body = self.shared.codec.encode(msg)?;
        self.shared.writer.send(&body)?;
        trace!(len = body.len(), "message sent");
        Ok(())
    }

    /// Send a text message to `to` (or [`radiolink_proto::BROADCAST_ADDR`]).
    pub fn send_text(&self, to: u32, channel: u32, text: &str) -> Result<()> {
        self.send(&text_message(to, channel, text))
    }

    pub fn send_heartbeat(&self) -> Result<()> {
        self.send(&heartbeat())
    }

    /// Register a handler for messages of `kind` decoded after the handshake.
    ///
    /// Register before calling [`start`](Self::start) to see every message
    /// the radio sends once its configuration is complete.
    pub fn subscribe<F>(&self, kind: MessageKind, handler: F) -> SubscriptionId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.shared.registry.register(kind, handler)
    }

    /// Register a handler for every message decoded after the handshake.
    pub fn subscribe_all<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.shared.registry.register_all(handler)
    }

    /// Like [`subscribe`](Self::subscribe) for handlers that only need the message.
    pub fn handle<F>(&self, kind: MessageKind, handler: F) -> SubscriptionId
    where
        F: Fn(&FromRadio) + Send + Sync + 'static,
    {
        self.shared
            .registry
            .register(kind, move |event: &Event| handler(&event.message))
    }

    /// Remove a handler. Returns whether it was still registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.registry.unregister(id)
    }

    /// The session state this client fills in.
    pub fn session(&self) -> Arc<SessionState> {
        Arc::clone(&self.shared.session)
    }

    pub fn state(&self) -> ClientState {
        *self.shared.lock_state()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.shared.config
    }

    /// Short name of the underlying transport ("tcp", "unix" or "serial").
    pub fn transport(&self) -> &'static str {
        self.shared.control.transport_name()
    }

    /// Stop the decode loop and close the connection.
    ///
    /// Socket readers are unblocked at once; serial readers stop at their
    /// next read timeout. Idempotent.
    pub fn shutdown(&self) -> Result<()> {
        {
            let mut state = self.shared.lock_state();
            if *state == ClientState::Closed {
                return Ok(());
            }
            *state = ClientState::Closed;
        }

        self.shared.stop.store(true, Ordering::Release);
        if let Err(err) = self.shared.control.shutdown() {
            debug!(error = %err, "stream shutdown failed");
        }

        let handle = self
            .decode_thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.thread().id() != thread::current().id() && handle.join().is_err() {
                error!("decode thread panicked");
            }
        }
        self.shared.registry.dispatcher().clear();
        info!("client closed");
        Ok(())
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("transport", &self.shared.control.transport_name())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, ClientState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, next: ClientState) {
        *self.lock_state() = next;
    }

    fn transition(&self, from: ClientState, to: ClientState) {
        let mut state = self.lock_state();
        if *state == from {
            *state = to;
        }
    }

    fn route(&self, msg: FromRadio) {
        if !self.session.is_complete() {
            self.absorb(msg);
            return;
        }

        let kind = msg.kind();
        match kind {
            MessageKind::ConfigCompleteId => {
                debug!(id = msg.id, "ignoring repeated configuration complete");
                return;
            }
            MessageKind::Unknown => {
                debug!(id = msg.id, "dropping message of unknown kind");
                return;
            }
            MessageKind::Rebooted => info!("radio rebooted"),
            _ => {}
        }

        if let Some(variant) = &msg.payload_variant {
            // A radio may re-send configuration later; keep the session current.
            self.store(variant);
        }
        if let Err(err) = self.registry.dispatch(Arc::new(msg)) {
            warn!(kind = %kind, error = %err, "message not handled");
        }
    }

    fn absorb(&self, msg: FromRadio) {
        let kind = msg.kind();
        match &msg.payload_variant {
            Some(PayloadVariant::ConfigCompleteId(id)) => self.complete(*id),
            Some(PayloadVariant::Rebooted(_)) => info!("radio rebooted"),
            Some(variant) if kind.is_config_stream() => {
                debug!(kind = %kind, id = msg.id, "configuration message");
                self.store(variant);
            }
            _ => debug!(
                kind = %kind,
                id = msg.id,
                "ignoring message before configuration completes"
            ),
        }
    }

    fn store(&self, variant: &PayloadVariant) {
        match variant {
            PayloadVariant::MyInfo(info) => self.session.set_node_info(info.clone()),
            PayloadVariant::Metadata(meta) => self.session.set_device_metadata(meta.clone()),
            PayloadVariant::NodeInfo(node) => self.session.append_node(node.clone()),
            PayloadVariant::Channel(channel) => self.session.append_channel(channel.clone()),
            PayloadVariant::Config(config) => self.session.append_config(config.clone()),
            PayloadVariant::ModuleConfig(module) => self.session.append_module(module.clone()),
            _ => {}
        }
    }

    fn complete(&self, id: u32) {
        let expected = self.session.config_id();
        if id != expected {
            warn!(
                expected,
                received = id,
                "configuration complete id does not match request"
            );
        }
        if !self.session.mark_complete() {
            return;
        }
        {
            let mut state = self.lock_state();
            if *state != ClientState::Closed {
                *state = ClientState::Complete;
            }
        }
        self.latch.fire();

        let snap = self.session.snapshot();
        info!(
            config_id = snap.config_id,
            nodes = snap.nodes.len(),
            channels = snap.channels.len(),
            configs = snap.configs.len(),
            modules = snap.modules.len(),
            "device configuration complete"
        );
    }
}

fn decode_loop(shared: Arc<Shared>, mut reader: FrameReader<RadioStream>) {
    debug!("decode loop started");
    loop {
        if shared.stop.load(Ordering::Acquire) {
            break;
        }

        let body = match reader.read_frame() {
            Ok(body) => body,
            Err(err) if err.is_timeout() => continue,
            Err(FrameError::ConnectionClosed) => {
                if !shared.stop.load(Ordering::Acquire) {
                    info!("radio closed the connection");
                }
                break;
            }
            Err(err) => {
                if shared.stop.load(Ordering::Acquire) {
                    break;
                }
                error!(error = %err, "frame read failed");
                thread::sleep(shared.config.error_backoff);
                continue;
            }
        };

        match shared.codec.decode(&body) {
            Ok(msg) => shared.route(msg),
            Err(err) => warn!(len = body.len(), error = %err, "dropping undecodable frame"),
        }
    }
    debug!(discarded = reader.discarded_bytes(), "decode loop stopped");
}
