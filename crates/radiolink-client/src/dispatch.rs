//! Fan-out of decoded messages to subscribers.
//!
//! [`EventDispatcher`] keeps a table of handlers per [`MessageKind`], plus
//! catch-all handlers that see every kind, and runs every matching handler on
//! a small worker pool. Each subscription is identified by a
//! [`SubscriptionId`] that can later be passed to `unsubscribe`. Publishing never blocks on
//! a handler: when the pool queue is full the invocation gets its own thread
//! instead of waiting for a slot. [`HandlerRegistry`] sits on top and decides
//! what happens to a message nobody listens for.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, TrySendError};
use radiolink_proto::{FromRadio, MessageKind};
use tracing::{debug, error, warn};

use crate::error::{ClientError, Result};

/// A decoded message as delivered to handlers.
#[derive(Debug, Clone)]
pub struct Event {
    pub kind: MessageKind,
    /// Per-boot message counter from the radio.
    pub id: u32,
    pub message: Arc<FromRadio>,
}

impl Event {
    pub fn new(message: Arc<FromRadio>) -> Self {
        Self {
            kind: message.kind(),
            id: message.id,
            message,
        }
    }
}

/// Shared handler callback.
pub type Handler = Arc<dyn Fn(&Event) + Send + Sync + 'static>;

/// Handle for one registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct Subscribers {
    by_kind: HashMap<MessageKind, Vec<(SubscriptionId, Handler)>>,
    any: Vec<(SubscriptionId, Handler)>,
}

impl Subscribers {
    fn matching(&self, kind: MessageKind) -> Vec<Handler> {
        self.by_kind
            .get(&kind)
            .into_iter()
            .flatten()
            .chain(self.any.iter())
            .map(|(_, handler)| Arc::clone(handler))
            .collect()
    }

    fn count(&self, kind: MessageKind) -> usize {
        self.by_kind.get(&kind).map_or(0, Vec::len) + self.any.len()
    }

    fn remove(&mut self, id: SubscriptionId) -> bool {
        if let Some(pos) = self.any.iter().position(|(sub, _)| *sub == id) {
            self.any.remove(pos);
            return true;
        }
        for handlers in self.by_kind.values_mut() {
            if let Some(pos) = handlers.iter().position(|(sub, _)| *sub == id) {
                handlers.remove(pos);
                return true;
            }
        }
        false
    }

    fn len(&self) -> usize {
        self.by_kind.values().map(Vec::len).sum::<usize>() + self.any.len()
    }
}

/// Worker pool sizing.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Pool threads draining the invocation queue. `0` spawns a thread per
    /// invocation. Default: 4.
    pub workers: usize,
    /// Pending invocations before publishers fall back to a dedicated thread.
    /// Default: 1024.
    pub queue_capacity: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 1024,
        }
    }
}

struct Job {
    handler: Handler,
    event: Event,
}

/// Kind-keyed publish/subscribe over a bounded worker pool.
pub struct EventDispatcher {
    subscribers: RwLock<Subscribers>,
    next_id: AtomicU64,
    queue: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl EventDispatcher {
    /// Start the worker pool.
    pub fn new(config: DispatchConfig) -> Result<Self> {
        if config.workers == 0 {
            return Ok(Self {
                subscribers: RwLock::default(),
                next_id: AtomicU64::new(1),
                queue: None,
                workers: Vec::new(),
            });
        }

        let (tx, rx) = crossbeam_channel::bounded::<Job>(config.queue_capacity.max(1));
        let workers = (0..config.workers)
            .map(|n| {
                let rx = rx.clone();
                thread::Builder::new()
                    .name(format!("radiolink-dispatch-{n}"))
                    .spawn(move || worker_main(rx))
                    .map_err(ClientError::Spawn)
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            workers = config.workers,
            queue_capacity = config.queue_capacity,
            "dispatch pool started"
        );
        Ok(Self {
            subscribers: RwLock::default(),
            next_id: AtomicU64::new(1),
            queue: Some(tx),
            workers,
        })
    }

    /// Register `handler` for `kind`. Handlers for one kind run independently.
    pub fn subscribe<F>(&self, kind: MessageKind, handler: F) -> SubscriptionId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.write()
            .by_kind
            .entry(kind)
            .or_default()
            .push((id, Arc::new(handler)));
        debug!(kind = %kind, subscription = id.0, "handler subscribed");
        id
    }

    /// Register `handler` for every kind.
    pub fn subscribe_all<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.write().any.push((id, Arc::new(handler)));
        debug!(subscription = id.0, "catch-all handler subscribed");
        id
    }

    /// Remove one subscription. Returns whether it was registered.
    ///
    /// Invocations already scheduled still run.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.write().remove(id);
        debug!(subscription = id.0, removed, "handler unsubscribed");
        removed
    }

    /// Remove every subscription. Returns how many were registered.
    pub fn clear(&self) -> usize {
        let removed = std::mem::take(&mut *self.write()).len();
        debug!(removed, "all handlers unsubscribed");
        removed
    }

    /// Number of handlers a publish of `kind` reaches, catch-alls included.
    pub fn subscriber_count(&self, kind: MessageKind) -> usize {
        self.read().count(kind)
    }

    /// Schedule every handler registered for `kind` with `event`.
    ///
    /// Returns the number of invocations scheduled once all of them are
    /// queued. No ordering is promised between handlers or between events.
    pub fn publish(&self, kind: MessageKind, event: Event) -> usize {
        let handlers = self.read().matching(kind);

        for handler in &handlers {
            let job = Job {
                handler: Arc::clone(handler),
                event: event.clone(),
            };
            match &self.queue {
                Some(queue) => match queue.try_send(job) {
                    Ok(()) => {}
                    Err(TrySendError::Full(job)) => {
                        debug!(
                            kind = %kind,
                            "dispatch queue full, running handler on its own thread"
                        );
                        spawn_job(job);
                    }
                    Err(TrySendError::Disconnected(job)) => spawn_job(job),
                },
                None => spawn_job(job),
            }
        }
        handlers.len()
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn read(&self) -> RwLockReadGuard<'_, Subscribers> {
        self.subscribers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Subscribers> {
        self.subscribers.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for EventDispatcher {
    fn drop(&mut self) {
        // Workers exit once the queue is closed and drained.
        self.queue.take();
        let current = thread::current().id();
        for worker in self.workers.drain(..) {
            if worker.thread().id() == current {
                continue;
            }
            if worker.join().is_err() {
                error!("dispatch worker panicked");
            }
        }
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("workers", &self.workers.len())
            .finish_non_exhaustive()
    }
}

fn worker_main(rx: Receiver<Job>) {
    while let Ok(job) = rx.recv() {
        run_job(job);
    }
}

fn spawn_job(job: Job) {
    let kind = job.event.kind;
    let spawned = thread::Builder::new()
        .name("radiolink-handler".into())
        .spawn(move || run_job(job));
    if let Err(err) = spawned {
        error!(kind = %kind, error = %err, "failed to spawn handler thread, event dropped");
    }
}

fn run_job(job: Job) {
    let Job { handler, event } = job;
    if catch_unwind(AssertUnwindSafe(|| handler(&event))).is_err() {
        warn!(kind = %event.kind, id = event.id, "handler panicked");
    }
}

/// Routes each decoded message to the handlers registered for its kind.
#[derive(Debug, Clone)]
pub struct HandlerRegistry {
    dispatcher: Arc<EventDispatcher>,
    error_on_no_handler: bool,
}

impl HandlerRegistry {
    /// With `error_on_no_handler`, messages nobody handles are reported as
    /// [`ClientError::NoHandler`]; otherwise they are dropped silently.
    pub fn new(dispatcher: Arc<EventDispatcher>, error_on_no_handler: bool) -> Self {
        Self {
            dispatcher,
            error_on_no_handler,
        }
    }

    pub fn register<F>(&self, kind: MessageKind, handler: F) -> SubscriptionId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.dispatcher.subscribe(kind, handler)
    }

    pub fn register_all<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.dispatcher.subscribe_all(handler)
    }

    pub fn unregister(&self, id: SubscriptionId) -> bool {
        self.dispatcher.unsubscribe(id)
    }

    pub fn has_handler(&self, kind: MessageKind) -> bool {
        self.dispatcher.subscriber_count(kind) > 0
    }

    /// Dispatch one message. Returns whether any handler was scheduled.
    pub fn dispatch(&self, message: Arc<FromRadio>) -> Result<bool> {
        let event = Event::new(message);
        let kind = event.kind;
        if self.dispatcher.publish(kind, event) > 0 {
            return Ok(true);
        }
        if self.error_on_no_handler {
            return Err(ClientError::NoHandler(kind));
        }
        Ok(false)
    }

    pub fn dispatcher(&self) -> &Arc<EventDispatcher> {
        &self.dispatcher
    }
}
