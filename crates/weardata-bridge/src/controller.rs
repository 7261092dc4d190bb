//! The bridge controller: command entry point, dispatch, and listeners.
//!
//! Commands that arrive before a transport session is attached are parked
//! in a [`CommandQueue`] and dispatched in arrival order once one is.
//! Dispatch is synchronous: the transport call is issued while the state
//! lock is held, so dispatch order equals arrival order. Completions run on
//! the runtime and report to the command's channel without the lock.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use weardata_core::{ChangeEvent, Codec, StructuredValue};
use weardata_transport::{ChangeReceiver, SessionRegistry, TransportError, TransportSession};

use crate::channel::{Channel, PluginResult};
use crate::command::{Command, CommandKind, PendingCommand};
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::queue::{CommandQueue, Submission};

/// Whether [`BridgeController::execute`] recognised the command name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    Yes,
    No,
}

impl Handled {
    pub fn is_handled(self) -> bool {
        self == Handled::Yes
    }
}

/// Command-side half of the bridge. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct BridgeController {
    inner: Arc<Inner>,
}

struct Inner {
    config: BridgeConfig,
    codec: Codec,
    runtime: Handle,
    state: Mutex<ControllerState>,
}

struct ControllerState {
    queue: CommandQueue<PendingCommand>,
    session: Option<TransportSession>,
    listeners: Vec<Channel>,
    /// Task forwarding the attached session's changes to listeners.
    forwarder: Option<JoinHandle<()>>,
}

impl BridgeController {
    /// Create a controller on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime. Use
    /// [`with_runtime`](Self::with_runtime) from other threads.
    pub fn new(config: BridgeConfig) -> Self {
        Self::with_runtime(config, Handle::current())
    }

    /// Create a controller whose completions run on `runtime`.
    pub fn with_runtime(config: BridgeConfig, runtime: Handle) -> Self {
        let codec = Codec::new(config.codec.clone());
        let queue = CommandQueue::with_capacity_limit(config.max_pending_commands);
        Self {
            inner: Arc::new(Inner {
                config,
                codec,
                runtime,
                state: Mutex::new(ControllerState {
                    queue,
                    session: None,
                    listeners: Vec::new(),
                    forwarder: None,
                }),
            }),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Commands
    // ─────────────────────────────────────────────────────────────────────────

    /// Run a named command.
    ///
    /// Returns [`Handled::No`] for an unknown name, without touching
    /// `channel`. Otherwise the outcome is delivered to `channel`: right away
    /// for invalid arguments, later for dispatched commands.
    pub fn execute(&self, name: &str, args: Vec<Value>, channel: Channel) -> Handled {
        let Some(kind) = CommandKind::parse(name, self.inner.config.accept_legacy_names) else {
            tracing::debug!(command = name, "unknown command");
            return Handled::No;
        };

        match Command::parse(kind, &args, &self.inner.codec) {
            Ok(Some(command)) => self.submit(PendingCommand {
                kind,
                command,
                channel,
            }),
            Ok(None) => self.register_listener(channel),
            Err(e) => {
                tracing::warn!(command = kind.name(), error = %e, "invalid command");
                channel.deliver(PluginResult::error(e.to_string()));
            }
        }
        Handled::Yes
    }

    fn submit(&self, pending: PendingCommand) {
        let mut state = self.inner.lock_state();
        let session = state.session.clone();
        let failed = match state.queue.submit(pending) {
            Submission::Dispatch(pending) => match session {
                Some(session) => {
                    self.inner.dispatch(&session, pending);
                    None
                }
                None => Some((pending, BridgeError::from(TransportError::Disconnected))),
            },
            Submission::Queued { position } => {
                tracing::debug!(position, "transport not ready; command queued");
                None
            }
            Submission::Rejected(pending) => {
                let capacity = state.queue.capacity().unwrap_or_default();
                Some((pending, BridgeError::QueueFull { capacity }))
            }
        };
        drop(state);

        if let Some((pending, error)) = failed {
            self.inner.fail(pending, error);
        }
    }

    fn register_listener(&self, channel: Channel) {
        let mut state = self.inner.lock_state();
        state.listeners.push(channel);
        tracing::debug!(listeners = state.listeners.len(), "listener registered");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Listeners
    // ─────────────────────────────────────────────────────────────────────────

    /// Fan a batch of external changes out to every registered listener.
    ///
    /// The batch is encoded once; each listener gets the same array, with
    /// `keep_callback` set.
    pub fn on_external_change(&self, events: &[ChangeEvent]) {
        if events.is_empty() {
            return;
        }
        let listeners = self.inner.lock_state().listeners.clone();
        if listeners.is_empty() {
            tracing::trace!(events = events.len(), "no listeners for change batch");
            return;
        }

        let payload = self.inner.codec.encode_events(events);
        tracing::debug!(
            events = events.len(),
            listeners = listeners.len(),
            "delivering change batch"
        );
        for listener in &listeners {
            listener.deliver(PluginResult::ok_with(payload.clone()).keep_callback(true));
        }
    }

    /// Drop all registered listeners (page reload).
    pub fn reset(&self) {
        let mut state = self.inner.lock_state();
        let cleared = state.listeners.len();
        state.listeners.clear();
        tracing::info!(cleared, "listeners reset");
    }

    pub fn listener_count(&self) -> usize {
        self.inner.lock_state().listeners.len()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Transport Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Attach a connected transport session and drain parked commands.
    ///
    /// Attaching the session that is already attached is a no-op.
    pub fn attach_session(&self, session: TransportSession) {
        let mut state = self.inner.lock_state();
        if state.forwarder.is_some()
            && state
                .session
                .as_ref()
                .is_some_and(|current| current.same_transport(&session))
        {
            return;
        }

        // Subscribe before draining so changes made by drained commands
        // reach listeners.
        let forwarder = self.inner.runtime.spawn(forward_changes(
            Arc::downgrade(&self.inner),
            session.changes(),
        ));
        if let Some(previous) = state.forwarder.replace(forwarder) {
            previous.abort();
        }
        state.session = Some(session.clone());

        let drained = state.queue.len();
        tracing::info!(node = %session.local_node(), drained, "transport session attached");
        for pending in state.queue.on_ready() {
            self.inner.dispatch(&session, pending);
        }
    }

    /// Detach the current session. New commands park until the next attach;
    /// commands already dispatched still complete.
    pub fn detach_session(&self) {
        let mut state = self.inner.lock_state();
        state.queue.on_teardown();
        if let Some(forwarder) = state.forwarder.take() {
            forwarder.abort();
        }
        if state.session.take().is_some() {
            tracing::info!("transport session detached");
        }
    }

    /// Follow `registry`: attach whenever a session is published, detach
    /// whenever it is withdrawn.
    ///
    /// The returned task ends when the registry is dropped or every handle
    /// to this controller is gone.
    pub fn bind(&self, registry: &SessionRegistry) -> JoinHandle<()> {
        let mut sessions = registry.watch();
        let inner = Arc::downgrade(&self.inner);
        self.inner.runtime.spawn(async move {
            loop {
                let current = sessions.borrow_and_update().clone();
                let Some(inner) = inner.upgrade() else {
                    break;
                };
                let controller = BridgeController { inner };
                match current {
                    Some(session) => controller.attach_session(session),
                    None => controller.detach_session(),
                }
                drop(controller);

                if sessions.changed().await.is_err() {
                    break;
                }
            }
        })
    }

    pub fn is_ready(&self) -> bool {
        self.inner.lock_state().queue.is_ready()
    }

    /// Commands parked waiting for a transport.
    pub fn pending_count(&self) -> usize {
        self.inner.lock_state().queue.len()
    }
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Issue the transport call now; report its outcome when it completes.
    fn dispatch(&self, session: &TransportSession, pending: PendingCommand) {
        let PendingCommand {
            kind,
            command,
            channel,
        } = pending;
        tracing::debug!(command = kind.name(), "dispatching");

        match command {
            Command::Put { uri, data } => {
                let put = session.put(uri, data);
                self.complete(kind, channel, async move { put.await.map(|_| None) });
            }
            Command::Get { uri, filter } => {
                let get = session.get(&uri, filter);
                let codec = self.codec.clone();
                self.complete(kind, channel, async move {
                    let records = get.await?;
                    Ok(Some(codec.encode_records(&records)))
                });
            }
            Command::Delete { uri, filter } => {
                let delete = session.delete(&uri, filter);
                self.complete(kind, channel, async move {
                    let removed = delete.await?;
                    Ok(Some(num_deleted(removed)))
                });
            }
        }
    }

    fn complete<F>(&self, kind: CommandKind, channel: Channel, operation: F)
    where
        F: Future<Output = weardata_transport::Result<Option<StructuredValue>>> + Send + 'static,
    {
        self.runtime.spawn(async move {
            let result = match operation.await {
                Ok(Some(value)) => PluginResult::ok_with(value),
                Ok(None) => PluginResult::ok(),
                Err(e) => {
                    let error = BridgeError::from(e);
                    tracing::warn!(command = kind.name(), error = %error, "command failed");
                    PluginResult::error(error.to_string())
                }
            };
            channel.deliver(result);
        });
    }

    fn fail(&self, pending: PendingCommand, error: BridgeError) {
        tracing::warn!(command = pending.kind.name(), error = %error, "command failed");
        pending.channel.deliver(PluginResult::error(error.to_string()));
    }
}

async fn forward_changes(inner: Weak<Inner>, mut changes: ChangeReceiver) {
    loop {
        match changes.recv().await {
            Ok(batch) => {
                let Some(inner) = inner.upgrade() else {
                    break;
                };
                BridgeController { inner }.on_external_change(&batch);
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "change forwarder lagged; batches dropped");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

fn num_deleted(count: u64) -> StructuredValue {
    let value = match i32::try_from(count) {
        Ok(n) => StructuredValue::Integer(n),
        Err(_) => StructuredValue::Long(i64::try_from(count).unwrap_or(i64::MAX)),
    };
    StructuredValue::object([("NumDeleted", value)])
}
