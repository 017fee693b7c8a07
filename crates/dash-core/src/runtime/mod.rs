//! Command runtime
//!
//! Commands are queued in dispatch order and drained by a single worker task, one at a time.
//! The worker runs the handler against the current snapshot, commits its actions, updates the
//! undo history and publishes exactly one terminal event per command.

pub mod ticket;

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use ahash::AHashMap;
use dash_backend::BackendGateway;
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::commands::Command;
use crate::config::EngineSettings;
use crate::error::{CommandError, RuntimeError};
use crate::events::{DashboardEvent, EventBus, EventPayload};
use crate::handlers::{self, HandlerContext, HandlerOutcome, HistoryEffect};
use crate::store::{DashboardState, Selectors, Store};
use crate::undo::{LayoutSnapshot, UndoRecord, UndoStack};

pub use ticket::CommandTicket;

/// Running supersedable commands by key, with the sequence number of the owner
type SupersedeRegistry = Arc<Mutex<AHashMap<String, (u64, CancellationToken)>>>;

struct Envelope {
    seq: u64,
    command: Command,
    supersede_key: Option<String>,
    token: CancellationToken,
    reply: oneshot::Sender<DashboardEvent>,
}

/// Single-writer dashboard engine
pub struct DashboardRuntime {
    store: Arc<Store>,
    bus: Arc<EventBus>,
    settings: Arc<EngineSettings>,
    sender: mpsc::UnboundedSender<Envelope>,
    pending: Arc<AtomicUsize>,
    supersede: SupersedeRegistry,
    next_seq: AtomicU64,
    worker: JoinHandle<()>,
}

impl DashboardRuntime {
    /// Start a runtime over `state`; must be called from within a tokio runtime
    pub fn new(state: DashboardState, backend: Arc<dyn BackendGateway>, settings: EngineSettings) -> Self {
        let store = Arc::new(Store::new(state));
        let bus = Arc::new(EventBus::new());
        let settings = Arc::new(settings);
        let pending = Arc::new(AtomicUsize::new(0));
        let supersede: SupersedeRegistry = Arc::new(Mutex::new(AHashMap::new()));
        let (sender, receiver) = mpsc::unbounded_channel();

        let worker = Worker {
            store: store.clone(),
            bus: bus.clone(),
            backend,
            settings: settings.clone(),
            selectors: Selectors::new(),
            history: UndoStack::new(settings.undo_limit),
            pending: pending.clone(),
            supersede: supersede.clone(),
        };
        let worker = tokio::spawn(worker.run(receiver));

        Self {
            store,
            bus,
            settings,
            sender,
            pending,
            supersede,
            next_seq: AtomicU64::new(1),
            worker,
        }
    }

    /// Queue a command
    ///
    /// A command with a supersede key cancels the queued or running command holding that key.
    pub fn dispatch(&self, command: Command) -> CommandTicket {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        let supersede_key = command.payload.supersede_key();

        if let Some(key) = &supersede_key {
            let previous = self.supersede.lock().insert(key.clone(), (seq, token.clone()));
            if let Some((previous_seq, previous_token)) = previous {
                tracing::debug!("Command #{} supersedes #{} on '{}'", seq, previous_seq, key);
                previous_token.cancel();
            }
        }

        let depth = self.pending.fetch_add(1, Ordering::Relaxed) + 1;
        if depth > self.settings.queue_warning_threshold {
            tracing::warn!("Command queue holds {} commands", depth);
        }

        let (reply, receiver) = oneshot::channel();
        let ticket = CommandTicket::new(command.command_type(), command.correlation_id.clone(), token.clone(), receiver);
        let envelope = Envelope {
            seq,
            command,
            supersede_key,
            token,
            reply,
        };
        if self.sender.send(envelope).is_err() {
            // the envelope and its reply sender are dropped, so the ticket resolves to Closed
            tracing::error!("Dispatch after the runtime worker stopped");
            self.pending.fetch_sub(1, Ordering::Relaxed);
        }
        ticket
    }

    /// Dispatch and wait for the terminal event
    pub async fn execute(&self, command: Command) -> Result<DashboardEvent, RuntimeError> {
        self.dispatch(command).wait().await
    }

    /// Current state snapshot
    pub fn state(&self) -> Arc<DashboardState> {
        self.store.snapshot()
    }

    pub fn revision(&self) -> u64 {
        self.store.revision()
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Commands queued or running
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Relaxed)
    }

    /// Stop accepting commands and wait until the queue is drained
    pub async fn shutdown(self) {
        let Self { sender, worker, .. } = self;
        drop(sender);
        if let Err(error) = worker.await {
            tracing::error!("Runtime worker failed: {}", error);
        }
    }
}

/// Turn a panic inside `future` into an internal error, so the worker survives it
async fn contain_panic<T, F>(future: F) -> Result<T, CommandError>
where
    F: Future<Output = Result<T, CommandError>>,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown cause".to_string());
            tracing::error!("Command handler panicked: {}", message);
            Err(CommandError::internal(format!("handler panicked: {}", message)))
        }
    }
}

/// State owned by the worker task
struct Worker {
    store: Arc<Store>,
    bus: Arc<EventBus>,
    backend: Arc<dyn BackendGateway>,
    settings: Arc<EngineSettings>,
    selectors: Selectors,
    history: UndoStack,
    pending: Arc<AtomicUsize>,
    supersede: SupersedeRegistry,
}

impl Worker {
    async fn run(mut self, mut receiver: mpsc::UnboundedReceiver<Envelope>) {
        tracing::debug!("Runtime worker started");
        while let Some(envelope) = receiver.recv().await {
            let event = self.process(&envelope).await;
            self.release(&envelope);
            self.pending.fetch_sub(1, Ordering::Relaxed);

            self.bus.publish(&event);
            // the caller may have dropped its ticket
            let _ = envelope.reply.send(event);
        }
        tracing::debug!("Runtime worker stopped");
    }

    /// Drop the supersede entry of a finished command unless a newer command took it over
    fn release(&self, envelope: &Envelope) {
        if let Some(key) = &envelope.supersede_key {
            let mut registry = self.supersede.lock();
            if registry.get(key).is_some_and(|(seq, _)| *seq == envelope.seq) {
                registry.remove(key);
            }
        }
    }

    async fn process(&mut self, envelope: &Envelope) -> DashboardEvent {
        let command = &envelope.command;
        let command_type = command.command_type();
        let correlation_id = command.correlation_id.clone();

        let result = if envelope.token.is_cancelled() {
            Err(CommandError::Cancelled)
        } else {
            tracing::debug!("Running #{} {} ({:?})", envelope.seq, command_type, correlation_id);
            self.run_handler(envelope).await
        };

        let payload = match result {
            Ok(payload) => payload,
            Err(CommandError::Cancelled) => {
                tracing::warn!("{} ({:?}) was cancelled", command_type, correlation_id);
                EventPayload::from_error(&CommandError::Cancelled, command_type)
            }
            Err(error) => {
                tracing::warn!("{} ({:?}) failed: {}", command_type, correlation_id, error);
                EventPayload::from_error(&error, command_type)
            }
        };
        DashboardEvent::new(correlation_id, payload)
    }

    async fn run_handler(&mut self, envelope: &Envelope) -> Result<EventPayload, CommandError> {
        let (revision, state) = self.store.versioned_snapshot();
        let outcome = {
            let ctx = HandlerContext {
                state: state.clone(),
                revision,
                selectors: &self.selectors,
                backend: self.backend.as_ref(),
                settings: &self.settings,
                correlation_id: envelope.command.correlation_id.as_deref(),
                abort: envelope.token.clone(),
                history: &self.history,
            };
            tokio::select! {
                biased;
                _ = envelope.token.cancelled() => Err(CommandError::Cancelled),
                result = contain_panic(handlers::handle(&ctx, &envelope.command.payload)) => result,
            }
        }?;
        // a handler may finish before it notices a late cancellation
        if envelope.token.is_cancelled() {
            return Err(CommandError::Cancelled);
        }
        self.commit(outcome, &state, &envelope.command)
    }

    fn commit(
        &mut self,
        outcome: HandlerOutcome,
        prior: &DashboardState,
        command: &Command,
    ) -> Result<EventPayload, CommandError> {
        let action_count = outcome.actions.len();
        let revision = self.store.commit(outcome.actions)?;

        let snapshot = || LayoutSnapshot {
            layout: prior.dashboard.layout.clone(),
            stash: prior.stash.clone(),
        };
        match outcome.history {
            HistoryEffect::None => {}
            HistoryEffect::Record => self.history.push(UndoRecord {
                command_type: command.command_type(),
                correlation_id: command.correlation_id.clone(),
                prior: snapshot(),
            }),
            HistoryEffect::Undo { count, redoable } => {
                self.history.undo(count, snapshot(), redoable);
            }
            HistoryEffect::Redo => {
                self.history.redo();
            }
            HistoryEffect::Clear => self.history.clear(),
            HistoryEffect::RemapWidgetRefs(identities) => self.history.remap_widget_refs(&identities),
        }

        tracing::info!(
            "{} committed {} actions at revision {}",
            command.command_type(),
            action_count,
            revision
        );
        Ok(outcome.event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{AddLayoutSection, RenameDashboard, UndoLayoutChanges};
    use dash_backend::InMemoryBackend;
    use dash_model::Dashboard;

    fn runtime() -> DashboardRuntime {
        DashboardRuntime::new(
            DashboardState::new(Dashboard::new("Test")),
            Arc::new(InMemoryBackend::new()),
            EngineSettings::default(),
        )
    }

    #[tokio::test]
    async fn test_execute_commits_and_publishes() {
        let runtime = runtime();
        let (_, mut events) = runtime.bus().channel();

        let event = runtime
            .execute(Command::new(AddLayoutSection::default()).with_correlation_id("c1"))
            .await
            .unwrap();

        assert!(event.is_success());
        assert_eq!(event.correlation_id.as_deref(), Some("c1"));
        assert_eq!(runtime.state().layout().sections.len(), 1);
        assert_eq!(runtime.revision(), 1);
        assert_eq!(events.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_failed_command_leaves_revision() {
        let runtime = runtime();

        let event = runtime
            .execute(Command::new(RenameDashboard { title: String::new() }))
            .await
            .unwrap();

        assert_eq!(event.failure_reason(), Some(crate::FailureReason::UserError));
        assert_eq!(runtime.revision(), 0);
    }

    #[tokio::test]
    async fn test_undo_after_add() {
        let runtime = runtime();
        runtime.execute(Command::new(AddLayoutSection::default())).await.unwrap();

        let event = runtime.execute(Command::new(UndoLayoutChanges::default())).await.unwrap();

        assert_eq!(event.event_type(), "DASH/EVT.FLUID_LAYOUT.LAYOUT_CHANGED");
        assert!(runtime.state().layout().sections.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_while_queued() {
        let runtime = runtime();
        let ticket = runtime.dispatch(Command::new(AddLayoutSection::default()));
        ticket.cancel();

        let event = ticket.wait().await.unwrap();

        assert!(event.is_cancelled());
        assert_eq!(runtime.revision(), 0);
    }

    #[tokio::test]
    async fn test_handler_panic_becomes_internal_error() {
        async fn broken() -> Result<(), CommandError> {
            panic!("size table broken")
        }

        let result = contain_panic(broken()).await;

        match result {
            Err(CommandError::Internal(message)) => assert!(message.contains("size table broken")),
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(contain_panic(async { Ok::<_, CommandError>(7) }).await, Ok(7));
    }

    #[tokio::test]
    async fn test_shutdown_drains_queue() {
        let runtime = runtime();
        let first = runtime.dispatch(Command::new(AddLayoutSection::default()));
        let second = runtime.dispatch(Command::new(AddLayoutSection::default()));

        runtime.shutdown().await;

        assert!(first.wait().await.unwrap().is_success());
        assert!(second.wait().await.unwrap().is_success());
    }
}
