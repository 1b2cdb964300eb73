//! Chat client
//!
//! `ChatClient` ties the pieces together: it records the user turn, opens
//! the completion stream, and runs the [`StreamSession`] that fills the
//! assistant placeholder. Only one turn streams at a time; starting a new
//! turn cancels the previous one and waits for it to settle.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ChatConfig;
use crate::error::ChatError;
use crate::storage::{ConversationRepository, KeyValueStore};
use crate::store::{SessionId, StoreHandle};
use crate::streaming::{SessionOutcome, SessionReport, StreamEvent, StreamSession};
use crate::transport::{CompletionTransport, HttpTransport};
use crate::types::{CompletionRequest, ConversationSnapshot, Message, MessageKind};
use crate::utils::CancelHandle;

/// Result of one assistant turn.
pub type TurnOutcome = SessionReport;

struct ActiveTurn {
    session: SessionId,
    cancel: CancelHandle,
    /// Cancelled once the turn's task has settled the store.
    finished: CancelHandle,
}

/// Handle to a turn running in the background.
#[derive(Debug)]
pub struct TurnHandle {
    session: SessionId,
    cancel: CancelHandle,
    join: JoinHandle<TurnOutcome>,
}

impl TurnHandle {
    pub fn session_id(&self) -> SessionId {
        self.session
    }

    /// Stop reading the stream; the message keeps its partial content.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub async fn join(self) -> Result<TurnOutcome, ChatError> {
        self.join
            .await
            .map_err(|e| ChatError::InternalError(format!("turn task failed: {e}")))
    }
}

/// Streaming chat client over a persisted conversation log.
#[derive(Clone)]
pub struct ChatClient {
    model: String,
    idle_timeout: Option<Duration>,
    transport: Arc<dyn CompletionTransport>,
    store: StoreHandle,
    events: Option<mpsc::Sender<StreamEvent>>,
    active: Arc<Mutex<Option<ActiveTurn>>>,
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("model", &self.model)
            .field("idle_timeout", &self.idle_timeout)
            .finish_non_exhaustive()
    }
}

impl ChatClient {
    pub fn new(
        config: &ChatConfig,
        transport: Arc<dyn CompletionTransport>,
        store: StoreHandle,
    ) -> Self {
        Self {
            model: config.model.clone(),
            idle_timeout: config.stream_idle_timeout,
            transport,
            store,
            events: None,
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// Load the log from `kv_store`, spawn its store task and connect over
    /// HTTP.
    pub async fn open(
        config: &ChatConfig,
        kv_store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, ChatError> {
        let transport = HttpTransport::new(config)?;
        let store = StoreHandle::open(ConversationRepository::new(kv_store)).await?;
        info!(
            model = %config.model,
            messages = store.snapshot().len(),
            "chat client ready"
        );
        Ok(Self::new(config, Arc::new(transport), store))
    }

    /// Forward per-delta events of every turn to `events`.
    pub fn with_stream_events(mut self, events: mpsc::Sender<StreamEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    /// Send `input` and wait for the assistant turn to settle.
    ///
    /// Returns `Ok(None)` without touching the log when `input` is blank.
    pub async fn send(&self, input: &str) -> Result<Option<TurnOutcome>, ChatError> {
        match self.start(input).await? {
            Some(handle) => handle.join().await.map(Some),
            None => Ok(None),
        }
    }

    /// Like [`send`](Self::send), but the turn runs in a background task.
    pub async fn start(&self, input: &str) -> Result<Option<TurnHandle>, ChatError> {
        if input.trim().is_empty() {
            return Ok(None);
        }

        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            self.settle_previous(previous).await;
        }

        // Stored as typed; the trim above only decides whether to send.
        let start = self.store.begin_turn(Message::user(input)).await?;
        let session = start.session;
        let request = CompletionRequest::streaming(self.model.clone(), &start.history);

        let cancel = CancelHandle::new();
        let finished = CancelHandle::new();
        *active = Some(ActiveTurn {
            session,
            cancel: cancel.clone(),
            finished: finished.clone(),
        });
        drop(active);

        info!(%session, history = request.messages.len(), "turn started");
        let join = tokio::spawn(drive(
            self.transport.clone(),
            self.store.clone(),
            request,
            session,
            cancel.clone(),
            finished,
            self.idle_timeout,
            self.events.clone(),
        ));
        Ok(Some(TurnHandle {
            session,
            cancel,
            join,
        }))
    }

    async fn settle_previous(&self, previous: ActiveTurn) {
        debug!(session = %previous.session, "cancelling previous turn");
        previous.cancel.cancel();
        previous.finished.cancelled().await;
        // Normally already settled by its task; this covers a task that
        // panicked before finishing.
        if let Err(e) = self.store.finish(previous.session).await {
            debug!(session = %previous.session, error = %e, "previous turn already settled");
        }
    }

    /// Cancel the streaming turn, if any. Returns whether one was running.
    pub async fn cancel_in_flight(&self) -> bool {
        let active = self.active.lock().await;
        match active.as_ref() {
            Some(turn) if !turn.finished.is_cancelled() => {
                turn.cancel.cancel();
                true
            }
            _ => false,
        }
    }

    /// Empty the conversation log. A streaming turn is detached and its
    /// connection closed.
    pub async fn clear(&self) -> Result<(), ChatError> {
        self.store.clear().await?;
        if let Some(turn) = self.active.lock().await.as_ref() {
            turn.cancel.cancel();
        }
        info!("conversation cleared");
        Ok(())
    }

    pub fn messages(&self) -> ConversationSnapshot {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConversationSnapshot> {
        self.store.subscribe()
    }
}

#[allow(clippy::too_many_arguments)]
async fn drive(
    transport: Arc<dyn CompletionTransport>,
    store: StoreHandle,
    request: CompletionRequest,
    session: SessionId,
    cancel: CancelHandle,
    finished: CancelHandle,
    idle_timeout: Option<Duration>,
    events: Option<mpsc::Sender<StreamEvent>>,
) -> TurnOutcome {
    let _finished = finished.drop_guard();

    // The idle limit also bounds the wait for response headers.
    let handshake = async {
        match idle_timeout {
            Some(limit) => tokio::time::timeout(limit, transport.open_stream(&request))
                .await
                .unwrap_or_else(|_| {
                    Err(ChatError::TimeoutError(format!(
                        "no response within {}s",
                        limit.as_secs_f32()
                    )))
                }),
            None => transport.open_stream(&request).await,
        }
    };
    let opened = tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        result = handshake => Some(result),
    };

    let body = match opened {
        Some(Ok(body)) => body,
        Some(Err(e)) => {
            warn!(%session, error = %e, "failed to open completion stream");
            let outcome = match store.fail_last(session).await {
                Ok(()) => SessionOutcome::Failed(e),
                Err(ChatError::StorageError(_)) => SessionOutcome::Failed(e),
                Err(_) => SessionOutcome::Detached,
            };
            return empty_report(session, outcome);
        }
        None => {
            let outcome = match store.finish(session).await {
                Err(ChatError::StaleSession(_)) | Err(ChatError::InternalError(_)) => {
                    SessionOutcome::Detached
                }
                _ => SessionOutcome::Cancelled,
            };
            return empty_report(session, outcome);
        }
    };

    let mut stream_session =
        StreamSession::new(session, store, cancel).with_idle_timeout(idle_timeout);
    if let Some(events) = events {
        stream_session = stream_session.with_events(events);
    }
    stream_session.run(body).await
}

fn empty_report(session: SessionId, outcome: SessionOutcome) -> TurnOutcome {
    SessionReport {
        session,
        outcome,
        content: String::new(),
        kind: MessageKind::Plain,
    }
}
