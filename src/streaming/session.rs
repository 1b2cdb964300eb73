//! Stream session: applies a decoded response body to the in-flight
//! assistant message.

use futures::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{ByteStream, DecodeEvent, StreamAssembler, StreamEvent, SessionOutcome, decode_stream, with_idle_timeout};
use crate::error::ChatError;
use crate::store::{SessionId, StoreHandle};
use crate::types::MessageKind;
use crate::utils::CancelHandle;

/// Final state of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub session: SessionId,
    pub outcome: SessionOutcome,
    /// Text accumulated from the stream. For a failed session this is what
    /// arrived before the failure, not the apology stored in the log.
    pub content: String,
    pub kind: MessageKind,
}

/// One stream session bound to the in-flight message of `id`.
#[derive(Debug)]
pub struct StreamSession {
    id: SessionId,
    store: StoreHandle,
    cancel: CancelHandle,
    idle_timeout: Option<Duration>,
    events: Option<mpsc::Sender<StreamEvent>>,
}

enum Step {
    Continue,
    Stop(SessionOutcome),
}

impl StreamSession {
    pub fn new(id: SessionId, store: StoreHandle, cancel: CancelHandle) -> Self {
        Self {
            id,
            store,
            cancel,
            idle_timeout: None,
            events: None,
        }
    }

    /// Fail the session if no bytes arrive for `timeout`.
    pub fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Forward per-delta [`StreamEvent`]s to `events`.
    pub fn with_events(mut self, events: mpsc::Sender<StreamEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Read `body` to the end, cancellation, or failure, then settle the
    /// in-flight message.
    pub async fn run(self, body: ByteStream) -> SessionReport {
        let mut decoded = decode_stream(with_idle_timeout(body, self.idle_timeout));
        let mut assembler = StreamAssembler::new();

        let outcome = loop {
            let event = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break SessionOutcome::Cancelled,
                event = decoded.next() => event,
            };
            let Some(event) = event else {
                break SessionOutcome::Completed;
            };
            if let Step::Stop(outcome) = self.apply(event, &mut assembler).await {
                break outcome;
            }
        };
        // Release the connection before settling.
        drop(decoded);

        let outcome = self.settle(outcome).await;
        self.emit(StreamEvent::Ended(outcome.clone())).await;

        let (content, kind) = assembler.into_parts();
        info!(
            session = %self.id,
            outcome = ?outcome,
            chars = content.chars().count(),
            "stream session ended"
        );
        SessionReport {
            session: self.id,
            outcome,
            content,
            kind,
        }
    }

    async fn apply(&self, event: DecodeEvent, assembler: &mut StreamAssembler) -> Step {
        match event {
            DecodeEvent::Delta(delta) => {
                let Some(update) = assembler.push_delta(&delta) else {
                    return Step::Continue;
                };
                match self
                    .store
                    .update_last(self.id, update.content.clone(), update.kind)
                    .await
                {
                    Ok(()) => {}
                    Err(ChatError::StorageError(e)) => {
                        warn!(session = %self.id, error = %e, "delta applied but not persisted");
                    }
                    Err(e) => {
                        debug!(session = %self.id, error = %e, "session detached from the log");
                        return Step::Stop(SessionOutcome::Detached);
                    }
                }
                self.emit(StreamEvent::Delta {
                    delta,
                    content: update.content,
                    kind: update.kind,
                })
                .await;
                Step::Continue
            }
            DecodeEvent::Done => {
                self.emit(StreamEvent::DoneMarker).await;
                Step::Continue
            }
            DecodeEvent::Malformed(e) => {
                self.emit(StreamEvent::FrameDiscarded(e)).await;
                Step::Continue
            }
            DecodeEvent::Failed(e) => Step::Stop(SessionOutcome::Failed(e)),
        }
    }

    /// Finalize the in-flight message for `outcome`.
    async fn settle(&self, outcome: SessionOutcome) -> SessionOutcome {
        let result = match &outcome {
            SessionOutcome::Detached => return outcome,
            SessionOutcome::Failed(e) => {
                warn!(session = %self.id, error = %e, "stream failed");
                self.store.fail_last(self.id).await
            }
            SessionOutcome::Completed | SessionOutcome::Cancelled => {
                self.store.finish(self.id).await
            }
        };
        match result {
            Ok(()) => outcome,
            Err(ChatError::StorageError(e)) => {
                warn!(session = %self.id, error = %e, "final state not persisted");
                outcome
            }
            Err(e) => {
                debug!(session = %self.id, error = %e, "session already settled");
                SessionOutcome::Detached
            }
        }
    }

    async fn emit(&self, event: StreamEvent) {
        if let Some(events) = &self.events {
            // A dropped observer does not affect the session.
            let _ = events.send(event).await;
        }
    }
}
