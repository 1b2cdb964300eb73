use tracing::{debug, warn};

use super::SessionId;
use crate::defaults::content::FAILURE_APOLOGY;
use crate::error::ChatError;
use crate::storage::ConversationRepository;
use crate::types::{ConversationSnapshot, Message, MessageKind};

/// Result of opening a turn.
#[derive(Debug, Clone)]
pub struct TurnStart {
    /// Session that owns the new assistant placeholder
    pub session: SessionId,
    /// Log up to and including the new user message (placeholder excluded)
    pub history: Vec<Message>,
}

/// Owner of the conversation log.
#[derive(Debug)]
pub struct MessageStore {
    messages: Vec<Message>,
    in_flight: Option<SessionId>,
    repository: ConversationRepository,
    revision: u64,
}

impl MessageStore {
    /// Store over an already loaded log.
    pub fn new(messages: Vec<Message>, repository: ConversationRepository) -> Self {
        Self {
            messages,
            in_flight: None,
            repository,
            revision: 0,
        }
    }

    /// Load the stored log (or start empty).
    pub async fn load(repository: ConversationRepository) -> Result<Self, ChatError> {
        let messages = repository.load().await?;
        debug!(count = messages.len(), "conversation log loaded");
        Ok(Self::new(messages, repository))
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn in_flight(&self) -> Option<SessionId> {
        self.in_flight
    }

    /// Incremented by every applied mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn snapshot(&self) -> ConversationSnapshot {
        ConversationSnapshot::new(self.messages.clone(), self.in_flight.is_some())
    }

    /// Add a message at the end of the log.
    ///
    /// Rejected while a session is in flight, since the in-flight message
    /// must stay the last entry.
    pub async fn append(&mut self, message: Message) -> Result<(), ChatError> {
        self.ensure_idle()?;
        self.messages.push(message);
        self.commit().await
    }

    /// Append the user message and an empty assistant placeholder, and mark
    /// the placeholder as in flight.
    pub async fn begin_turn(&mut self, user_message: Message) -> Result<TurnStart, ChatError> {
        self.ensure_idle()?;
        let session = SessionId::new();

        self.messages.push(user_message);
        let history = self.messages.clone();
        self.messages.push(Message::assistant_placeholder());
        self.in_flight = Some(session);
        debug!(%session, "turn started");

        // The turn is open whether or not the save succeeded; the next
        // mutation writes the full log again.
        if let Err(e) = self.commit().await {
            debug!(%session, error = %e, "turn started without persisting");
        }
        Ok(TurnStart { session, history })
    }

    /// Replace content and kind of the in-flight message.
    pub async fn update_last(
        &mut self,
        session: SessionId,
        content: String,
        kind: MessageKind,
    ) -> Result<(), ChatError> {
        let message = self.in_flight_message(session)?;
        message.replace_content(content, kind);
        self.commit().await
    }

    /// Overwrite the in-flight message with the apology and end the session.
    pub async fn fail_last(&mut self, session: SessionId) -> Result<(), ChatError> {
        let message = self.in_flight_message(session)?;
        message.overwrite_with_notice(FAILURE_APOLOGY);
        self.in_flight = None;
        debug!(%session, "turn failed");
        self.commit().await
    }

    /// End the session, keeping whatever content it produced.
    pub async fn finish(&mut self, session: SessionId) -> Result<(), ChatError> {
        self.in_flight_message(session)?;
        self.in_flight = None;
        debug!(%session, "turn finished");
        self.commit().await
    }

    /// Empty the log. Any in-flight session is ended; its late writes will
    /// be rejected as stale.
    pub async fn clear(&mut self) -> Result<(), ChatError> {
        if let Some(session) = self.in_flight.take() {
            debug!(%session, "clearing log with a turn in flight");
        }
        self.messages.clear();
        self.commit().await
    }

    fn ensure_idle(&self) -> Result<(), ChatError> {
        match self.in_flight {
            Some(session) => Err(ChatError::Busy(session.to_string())),
            None => Ok(()),
        }
    }

    fn in_flight_message(&mut self, session: SessionId) -> Result<&mut Message, ChatError> {
        if self.in_flight != Some(session) {
            return Err(ChatError::StaleSession(format!(
                "session {session} is not in flight"
            )));
        }
        match self.messages.last_mut() {
            Some(message) if message.is_assistant() => Ok(message),
            _ => Err(ChatError::StaleSession(format!(
                "last entry is not the placeholder of session {session}"
            ))),
        }
    }

    async fn commit(&mut self) -> Result<(), ChatError> {
        self.revision += 1;
        if let Err(e) = self.repository.save(&self.messages).await {
            warn!(error = %e, "failed to persist conversation log");
            return Err(e);
        }
        Ok(())
    }
}
