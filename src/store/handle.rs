use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, trace};

use super::{MessageStore, SessionId, TurnStart};
use crate::defaults::storage::COMMAND_QUEUE_CAPACITY;
use crate::error::ChatError;
use crate::storage::ConversationRepository;
use crate::types::{ConversationSnapshot, Message, MessageKind};

type Reply<T> = oneshot::Sender<Result<T, ChatError>>;

enum Command {
    Append {
        message: Message,
        reply: Reply<()>,
    },
    BeginTurn {
        user_message: Message,
        reply: Reply<TurnStart>,
    },
    UpdateLast {
        session: SessionId,
        content: String,
        kind: MessageKind,
        reply: Reply<()>,
    },
    FailLast {
        session: SessionId,
        reply: Reply<()>,
    },
    Finish {
        session: SessionId,
        reply: Reply<()>,
    },
    Clear {
        reply: Reply<()>,
    },
}

/// Cloneable handle to the task that owns the [`MessageStore`].
///
/// The task exits once every handle has been dropped.
#[derive(Clone, Debug)]
pub struct StoreHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<ConversationSnapshot>,
}

static_assertions::assert_impl_all!(StoreHandle: Send, Sync, Clone);

impl StoreHandle {
    /// Move `store` into a new task and return a handle to it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(store: MessageStore) -> Self {
        let (commands, receiver) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let (publisher, snapshots) = watch::channel(store.snapshot());
        tokio::spawn(run(store, receiver, publisher));
        Self {
            commands,
            snapshots,
        }
    }

    /// Load the stored log and spawn its owner.
    pub async fn open(repository: ConversationRepository) -> Result<Self, ChatError> {
        Ok(Self::spawn(MessageStore::load(repository).await?))
    }

    /// Current state of the log.
    pub fn snapshot(&self) -> ConversationSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified after every applied mutation.
    pub fn subscribe(&self) -> watch::Receiver<ConversationSnapshot> {
        self.snapshots.clone()
    }

    pub async fn append(&self, message: Message) -> Result<(), ChatError> {
        self.request(|reply| Command::Append { message, reply })
            .await
    }

    pub async fn begin_turn(&self, user_message: Message) -> Result<TurnStart, ChatError> {
        self.request(|reply| Command::BeginTurn {
            user_message,
            reply,
        })
        .await
    }

    pub async fn update_last(
        &self,
        session: SessionId,
        content: String,
        kind: MessageKind,
    ) -> Result<(), ChatError> {
        self.request(|reply| Command::UpdateLast {
            session,
            content,
            kind,
            reply,
        })
        .await
    }

    pub async fn fail_last(&self, session: SessionId) -> Result<(), ChatError> {
        self.request(|reply| Command::FailLast { session, reply })
            .await
    }

    pub async fn finish(&self, session: SessionId) -> Result<(), ChatError> {
        self.request(|reply| Command::Finish { session, reply })
            .await
    }

    pub async fn clear(&self) -> Result<(), ChatError> {
        self.request(|reply| Command::Clear { reply }).await
    }

    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> Command) -> Result<T, ChatError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| store_gone())?;
        response.await.map_err(|_| store_gone())?
    }
}

fn store_gone() -> ChatError {
    ChatError::InternalError("message store has shut down".to_string())
}

/// Reply held back until the resulting snapshot has been published, so a
/// caller that awaited a mutation always observes it in `snapshot()`.
type PendingReply = Box<dyn FnOnce() + Send>;

fn pending<T: Send + 'static>(reply: Reply<T>, result: Result<T, ChatError>) -> PendingReply {
    Box::new(move || {
        let _ = reply.send(result);
    })
}

async fn run(
    mut store: MessageStore,
    mut commands: mpsc::Receiver<Command>,
    publisher: watch::Sender<ConversationSnapshot>,
) {
    while let Some(command) = commands.recv().await {
        let before = store.revision();
        let respond = match command {
            Command::Append { message, reply } => pending(reply, store.append(message).await),
            Command::BeginTurn {
                user_message,
                reply,
            } => pending(reply, store.begin_turn(user_message).await),
            Command::UpdateLast {
                session,
                content,
                kind,
                reply,
            } => pending(reply, store.update_last(session, content, kind).await),
            Command::FailLast { session, reply } => pending(reply, store.fail_last(session).await),
            Command::Finish { session, reply } => pending(reply, store.finish(session).await),
            Command::Clear { reply } => pending(reply, store.clear().await),
        };
        if store.revision() != before {
            trace!(revision = store.revision(), "publishing snapshot");
            publisher.send_replace(store.snapshot());
        }
        respond();
    }
    debug!("message store stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryKeyValueStore;
    use std::sync::Arc;

    fn handle() -> StoreHandle {
        let repo = ConversationRepository::new(Arc::new(MemoryKeyValueStore::new()));
        StoreHandle::spawn(MessageStore::new(Vec::new(), repo))
    }

    #[tokio::test]
    async fn mutations_are_published_in_order() {
        let store = handle();
        let mut rx = store.subscribe();

        let start = store.begin_turn(Message::user("hi")).await.unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().in_flight());

        for content in ["a", "ab", "abc"] {
            store
                .update_last(start.session, content.to_string(), MessageKind::Plain)
                .await
                .unwrap();
        }
        store.finish(start.session).await.unwrap();

        let snapshot = store.snapshot();
        assert!(!snapshot.in_flight());
        assert_eq!(snapshot.last().unwrap().content(), "abc");
    }

    #[tokio::test]
    async fn rejected_write_publishes_nothing() {
        let store = handle();
        let mut rx = store.subscribe();
        rx.borrow_and_update();

        let err = store
            .update_last(SessionId::new(), "x".into(), MessageKind::Plain)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::StaleSession(_)));
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn concurrent_appends_are_serialized() {
        let store = handle();
        let mut tasks = Vec::new();
        for i in 0..20 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store.append(Message::user(format!("m{i}"))).await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }
        assert_eq!(store.snapshot().len(), 20);
    }
}
