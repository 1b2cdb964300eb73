//! Rendering view of the conversation log.
//!
//! The crate does not draw anything itself. [`MessageView`] tells a renderer
//! how to display one message, and [`render_loop`] repaints a
//! [`MessageRenderer`] whenever the log changes.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::defaults::content::DEFAULT_CODE_LANGUAGE;
use tokio::sync::watch;

use crate::types::{ConversationSnapshot, Message};

/// First fenced block: opening fence, optional language tag, newline, body
/// (shortest match), closing fence.
static CODE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```([A-Za-z0-9_]+)?\n(.*?)```").expect("valid code block regex"));

/// How a single message should be displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageView<'a> {
    Text(&'a str),
    Code { language: &'a str, code: &'a str },
}

impl<'a> MessageView<'a> {
    /// Only `Code` messages with a complete fenced block render as code;
    /// everything after the first block is not shown in that case.
    pub fn of(message: &'a Message) -> Self {
        if !message.kind().is_code() {
            return Self::Text(message.content());
        }
        match CODE_BLOCK.captures(message.content()) {
            Some(caps) => {
                let language = caps
                    .get(1)
                    .map_or(DEFAULT_CODE_LANGUAGE, |m| m.as_str());
                let code = caps.get(2).map_or("", |m| m.as_str().trim());
                Self::Code { language, code }
            }
            None => Self::Text(message.content()),
        }
    }

    pub fn is_code(&self) -> bool {
        matches!(self, Self::Code { .. })
    }
}

/// Receives every published state of the log.
pub trait MessageRenderer {
    fn render(&mut self, snapshot: &ConversationSnapshot);
}

/// Render the current log, then again after every change, until the store
/// task has shut down. Intermediate states may be coalesced.
pub async fn render_loop<R: MessageRenderer + ?Sized>(
    mut updates: watch::Receiver<ConversationSnapshot>,
    renderer: &mut R,
) {
    let initial = updates.borrow_and_update().clone();
    renderer.render(&initial);

    while updates.changed().await.is_ok() {
        let snapshot = updates.borrow_and_update().clone();
        renderer.render(&snapshot);
    }
    debug!("store closed, render loop finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{ConversationRepository, KeyValueStore, MemoryKeyValueStore};
    use crate::store::{MessageStore, StoreHandle};
    use crate::types::{MessageKind, Role};
    use std::sync::Arc;

    fn code_message(content: &str) -> Message {
        let mut message = Message::with_timestamp(Role::Assistant, "", "10:00");
        message.replace_content(content.to_string(), MessageKind::Code);
        message
    }

    #[test]
    fn plain_message_is_text() {
        let message = Message::user("Hello");
        assert_eq!(MessageView::of(&message), MessageView::Text("Hello"));
    }

    #[test]
    fn code_block_with_language() {
        let message = code_message("Here:\n```py\nprint(1)\n```\nDone");
        assert_eq!(
            MessageView::of(&message),
            MessageView::Code {
                language: "py",
                code: "print(1)"
            }
        );
    }

    #[test]
    fn missing_language_defaults() {
        let message = code_message("```\n  let x = 1;\n```");
        assert_eq!(
            MessageView::of(&message),
            MessageView::Code {
                language: "javascript",
                code: "let x = 1;"
            }
        );
    }

    #[test]
    fn only_first_block_is_used() {
        let message = code_message("```rs\na\n```\n```go\nb\n```");
        assert_eq!(
            MessageView::of(&message),
            MessageView::Code {
                language: "rs",
                code: "a"
            }
        );
    }

    #[test]
    fn unterminated_block_falls_back_to_text() {
        let message = code_message("```py\nprint(1)");
        assert_eq!(MessageView::of(&message), MessageView::Text("```py\nprint(1)"));
    }

    struct Recorder(Vec<usize>);

    impl MessageRenderer for Recorder {
        fn render(&mut self, snapshot: &ConversationSnapshot) {
            self.0.push(snapshot.len());
        }
    }

    #[tokio::test]
    async fn render_loop_ends_with_the_store() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryKeyValueStore::new());
        let store = StoreHandle::spawn(MessageStore::new(
            Vec::new(),
            ConversationRepository::new(kv),
        ));
        let updates = store.subscribe();
        store.append(Message::user("a")).await.unwrap();
        store.append(Message::user("b")).await.unwrap();
        drop(store);

        let mut recorder = Recorder(Vec::new());
        render_loop(updates, &mut recorder).await;
        assert_eq!(recorder.0.last(), Some(&2));
    }
}
