//! Terminal chat
//!
//! Reads lines from stdin and streams answers to stdout.
//!
//! ```bash
//! export STREAMCHAT_API_KEY="your-api-key"
//! cargo run --example terminal_chat
//! ```
//!
//! Commands: `/clear` empties the log, `/theme` toggles the stored theme,
//! `/quit` exits.

use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use streamchat::defaults;
use streamchat::prelude::*;
use streamchat::render::MessageView;
use streamchat::telemetry;

/// Prints the growing tail of the in-flight answer.
#[derive(Default)]
struct TerminalRenderer {
    printed: usize,
}

impl MessageRenderer for TerminalRenderer {
    fn render(&mut self, snapshot: &ConversationSnapshot) {
        let Some(last) = snapshot.last() else {
            self.printed = 0;
            return;
        };
        if last.role() != Role::Assistant {
            self.printed = 0;
            return;
        }
        let content = last.content();
        if content.len() < self.printed || !content.is_char_boundary(self.printed) {
            // Replaced wholesale (apology); start over on a fresh line.
            println!();
            self.printed = 0;
        }
        print!("{}", &content[self.printed..]);
        self.printed = content.len();
        if !snapshot.in_flight() {
            if let MessageView::Code { language, .. } = MessageView::of(last) {
                print!("\n[{language} code]");
            }
            println!("\n");
            self.printed = 0;
        }
        let _ = std::io::stdout().flush();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _guard = telemetry::init_from_env()?;

    let config = ChatConfig::from_env()?;
    let data_dir = std::env::var(defaults::env::DATA_DIR).unwrap_or_else(|_| ".streamchat".into());
    let storage: Arc<dyn KeyValueStore> = Arc::new(FileKeyValueStore::open(data_dir).await?);
    let (events, mut event_rx) =
        tokio::sync::mpsc::channel(defaults::stream::EVENT_CHANNEL_CAPACITY);
    let client = ChatClient::open(&config, storage.clone())
        .await?
        .with_stream_events(events);
    let themes = ThemeRepository::new(storage);

    let mut renderer = TerminalRenderer::default();
    let updates = client.subscribe();
    tokio::spawn(async move { render_loop(updates, &mut renderer).await });

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if let StreamEvent::FrameDiscarded(e) = event {
                eprintln!("[skipped frame: {e}]");
            }
        }
    });

    println!("theme: {}", themes.load().await?);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "/quit" => break,
            "/clear" => client.clear().await?,
            "/theme" => println!("theme: {}", themes.toggle().await?),
            _ => {
                client.start(&line).await?;
            }
        }
    }

    client.cancel_in_flight().await;
    Ok(())
}
