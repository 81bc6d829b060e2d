//! Forwards log events to an operator chat.
//!
//! WARN and ERROR go out immediately. INFO lines are batched and flushed on
//! an interval or when the batch fills up. The queue is bounded; lines that
//! do not fit are counted and reported with the next flush.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::ChatId;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

/// Telegram rejects messages above 4096 chars.
const MAX_MESSAGE_CHARS: usize = 4000;
/// Lines waiting for the forwarding task before new ones are dropped.
const QUEUE_CAPACITY: usize = 256;

/// When batched INFO lines go out.
#[derive(Debug, Clone, Copy)]
pub struct Batching {
    pub flush_every: Duration,
    pub max_lines: usize,
}

#[derive(Debug, PartialEq)]
enum LogLine {
    Urgent(String),
    Info(String),
}

impl LogLine {
    fn from_event(level: Level, target: &str, message: String) -> Option<Self> {
        // Our own sends would feed back into the layer.
        if target.starts_with("teloxide") || target.starts_with("reqwest") || target.starts_with("hyper") {
            return None;
        }
        match level {
            Level::ERROR => Some(LogLine::Urgent(format!("❌ {}", message))),
            Level::WARN => Some(LogLine::Urgent(format!("⚠️ {}", message))),
            Level::INFO => Some(LogLine::Info(message)),
            _ => None,
        }
    }
}

/// INFO lines waiting for the next flush.
struct Batch {
    lines: Vec<String>,
    max_lines: usize,
    dropped: usize,
}

impl Batch {
    fn new(max_lines: usize) -> Self {
        Self { lines: Vec::new(), max_lines, dropped: 0 }
    }

    /// Returns the combined text once the batch is full.
    fn push(&mut self, line: String) -> Option<String> {
        self.lines.push(line);
        if self.lines.len() >= self.max_lines {
            self.take()
        } else {
            None
        }
    }

    fn note_dropped(&mut self, count: usize) {
        self.dropped += count;
    }

    fn take(&mut self) -> Option<String> {
        if self.dropped > 0 {
            self.lines.push(format!("({} log lines dropped, queue full)", self.dropped));
            self.dropped = 0;
        }
        if self.lines.is_empty() {
            return None;
        }
        let combined = self.lines.join("\n");
        self.lines.clear();
        Some(combined)
    }
}

pub struct OperatorLogLayer {
    tx: mpsc::Sender<LogLine>,
    dropped: Arc<AtomicUsize>,
}

impl OperatorLogLayer {
    /// Spawns the forwarding task; must be called inside a tokio runtime.
    pub fn new(bot: Bot, chat_id: ChatId, batching: Batching) -> Self {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let dropped = Arc::new(AtomicUsize::new(0));
        tokio::spawn(forward(bot, chat_id, rx, dropped.clone(), batching));
        Self { tx, dropped }
    }

    /// Never blocks the logging thread; a full queue counts the line as dropped.
    fn enqueue(&self, line: LogLine) {
        match self.tx.try_send(line) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
            Err(TrySendError::Closed(_)) => eprintln!("Operator log channel closed, message dropped"),
        }
    }
}

async fn forward(
    bot: Bot,
    chat_id: ChatId,
    mut rx: mpsc::Receiver<LogLine>,
    dropped: Arc<AtomicUsize>,
    batching: Batching,
) {
    let mut batch = Batch::new(batching.max_lines);
    let mut interval = tokio::time::interval(batching.flush_every);

    loop {
        let ready = tokio::select! {
            line = rx.recv() => match line {
                Some(LogLine::Urgent(text)) => Some(text),
                Some(LogLine::Info(text)) => batch.push(text),
                None => break,
            },
            _ = interval.tick() => {
                batch.note_dropped(dropped.swap(0, Ordering::Relaxed));
                batch.take()
            }
        };
        if let Some(text) = ready {
            post(&bot, chat_id, &text).await;
        }
    }
    if let Some(text) = batch.take() {
        post(&bot, chat_id, &text).await;
    }
}

fn truncate(text: &str) -> String {
    if text.chars().count() > MAX_MESSAGE_CHARS {
        let truncated: String = text.chars().take(MAX_MESSAGE_CHARS).collect();
        format!("{}...", truncated)
    } else {
        text.to_string()
    }
}

async fn post(bot: &Bot, chat_id: ChatId, text: &str) {
    if let Err(e) = bot.send_message(chat_id, truncate(text)).await {
        eprintln!("Operator log to chat {} lost: {e}", chat_id);
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else if self.message.is_empty() {
            self.message = format!("{} = {:?}", field.name(), value);
        } else {
            self.message
                .push_str(&format!(", {} = {:?}", field.name(), value));
        }
    }
}

impl<S: Subscriber> Layer<S> for OperatorLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let Some(line) = LogLine::from_event(*metadata.level(), metadata.target(), visitor.message) else {
            return;
        };
        self.enqueue(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels() {
        assert_eq!(
            LogLine::from_event(Level::WARN, "foodbot::chatbot::engine", "search failed".into()),
            Some(LogLine::Urgent("⚠️ search failed".into()))
        );
        assert_eq!(
            LogLine::from_event(Level::ERROR, "foodbot", "boom".into()),
            Some(LogLine::Urgent("❌ boom".into()))
        );
        assert_eq!(
            LogLine::from_event(Level::INFO, "foodbot", "started".into()),
            Some(LogLine::Info("started".into()))
        );
        assert_eq!(LogLine::from_event(Level::DEBUG, "foodbot", "noise".into()), None);
    }

    #[test]
    fn test_transport_targets_are_skipped() {
        assert_eq!(LogLine::from_event(Level::WARN, "teloxide::dispatching", "x".into()), None);
        assert_eq!(LogLine::from_event(Level::ERROR, "reqwest::connect", "x".into()), None);
    }

    #[test]
    fn test_batch_flushes_when_full() {
        let mut batch = Batch::new(3);
        assert_eq!(batch.push("a".into()), None);
        assert_eq!(batch.push("b".into()), None);
        assert_eq!(batch.push("c".into()), Some("a\nb\nc".to_string()));
        assert_eq!(batch.take(), None);
    }

    #[test]
    fn test_batch_reports_dropped_lines() {
        let mut batch = Batch::new(50);
        batch.note_dropped(0);
        assert_eq!(batch.take(), None);

        batch.push("started".into());
        batch.note_dropped(7);
        assert_eq!(
            batch.take(),
            Some("started\n(7 log lines dropped, queue full)".to_string())
        );
        assert_eq!(batch.take(), None);
    }

    #[test]
    fn test_full_queue_counts_drops() {
        let (tx, mut rx) = mpsc::channel(1);
        let layer = OperatorLogLayer { tx, dropped: Arc::new(AtomicUsize::new(0)) };

        layer.enqueue(LogLine::Info("first".into()));
        layer.enqueue(LogLine::Info("second".into()));
        layer.enqueue(LogLine::Urgent("third".into()));

        assert_eq!(layer.dropped.load(Ordering::Relaxed), 2);
        assert_eq!(rx.try_recv().unwrap(), LogLine::Info("first".into()));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_layer_captures_events() {
        use tracing_subscriber::layer::SubscriberExt;

        let (tx, mut rx) = mpsc::channel(8);
        let layer = OperatorLogLayer { tx, dropped: Arc::new(AtomicUsize::new(0)) };
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!("search failed");
            tracing::info!(chat = 42, "suggesting");
            tracing::debug!("noise");
        });

        assert_eq!(rx.try_recv().unwrap(), LogLine::Urgent("⚠️ search failed".into()));
        assert_eq!(rx.try_recv().unwrap(), LogLine::Info("suggesting, chat = 42".into()));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short"), "short");
        let long = "é".repeat(MAX_MESSAGE_CHARS + 10);
        let truncated = truncate(&long);
        assert_eq!(truncated.chars().count(), MAX_MESSAGE_CHARS + 3);
        assert!(truncated.ends_with("..."));
    }
}
