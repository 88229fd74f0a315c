//! src/eventbus/mod.rs
//!
//! Provides an in-process event bus that fans console events out to
//! subscribers (the terminal renderer, tests) via bounded MPSC queues.

use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};

use painel_common::models::{ActiveSession, ChatMessage, ConnectionStatus, MediaKind, Operator, QueueEntry};

use crate::console::notices::NoticeKind;

/// Everything a front end needs to redraw the console.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleEvent {
    StatusChanged(ConnectionStatus),
    LoggedIn(Operator),
    LoggedOut,
    QueueUpdated(Vec<QueueEntry>),
    SessionEntered(ActiveSession),
    SessionClosed { session_id: String },
    MessageAppended(ChatMessage),
    /// `text: None` means the banner of that kind was cleared.
    Notice { kind: NoticeKind, text: Option<String> },
    AttachmentStaged { file_name: String, kind: MediaKind, size: usize },
    AttachmentCleared,
    UploadBusy(bool),
    /// The operator asked to end the session; waiting for yes/no.
    ConfirmEndRequested { session_id: String },
}

impl ConsoleEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            ConsoleEvent::StatusChanged(_) => "status_changed",
            ConsoleEvent::LoggedIn(_) => "logged_in",
            ConsoleEvent::LoggedOut => "logged_out",
            ConsoleEvent::QueueUpdated(_) => "queue_updated",
            ConsoleEvent::SessionEntered(_) => "session_entered",
            ConsoleEvent::SessionClosed { .. } => "session_closed",
            ConsoleEvent::MessageAppended(_) => "message_appended",
            ConsoleEvent::Notice { .. } => "notice",
            ConsoleEvent::AttachmentStaged { .. } => "attachment_staged",
            ConsoleEvent::AttachmentCleared => "attachment_cleared",
            ConsoleEvent::UploadBusy(_) => "upload_busy",
            ConsoleEvent::ConfirmEndRequested { .. } => "confirm_end_requested",
        }
    }
}

/// Each subscriber gets its own `mpsc::Sender<ConsoleEvent>` for guaranteed delivery.
///
/// - If the subscriber’s channel buffer fills, `publish` will await
///   until there's space (backpressure).
/// - If the subscriber has dropped the `Receiver`, it is removed on the next publish.
#[derive(Clone)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<mpsc::Sender<ConsoleEvent>>>>,
    shutdown_tx: watch::Sender<bool>,
    pub shutdown_rx: watch::Receiver<bool>,
}

/// Default size for each subscriber’s buffer.
const DEFAULT_BUFFER_SIZE: usize = 10000;

impl EventBus {
    /// Create a new, empty event bus.
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            subscribers: Arc::new(Mutex::new(vec![])),
            shutdown_tx: tx,
            shutdown_rx: rx,
        }
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    /// Returns a receiver on which events will be delivered.
    pub async fn subscribe(&self, buffer_size: Option<usize>) -> mpsc::Receiver<ConsoleEvent> {
        let size = buffer_size.unwrap_or(DEFAULT_BUFFER_SIZE);
        let (tx, rx) = mpsc::channel(size);
        let mut subs = self.subscribers.lock().await;
        subs.push(tx);
        rx
    }

    /// Publish an event to all subscribers.
    pub async fn publish(&self, event: ConsoleEvent) {
        let senders = {
            let subs = self.subscribers.lock().await;
            subs.clone()
        };
        let mut saw_closed = false;
        for s in senders {
            if s.send(event.clone()).await.is_err() {
                saw_closed = true;
            }
        }
        if saw_closed {
            let mut subs = self.subscribers.lock().await;
            subs.retain(|s| !s.is_closed());
        }
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.lock().await.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{sleep, timeout, Duration};

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let bus = EventBus::new();

        let mut rx1 = bus.subscribe(Some(5)).await;
        let mut rx2 = bus.subscribe(Some(5)).await;

        bus.publish(ConsoleEvent::LoggedOut).await;

        let evt1 = rx1.recv().await.expect("rx1 should get event");
        let evt2 = rx2.recv().await.expect("rx2 should get event");
        assert_eq!(evt1, ConsoleEvent::LoggedOut);
        assert_eq!(evt2, ConsoleEvent::LoggedOut);
    }

    #[tokio::test]
    async fn test_backpressure_blocking() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe(Some(1)).await;

        bus.publish(ConsoleEvent::UploadBusy(true)).await;

        let handle = tokio::spawn(async move {
            sleep(Duration::from_millis(50)).await;
            let first = rx.recv().await.expect("expected first message");
            let second = rx.recv().await.expect("expected second message");
            (first, second)
        });

        // Blocks until the reader drains the first event.
        let published = timeout(Duration::from_secs(1), bus.publish(ConsoleEvent::UploadBusy(false))).await;
        assert!(published.is_ok(), "publish should complete once space frees up");

        let (first, second) = handle.await.unwrap();
        assert_eq!(first, ConsoleEvent::UploadBusy(true));
        assert_eq!(second, ConsoleEvent::UploadBusy(false));
    }

    #[tokio::test]
    async fn dropped_subscribers_are_pruned() {
        let bus = EventBus::new();
        let rx = bus.subscribe(Some(1)).await;
        drop(rx);
        bus.publish(ConsoleEvent::LoggedOut).await;
        assert_eq!(bus.subscriber_count().await, 0);
    }

    #[test]
    fn shutdown_flag() {
        let bus = EventBus::new();
        assert!(!bus.is_shutdown());
        bus.shutdown();
        assert!(bus.is_shutdown());
    }
}
