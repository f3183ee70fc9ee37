use crate::domain::notification::Notification;
use crate::domain::ports::{NotificationSink, TokenSource};
use parking_lot::Mutex;
use std::sync::Arc;

/// A token fixed at startup (command line or environment).
#[derive(Debug, Clone, Default)]
pub struct StaticToken(pub Option<String>);

impl StaticToken {
    pub fn new(token: Option<String>) -> Self {
        Self(token.filter(|t| !t.trim().is_empty()))
    }
}

impl TokenSource for StaticToken {
    fn token(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Writes notifications to stderr, one per line.
#[derive(Debug, Default)]
pub struct StderrNotifier;

impl NotificationSink for StderrNotifier {
    fn notify(&self, notification: Notification) {
        eprintln!("{notification}");
    }
}

/// Keeps every notification it receives. Clones share the list.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    received: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.received.lock().clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.received.lock().iter().map(|n| n.title.clone()).collect()
    }
}

impl NotificationSink for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.received.lock().push(notification);
    }
}
