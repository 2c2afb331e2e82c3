//! User-facing notification seam.
//!
//! Mutations report their outcome through a [`Notifier`] so the presentation
//! layer can surface toasts however it likes; the default implementation
//! emits tracing events.

use std::sync::Mutex;

use tracing::{error, info};

pub trait Notifier: Send + Sync {
    fn notify_success(&self, message: &str);
    fn notify_error(&self, message: &str);
}

/// Default notifier: structured log events, one per notification.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify_success(&self, message: &str) {
        info!(target: "folio::notify", kind = "success", message, "notification");
    }

    fn notify_error(&self, message: &str) {
        error!(target: "folio::notify", kind = "error", message, "notification");
    }
}

/// In-memory notifier that records every message, for tests and headless
/// consumers that present notifications after the fact.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<Notification>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Success(String),
    Error(String),
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Notification> {
        self.events.lock().expect("notifier lock").clone()
    }

    pub fn last(&self) -> Option<Notification> {
        self.events.lock().expect("notifier lock").last().cloned()
    }
}

impl Notifier for RecordingNotifier {
    fn notify_success(&self, message: &str) {
        self.events
            .lock()
            .expect("notifier lock")
            .push(Notification::Success(message.to_string()));
    }

    fn notify_error(&self, message: &str) {
        self.events
            .lock()
            .expect("notifier lock")
            .push(Notification::Error(message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_notifier_keeps_order() {
        let notifier = RecordingNotifier::new();
        notifier.notify_success("created");
        notifier.notify_error("failed");

        assert_eq!(
            notifier.events(),
            vec![
                Notification::Success("created".to_string()),
                Notification::Error("failed".to_string()),
            ]
        );
        assert_eq!(notifier.last(), Some(Notification::Error("failed".to_string())));
    }
}
