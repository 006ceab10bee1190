//! User-facing notifications

use chrono::{DateTime, Utc};
use lookup_core::Error;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            at: Utc::now(),
        }
    }
}

/// Sending half of the notification channel
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    pub fn info(&self, message: impl Into<String>) {
        let message = message.into();
        info!(%message, "Notification");
        self.send(Notification::new(NotificationLevel::Info, message));
    }

    pub fn warning(&self, message: impl Into<String>) {
        let message = message.into();
        warn!(%message, "Notification");
        self.send(Notification::new(NotificationLevel::Warning, message));
    }

    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        error!(%message, "Notification");
        self.send(Notification::new(NotificationLevel::Error, message));
    }

    /// Cancellation is a warning, everything else an error
    pub fn report(&self, err: &Error) {
        if err.is_cancelled() {
            self.warning(err.to_string());
        } else {
            self.error(err.to_string());
        }
    }

    fn send(&self, notification: Notification) {
        // A dropped receiver only means nobody is listening
        let _ = self.sender.send(notification);
    }
}
