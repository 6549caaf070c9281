//! Notification sink that records every message for assertions.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::domain::UserId;
use crate::port::{Message, NotificationKind, Notifier};

/// One recorded delivery. `recipient` is `None` for broadcasts.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub recipient: Option<UserId>,
    pub message: Message,
}

/// Thread-safe message collector. Clones share the same log.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    deliveries: Arc<Mutex<Vec<Delivery>>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.deliveries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deliveries.lock().is_empty()
    }

    /// Everything delivered so far, in order.
    #[must_use]
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().clone()
    }

    /// Broadcast messages, in order.
    #[must_use]
    pub fn broadcasts(&self) -> Vec<Message> {
        self.deliveries
            .lock()
            .iter()
            .filter(|d| d.recipient.is_none())
            .map(|d| d.message.clone())
            .collect()
    }

    /// Messages sent directly to `user_id`, in order.
    #[must_use]
    pub fn direct(&self, user_id: UserId) -> Vec<Message> {
        self.deliveries
            .lock()
            .iter()
            .filter(|d| d.recipient == Some(user_id))
            .map(|d| d.message.clone())
            .collect()
    }

    /// Kinds of every delivery, in order.
    #[must_use]
    pub fn kinds(&self) -> Vec<NotificationKind> {
        self.deliveries.lock().iter().map(|d| d.message.kind).collect()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.deliveries.lock().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn broadcast(&self, message: Message) {
        self.deliveries.lock().push(Delivery {
            recipient: None,
            message,
        });
    }

    fn send_to(&self, user_id: UserId, message: Message) {
        self.deliveries.lock().push(Delivery {
            recipient: Some(user_id),
            message,
        });
    }
}
