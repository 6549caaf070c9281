//! In-process fan-out broker.
//!
//! Each subscriber owns a bounded `tokio::sync::mpsc` channel. Delivery uses
//! `try_send`, so a full channel drops the message for that subscriber only
//! and a closed channel removes the subscriber on the next delivery.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::domain::UserId;
use crate::port::outbound::notifier::{Message, Notifier};

/// Channel capacity per subscriber.
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 64;

struct Subscriber {
    id: u64,
    user_id: Option<UserId>,
    tx: mpsc::Sender<Message>,
}

/// Receiving end handed to a subscriber.
///
/// Dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    user_id: Option<UserId>,
    rx: mpsc::Receiver<Message>,
}

impl Subscription {
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The user this subscription belongs to, if any.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// Wait for the next message. Returns `None` once the broker is gone.
    pub async fn recv(&mut self) -> Option<Message> {
        self.rx.recv().await
    }

    /// Take a queued message without waiting.
    pub fn try_recv(&mut self) -> Option<Message> {
        self.rx.try_recv().ok()
    }
}

/// Fan-out notifier with per-subscriber bounded queues.
pub struct Broker {
    subscribers: Mutex<Vec<Subscriber>>,
    next_id: AtomicU64,
    buffer: usize,
    dropped: AtomicU64,
}

impl Broker {
    /// Create a broker whose subscribers buffer `buffer` messages each.
    #[must_use]
    pub fn new(buffer: usize) -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            buffer: buffer.max(1),
            dropped: AtomicU64::new(0),
        }
    }

    /// Register a subscriber. `user_id` is `None` for anonymous viewers,
    /// which only receive broadcasts.
    pub fn subscribe(&self, user_id: Option<UserId>) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.buffer);
        self.subscribers.lock().push(Subscriber { id, user_id, tx });
        debug!(subscriber = id, user_id = ?user_id, "Subscriber registered");
        Subscription { id, user_id, rx }
    }

    /// Remove a subscriber by id. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: u64) -> bool {
        let mut subscribers = self.subscribers.lock();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        before != subscribers.len()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Messages dropped because a subscriber's queue was full.
    #[must_use]
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn deliver(&self, message: &Message, target: Option<UserId>) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|s| {
            if target.is_some() && s.user_id != target {
                return true;
            }
            match s.tx.try_send(message.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                    warn!(subscriber = s.id, kind = %message.kind, "Subscriber queue full, dropping message");
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!(subscriber = s.id, "Subscriber gone, removing");
                    false
                }
            }
        });
    }
}

impl Default for Broker {
    fn default() -> Self {
        Self::new(DEFAULT_SUBSCRIBER_BUFFER)
    }
}

impl Notifier for Broker {
    fn broadcast(&self, message: Message) {
        self.deliver(&message, None);
    }

    fn send_to(&self, user_id: UserId, message: Message) {
        self.deliver(&message, Some(user_id));
    }
}
