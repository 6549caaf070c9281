//! Notifier port for market notifications.
//!
//! This module defines the sink the market service pushes results into:
//! odds changes, new events, resolutions and personalised settlement notices.
//! Delivery is fire-and-forget; the market never waits on a subscriber.

use std::fmt;

use serde::Serialize;
use serde_json::{json, Value};

use crate::domain::{ActivityEntry, Event, EventId, OutcomeId, OutcomeOdds, UserId, UserOutcome};

/// Kinds of notification pushed to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Odds of an event changed after a trade.
    OddsUpdated,
    /// An event was created or edited.
    EventCreated,
    /// An event resolved or was deleted.
    EventResolved,
    /// Personal settlement notice for one user.
    UserResolved,
    /// New activity feed entry.
    ActivityNew,
}

impl NotificationKind {
    /// Stable wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OddsUpdated => "odds_updated",
            Self::EventCreated => "event_created",
            Self::EventResolved => "event_resolved",
            Self::UserResolved => "user_resolved",
            Self::ActivityNew => "activity_new",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A notification: its kind plus a JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub data: Value,
}

impl Message {
    #[must_use]
    pub fn new(kind: NotificationKind, data: Value) -> Self {
        Self { kind, data }
    }

    /// Odds changed for `event_id`.
    #[must_use]
    pub fn odds_updated(event_id: EventId, odds: &[OutcomeOdds]) -> Self {
        Self::new(
            NotificationKind::OddsUpdated,
            json!({ "event_id": event_id, "odds": odds }),
        )
    }

    /// A new event opened with its initial odds.
    #[must_use]
    pub fn event_created(event: &Event, odds: &[OutcomeOdds]) -> Self {
        Self::new(
            NotificationKind::EventCreated,
            json!({
                "event_id": event.id,
                "title": event.title,
                "description": event.description,
                "event_type": event.kind,
                "odds": odds,
            }),
        )
    }

    /// An existing event was edited or reopened.
    #[must_use]
    pub fn event_changed(event: &Event) -> Self {
        Self::new(
            NotificationKind::EventCreated,
            json!({ "event_id": event.id, "title": event.title }),
        )
    }

    /// Generic resolution notice for everyone.
    #[must_use]
    pub fn event_resolved(
        event_id: EventId,
        title: &str,
        winning_outcome_id: OutcomeId,
        winner_label: &str,
    ) -> Self {
        Self::new(
            NotificationKind::EventResolved,
            json!({
                "event_id": event_id,
                "title": title,
                "winning_outcome_id": winning_outcome_id,
                "winner_label": winner_label,
            }),
        )
    }

    /// The event was removed by an admin.
    #[must_use]
    pub fn event_deleted(event_id: EventId) -> Self {
        Self::new(
            NotificationKind::EventResolved,
            json!({ "event_id": event_id, "deleted": true }),
        )
    }

    /// Personal settlement notice.
    #[must_use]
    pub fn user_resolved(outcome: &UserOutcome, title: &str) -> Self {
        Self::new(
            NotificationKind::UserResolved,
            json!({
                "won": outcome.won,
                "payout": outcome.payout,
                "refund": outcome.refund,
                "title": title,
            }),
        )
    }

    #[must_use]
    pub fn activity(entry: &ActivityEntry) -> Self {
        Self::new(NotificationKind::ActivityNew, json!(entry))
    }
}

/// Trait for notification sinks.
///
/// # Implementation Notes
///
/// - Implementations must be thread-safe (`Send + Sync`)
/// - Neither method may block on a slow consumer; drop the message instead
pub trait Notifier: Send + Sync {
    /// Deliver to every current subscriber.
    fn broadcast(&self, message: Message);

    /// Deliver only to subscribers belonging to `user_id`.
    fn send_to(&self, user_id: UserId, message: Message);
}

impl<T: Notifier + ?Sized> Notifier for std::sync::Arc<T> {
    fn broadcast(&self, message: Message) {
        (**self).broadcast(message);
    }

    fn send_to(&self, user_id: UserId, message: Message) {
        (**self).send_to(user_id, message);
    }
}

/// Registry of notifiers (composite pattern).
///
/// Forwards every message to all registered notifiers.
pub struct NotifierRegistry {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotifierRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { notifiers: vec![] }
    }

    /// Register a notifier.
    pub fn register(&mut self, notifier: Box<dyn Notifier>) {
        self.notifiers.push(notifier);
    }

    /// Number of registered notifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    /// Check if registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

impl Default for NotifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for NotifierRegistry {
    fn broadcast(&self, message: Message) {
        for notifier in &self.notifiers {
            notifier.broadcast(message.clone());
        }
    }

    fn send_to(&self, user_id: UserId, message: Message) {
        for notifier in &self.notifiers {
            notifier.send_to(user_id, message.clone());
        }
    }
}

/// A no-op notifier for testing or when notifications are disabled.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn broadcast(&self, _message: Message) {}

    fn send_to(&self, _user_id: UserId, _message: Message) {}
}

/// A notifier that logs every message via tracing.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn broadcast(&self, message: Message) {
        tracing::info!(kind = %message.kind, data = %message.data, "Broadcast");
    }

    fn send_to(&self, user_id: UserId, message: Message) {
        tracing::info!(user_id = %user_id, kind = %message.kind, data = %message.data, "Direct message");
    }
}
