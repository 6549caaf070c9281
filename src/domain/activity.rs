//! Public activity feed entries.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{ActivityId, EventId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Trade,
    EventCreated,
    EventResolved,
    Payout,
}

impl ActivityKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trade => "trade",
            Self::EventCreated => "event_created",
            Self::EventResolved => "event_resolved",
            Self::Payout => "payout",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trade" => Ok(Self::Trade),
            "event_created" => Ok(Self::EventCreated),
            "event_resolved" => Ok(Self::EventResolved),
            "payout" => Ok(Self::Payout),
            other => Err(format!("unknown activity kind '{other}'")),
        }
    }
}

/// A human-readable line in the activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: ActivityId,
    pub kind: ActivityKind,
    pub message: String,
    pub user_id: Option<UserId>,
    pub event_id: Option<EventId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivity {
    pub kind: ActivityKind,
    pub message: String,
    pub user_id: Option<UserId>,
    pub event_id: Option<EventId>,
    pub created_at: DateTime<Utc>,
}

impl NewActivity {
    pub fn new(kind: ActivityKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            user_id: None,
            event_id: None,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    #[must_use]
    pub fn event(mut self, event_id: EventId) -> Self {
        self.event_id = Some(event_id);
        self
    }

    #[must_use]
    pub fn with_id(self, id: ActivityId) -> ActivityEntry {
        ActivityEntry {
            id,
            kind: self.kind,
            message: self.message,
            user_id: self.user_id,
            event_id: self.event_id,
            created_at: self.created_at,
        }
    }
}
