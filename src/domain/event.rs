//! Market events and their mutually exclusive outcomes.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::MarketError;
use super::id::{EventId, OutcomeId};

/// Lifecycle of a market event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    /// Accepting buys and sells.
    Open,
    /// Settled; positions have been paid out and removed.
    Resolved,
}

impl EventStatus {
    /// Stable name used in storage and output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Resolved => "resolved",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "resolved" => Ok(Self::Resolved),
            other => Err(format!("unknown event status '{other}'")),
        }
    }
}

/// Shape of an event's outcome set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Exactly two outcomes, "Yes" and "No".
    Binary,
    /// Two or more admin-labelled outcomes.
    Multi,
}

impl EventKind {
    /// Stable name used in storage and output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::Multi => "multi",
        }
    }

    /// Outcome labels to create for this kind of event.
    ///
    /// Binary events ignore `labels` and always get "Yes"/"No".
    ///
    /// # Errors
    /// Returns [`MarketError::InvalidRequest`] if a multi event has fewer than
    /// two labels or any blank label.
    pub fn outcome_labels(self, labels: &[String]) -> Result<Vec<String>, MarketError> {
        match self {
            Self::Binary => Ok(vec!["Yes".to_string(), "No".to_string()]),
            Self::Multi => {
                if labels.len() < 2 {
                    return Err(MarketError::InvalidRequest(
                        "multi events need at least 2 outcomes".into(),
                    ));
                }
                if labels.iter().any(|l| l.trim().is_empty()) {
                    return Err(MarketError::InvalidRequest(
                        "outcome labels cannot be blank".into(),
                    ));
                }
                Ok(labels.to_vec())
            }
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "binary" => Ok(Self::Binary),
            "multi" => Ok(Self::Multi),
            other => Err(format!("event kind must be 'binary' or 'multi', got '{other}'")),
        }
    }
}

/// A market question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub description: String,
    pub kind: EventKind,
    pub status: EventStatus,
    pub winning_outcome_id: Option<OutcomeId>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Event {
    /// Return true if the event accepts trades.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == EventStatus::Open
    }

    /// Return true if the event has been settled.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.status == EventStatus::Resolved
    }

    /// Settle the event on `winner` at `at`.
    pub fn mark_resolved(&mut self, winner: OutcomeId, at: DateTime<Utc>) {
        self.status = EventStatus::Resolved;
        self.winning_outcome_id = Some(winner);
        self.resolved_at = Some(at);
    }

    /// Reopen a resolved event, clearing its settlement.
    pub fn reopen(&mut self) {
        self.status = EventStatus::Open;
        self.winning_outcome_id = None;
        self.resolved_at = None;
    }
}

/// Fields required to create an event. New events are always open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub kind: EventKind,
    pub created_at: DateTime<Utc>,
}

impl NewEvent {
    pub fn new(title: impl Into<String>, description: impl Into<String>, kind: EventKind) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            kind,
            created_at: Utc::now(),
        }
    }

    /// Attach the id assigned by the store.
    #[must_use]
    pub fn with_id(self, id: EventId) -> Event {
        Event {
            id,
            title: self.title,
            description: self.description,
            kind: self.kind,
            status: EventStatus::Open,
            winning_outcome_id: None,
            created_at: self.created_at,
            resolved_at: None,
        }
    }
}

/// One mutually exclusive answer to an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub id: OutcomeId,
    pub event_id: EventId,
    pub label: String,
}

/// Fields required to create an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOutcome {
    pub event_id: EventId,
    pub label: String,
}

impl NewOutcome {
    pub fn new(event_id: EventId, label: impl Into<String>) -> Self {
        Self {
            event_id,
            label: label.into(),
        }
    }

    /// Attach the id assigned by the store.
    #[must_use]
    pub fn with_id(self, id: OutcomeId) -> Outcome {
        Outcome {
            id,
            event_id: self.event_id,
            label: self.label,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_events_always_get_yes_no() {
        let labels = EventKind::Binary
            .outcome_labels(&["ignored".to_string()])
            .unwrap();
        assert_eq!(labels, vec!["Yes", "No"]);
    }

    #[test]
    fn multi_events_need_two_labels() {
        let err = EventKind::Multi
            .outcome_labels(&["Only".to_string()])
            .unwrap_err();
        assert!(matches!(err, MarketError::InvalidRequest(_)));
    }

    #[test]
    fn resolve_then_reopen_clears_settlement() {
        let mut event = NewEvent::new("Q?", "", EventKind::Binary).with_id(EventId::new(1));
        event.mark_resolved(OutcomeId::new(2), Utc::now());
        assert!(event.is_resolved());
        assert_eq!(event.winning_outcome_id, Some(OutcomeId::new(2)));

        event.reopen();
        assert!(event.is_open());
        assert!(event.winning_outcome_id.is_none());
        assert!(event.resolved_at.is_none());
    }

    #[test]
    fn status_round_trips_through_str() {
        assert_eq!("resolved".parse::<EventStatus>().unwrap(), EventStatus::Resolved);
        assert!("closed".parse::<EventStatus>().is_err());
    }
}
