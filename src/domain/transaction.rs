//! Append-only ledger of balance-affecting events.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{EventId, OutcomeId, TransactionId, UserId};
use super::money::{Points, Shares};

/// Kind of ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    Buy,
    Sell,
    /// Pool share or refund paid at resolution.
    Payout,
    /// Flat winner bonus paid at resolution.
    Bonus,
}

impl TxKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
            Self::Payout => "payout",
            Self::Bonus => "bonus",
        }
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TxKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy" => Ok(Self::Buy),
            "sell" => Ok(Self::Sell),
            "payout" => Ok(Self::Payout),
            "bonus" => Ok(Self::Bonus),
            other => Err(format!("unknown transaction kind '{other}'")),
        }
    }
}

/// An immutable ledger record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub user_id: UserId,
    pub event_id: EventId,
    pub outcome_id: OutcomeId,
    pub kind: TxKind,
    pub shares: Shares,
    pub points: Points,
    pub created_at: DateTime<Utc>,
}

/// A ledger record waiting to be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub user_id: UserId,
    pub event_id: EventId,
    pub outcome_id: OutcomeId,
    pub kind: TxKind,
    pub shares: Shares,
    pub points: Points,
    pub created_at: DateTime<Utc>,
}

impl NewTransaction {
    pub fn new(
        kind: TxKind,
        user_id: UserId,
        event_id: EventId,
        outcome_id: OutcomeId,
        shares: Shares,
        points: Points,
    ) -> Self {
        Self {
            user_id,
            event_id,
            outcome_id,
            kind,
            shares,
            points,
            created_at: Utc::now(),
        }
    }

    /// Attach the id assigned by the store.
    #[must_use]
    pub fn with_id(self, id: TransactionId) -> Transaction {
        Transaction {
            id,
            user_id: self.user_id,
            event_id: self.event_id,
            outcome_id: self.outcome_id,
            kind: self.kind,
            shares: self.shares,
            points: self.points,
            created_at: self.created_at,
        }
    }
}
