//! Market participants and their point balances.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::UserId;
use super::money::Points;

/// A registered participant.
///
/// Balances are never negative after a purchase, but admin overrides and
/// payouts are unbounded above.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub balance: Points,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Return true if the user can afford to spend `amount` points.
    #[must_use]
    pub fn can_afford(&self, amount: Points) -> bool {
        self.balance >= amount
    }
}

/// Fields required to register a user. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub balance: Points,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl NewUser {
    /// A regular (non-admin) user created now.
    pub fn new(username: impl Into<String>, balance: Points) -> Self {
        Self {
            username: username.into(),
            balance,
            is_admin: false,
            created_at: Utc::now(),
        }
    }

    /// Mark the user as an administrator.
    #[must_use]
    pub fn admin(mut self) -> Self {
        self.is_admin = true;
        self
    }

    /// Attach the id assigned by the store.
    #[must_use]
    pub fn with_id(self, id: UserId) -> User {
        User {
            id,
            username: self.username,
            balance: self.balance,
            is_admin: self.is_admin,
            created_at: self.created_at,
        }
    }
}
