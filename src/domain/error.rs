//! Domain validation errors for market operations.
//!
//! Every variant is a caller mistake or a rule violation, never an
//! infrastructure failure. They are raised before any mutation happens.
//!
//! # Examples
//!
//! ```
//! use parimarket::domain::error::MarketError;
//!
//! let err = MarketError::InsufficientBalance { balance: 10, requested: 25 };
//! assert_eq!(err.to_string(), "insufficient balance: have 10, need 25");
//! ```

use rust_decimal::Decimal;
use thiserror::Error;

use super::id::{EventId, OutcomeId, UserId};

/// Rule violations raised by the market engine and admin operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketError {
    /// Trade amount was zero or negative.
    #[error("amount must be a positive whole number")]
    InvalidAmount,

    #[error("user {0} not found")]
    UserNotFound(UserId),

    #[error("insufficient balance: have {balance}, need {requested}")]
    InsufficientBalance {
        /// Current balance.
        balance: i64,
        /// Points the trade would spend.
        requested: i64,
    },

    #[error("event {0} not found")]
    EventNotFound(EventId),

    /// The event is no longer open for trading.
    #[error("event {0} is not open for trading")]
    MarketClosed(EventId),

    #[error("outcome {outcome_id} does not belong to event {event_id}")]
    InvalidOutcome {
        /// Event the trade targeted.
        event_id: EventId,
        /// Outcome that is not part of it.
        outcome_id: OutcomeId,
    },

    /// The user already holds a different outcome of the same event.
    #[error("already holding outcome {held} on event {event_id}")]
    ConflictingPosition {
        /// Event the trade targeted.
        event_id: EventId,
        /// Outcome the user already holds.
        held: OutcomeId,
    },

    #[error("shares must be a whole number, got {0}")]
    FractionalShares(Decimal),

    #[error("insufficient shares: have {held}, requested {requested}")]
    InsufficientShares {
        /// Shares currently held (zero when no position exists).
        held: Decimal,
        /// Shares the sale asked for.
        requested: Decimal,
    },

    /// A credit would push a balance past what the store can hold.
    #[error("balance of {0} would overflow")]
    BalanceOverflow(UserId),

    #[error("event {0} is already resolved")]
    AlreadyResolved(EventId),

    #[error("event {0} is not resolved")]
    NotResolved(EventId),

    /// Admin input rejected (empty title, too few outcomes, ...).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}
