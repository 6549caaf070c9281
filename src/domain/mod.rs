//! Market domain: records, pure pricing math and rule violations.

pub mod activity;
pub mod error;
pub mod event;
pub mod id;
pub mod money;
pub mod odds;
pub mod position;
pub mod resolution;
pub mod transaction;
pub mod user;

pub use activity::{ActivityEntry, ActivityKind, NewActivity};
pub use error::MarketError;
pub use event::{Event, EventKind, EventStatus, NewEvent, NewOutcome, Outcome};
pub use id::{ActivityId, EventId, OutcomeId, PositionId, SnapshotId, TransactionId, UserId};
pub use money::{Points, Shares};
pub use odds::{compute_odds, NewSnapshot, OddsSnapshot, OutcomeOdds};
pub use position::{NewPosition, Position};
pub use resolution::{Resolution, Settlement, UserOutcome, UserOutcomes};
pub use transaction::{NewTransaction, Transaction, TxKind};
pub use user::{NewUser, User};
