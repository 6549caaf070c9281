//! Domain identifier types with proper encapsulation.
//!
//! Every record family gets its own newtype so a user id can never be passed
//! where an event id is expected. Values are assigned by the record store.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw store-assigned value.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the underlying value.
            #[must_use]
            pub const fn value(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "-{}"), self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
    };
}

record_id!(
    /// User identifier.
    UserId,
    "user"
);
record_id!(
    /// Market event identifier.
    EventId,
    "event"
);
record_id!(
    /// Outcome identifier, unique across all events.
    OutcomeId,
    "outcome"
);
record_id!(
    /// Position identifier.
    PositionId,
    "pos"
);
record_id!(
    /// Ledger transaction identifier.
    TransactionId,
    "tx"
);
record_id!(
    /// Odds snapshot identifier.
    SnapshotId,
    "snap"
);
record_id!(
    /// Activity feed entry identifier.
    ActivityId,
    "activity"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_family_prefix() {
        assert_eq!(UserId::new(7).to_string(), "user-7");
        assert_eq!(EventId::new(3).to_string(), "event-3");
        assert_eq!(PositionId::new(12).to_string(), "pos-12");
    }

    #[test]
    fn ids_serialize_as_plain_integers() {
        let json = serde_json::to_string(&OutcomeId::new(42)).unwrap();
        assert_eq!(json, "42");

        let back: OutcomeId = serde_json::from_str("42").unwrap();
        assert_eq!(back, OutcomeId::new(42));
    }

    #[test]
    fn ids_order_by_value() {
        assert!(UserId::new(1) < UserId::new(2));
    }
}
