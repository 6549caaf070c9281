//! Port definitions: the boundaries between the market and its collaborators.

pub mod outbound;

pub use outbound::notifier::{
    LogNotifier, Message, NotificationKind, Notifier, NotifierRegistry, NullNotifier,
};
pub use outbound::store::{
    ActivityStore, Changeset, EventStore, OutcomeStore, PositionChange, PositionStore,
    RecordStore, SnapshotStore, TransactionStore, UserStore,
};
