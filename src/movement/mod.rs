pub mod events;
pub mod executor;
pub mod lifecycle;

pub use events::{ChannelSink, LogSink, NotificationSink, RecordingSink, WorldEvent};
pub use executor::{MoveOutcome, MovementExecutor, RejectReason};
pub use lifecycle::{join, leave, nearest_free_tile, JoinError};
