pub mod activity;
pub mod chat;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod messages;
pub mod roster;
pub mod scheduler;
pub mod stats;
pub mod tracking;

#[cfg(test)]
mod testing;

// Re-exports for convenience
pub use activity::{EventKind, NotificationEvent, Step, Transition, advance};
pub use chat::{ChatSink, OutputChannel};
pub use commands::{Caller, Command, dispatch, parse_command};
pub use context::AppContext;
pub use error::{ChatError, CommandError, FetchError, PollError, RosterError, StorageError};
pub use scheduler::{PassReport, run_poll_pass};
pub use stats::{Snapshot, StatsClient, StatsSource};
pub use tracking::{Checkpoint, TrackingRecord, TrackingStore};
