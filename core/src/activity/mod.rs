//! Player activity inference from cumulative play-time and kill counters.

mod event;
mod machine;


pub use event::{EventKind, NotificationEvent};
pub use machine::{Step, Transition, advance, session_minutes};
