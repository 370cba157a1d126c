pub mod config;
pub mod formatting;

pub use config::{ActivityPolicy, DEFAULT_STATS_ENDPOINT, MessageTemplates, TrackerConfig};
