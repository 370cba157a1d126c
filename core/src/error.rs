//! Error types for every failure the tracker distinguishes.
//!
//! User mistakes ([`RosterError::AlreadyMonitored`], [`RosterError::NotMonitored`])
//! are ordinary values reported back to the caller. Everything else is a
//! system fault and gets logged where it is handled.

use std::path::PathBuf;

/// Failure to obtain a stats snapshot for one player.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("stats request failed with HTTP status {status}")]
    Http { status: u16 },

    #[error("malformed stats payload for {username}: {detail}")]
    MalformedData { username: String, detail: String },

    #[error("stats request timed out")]
    Timeout,

    /// Connection, DNS or TLS failure before a response arrived.
    #[error("stats request failed: {0}")]
    Transport(String),
}

/// Failure while reading or writing durable config/state.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error in {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("config error in {path:?}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: confy::ConfyError,
    },

    #[error("invalid config in {path:?}: {reason}")]
    InvalidConfig { path: PathBuf, reason: String },
}

/// Roster mutation failures.
#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("{0} is already monitored")]
    AlreadyMonitored(String),

    #[error("{0} is not monitored")]
    NotMonitored(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Chat platform failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("channel {channel_id} is unavailable: {reason}")]
    ChannelUnavailable { channel_id: u64, reason: String },

    #[error("failed to send message: {0}")]
    Send(String),
}

/// Reasons a poll pass stops early or ends without persisting.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Unexpected failure inside a command handler.
///
/// Only ever logged; the caller sees a generic notice.
#[derive(Debug, thiserror::Error)]
#[error("command `{command}` failed: {source}")]
pub struct CommandError {
    pub command: &'static str,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}
