//! Outbound side of the chat platform.

use crate::error::ChatError;

/// A resolved channel that notifications can be posted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputChannel {
    pub id: u64,
    pub name: Option<String>,
}

impl OutputChannel {
    pub fn new(id: u64, name: Option<String>) -> Self {
        Self { id, name }
    }
}

/// Posting target for notifications and command replies.
#[allow(async_fn_in_trait)]
pub trait ChatSink {
    /// Resolve `channel_id`, failing with [`ChatError::ChannelUnavailable`]
    /// when the bot cannot see or write to it.
    async fn open_channel(&self, channel_id: u64) -> Result<OutputChannel, ChatError>;

    async fn post(&self, channel: &OutputChannel, content: &str) -> Result<(), ChatError>;
}
