//! Inbound command listener.
//!
//! Polls the configured channel for new messages and forwards those that
//! look like commands to the main loop, which parses and runs them one at a
//! time.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::discord::{DiscordClient, Message, snowflake_at};

/// A chat message addressed to the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub author_id: u64,
    pub author_name: String,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct ListenerConfig {
    pub channel_id: u64,
    pub prefix: String,
    pub poll_interval: Duration,
    /// The bot's own user id; its messages are never treated as commands.
    pub self_id: u64,
}

/// Keep messages from people that start with the command prefix.
///
/// Returns the forwarded messages and the cursor to resume from.
fn select_commands(
    messages: Vec<Message>,
    cursor: u64,
    config: &ListenerConfig,
) -> (Vec<InboundMessage>, u64) {
    let next_cursor = messages.iter().map(|m| m.id).fold(cursor, u64::max);

    let inbound = messages
        .into_iter()
        .filter(|m| !m.author.bot && m.author.id != config.self_id)
        .filter(|m| m.content.trim_start().starts_with(&config.prefix))
        .map(|m| InboundMessage {
            author_id: m.author.id,
            author_name: m.author.username,
            content: m.content,
        })
        .collect();

    (inbound, next_cursor)
}

/// Spawn the listener. It stops when the receiving side is dropped.
///
/// The cursor starts at the current time so channel history from before
/// startup is never replayed.
pub fn spawn_command_listener(
    client: DiscordClient,
    config: ListenerConfig,
    tx: mpsc::Sender<InboundMessage>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut cursor = snowflake_at(Utc::now());
        let mut ticker = time::interval(config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(channel_id = config.channel_id, prefix = %config.prefix, "Command listener started");

        loop {
            ticker.tick().await;

            let messages = match client.messages_after(config.channel_id, cursor).await {
                Ok(messages) => messages,
                Err(e) => {
                    warn!(error = %e, "Failed to read channel messages");
                    continue;
                }
            };

            let (inbound, next_cursor) = select_commands(messages, cursor, &config);
            cursor = next_cursor;

            for message in inbound {
                debug!(author = %message.author_name, content = %message.content, "Command message");
                if tx.send(message).await.is_err() {
                    debug!("Command receiver closed, stopping listener");
                    return;
                }
            }
        }
    })
}
