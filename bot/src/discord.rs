//! Minimal Discord REST client.
//!
//! Only the handful of v10 endpoints the bot needs: identify itself, resolve
//! the output channel, post messages and read recent channel messages.

use bftracker_core::{ChatError, ChatSink, OutputChannel};
use bftracker_types::formatting::truncate_with_marker;
use chrono::{DateTime, Utc};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;
use tracing::debug;

const API_BASE: &str = "https://discord.com/api/v10";
const USER_AGENT: &str = concat!("DiscordBot (bftracker, ", env!("CARGO_PKG_VERSION"), ")");
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Discord's per-message character limit.
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Milliseconds between the Unix epoch and the Discord epoch (2015-01-01).
const DISCORD_EPOCH_MS: i64 = 1_420_070_400_000;

/// Page size for message history requests.
const HISTORY_LIMIT: u8 = 50;

#[derive(Debug, thiserror::Error)]
pub enum DiscordError {
    #[error("bot token contains invalid header characters")]
    InvalidToken,

    #[error("Discord API returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Discord request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

fn snowflake<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

/// Smallest snowflake that could have been created at `at`.
pub fn snowflake_at(at: DateTime<Utc>) -> u64 {
    let ms = at.timestamp_millis().saturating_sub(DISCORD_EPOCH_MS).max(0);
    (ms as u64) << 22
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "snowflake")]
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub bot: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Channel {
    #[serde(deserialize_with = "snowflake")]
    pub id: u64,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    #[serde(deserialize_with = "snowflake")]
    pub id: u64,
    pub author: User,
    #[serde(default)]
    pub content: String,
}

#[derive(Serialize)]
struct CreateMessage<'a> {
    content: &'a str,
}

#[derive(Debug, Clone)]
pub struct DiscordClient {
    http: reqwest::Client,
    base: String,
}

impl DiscordClient {
    pub fn new(token: &str) -> Result<Self, DiscordError> {
        let mut auth = HeaderValue::from_str(&format!("Bot {token}"))
            .map_err(|_| DiscordError::InvalidToken)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base: API_BASE.to_string(),
        })
    }

    async fn read<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, DiscordError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DiscordError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, DiscordError> {
        let response = self.http.get(format!("{}{path}", self.base)).send().await?;
        Self::read(response).await
    }

    /// The bot's own account. Also serves as a token check at startup.
    pub async fn current_user(&self) -> Result<User, DiscordError> {
        self.get("/users/@me").await
    }

    pub async fn channel(&self, channel_id: u64) -> Result<Channel, DiscordError> {
        self.get(&format!("/channels/{channel_id}")).await
    }

    /// Messages in `channel_id` newer than the `after` snowflake, oldest first.
    pub async fn messages_after(&self, channel_id: u64, after: u64) -> Result<Vec<Message>, DiscordError> {
        let response = self
            .http
            .get(format!("{}/channels/{channel_id}/messages", self.base))
            .query(&[("after", after.to_string()), ("limit", HISTORY_LIMIT.to_string())])
            .send()
            .await?;

        let mut messages: Vec<Message> = Self::read(response).await?;
        messages.sort_by_key(|m| m.id);
        Ok(messages)
    }

    pub async fn create_message(&self, channel_id: u64, content: &str) -> Result<(), DiscordError> {
        let content = clip(content);
        let response = self
            .http
            .post(format!("{}/channels/{channel_id}/messages", self.base))
            .json(&CreateMessage { content: &content })
            .send()
            .await?;

        let _: serde_json::Value = Self::read(response).await?;
        Ok(())
    }
}

/// Clip `content` to Discord's limit, marking the cut.
fn clip(content: &str) -> String {
    if content.chars().count() <= MAX_MESSAGE_CHARS {
        return content.to_string();
    }
    truncate_with_marker(content, MAX_MESSAGE_CHARS - 1, "…")
}

impl ChatSink for DiscordClient {
    async fn open_channel(&self, channel_id: u64) -> Result<OutputChannel, ChatError> {
        let channel = self
            .channel(channel_id)
            .await
            .map_err(|e| ChatError::ChannelUnavailable {
                channel_id,
                reason: e.to_string(),
            })?;

        debug!(channel_id = channel.id, name = ?channel.name, "Resolved output channel");
        Ok(OutputChannel::new(channel.id, channel.name))
    }

    async fn post(&self, channel: &OutputChannel, content: &str) -> Result<(), ChatError> {
        self.create_message(channel.id, content)
            .await
            .map_err(|e| ChatError::Send(e.to_string()))
    }
}
