//! In-memory stand-ins for the stats API and chat platform.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use serde_json::{Value, json};

use crate::chat::{ChatSink, OutputChannel};
use crate::error::{ChatError, FetchError};
use crate::stats::StatsSource;

/// Stats source answering from a fixed table. Unknown players get a 404.
#[derive(Default)]
pub struct FakeStats {
    responses: RefCell<HashMap<String, Result<Value, FetchError>>>,
    calls: RefCell<Vec<String>>,
}

impl FakeStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payload(self, username: &str, payload: Value) -> Self {
        self.responses
            .borrow_mut()
            .insert(username.to_string(), Ok(payload));
        self
    }

    pub fn with_snapshot(self, username: &str, seconds_played: u64, kills: u64) -> Self {
        self.with_payload(
            username,
            json!({ "secondsPlayed": seconds_played, "kills": kills }),
        )
    }

    pub fn with_error(self, username: &str, error: FetchError) -> Self {
        self.responses
            .borrow_mut()
            .insert(username.to_string(), Err(error));
        self
    }

    /// Replace the counters returned for `username` between passes.
    pub fn set_snapshot(&self, username: &str, seconds_played: u64, kills: u64) {
        self.responses.borrow_mut().insert(
            username.to_string(),
            Ok(json!({ "secondsPlayed": seconds_played, "kills": kills })),
        );
    }

    /// Usernames requested so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl StatsSource for FakeStats {
    async fn fetch_raw(&self, username: &str) -> Result<Value, FetchError> {
        self.calls.borrow_mut().push(username.to_string());
        self.responses
            .borrow()
            .get(username)
            .cloned()
            .unwrap_or(Err(FetchError::Http { status: 404 }))
    }
}

/// Chat sink that records every posted message.
pub struct FakeChat {
    available: Cell<bool>,
    fail_sends: Cell<bool>,
    posts: RefCell<Vec<String>>,
}

impl Default for FakeChat {
    fn default() -> Self {
        Self {
            available: Cell::new(true),
            fail_sends: Cell::new(false),
            posts: RefCell::new(Vec::new()),
        }
    }
}

impl FakeChat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unavailable() -> Self {
        let chat = Self::default();
        chat.available.set(false);
        chat
    }

    pub fn failing_sends() -> Self {
        let chat = Self::default();
        chat.fail_sends.set(true);
        chat
    }

    pub fn posts(&self) -> Vec<String> {
        self.posts.borrow().clone()
    }
}

impl ChatSink for FakeChat {
    async fn open_channel(&self, channel_id: u64) -> Result<OutputChannel, ChatError> {
        if !self.available.get() {
            return Err(ChatError::ChannelUnavailable {
                channel_id,
                reason: "not found".to_string(),
            });
        }
        Ok(OutputChannel::new(channel_id, Some("tracker".to_string())))
    }

    async fn post(&self, _channel: &OutputChannel, content: &str) -> Result<(), ChatError> {
        if self.fail_sends.get() {
            return Err(ChatError::Send("rejected".to_string()));
        }
        self.posts.borrow_mut().push(content.to_string());
        Ok(())
    }
}
