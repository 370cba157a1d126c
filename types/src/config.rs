//! Tracker configuration as stored on disk.
//!
//! The roster (`players`) lives here too, so every roster mutation rewrites
//! the whole file.

use serde::{Deserialize, Serialize};

/// Upper bound for the poll interval and inactivity threshold (one week).
pub const MAX_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

/// Default stats endpoint (Battlefield 6 multiplayer stats).
pub const DEFAULT_STATS_ENDPOINT: &str = "https://api.gametools.network/bf6/stats/";

/// What activity notifications report while a session is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityPolicy {
    /// Every poll with new play time notifies with the kills gained since
    /// the previous poll.
    #[default]
    PerPoll,
    /// The first poll with new play time announces the session; later polls
    /// report kills accumulated since the session began.
    PerSession,
}

/// Message templates, one is picked at random per notification.
///
/// Placeholders: `{player}`, `{kills}`, `{minutes}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageTemplates {
    /// Idle → active with no new kills.
    pub played_again: Vec<String>,
    /// Still active, no new kills.
    pub still_playing: Vec<String>,
    /// New kills since the baseline.
    pub rampage: Vec<String>,
    /// Session ended after the inactivity threshold.
    pub stopped: Vec<String>,
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self {
            played_again: vec![
                "🎮 **{player}** has played again!".to_string(),
                "🎮 **{player}** just dropped back into the fight.".to_string(),
            ],
            still_playing: vec![
                "🎮 **{player}** is still playing.".to_string(),
                "🎮 **{player}** is still out there, but hasn't scored yet.".to_string(),
            ],
            rampage: vec![
                "🎮 **{player}** is on a rampage, racking up {kills} kills!".to_string(),
                "🎮 **{player}** added {kills} kills to the tally!".to_string(),
            ],
            stopped: vec![
                "🎮 **{player}** stopped playing after claiming 💀 **{kills}** souls in ⏱️ {minutes} minutes."
                    .to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Chat bot token.
    pub token: String,
    /// Channel receiving notifications and commands.
    pub channel_id: u64,
    pub check_interval_minutes: u64,
    pub inactivity_threshold_minutes: u64,
    /// Monitored usernames, in insertion order.
    #[serde(default)]
    pub players: Vec<String>,

    /// User ids allowed to run privileged commands.
    #[serde(default)]
    pub admins: Vec<u64>,
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
    /// How often the command listener checks the channel for new messages.
    #[serde(default = "default_command_poll_seconds")]
    pub command_poll_seconds: u64,
    #[serde(default = "default_stats_endpoint")]
    pub stats_endpoint: String,
    #[serde(default = "default_platform")]
    pub platform: String,
    #[serde(default)]
    pub policy: ActivityPolicy,
    #[serde(default)]
    pub messages: MessageTemplates,
}

fn default_command_prefix() -> String {
    "!bf".to_string()
}

fn default_command_poll_seconds() -> u64 {
    3
}

fn default_stats_endpoint() -> String {
    DEFAULT_STATS_ENDPOINT.to_string()
}

fn default_platform() -> String {
    "pc".to_string()
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            channel_id: 0,
            check_interval_minutes: 5,
            inactivity_threshold_minutes: 15,
            players: Vec::new(),
            admins: Vec::new(),
            command_prefix: default_command_prefix(),
            command_poll_seconds: default_command_poll_seconds(),
            stats_endpoint: default_stats_endpoint(),
            platform: default_platform(),
            policy: ActivityPolicy::default(),
            messages: MessageTemplates::default(),
        }
    }
}

impl TrackerConfig {
    pub fn check_interval_secs(&self) -> u64 {
        self.check_interval_minutes.saturating_mul(60)
    }

    pub fn inactivity_threshold_secs(&self) -> i64 {
        i64::try_from(self.inactivity_threshold_minutes.saturating_mul(60)).unwrap_or(i64::MAX)
    }

    pub fn is_monitored(&self, username: &str) -> bool {
        self.players.iter().any(|p| p == username)
    }

    pub fn is_admin(&self, user_id: u64) -> bool {
        self.admins.contains(&user_id)
    }

    /// Validate configuration, returning a description of the first problem.
    pub fn validate(&self) -> Result<(), String> {
        if self.token.trim().is_empty() {
            return Err("token is empty".to_string());
        }
        if self.channel_id == 0 {
            return Err("channel_id is not set".to_string());
        }
        if self.check_interval_minutes == 0 {
            return Err("check_interval_minutes must be at least 1".to_string());
        }
        if self.check_interval_minutes > MAX_INTERVAL_MINUTES {
            return Err(format!(
                "check_interval_minutes must be at most {MAX_INTERVAL_MINUTES}"
            ));
        }
        if self.inactivity_threshold_minutes > MAX_INTERVAL_MINUTES {
            return Err(format!(
                "inactivity_threshold_minutes must be at most {MAX_INTERVAL_MINUTES}"
            ));
        }
        if self.command_poll_seconds == 0 {
            return Err("command_poll_seconds must be at least 1".to_string());
        }
        if self.command_prefix.trim().is_empty() {
            return Err("command_prefix is empty".to_string());
        }

        let mut seen = std::collections::HashSet::new();
        for player in &self.players {
            if !seen.insert(player.as_str()) {
                return Err(format!("duplicate player in roster: {player}"));
            }
        }

        Ok(())
    }
}
