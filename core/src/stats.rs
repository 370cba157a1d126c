//! Stats API access.
//!
//! [`StatsSource`] is the seam the scheduler and commands depend on;
//! [`StatsClient`] is the HTTP implementation against the gametools API.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::error::FetchError;

/// Per-request deadline for stats queries.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("bftracker/", env!("CARGO_PKG_VERSION"));

/// Cumulative counters for one player at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub seconds_played: u64,
    pub kills: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsPayload {
    seconds_played: u64,
    kills: u64,
}

impl Snapshot {
    pub fn new(seconds_played: u64, kills: u64) -> Self {
        Self {
            seconds_played,
            kills,
        }
    }

    /// Extract the required counters from a raw API payload.
    ///
    /// Both `secondsPlayed` and `kills` must be present as non-negative
    /// integers; any other shape is malformed.
    pub fn from_payload(username: &str, payload: &Value) -> Result<Self, FetchError> {
        let parsed = StatsPayload::deserialize(payload).map_err(|e| FetchError::MalformedData {
            username: username.to_string(),
            detail: e.to_string(),
        })?;

        Ok(Self::new(parsed.seconds_played, parsed.kills))
    }
}

/// Source of player stats.
#[allow(async_fn_in_trait)]
pub trait StatsSource {
    /// Fetch the unfiltered payload for `username`.
    async fn fetch_raw(&self, username: &str) -> Result<Value, FetchError>;

    /// Fetch and normalize a snapshot. Every failure is logged here.
    async fn fetch(&self, username: &str) -> Result<Snapshot, FetchError> {
        let result = match self.fetch_raw(username).await {
            Ok(payload) => Snapshot::from_payload(username, &payload),
            Err(e) => Err(e),
        };

        match &result {
            Ok(snapshot) => debug!(
                player = %username,
                seconds_played = snapshot.seconds_played,
                kills = snapshot.kills,
                "Fetched stats"
            ),
            Err(e @ FetchError::MalformedData { .. }) => {
                error!(player = %username, error = %e, "Malformed stats data")
            }
            Err(e) => warn!(player = %username, error = %e, "Failed to fetch stats"),
        }

        result
    }
}

/// HTTP client for the gametools stats endpoint.
#[derive(Debug, Clone)]
pub struct StatsClient {
    http: reqwest::Client,
    endpoint: String,
    platform: String,
}

impl StatsClient {
    pub fn new(endpoint: &str, platform: &str) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            platform: platform.to_string(),
        })
    }

    fn query<'a>(&'a self, username: &'a str) -> [(&'static str, &'a str); 6] {
        [
            ("categories", "multiplayer"),
            ("raw", "false"),
            ("format_values", "true"),
            ("name", username),
            ("platform", self.platform.as_str()),
            ("skip_battlelog", "true"),
        ]
    }
}

fn classify(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else if let Some(status) = e.status() {
        FetchError::Http {
            status: status.as_u16(),
        }
    } else {
        FetchError::Transport(e.to_string())
    }
}

impl StatsSource for StatsClient {
    async fn fetch_raw(&self, username: &str) -> Result<Value, FetchError> {
        debug!(player = %username, endpoint = %self.endpoint, "Requesting stats");

        let response = self
            .http
            .get(&self.endpoint)
            .query(&self.query(username))
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
            });
        }

        response.json::<Value>().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::MalformedData {
                    username: username.to_string(),
                    detail: e.to_string(),
                }
            }
        })
    }
}
