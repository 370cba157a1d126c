//! Roster administration: keyed operations on the monitored player list and
//! the matching tracking records.

use serde_json::Value;
use tracing::{info, warn};

use crate::context::AppContext;
use crate::error::{FetchError, RosterError};
use crate::stats::StatsSource;
use crate::tracking::TrackingRecord;

/// Add `username` to the roster with a fresh, unobserved tracking record.
///
/// The config file is written before the state file. If the config write
/// fails the in-memory roster is restored and nothing is persisted.
pub fn add_player(ctx: &mut AppContext, username: &str) -> Result<(), RosterError> {
    if ctx.config.is_monitored(username) {
        return Err(RosterError::AlreadyMonitored(username.to_string()));
    }

    ctx.config.players.push(username.to_string());
    if let Err(e) = ctx.save_config() {
        ctx.config.players.pop();
        return Err(e.into());
    }

    // Any leftover record from an earlier stint on the roster is discarded.
    ctx.store.insert(username, TrackingRecord::default());
    ctx.save_state()?;

    info!(player = %username, roster = ctx.config.players.len(), "Player added");
    Ok(())
}

/// Remove `username` from the roster and purge its tracking record.
pub fn remove_player(ctx: &mut AppContext, username: &str) -> Result<(), RosterError> {
    let Some(index) = ctx.config.players.iter().position(|p| p == username) else {
        return Err(RosterError::NotMonitored(username.to_string()));
    };

    let removed = ctx.config.players.remove(index);
    if let Err(e) = ctx.save_config() {
        ctx.config.players.insert(index, removed);
        return Err(e.into());
    }

    if ctx.store.remove(username).is_none() {
        warn!(player = %username, "Removed player had no tracking record");
    }
    ctx.save_state()?;

    info!(player = %username, roster = ctx.config.players.len(), "Player removed");
    Ok(())
}

/// Monitored players in insertion order.
pub fn players(ctx: &AppContext) -> &[String] {
    &ctx.config.players
}

/// Fetch the unfiltered stats payload for `username`. Tracking state is not
/// touched.
pub async fn check_player<S: StatsSource>(stats: &S, username: &str) -> Result<Value, FetchError> {
    stats.fetch_raw(username).await.inspect_err(|e| {
        warn!(player = %username, error = %e, "Ad-hoc stats check failed");
    })
}
