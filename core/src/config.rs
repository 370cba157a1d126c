//! Loading and persisting [`TrackerConfig`].

use std::path::Path;

use bftracker_types::TrackerConfig;
use tracing::{debug, info};

use crate::error::StorageError;

/// Load and validate the config file at `path`.
///
/// A missing file is written out with defaults first; validation then fails
/// on the empty token, pointing the operator at the file to fill in.
pub fn load_config(path: &Path) -> Result<TrackerConfig, StorageError> {
    if !path.exists() {
        info!(path = %path.display(), "No config file, writing defaults");
    }

    let config: TrackerConfig =
        confy::load_path(path).map_err(|source| StorageError::Config {
            path: path.to_path_buf(),
            source,
        })?;

    config
        .validate()
        .map_err(|reason| StorageError::InvalidConfig {
            path: path.to_path_buf(),
            reason,
        })?;

    info!(
        path = %path.display(),
        players = config.players.len(),
        interval_minutes = config.check_interval_minutes,
        threshold_minutes = config.inactivity_threshold_minutes,
        policy = ?config.policy,
        "Loaded config"
    );
    Ok(config)
}

/// Rewrite the whole config file.
pub fn save_config(path: &Path, config: &TrackerConfig) -> Result<(), StorageError> {
    confy::store_path(path, config).map_err(|source| StorageError::Config {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "Saved config");
    Ok(())
}
