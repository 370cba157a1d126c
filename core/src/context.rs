//! Shared application context owned by the main loop.
//!
//! Poll passes and command handlers run one at a time and take
//! `&mut AppContext`.

use std::path::{Path, PathBuf};

use bftracker_types::TrackerConfig;
use tracing::{info, warn};

use crate::config;
use crate::error::StorageError;
use crate::tracking::TrackingStore;

#[derive(Debug)]
pub struct AppContext {
    pub config: TrackerConfig,
    config_path: PathBuf,
    pub store: TrackingStore,
}

impl AppContext {
    /// Load config and tracking state. Records for players off the roster are
    /// dropped and every roster player without one gets a fresh record.
    pub fn load(
        config_path: impl Into<PathBuf>,
        state_path: impl Into<PathBuf>,
    ) -> Result<Self, StorageError> {
        let config_path = config_path.into();
        let config = config::load_config(&config_path)?;
        let store = TrackingStore::load(state_path)?;

        let mut ctx = Self::new(config, config_path, store);
        let pruned = ctx.prune_records();
        let seeded = ctx.seed_records();
        ctx.save_state()?;

        info!(
            players = ctx.config.players.len(),
            records = ctx.store.len(),
            seeded,
            pruned = pruned.len(),
            "Tracking state ready"
        );
        Ok(ctx)
    }

    pub fn new(config: TrackerConfig, config_path: impl Into<PathBuf>, store: TrackingStore) -> Self {
        Self {
            config,
            config_path: config_path.into(),
            store,
        }
    }

    /// Ensure every roster player has a record. Returns how many were created.
    pub fn seed_records(&mut self) -> usize {
        let Self { config, store, .. } = self;
        config
            .players
            .iter()
            .filter(|player| store.ensure(player))
            .count()
    }

    /// Drop records for players no longer on the roster.
    pub fn prune_records(&mut self) -> Vec<String> {
        let Self { config, store, .. } = self;
        let dropped = store.retain(|player| config.is_monitored(player));
        for player in &dropped {
            warn!(player = %player, "Dropping tracking record for player not on the roster");
        }
        dropped
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn save_config(&self) -> Result<(), StorageError> {
        config::save_config(&self.config_path, &self.config)
    }

    pub fn save_state(&self) -> Result<(), StorageError> {
        self.store.save()
    }
}
