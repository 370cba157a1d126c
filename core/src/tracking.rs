//! Per-player tracking records and their durable store.
//!
//! On disk the state file keeps the flat layout of earlier deployments:
//!
//! ```json
//! { "Alpha": { "seconds_played": 100, "kills": 5, "last_check": 1700000000, "playing": true } }
//! ```
//!
//! In memory the paired counters are a single `Option<Checkpoint>`, so a
//! record can never hold one counter without the other.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::StorageError;
use crate::stats::Snapshot;

/// Baseline `(seconds_played, kills)` pair used for delta computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub seconds_played: u64,
    pub kills: u64,
}

impl From<Snapshot> for Checkpoint {
    fn from(snapshot: Snapshot) -> Self {
        Self {
            seconds_played: snapshot.seconds_played,
            kills: snapshot.kills,
        }
    }
}

/// Tracking state for one monitored player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredRecord", into = "StoredRecord")]
pub struct TrackingRecord {
    /// Last recorded counters; `None` until the player is first observed.
    pub checkpoint: Option<Checkpoint>,
    /// Epoch seconds of the last state-changing observation.
    pub last_check: i64,
    pub playing: bool,
    /// Counters when the current session began, kept for the stop summary.
    pub session_start: Option<Checkpoint>,
}

#[derive(Serialize, Deserialize)]
struct StoredRecord {
    seconds_played: Option<u64>,
    kills: Option<u64>,
    #[serde(default, deserialize_with = "epoch_seconds")]
    last_check: i64,
    #[serde(default)]
    playing: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    session_start: Option<Checkpoint>,
}

/// Older state files store fractional epoch seconds.
fn epoch_seconds<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(f64::deserialize(deserializer)?.floor() as i64)
}

impl From<StoredRecord> for TrackingRecord {
    fn from(stored: StoredRecord) -> Self {
        let checkpoint = match (stored.seconds_played, stored.kills) {
            (Some(seconds_played), Some(kills)) => Some(Checkpoint {
                seconds_played,
                kills,
            }),
            _ => None,
        };

        Self {
            checkpoint,
            last_check: stored.last_check,
            // A player we have never observed cannot be mid-session.
            playing: stored.playing && checkpoint.is_some(),
            session_start: stored.session_start.filter(|_| checkpoint.is_some()),
        }
    }
}

impl From<TrackingRecord> for StoredRecord {
    fn from(record: TrackingRecord) -> Self {
        Self {
            seconds_played: record.checkpoint.map(|c| c.seconds_played),
            kills: record.checkpoint.map(|c| c.kills),
            last_check: record.last_check,
            playing: record.playing,
            session_start: record.session_start,
        }
    }
}

/// Durable map of username → [`TrackingRecord`].
///
/// Mutations are in-memory until [`TrackingStore::save`], which rewrites the
/// whole file.
#[derive(Debug)]
pub struct TrackingStore {
    path: PathBuf,
    records: BTreeMap<String, TrackingRecord>,
}

impl TrackingStore {
    /// Load the store from `path`. A missing file yields an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();

        if !path.exists() {
            info!(path = %path.display(), "No state file, starting with empty tracking state");
            return Ok(Self::empty(path));
        }

        let contents = fs::read_to_string(&path).map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;

        let records = serde_json::from_str(&contents).map_err(|source| StorageError::Json {
            path: path.clone(),
            source,
        })?;

        Ok(Self { path, records })
    }

    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: BTreeMap::new(),
        }
    }

    pub fn get(&self, player: &str) -> Option<&TrackingRecord> {
        self.records.get(player)
    }

    /// Return the record for `player`, creating an unobserved one if absent.
    /// Returns true if a record was created.
    pub fn ensure(&mut self, player: &str) -> bool {
        if self.records.contains_key(player) {
            return false;
        }
        self.records
            .insert(player.to_string(), TrackingRecord::default());
        true
    }

    pub fn insert(&mut self, player: &str, record: TrackingRecord) {
        self.records.insert(player.to_string(), record);
    }

    pub fn remove(&mut self, player: &str) -> Option<TrackingRecord> {
        self.records.remove(player)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop every record whose player fails `keep`, returning the dropped names.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) -> Vec<String> {
        let mut dropped = Vec::new();
        self.records.retain(|name, _| {
            let kept = keep(name);
            if !kept {
                dropped.push(name.clone());
            }
            kept
        });
        dropped
    }

    /// Write the whole map to disk.
    ///
    /// The file is written next to its destination and renamed into place,
    /// so readers only ever see a complete file.
    pub fn save(&self) -> Result<(), StorageError> {
        let contents =
            serde_json::to_string_pretty(&self.records).map_err(|source| StorageError::Json {
                path: self.path.clone(),
                source,
            })?;

        write_atomic(&self.path, contents.as_bytes())?;
        debug!(path = %self.path.display(), records = self.records.len(), "Saved tracking state");
        Ok(())
    }
}

pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StorageError> {
    let io_err = |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, contents).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)
}
