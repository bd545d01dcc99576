use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::core::models::usage::Snapshot;

const STORE_VERSION: u64 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSnapshot {
    #[serde(default)]
    version: u64,
    snapshot: Option<Snapshot>,
}

/// Holds the most recently fetched snapshot, optionally mirrored to disk.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    latest: RwLock<Option<Snapshot>>,
    path: Option<PathBuf>,
}

/// Default on-disk location, respecting XDG_CACHE_HOME.
pub fn default_store_path() -> PathBuf {
    let base = std::env::var("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("~"))
                .join(".cache")
        });
    base.join("pacebadge").join("snapshot.json")
}

impl SnapshotStore {
    /// Store that lives only in memory.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a store backed by `path`, loading whatever is already there.
    /// A missing, unreadable or outdated file starts the store empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let latest = read_snapshot(&path);
        Self {
            latest: RwLock::new(latest),
            path: Some(path),
        }
    }

    pub fn latest(&self) -> Option<Snapshot> {
        self.latest.read().clone()
    }

    /// Replace the stored snapshot. Disk write failures are logged only.
    pub fn set(&self, snapshot: Snapshot) {
        if let Some(path) = &self.path {
            if let Err(e) = write_snapshot(path, &snapshot) {
                warn!("Failed to persist snapshot: {:#}", e);
            }
        }
        *self.latest.write() = Some(snapshot);
    }
}

fn read_snapshot(path: &Path) -> Option<Snapshot> {
    let content = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str::<StoredSnapshot>(&content) {
        Ok(stored) if stored.version == STORE_VERSION => stored.snapshot,
        Ok(stored) => {
            debug!(
                "Ignoring snapshot file {} with version {}",
                path.display(),
                stored.version
            );
            None
        }
        Err(e) => {
            warn!("Ignoring unreadable snapshot file {}: {}", path.display(), e);
            None
        }
    }
}

fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let stored = StoredSnapshot {
        version: STORE_VERSION,
        snapshot: Some(snapshot.clone()),
    };
    let json = serde_json::to_string(&stored).context("Failed to serialize snapshot")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write snapshot to {}", path.display()))?;
    Ok(())
}
