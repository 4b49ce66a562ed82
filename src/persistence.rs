//! On-disk persistence for the retained snapshot store
//!
//! Snapshots are kept as a JSON list under the platform config directory.
//! Loading is tolerant: a missing or unreadable file yields an empty store
//! so a corrupt state file never blocks the application.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::constants;
use crate::snapshot::Snapshot;
use crate::store::SnapshotStore;
use crate::window_state::WindowRecord;

/// Serialized form of one snapshot: the name and the window records, in
/// back-to-front order. Timestamps and monitor fingerprints are not
/// persisted; a loaded snapshot is re-stamped at load time.
#[derive(Debug, Serialize, Deserialize)]
struct StoredSnapshot {
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "windowRecords", default)]
    window_records: Vec<WindowRecord>,
}

/// Location of the snapshots file, `None` when the platform exposes no
/// config directory.
pub fn store_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| {
        dir.join(constants::config::APP_DIR)
            .join(constants::config::SNAPSHOTS_FILE)
    })
}

pub fn load() -> SnapshotStore {
    match store_path() {
        Some(path) => load_from(&path),
        None => {
            warn!("no config directory on this platform, starting with an empty store");
            SnapshotStore::default()
        }
    }
}

fn load_from(path: &Path) -> SnapshotStore {
    let mut store = SnapshotStore::default();
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no retained snapshots yet");
            return store;
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                error = %err,
                "could not read retained snapshots, starting empty"
            );
            return store;
        }
    };
    match serde_json::from_str::<Vec<StoredSnapshot>>(&raw) {
        Ok(stored) => {
            for snapshot in stored {
                store.add(Snapshot::from_records(snapshot.name, snapshot.window_records));
            }
            info!(count = store.len(), "loaded retained snapshots");
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                error = %err,
                "retained snapshots file is corrupt, starting empty"
            );
        }
    }
    store
}

pub fn save(store: &SnapshotStore) -> Result<()> {
    let path = store_path().context("no config directory available on this platform")?;
    save_to(store, &path)
}

fn save_to(store: &SnapshotStore, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let stored: Vec<StoredSnapshot> = store
        .list()
        .iter()
        .map(|s| StoredSnapshot {
            name: s.name().map(str::to_string),
            window_records: s.records().to_vec(),
        })
        .collect();
    let json = serde_json::to_string_pretty(&stored).context("serializing snapshot store")?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
