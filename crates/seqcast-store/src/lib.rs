//! # seqcast-store
//!
//! Durable playlist storage for Seqcast.
//!
//! The playlist lives in a single JSON file named after a versioned storage
//! key inside the platform data directory. Missing or malformed data loads
//! as the built-in default playlist.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use seqcast_core::{Error, Playlist, PlaylistEntry, Result};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Storage key; bump the suffix when the on-disk shape changes.
pub const STORAGE_KEY: &str = "seq_player_playlist_v1";

/// Load/save access to the persisted playlist.
#[derive(Debug, Clone)]
pub struct PlaylistStore {
    path: PathBuf,
}

impl PlaylistStore {
    /// Create a store in the default data directory.
    pub fn new() -> Result<Self> {
        let project_dirs = ProjectDirs::from("com", "seqcast", "Seqcast")
            .ok_or_else(|| Error::Store("Failed to determine data directory".to_string()))?;

        Self::with_dir(project_dirs.data_dir())
    }

    /// Create a store inside `dir`, creating the directory if needed.
    pub fn with_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)
            .map_err(|e| Error::Store(format!("Failed to create data directory: {e}")))?;

        Ok(Self::at_path(dir.join(format!("{STORAGE_KEY}.json"))))
    }

    /// Use an explicit file path.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the playlist. Never fails: unreadable or malformed data yields the
    /// default playlist.
    pub fn load(&self) -> Playlist {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No stored playlist at {}", self.path.display());
                return Playlist::with_defaults();
            }
            Err(e) => {
                warn!("Failed to read {}: {e}", self.path.display());
                return Playlist::with_defaults();
            }
        };

        let Some(entries) = parse_entries(&raw) else {
            warn!("Stored playlist at {} is malformed", self.path.display());
            return Playlist::with_defaults();
        };

        let playlist = Playlist::new(entries);
        info!(
            "Loaded {} playlist entries from {}",
            playlist.len(),
            self.path.display()
        );
        playlist
    }

    /// Persist the playlist, replacing the stored copy.
    pub fn save(&self, playlist: &Playlist) -> Result<()> {
        let json = serde_json::to_string_pretty(playlist.entries())?;

        // Write beside the target and rename so a crash never leaves half a file
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| Error::Store(format!("Failed to replace {}: {e}", self.path.display())))?;

        debug!("Saved {} entries to {}", playlist.len(), self.path.display());
        Ok(())
    }
}

/// Parse stored JSON into entries, skipping elements without a usable URL.
///
/// Returns `None` when the document is not a non-empty JSON array.
fn parse_entries(raw: &str) -> Option<Vec<PlaylistEntry>> {
    let Value::Array(items) = serde_json::from_str::<Value>(raw).ok()? else {
        return None;
    };
    if items.is_empty() {
        return None;
    }

    Some(
        items
            .into_iter()
            .filter_map(|item| serde_json::from_value::<PlaylistEntry>(item).ok())
            .filter_map(PlaylistEntry::normalized)
            .collect(),
    )
}
