//! The user's playlist: an ordered, never-empty list of entries.

use serde::{Deserialize, Serialize};

use super::{EntryKind, PlaylistEntry};
use crate::{Error, Result};

/// Built-in playlist used on first start and whenever the list would become empty.
pub fn default_entries() -> Vec<PlaylistEntry> {
    vec![
        PlaylistEntry::new("Track 1 (example)", "./audio/track1.mp3"),
        PlaylistEntry::new("Track 2 (example)", "./audio/track2.mp3"),
    ]
}

/// Ordered playlist. Always holds at least one entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "Vec<PlaylistEntry>", into = "Vec<PlaylistEntry>")]
pub struct Playlist {
    entries: Vec<PlaylistEntry>,
}

impl Playlist {
    /// Build a playlist, normalizing entries and falling back to the defaults
    /// when nothing usable remains.
    pub fn new(entries: Vec<PlaylistEntry>) -> Self {
        let entries: Vec<_> = entries
            .into_iter()
            .filter_map(PlaylistEntry::normalized)
            .collect();

        if entries.is_empty() {
            Self::with_defaults()
        } else {
            Self { entries }
        }
    }

    pub fn with_defaults() -> Self {
        Self {
            entries: default_entries(),
        }
    }

    /// Get all entries.
    pub fn entries(&self) -> &[PlaylistEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&PlaylistEntry> {
        self.entries.get(index)
    }

    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub const fn last_index(&self) -> usize {
        self.entries.len().saturating_sub(1)
    }

    /// Clamp an index into the valid range.
    pub fn clamp_index(&self, index: usize) -> usize {
        index.min(self.last_index())
    }

    /// Append an entry built from user input. A blank title becomes "Track N".
    ///
    /// Returns the index of the new entry.
    pub fn add(&mut self, title: &str, url: &str) -> Result<usize> {
        self.add_with_kind(title, url, EntryKind::Auto)
    }

    /// Like [`add`](Self::add) with an explicit entry kind.
    pub fn add_with_kind(&mut self, title: &str, url: &str, kind: EntryKind) -> Result<usize> {
        let url = url.trim();
        if url.is_empty() {
            return Err(Error::InvalidArgument("playlist URL must not be empty".into()));
        }

        let title = match title.trim() {
            "" => format!("Track {}", self.entries.len() + 1),
            t => t.to_string(),
        };

        self.push(PlaylistEntry::new(title, url).with_kind(kind))
    }

    /// Append an already-built entry.
    pub fn push(&mut self, entry: PlaylistEntry) -> Result<usize> {
        let entry = entry
            .normalized()
            .ok_or_else(|| Error::InvalidArgument("playlist URL must not be empty".into()))?;
        self.entries.push(entry);
        Ok(self.entries.len() - 1)
    }

    /// Remove the entry at `index`. Removing the last remaining entry restores
    /// the default playlist.
    pub fn remove(&mut self, index: usize) -> Option<PlaylistEntry> {
        if index >= self.entries.len() {
            return None;
        }

        let removed = self.entries.remove(index);
        if self.entries.is_empty() {
            self.entries = default_entries();
        }
        Some(removed)
    }

    /// Replace everything with the default playlist.
    pub fn reset(&mut self) {
        self.entries = default_entries();
    }
}

impl Default for Playlist {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl From<Vec<PlaylistEntry>> for Playlist {
    fn from(entries: Vec<PlaylistEntry>) -> Self {
        Self::new(entries)
    }
}

impl From<Playlist> for Vec<PlaylistEntry> {
    fn from(playlist: Playlist) -> Self {
        playlist.entries
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_uses_defaults() {
        let playlist = Playlist::new(vec![PlaylistEntry::new("blank", "  ")]);
        assert_eq!(playlist.entries(), default_entries().as_slice());
    }

    #[test]
    fn test_add_defaults_title() {
        let mut playlist = Playlist::new(vec![PlaylistEntry::new("a", "a.mp3")]);
        let index = playlist.add("  ", " https://example.com/feed.xml ").unwrap();
        assert_eq!(index, 1);
        assert_eq!(playlist.get(1).unwrap().title, "Track 2");
        assert_eq!(playlist.get(1).unwrap().url, "https://example.com/feed.xml");
        assert!(playlist.add("x", " ").is_err());

        let index = playlist
            .add_with_kind("Show", "https://example.com/show", EntryKind::Feed)
            .unwrap();
        assert_eq!(playlist.get(index).unwrap().kind, EntryKind::Feed);
    }

    #[test]
    fn test_remove_last_restores_defaults() {
        let mut playlist = Playlist::new(vec![PlaylistEntry::new("only", "only.mp3")]);
        let removed = playlist.remove(0).unwrap();
        assert_eq!(removed.url, "only.mp3");
        assert_eq!(playlist.len(), default_entries().len());
        assert!(playlist.remove(10).is_none());
    }

    #[test]
    fn test_clamp_index() {
        let playlist = Playlist::with_defaults();
        assert_eq!(playlist.clamp_index(7), 1);
        assert_eq!(playlist.clamp_index(0), 0);
    }

    #[test]
    fn test_serde_as_plain_array() {
        let playlist: Playlist =
            serde_json::from_str(r#"[{"title":"A","url":"a.mp3","kind":"audio"}]"#).unwrap();
        assert_eq!(playlist.len(), 1);
        let json = serde_json::to_string(&playlist).unwrap();
        assert!(json.starts_with('['));
    }
}
