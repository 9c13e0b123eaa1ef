//! Playlist entry and resolved track types.

use serde::{Deserialize, Serialize};

/// How a playlist entry should be interpreted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// A direct link to an audio file.
    Audio,
    /// An RSS/Atom feed whose newest episode should be played.
    Feed,
    /// Decide from the URL.
    #[default]
    Auto,
}

impl EntryKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Feed => "feed",
            Self::Auto => "auto",
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntryKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "audio" => Ok(Self::Audio),
            "feed" | "rss" | "podcast" => Ok(Self::Feed),
            "auto" | "" => Ok(Self::Auto),
            other => Err(crate::Error::InvalidArgument(format!(
                "unknown entry kind: {other}"
            ))),
        }
    }
}

/// A single entry in the user's playlist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaylistEntry {
    /// User-supplied title, possibly empty.
    #[serde(default)]
    pub title: String,
    /// Audio file or feed URL. Never empty once normalized.
    pub url: String,
    #[serde(default)]
    pub kind: EntryKind,
}

impl PlaylistEntry {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into().trim().to_string(),
            kind: EntryKind::Auto,
        }
    }

    pub fn audio(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(title, url).with_kind(EntryKind::Audio)
    }

    pub fn feed(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(title, url).with_kind(EntryKind::Feed)
    }

    #[must_use]
    pub const fn with_kind(mut self, kind: EntryKind) -> Self {
        self.kind = kind;
        self
    }

    /// The trimmed title, if the user gave one.
    pub fn trimmed_title(&self) -> Option<&str> {
        let title = self.title.trim();
        (!title.is_empty()).then_some(title)
    }

    /// Title shown in a playlist listing, falling back to "Track N" (1-based).
    pub fn list_title(&self, index: usize) -> String {
        self.trimmed_title()
            .map_or_else(|| format!("Track {}", index + 1), str::to_string)
    }

    /// Apply load-time defaulting: trim the URL and reject entries without one.
    pub fn normalized(mut self) -> Option<Self> {
        let url = self.url.trim();
        if url.is_empty() {
            return None;
        }
        self.url = url.to_string();
        Some(self)
    }
}

/// A playlist entry resolved to something the media element can play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTrack {
    /// Direct audio URL.
    pub audio_url: String,
    /// Text for the "now playing" display.
    pub display_text: String,
}

impl ResolvedTrack {
    pub fn new(audio_url: impl Into<String>, display_text: impl Into<String>) -> Self {
        Self {
            audio_url: audio_url.into(),
            display_text: display_text.into(),
        }
    }
}
