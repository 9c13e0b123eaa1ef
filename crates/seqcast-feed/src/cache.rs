//! Per-feed memoization of resolved episodes.

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::trace;

use crate::parser::FeedEpisode;

/// How long a resolved feed stays fresh.
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

/// A resolved feed with the time it was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub audio_url: String,
    pub episode_title: String,
    pub resolved_at: Instant,
}

impl CacheEntry {
    pub fn new(episode: FeedEpisode, resolved_at: Instant) -> Self {
        Self {
            audio_url: episode.audio_url,
            episode_title: episode.episode_title,
            resolved_at,
        }
    }

    fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.resolved_at) >= ttl
    }

    pub fn episode(&self) -> FeedEpisode {
        FeedEpisode {
            audio_url: self.audio_url.clone(),
            episode_title: self.episode_title.clone(),
        }
    }
}

/// Feed URL → resolved episode, expiring lazily at read time.
///
/// Unbounded: one entry per feed in the playlist.
#[derive(Debug)]
pub struct ResolutionCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl ResolutionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get a live entry. Expired entries read as absent but stay stored until
    /// overwritten.
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.get(key)?;
        if entry.is_expired(self.ttl, Instant::now()) {
            trace!("Cache entry for {key} expired");
            return None;
        }
        Some(entry.clone())
    }

    pub fn put(&self, key: impl Into<String>, entry: CacheEntry) {
        self.entries.insert(key.into(), entry);
    }

    /// Number of stored entries, live or expired.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl Default for ResolutionCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn episode(url: &str) -> FeedEpisode {
        FeedEpisode {
            audio_url: url.to_string(),
            episode_title: "Ep".to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_at_ttl() {
        let cache = ResolutionCache::default();
        cache.put("feed", CacheEntry::new(episode("a.mp3"), Instant::now()));

        tokio::time::advance(DEFAULT_TTL - Duration::from_millis(1)).await;
        assert_eq!(cache.get("feed").unwrap().audio_url, "a.mp3");

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(cache.get("feed").is_none());
        // Lazy expiry keeps the raw entry around
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_overwrites() {
        let cache = ResolutionCache::new(Duration::from_secs(10));
        cache.put("feed", CacheEntry::new(episode("old.mp3"), Instant::now()));
        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(cache.get("feed").is_none());

        cache.put("feed", CacheEntry::new(episode("new.mp3"), Instant::now()));
        assert_eq!(cache.get("feed").unwrap().episode().audio_url, "new.mp3");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_missing_key() {
        let cache = ResolutionCache::default();
        assert!(cache.get("nope").is_none());
        assert!(cache.is_empty());
    }
}
