//! Playlist entry → playable URL and display text.

use seqcast_core::{classify, EntryKind, PlaylistEntry, ResolvedTrack, Result};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::client::Transport;
use crate::resolver::{FeedResolver, ResolverConfig};

/// Show name used when a feed entry has no title of its own.
pub const SHOW_TITLE_PLACEHOLDER: &str = "Podcast";

/// Resolves any playlist entry, audio or feed, through one async call.
pub struct TrackResolver<T> {
    feeds: FeedResolver<T>,
}

impl<T: Transport> TrackResolver<T> {
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, ResolverConfig::default())
    }

    pub fn with_config(transport: T, config: ResolverConfig) -> Self {
        Self {
            feeds: FeedResolver::with_config(transport, config),
        }
    }

    pub const fn feeds(&self) -> &FeedResolver<T> {
        &self.feeds
    }

    pub async fn resolve_track(&self, entry: &PlaylistEntry) -> Result<ResolvedTrack> {
        self.resolve_track_with(entry, &CancellationToken::new())
            .await
    }

    /// Resolve an entry. Audio entries never touch the network; feed errors
    /// are returned unchanged.
    pub async fn resolve_track_with(
        &self,
        entry: &PlaylistEntry,
        cancel: &CancellationToken,
    ) -> Result<ResolvedTrack> {
        match classify(entry) {
            EntryKind::Feed => {
                let episode = self.feeds.resolve_feed_with(&entry.url, cancel).await?;
                let show = entry.trimmed_title().unwrap_or(SHOW_TITLE_PLACEHOLDER);
                let display_text = if episode.episode_title.is_empty() {
                    show.to_string()
                } else {
                    format!("{show} — {}", episode.episode_title)
                };
                Ok(ResolvedTrack::new(episode.audio_url, display_text))
            }
            EntryKind::Audio | EntryKind::Auto => {
                debug!("Playing {} directly", entry.url);
                let display_text = entry.trimmed_title().unwrap_or(&entry.url);
                Ok(ResolvedTrack::new(entry.url.clone(), display_text))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use seqcast_core::Error;

    use super::*;
    use crate::client::FetchResponse;
    use crate::resolver::tests::{feed_body, MockTransport, FEED};

    #[tokio::test]
    async fn test_audio_entries_skip_network() {
        let resolver = TrackResolver::new(MockTransport::default());

        let entry = PlaylistEntry::audio("  ", "https://podcast.example.com/rss");
        let track = resolver.resolve_track(&entry).await.unwrap();
        assert_eq!(track.audio_url, entry.url);
        assert_eq!(track.display_text, entry.url);

        let entry = PlaylistEntry::new(" Morning ", "./audio/track1.mp3");
        let track = resolver.resolve_track(&entry).await.unwrap();
        assert_eq!(track.audio_url, "./audio/track1.mp3");
        assert_eq!(track.display_text, "Morning");

        assert!(resolver.feeds().transport().requests().is_empty());
    }

    #[tokio::test]
    async fn test_feed_display_text() {
        let transport = MockTransport::with(FEED, FetchResponse::ok(feed_body("ep.mp3", "Ep 12")));
        let resolver = TrackResolver::new(transport);

        let track = resolver
            .resolve_track(&PlaylistEntry::new("The Show", FEED))
            .await
            .unwrap();
        assert_eq!(track.audio_url, "ep.mp3");
        assert_eq!(track.display_text, "The Show — Ep 12");

        // Second resolution is served from the cache
        let track = resolver
            .resolve_track(&PlaylistEntry::new("", FEED))
            .await
            .unwrap();
        assert_eq!(track.display_text, "Podcast — Ep 12");
        assert_eq!(resolver.feeds().transport().requests().len(), 1);
    }

    #[tokio::test]
    async fn test_feed_without_episode_title() {
        let transport = MockTransport::with(
            FEED,
            FetchResponse::ok(r#"<rss><channel><item><enclosure url="a.mp3"/></item></channel></rss>"#),
        );
        let resolver = TrackResolver::new(transport);

        let track = resolver
            .resolve_track(&PlaylistEntry::feed("Show", FEED))
            .await
            .unwrap();
        assert_eq!(track.display_text, "Show");
    }

    #[tokio::test]
    async fn test_feed_errors_propagate() {
        let transport = MockTransport::with(
            FEED,
            FetchResponse::ok("<rss><channel><item><title>t</title></item></channel></rss>"),
        );
        let resolver = TrackResolver::new(transport);

        let err = resolver
            .resolve_track(&PlaylistEntry::new("Show", FEED))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoEnclosure { scanned: 1 }));
    }
}
