//! Entry classification: audio file or syndication feed.

use crate::{EntryKind, PlaylistEntry};

/// File extensions the media element is expected to play directly.
const AUDIO_EXTENSIONS: [&str; 4] = [".mp3", ".m4a", ".wav", ".ogg"];

/// Substrings that suggest a syndication document.
const FEED_MARKERS: [&str; 3] = ["rss", "feed", "podcast"];

/// Decide how to play an entry. Never returns [`EntryKind::Auto`].
///
/// An explicit `audio`/`feed` tag wins. Otherwise the URL is inspected, and
/// anything unrecognised is treated as audio so a direct play is attempted
/// before any feed parsing.
pub fn classify(entry: &PlaylistEntry) -> EntryKind {
    match entry.kind {
        EntryKind::Audio | EntryKind::Feed => entry.kind,
        EntryKind::Auto => classify_url(&entry.url),
    }
}

fn classify_url(url: &str) -> EntryKind {
    if looks_like_audio(url) {
        return EntryKind::Audio;
    }

    let lower = url.to_ascii_lowercase();
    if FEED_MARKERS.iter().any(|marker| lower.contains(marker))
        || strip_query(&lower).ends_with(".xml")
    {
        EntryKind::Feed
    } else {
        EntryKind::Audio
    }
}

/// True when the URL path ends in a known audio extension, ignoring any query
/// string.
pub fn looks_like_audio(url: &str) -> bool {
    let lower = url.trim().to_ascii_lowercase();
    let path = strip_query(&lower);
    AUDIO_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

fn strip_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(path, _)| path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn auto(url: &str) -> PlaylistEntry {
        PlaylistEntry::new("", url)
    }

    #[test]
    fn test_explicit_kind_wins() {
        let entry = PlaylistEntry::audio("", "https://example.com/podcast/rss");
        assert_eq!(classify(&entry), EntryKind::Audio);

        let entry = PlaylistEntry::feed("", "https://example.com/episode.mp3");
        assert_eq!(classify(&entry), EntryKind::Feed);
    }

    #[test]
    fn test_audio_extensions() {
        assert_eq!(classify(&auto("./audio/track1.mp3")), EntryKind::Audio);
        assert_eq!(classify(&auto("https://cdn.example.com/a.M4A")), EntryKind::Audio);
        assert_eq!(
            classify(&auto("https://cdn.example.com/a.ogg?token=abc")),
            EntryKind::Audio
        );
    }

    #[test]
    fn test_audio_extension_beats_feed_marker() {
        assert_eq!(
            classify(&auto("https://podcast.example.com/feed/ep1.mp3")),
            EntryKind::Audio
        );
    }

    #[test]
    fn test_feed_heuristics() {
        assert_eq!(classify(&auto("https://example.com/rss")), EntryKind::Feed);
        assert_eq!(
            classify(&auto("https://feeds.example.com/show")),
            EntryKind::Feed
        );
        assert_eq!(
            classify(&auto("https://example.com/Podcasts/show")),
            EntryKind::Feed
        );
        assert_eq!(
            classify(&auto("https://example.com/show.xml")),
            EntryKind::Feed
        );
    }

    #[test]
    fn test_unknown_falls_back_to_audio() {
        assert_eq!(classify(&auto("https://example.com/stream")), EntryKind::Audio);
        assert_eq!(classify(&auto("")), EntryKind::Audio);
    }

    proptest! {
        #[test]
        fn classify_is_total_and_never_auto(url in ".*") {
            prop_assert_ne!(classify(&auto(&url)), EntryKind::Auto);
        }

        #[test]
        fn audio_suffix_always_classifies_audio(
            stem in "[a-z/:.]{0,30}",
            ext in prop::sample::select(vec!["mp3", "m4a", "wav", "ogg"]),
            query in prop::option::of("[a-z=&]{0,10}"),
        ) {
            let url = match query {
                Some(q) => format!("{stem}.{ext}?{q}"),
                None => format!("{stem}.{ext}"),
            };
            prop_assert_eq!(classify(&auto(&url)), EntryKind::Audio);
        }
    }
}
