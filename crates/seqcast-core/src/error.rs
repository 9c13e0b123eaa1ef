//! Error types for Seqcast.

use std::time::Duration;

use thiserror::Error;

/// Result type alias using Seqcast's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Seqcast.
#[derive(Error, Debug)]
pub enum Error {
    // Feed resolution errors
    #[error("Feed fetch failed: {0}")]
    FeedFetch(#[from] HttpError),

    #[error("Feed is not valid XML: {0}")]
    FeedParse(String),

    #[error("Feed has no episodes")]
    EmptyFeed,

    #[error("No playable episode in the first {scanned} feed items")]
    NoEnclosure { scanned: usize },

    #[error("Feed fetch timed out after {0:?}")]
    FeedTimeout(Duration),

    // Playback errors
    #[error("Playback blocked: {0}")]
    PlaybackBlocked(String),

    // Storage errors
    #[error("Playlist store error: {0}")]
    Store(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Generic errors
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Operation cancelled")]
    Cancelled,
}

/// HTTP-specific errors raised while fetching a feed.
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Request failed with status {status}: {message}")]
    StatusError { status: u16, message: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl Error {
    /// Returns true if retrying the same operation later could succeed.
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::FeedTimeout(_)
                | Self::FeedFetch(HttpError::ConnectionFailed(_))
                | Self::FeedFetch(HttpError::StatusError {
                    status: 500..=599,
                    ..
                })
        )
    }

    /// Returns true if this error came out of feed resolution.
    pub const fn is_feed_error(&self) -> bool {
        matches!(
            self,
            Self::FeedFetch(_)
                | Self::FeedParse(_)
                | Self::EmptyFeed
                | Self::NoEnclosure { .. }
                | Self::FeedTimeout(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_retryable() {
        assert!(Error::FeedTimeout(Duration::from_secs(5)).is_retryable());
        assert!(Error::FeedFetch(HttpError::StatusError {
            status: 503,
            message: String::new()
        })
        .is_retryable());
        assert!(!Error::FeedFetch(HttpError::StatusError {
            status: 404,
            message: String::new()
        })
        .is_retryable());
        assert!(!Error::EmptyFeed.is_retryable());
    }

    #[test]
    fn test_feed_error_classification() {
        assert!(Error::NoEnclosure { scanned: 5 }.is_feed_error());
        assert!(Error::FeedParse("bad".into()).is_feed_error());
        assert!(!Error::PlaybackBlocked("gesture".into()).is_feed_error());
        assert!(!Error::Cancelled.is_feed_error());
    }

    #[test]
    fn test_error_display() {
        let err = Error::NoEnclosure { scanned: 5 };
        assert_eq!(
            err.to_string(),
            "No playable episode in the first 5 feed items"
        );
    }
}
