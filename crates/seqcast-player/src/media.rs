//! The media element the controller drives.

use async_trait::async_trait;
use seqcast_core::Result;

/// A single audio output with one bound source.
///
/// Implementations must not call back into the controller from these methods;
/// notifications are delivered separately through
/// [`PlaybackController::handle_media_event`](crate::PlaybackController::handle_media_event).
#[async_trait]
pub trait MediaElement: Send + Sync {
    /// Bind a new source, stopping anything currently playing and resetting
    /// the position to zero.
    fn set_source(&self, url: &str);

    /// Currently bound source, if any.
    fn source(&self) -> Option<String>;

    /// Start or resume playback.
    ///
    /// Returns [`Error::PlaybackBlocked`](seqcast_core::Error::PlaybackBlocked)
    /// when the platform refuses to start audio without user interaction.
    async fn play(&self) -> Result<()>;

    fn pause(&self);

    fn is_paused(&self) -> bool;

    /// Current position in seconds.
    fn position(&self) -> f64;

    fn set_position(&self, seconds: f64);

    /// Total duration in seconds, once known.
    fn duration(&self) -> Option<f64>;

    fn set_playback_rate(&self, rate: f64);
}

/// Notifications emitted by a media element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaEvent {
    /// Position advanced.
    TimeUpdate,
    /// Playback started or resumed.
    Play,
    /// Playback paused.
    Pause,
    /// The source played to its natural end.
    Ended,
}
