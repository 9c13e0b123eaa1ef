//! # seqcast-player
//!
//! Sequential playback over a single media element.
//!
//! [`PlaybackController`] owns the playback session: which entry is current,
//! whether the playlist loops, and whether the user paused. It resolves each
//! entry as it becomes current and advances automatically when a track ends
//! without a user pause.

pub mod controller;
pub mod media;

pub use controller::{MediaState, PlaybackController, PlayerEvent, SessionSnapshot};
pub use media::{MediaElement, MediaEvent};
