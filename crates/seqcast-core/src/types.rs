//! Core domain types for Seqcast.

pub mod common;
pub mod entry;
pub mod playlist;

pub use common::{format_clock, progress_permille, PlaybackRate};
pub use entry::{EntryKind, PlaylistEntry, ResolvedTrack};
pub use playlist::{default_entries, Playlist};
