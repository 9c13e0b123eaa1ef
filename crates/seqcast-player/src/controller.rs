//! Playback state machine coordinating resolution and the media element.

use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use parking_lot::Mutex;
use seqcast_core::{
    progress_permille, Error, PlaybackRate, Playlist, PlaylistEntry, ResolvedTrack, Result,
};
use seqcast_feed::{TrackResolver, Transport};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::media::{MediaElement, MediaEvent};

/// Past this many seconds, "previous" restarts the current track instead.
const RESTART_THRESHOLD_SECS: f64 = 2.0;

/// Media-side state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaState {
    #[default]
    Idle,
    Loading,
    Ready,
    Playing,
    Paused,
    Ended,
    Error,
}

/// Notifications for the presentation layer. Each is sent after the state
/// change it describes.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// Media state changed.
    StateChanged(MediaState),
    /// The current entry finished resolving, successfully or not.
    TrackChanged { index: usize, display_text: String },
    /// Playback position moved.
    Progress {
        position: f64,
        duration: Option<f64>,
        permille: Option<u16>,
    },
    /// Entries were added, removed, or reset.
    PlaylistChanged,
}

/// Point-in-time copy of the session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub current_index: usize,
    pub loop_enabled: bool,
    pub user_paused: bool,
    pub media_state: MediaState,
    pub current_track: Option<ResolvedTrack>,
    /// "Now playing" text, or the failure reason after a resolution error.
    pub display_text: String,
    pub rate: PlaybackRate,
}

struct Session {
    playlist: Playlist,
    current_index: usize,
    loop_enabled: bool,
    user_paused: bool,
    media_state: MediaState,
    current_track: Option<ResolvedTrack>,
    display_text: String,
    rate: PlaybackRate,
    /// Bumped by every load; a load whose generation is no longer current
    /// discards its result.
    generation: u64,
}

impl Session {
    fn new(playlist: Playlist) -> Self {
        let display_text = playlist
            .get(0)
            .map(|entry| entry.list_title(0))
            .unwrap_or_default();

        Self {
            playlist,
            current_index: 0,
            loop_enabled: false,
            user_paused: true,
            media_state: MediaState::Idle,
            current_track: None,
            display_text,
            rate: PlaybackRate::NORMAL,
            generation: 0,
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            current_index: self.current_index,
            loop_enabled: self.loop_enabled,
            user_paused: self.user_paused,
            media_state: self.media_state,
            current_track: self.current_track.clone(),
            display_text: self.display_text.clone(),
            rate: self.rate,
        }
    }
}

/// Drives one media element through a playlist.
///
/// All methods take `&self`. The session lock is never held across an
/// `.await`, so navigation calls may interleave with a pending resolution;
/// whichever load started last wins.
pub struct PlaybackController<T, M> {
    resolver: TrackResolver<T>,
    media: M,
    session: Mutex<Session>,
    event_tx: Sender<PlayerEvent>,
    event_rx: Receiver<PlayerEvent>,
    shutdown: CancellationToken,
}

impl<T: Transport, M: MediaElement> PlaybackController<T, M> {
    /// Create a controller in the idle state at the first entry, paused.
    pub fn new(resolver: TrackResolver<T>, media: M, playlist: Playlist) -> Self {
        let (event_tx, event_rx) = unbounded();

        Self {
            resolver,
            media,
            session: Mutex::new(Session::new(playlist)),
            event_tx,
            event_rx,
            shutdown: CancellationToken::new(),
        }
    }

    pub const fn media(&self) -> &M {
        &self.media
    }

    pub const fn resolver(&self) -> &TrackResolver<T> {
        &self.resolver
    }

    pub fn session(&self) -> SessionSnapshot {
        self.session.lock().snapshot()
    }

    pub fn playlist(&self) -> Playlist {
        self.session.lock().playlist.clone()
    }

    /// Receiver for controller notifications.
    pub fn events(&self) -> Receiver<PlayerEvent> {
        self.event_rx.clone()
    }

    /// Try to receive a pending notification.
    pub fn try_recv_event(&self) -> Option<PlayerEvent> {
        match self.event_rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    fn emit(&self, event: PlayerEvent) {
        // The controller holds a receiver, so the channel never disconnects
        let _ = self.event_tx.send(event);
    }

    fn set_state(&self, session: &mut Session, state: MediaState) {
        if session.media_state != state {
            debug!("Media state {:?} -> {state:?}", session.media_state);
            session.media_state = state;
            self.emit(PlayerEvent::StateChanged(state));
        }
    }

    /// Abandon any in-flight feed fetch. Later loads fail fast.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Resolve the current entry and bind it to the media element.
    ///
    /// Resolution failures never escape: they move the session to
    /// [`MediaState::Error`] with the reason as display text. A refused
    /// autoplay leaves the session paused.
    pub async fn load_current(&self, autoplay: bool) {
        let (generation, index, entry) = {
            let mut s = self.session.lock();
            s.generation += 1;
            s.current_index = s.playlist.clamp_index(s.current_index);
            let index = s.current_index;
            let Some(entry) = s.playlist.get(index).cloned() else {
                return;
            };
            s.display_text = entry.list_title(index);
            // The previous source must not keep playing (or end) while this
            // entry resolves
            self.media.pause();
            self.set_state(&mut s, MediaState::Loading);
            (s.generation, index, entry)
        };

        debug!("Loading entry {index} ({}), generation {generation}", entry.url);
        let result = self
            .resolver
            .resolve_track_with(&entry, &self.shutdown)
            .await;

        let start_playing = {
            let mut s = self.session.lock();
            if s.generation != generation {
                debug!("Discarding stale resolution for entry {index}");
                return;
            }

            match result {
                Ok(track) => {
                    self.media.set_source(&track.audio_url);
                    self.media.set_playback_rate(s.rate.value());
                    info!("Now playing: {}", track.display_text);

                    s.display_text = track.display_text.clone();
                    s.current_track = Some(track);
                    self.emit(PlayerEvent::TrackChanged {
                        index,
                        display_text: s.display_text.clone(),
                    });
                    self.set_state(&mut s, MediaState::Ready);

                    if autoplay {
                        s.user_paused = false;
                    }
                    autoplay
                }
                Err(Error::Cancelled) => {
                    debug!("Load of entry {index} cancelled");
                    s.user_paused = true;
                    let settled = if self.media.source().is_some() {
                        MediaState::Paused
                    } else {
                        MediaState::Idle
                    };
                    self.set_state(&mut s, settled);
                    return;
                }
                Err(e) => {
                    warn!("Failed to resolve entry {index} ({}): {e}", entry.url);
                    self.media.pause();

                    s.user_paused = true;
                    s.current_track = None;
                    s.display_text = e.to_string();
                    self.emit(PlayerEvent::TrackChanged {
                        index,
                        display_text: s.display_text.clone(),
                    });
                    self.set_state(&mut s, MediaState::Error);
                    false
                }
            }
        };

        if start_playing {
            self.start_playback(generation).await;
        }
    }

    /// Ask the media element to play, reverting to a user-paused state if the
    /// platform refuses.
    async fn start_playback(&self, generation: u64) {
        let result = self.media.play().await;

        let mut s = self.session.lock();
        if s.generation != generation {
            return;
        }
        match result {
            Ok(()) => self.set_state(&mut s, MediaState::Playing),
            Err(e) => {
                debug!("Playback did not start: {e}");
                s.user_paused = true;
                self.set_state(&mut s, MediaState::Paused);
            }
        }
    }

    /// Jump to `index` and load it.
    pub async fn select(&self, index: usize, autoplay: bool) -> Result<()> {
        {
            let mut s = self.session.lock();
            if index >= s.playlist.len() {
                return Err(Error::InvalidArgument(format!(
                    "no playlist entry at index {index}"
                )));
            }
            s.current_index = index;
        }
        self.load_current(autoplay).await;
        Ok(())
    }

    /// Advance to the next entry, wrapping when looping. At the end of a
    /// non-looping playlist, stop and stay on the last entry.
    pub async fn next(&self, autoplay: bool) {
        let advanced = {
            let mut s = self.session.lock();
            if s.current_index < s.playlist.last_index() {
                s.current_index += 1;
                true
            } else if s.loop_enabled {
                s.current_index = 0;
                true
            } else {
                s.user_paused = true;
                self.media.pause();
                self.set_state(&mut s, MediaState::Paused);
                false
            }
        };

        if advanced {
            self.load_current(autoplay).await;
        } else {
            info!("Reached the end of the playlist");
        }
    }

    /// Restart the current track once past the first couple of seconds;
    /// otherwise step back one entry.
    pub async fn previous(&self) {
        if self.media.position() > RESTART_THRESHOLD_SECS {
            self.media.set_position(0.0);
            return;
        }

        let moved = {
            let mut s = self.session.lock();
            if s.current_index > 0 {
                s.current_index -= 1;
                true
            } else if s.loop_enabled {
                s.current_index = s.playlist.last_index();
                true
            } else {
                false
            }
        };

        if moved {
            self.load_current(true).await;
        } else {
            self.media.set_position(0.0);
        }
    }

    /// The media reached its natural end. Advances unless the user paused or
    /// the track was not actually playing.
    pub async fn on_ended(&self) {
        {
            let mut s = self.session.lock();
            if s.user_paused {
                debug!("Ignoring end of track after user pause");
                return;
            }
            if s.media_state != MediaState::Playing {
                debug!("Ignoring end of track while {:?}", s.media_state);
                return;
            }
            self.set_state(&mut s, MediaState::Ended);
        }
        self.next(true).await;
    }

    /// Play if paused, pause if playing. Loads the current entry first when
    /// nothing is bound or the last load failed. Ignored while a load is in
    /// flight.
    pub async fn toggle_play_pause(&self) {
        if self.session.lock().media_state == MediaState::Loading {
            debug!("Ignoring play/pause while loading");
            return;
        }

        let needs_load = self.media.source().is_none()
            || self.session.lock().media_state == MediaState::Error;
        if needs_load {
            self.load_current(false).await;
            if self.media.source().is_none()
                || self.session.lock().media_state == MediaState::Error
            {
                return;
            }
        }

        if self.media.is_paused() {
            let generation = {
                let mut s = self.session.lock();
                s.user_paused = false;
                s.generation
            };
            self.start_playback(generation).await;
        } else {
            let mut s = self.session.lock();
            s.user_paused = true;
            self.media.pause();
            self.set_state(&mut s, MediaState::Paused);
        }
    }

    /// Skip by `delta_seconds`, clamped to the start and known end.
    pub fn seek_relative(&self, delta_seconds: f64) {
        let end = self
            .media
            .duration()
            .filter(|d| d.is_finite() && *d > 0.0)
            .unwrap_or(f64::INFINITY);
        let position = self.media.position();
        let position = if position.is_finite() { position } else { 0.0 };
        let delta = if delta_seconds.is_finite() {
            delta_seconds
        } else {
            0.0
        };

        let target = (position + delta).clamp(0.0, end);
        self.media.set_position(target);
    }

    /// Seek to `permille` thousandths of the duration. No-op until the
    /// duration is known.
    pub fn scrub(&self, permille: u16) {
        let Some(duration) = self.media.duration().filter(|d| d.is_finite() && *d > 0.0) else {
            return;
        };
        let fraction = f64::from(permille.min(1000)) / 1000.0;
        self.media.set_position(duration * fraction);
    }

    /// Set the playback speed. Invalid rates mean normal speed.
    pub fn set_speed(&self, rate: impl Into<PlaybackRate>) {
        let rate = rate.into();
        self.session.lock().rate = rate;
        self.media.set_playback_rate(rate.value());
    }

    pub fn set_loop(&self, enabled: bool) {
        self.session.lock().loop_enabled = enabled;
    }

    /// Feed a media element notification into the state machine.
    pub async fn handle_media_event(&self, event: MediaEvent) {
        match event {
            MediaEvent::TimeUpdate => {
                let position = self.media.position();
                let duration = self.media.duration();
                self.emit(PlayerEvent::Progress {
                    position,
                    duration,
                    permille: progress_permille(position, duration),
                });
            }
            MediaEvent::Play => {
                let mut s = self.session.lock();
                if matches!(
                    s.media_state,
                    MediaState::Ready | MediaState::Paused | MediaState::Ended
                ) {
                    self.set_state(&mut s, MediaState::Playing);
                }
            }
            MediaEvent::Pause => {
                let mut s = self.session.lock();
                if s.media_state == MediaState::Playing {
                    self.set_state(&mut s, MediaState::Paused);
                }
            }
            MediaEvent::Ended => self.on_ended().await,
        }
    }

    /// Append an entry. Returns its index.
    pub fn add_entry(&self, title: &str, url: &str) -> Result<usize> {
        let index = self.session.lock().playlist.add(title, url)?;
        self.emit(PlayerEvent::PlaylistChanged);
        Ok(index)
    }

    /// Append an already-built entry. Returns its index.
    pub fn push_entry(&self, entry: PlaylistEntry) -> Result<usize> {
        let index = self.session.lock().playlist.push(entry)?;
        self.emit(PlayerEvent::PlaylistChanged);
        Ok(index)
    }

    /// Remove an entry and reload whatever is current afterwards, without
    /// autoplay. Removing the last entry restores the default playlist.
    pub async fn remove_entry(&self, index: usize) -> Result<PlaylistEntry> {
        let removed = {
            let mut s = self.session.lock();
            let removed = s.playlist.remove(index).ok_or_else(|| {
                Error::InvalidArgument(format!("no playlist entry at index {index}"))
            })?;
            if index < s.current_index {
                s.current_index -= 1;
            }
            s.current_index = s.playlist.clamp_index(s.current_index);
            removed
        };

        self.emit(PlayerEvent::PlaylistChanged);
        self.load_current(false).await;
        Ok(removed)
    }

    /// Restore the default playlist and load its first entry without autoplay.
    pub async fn reset_playlist(&self) {
        {
            let mut s = self.session.lock();
            s.playlist.reset();
            s.current_index = 0;
        }
        self.emit(PlayerEvent::PlaylistChanged);
        self.load_current(false).await;
    }
}
