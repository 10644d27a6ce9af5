//! The playback state machine.
//!
//! A `Player` owns a playlist, a zero-based cursor and a handle to the
//! playback engine, and keeps the three consistent across user commands
//! and asynchronous engine events. Engine events are marshaled onto one
//! pump thread; the pump and the command path share the same mutex, so
//! state mutations never interleave.

use std::fmt;
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::warn;

use crate::engine::{EngineEvent, PlaybackEngine, Transport};
use crate::playlist::Playlist;


/// The player's externally visible state, kept consistent with the
/// engine's transport.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Stopped => "STOPPED",
            Self::Playing => "PLAYING",
            Self::Paused => "PAUSED",
        };
        f.write_str(label)
    }
}

pub struct Player {
    engine: Box<dyn PlaybackEngine>,
    playlist: Playlist,
    state: PlaybackState,
    /// Zero-based playlist cursor, always in `[0, playlist.len()]`.
    cursor: usize,
}

impl Player {
    pub fn new(engine: Box<dyn PlaybackEngine>) -> Self {
        Self {
            engine,
            playlist: Playlist::new(),
            state: PlaybackState::Stopped,
            cursor: 0,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    /// Direct access for order mutations (shuffle, extend, clear). The
    /// cursor keeps pointing at its position, not at a specific track.
    pub fn playlist_mut(&mut self) -> &mut Playlist {
        &mut self.playlist
    }

    /// Replacing the playlist always rewinds to the first track, whatever
    /// the previous playback state.
    pub fn set_playlist(&mut self, playlist: Playlist) {
        self.playlist = playlist;
        self.set_current_track(1);
    }

    /// Current track number, one-based.
    pub fn current_track(&self) -> usize {
        self.cursor + 1
    }

    /// Jump to a track by one-based number, clamped to a minimum of 1.
    ///
    /// Any jump forces the engine idle first. An out-of-range target stops
    /// playback and rewinds; a jump while paused degrades to stopped since
    /// no track is loaded any more.
    pub fn set_current_track(&mut self, number: i64) {
        self.cursor = (number.max(1) - 1) as usize;
        self.engine.set_transport(Transport::Idle);
        if self.cursor >= self.playlist.len() {
            self.stop();
        } else if self.state == PlaybackState::Playing {
            self.play();
        } else if self.state == PlaybackState::Paused {
            self.state = PlaybackState::Stopped;
        }
    }

    pub fn play(&mut self) {
        if self.state == PlaybackState::Paused {
            self.engine.set_transport(Transport::Playing);
            self.state = PlaybackState::Playing;
        } else if self.state == PlaybackState::Playing && self.cursor >= self.playlist.len() {
            // Ran past the end of the playlist: playback is complete.
            self.engine.set_transport(Transport::Idle);
            self.state = PlaybackState::Stopped;
        } else if let Some(track) = self.playlist.get(self.cursor) {
            self.engine.load(&track.uri);
            self.engine.set_transport(Transport::Playing);
            self.state = PlaybackState::Playing;
        }
        // Empty playlist: nothing to do.
    }

    pub fn pause(&mut self) {
        self.engine.set_transport(Transport::Paused);
        self.state = PlaybackState::Paused;
    }

    /// Stop and rewind to the start of the playlist.
    pub fn stop(&mut self) {
        self.engine.set_transport(Transport::Idle);
        self.state = PlaybackState::Stopped;
        self.cursor = 0;
    }

    pub fn next(&mut self, increment: i64) {
        self.set_current_track((self.current_track() as i64).saturating_add(increment));
    }

    pub fn prev(&mut self, decrement: i64) {
        self.set_current_track((self.current_track() as i64).saturating_sub(decrement));
    }

    /// Jump to the first track of the next album in the playlist. Past
    /// the last album this runs off the end, which stops and rewinds.
    pub fn next_album(&mut self) {
        let Some(current) = self.playlist.get(self.cursor) else {
            return;
        };
        let album = current.album.clone();
        let target = self
            .playlist
            .iter()
            .enumerate()
            .skip(self.cursor + 1)
            .find(|(_, t)| t.album != album)
            .map(|(n, _)| n)
            .unwrap_or(self.playlist.len());
        self.set_current_track(target as i64 + 1);
    }

    /// Jump to the first track of the previous album, or the start of the
    /// current album's group when there is none before it.
    pub fn prev_album(&mut self) {
        let Some(current) = self.playlist.get(self.cursor) else {
            return;
        };
        let album = current.album.clone();
        let mut n = self.cursor;
        while n > 0 && self.playlist.get(n - 1).map(|t| &t.album) == Some(&album) {
            n -= 1;
        }
        if n > 0 {
            let prev_album = self.playlist.get(n - 1).map(|t| t.album.clone());
            while n > 0 && self.playlist.get(n - 1).map(|t| t.album.clone()) == prev_album {
                n -= 1;
            }
        }
        self.set_current_track(n as i64 + 1);
    }

    /// Skip to the first of `positions` (zero-based) after the current
    /// track, wrapping back to the first match when none lies ahead.
    pub fn skip_to(&mut self, positions: &[usize]) {
        let target = positions
            .iter()
            .find(|&&p| p > self.cursor)
            .or_else(|| positions.first());
        if let Some(&p) = target {
            self.set_current_track(p as i64 + 1);
        }
    }

    /// Set the volume, silently clamped into `[0.0, 10.0]`. Non-finite
    /// input is ignored; NaN must never reach the sink.
    pub fn set_volume(&mut self, volume: f64) {
        if !volume.is_finite() {
            return;
        }
        self.engine.set_volume(volume.clamp(0.0, 10.0));
    }

    pub fn volume(&self) -> f64 {
        self.engine.volume()
    }

    pub fn mute(&mut self) {
        self.set_volume(0.0);
    }

    /// Seek to an absolute position in seconds. Values beyond what
    /// `Duration` can represent saturate; the engine treats a seek past
    /// the end as end-of-stream.
    pub fn seek(&mut self, seconds: f64) {
        let position = Duration::try_from_secs_f64(seconds.max(0.0)).unwrap_or(Duration::MAX);
        self.engine.seek(position);
    }

    /// Position in seconds, absent when the engine has nothing loaded.
    pub fn position(&self) -> Option<f64> {
        self.engine.position().map(|d| d.as_secs_f64())
    }

    pub fn duration(&self) -> Option<f64> {
        self.engine.duration().map(|d| d.as_secs_f64())
    }

    /// Fast forward by `delta` seconds; a no-op when the position is
    /// unknown.
    pub fn ff(&mut self, delta: f64) {
        if let Some(position) = self.position() {
            self.seek(position + delta);
        }
    }

    /// Rewind by `delta` seconds; a no-op when the position is unknown.
    pub fn rew(&mut self, delta: f64) {
        if let Some(position) = self.position() {
            self.seek((position - delta).max(0.0));
        }
    }

    /// React to an asynchronous engine notification.
    pub fn handle_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::EndOfStream => self.next(1),
            EngineEvent::Error(message) => {
                warn!("playback engine error: {message}");
                self.engine.set_transport(Transport::Idle);
                self.state = PlaybackState::Stopped;
            }
        }
    }

    /// One-line summary of state, cursor, current track and time.
    pub fn status(&self) -> String {
        if self.state == PlaybackState::Stopped {
            return self.state.to_string();
        }
        let Some(track) = self.playlist.get(self.cursor) else {
            return self.state.to_string();
        };

        let mut status = format!(
            "{}: [{}/{}] {}",
            self.state,
            self.cursor + 1,
            self.playlist.len(),
            track
        );
        if let (Some(position), Some(duration)) = (self.position(), self.duration()) {
            status = format!("{status} [{position:.1}/{duration:.1} sec]");
        }
        status
    }
}

/// A player shared between the command loop and the event pump.
pub type SharedPlayer = Arc<Mutex<Player>>;

/// Lock the shared player, recovering from a poisoned lock.
pub fn lock_player(player: &SharedPlayer) -> MutexGuard<'_, Player> {
    player.lock().unwrap_or_else(|e| e.into_inner())
}

/// Drain engine events into the player on a single thread. Each event is
/// applied under the player lock, so auto-advance never races a user
/// command. Ends when the engine side hangs up.
pub fn spawn_event_pump(events: Receiver<EngineEvent>, player: SharedPlayer) -> JoinHandle<()> {
    thread::spawn(move || {
        for event in events {
            lock_player(&player).handle_event(event);
        }
    })
}
