//! Playback engine capability.
//!
//! The player drives an opaque streaming engine through this small
//! interface: load a URI, move the transport, seek, query time, set the
//! volume. The engine reports end-of-stream and errors asynchronously on
//! the event channel handed out at construction; nothing here blocks.

use std::time::Duration;

mod rodio;

pub use self::rodio::RodioEngine;

/// The engine's own play/pause/idle mode, kept consistent with (but
/// distinct from) the player's state.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum Transport {
    #[default]
    Idle,
    Playing,
    Paused,
}

/// Asynchronous notification raised by the engine.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// The loaded track played to completion.
    EndOfStream,
    /// The engine failed; transport is no longer meaningful.
    Error(String),
}

/// Capability interface over the streaming media backend.
///
/// Calls are fire-and-forget handles into the engine and must not block;
/// failures surface later as `EngineEvent::Error`.
pub trait PlaybackEngine: Send {
    /// Point the engine at a new URI. Does not start playback.
    fn load(&mut self, uri: &str);
    fn set_transport(&mut self, transport: Transport);
    fn seek(&mut self, position: Duration);
    /// Current position, or `None` when nothing is loaded.
    fn position(&self) -> Option<Duration>;
    /// Duration of the loaded track, or `None` when unavailable.
    fn duration(&self) -> Option<Duration>;
    fn volume(&self) -> f64;
    fn set_volume(&mut self, volume: f64);
}
