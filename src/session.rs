//! Session state: one collection, one shared player, per process.
//!
//! The session replaces any module-level singletons: the shell borrows it
//! and every command goes through here. The player sits behind a mutex
//! shared with the engine event pump (see `player::spawn_event_pump`).

use std::path::Path;
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};

use crate::config::Settings;
use crate::engine::{EngineEvent, PlaybackEngine};
use crate::library::{Collection, RemoteClient, RemoteError, SnapshotError};
use crate::player::{Player, SharedPlayer, lock_player, spawn_event_pump};

pub struct Session {
    settings: Settings,
    collection: Option<Collection>,
    player: SharedPlayer,
    remote: Option<Box<dyn RemoteClient>>,
}

impl Session {
    pub fn new(
        settings: Settings,
        engine: Box<dyn PlaybackEngine>,
        events: Receiver<EngineEvent>,
    ) -> Self {
        let player: SharedPlayer = Arc::new(Mutex::new(Player::new(engine)));
        lock_player(&player).set_volume(settings.player.volume);
        spawn_event_pump(events, player.clone());

        Self {
            settings,
            collection: None,
            player,
            remote: None,
        }
    }

    /// Install the remote library client used by `load_remote`.
    #[allow(dead_code)]
    pub fn set_remote_client(&mut self, client: Box<dyn RemoteClient>) {
        self.remote = Some(client);
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn collection(&self) -> Option<&Collection> {
        self.collection.as_ref()
    }

    /// Run `f` with the player locked. Engine events wait on the same
    /// lock, so commands and auto-advance never interleave.
    pub fn with_player<R>(&self, f: impl FnOnce(&mut Player) -> R) -> R {
        f(&mut lock_player(&self.player))
    }

    /// Replace the collection with a directory scan. Returns the number
    /// of tracks loaded.
    pub fn load_directory(&mut self, dir: &Path) -> usize {
        let collection = Collection::from_directory(dir, &self.settings.library);
        let count = collection.len();
        self.collection = Some(collection);
        count
    }

    /// Replace the collection with a remote library fetch.
    pub fn load_remote(
        &mut self,
        host: &str,
        port: u16,
        password: Option<&str>,
    ) -> Result<usize, RemoteError> {
        let client = self.remote.as_deref_mut().ok_or(RemoteError::NotConfigured)?;
        let collection = Collection::from_remote(client, host, port, password)?;
        let count = collection.len();
        self.collection = Some(collection);
        Ok(count)
    }

    pub fn save_collection(&self, path: &Path) -> Result<(), SnapshotError> {
        match &self.collection {
            Some(collection) => collection.save_snapshot(path),
            None => Ok(()),
        }
    }

    pub fn load_collection(&mut self, path: &Path) -> Result<usize, SnapshotError> {
        let collection = Collection::load_snapshot(path)?;
        let count = collection.len();
        self.collection = Some(collection);
        Ok(count)
    }
}
