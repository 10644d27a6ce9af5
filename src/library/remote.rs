//! Remote library capability.
//!
//! The wire protocol (connection handshake, login, track listing) lives
//! behind the `RemoteClient` trait; this crate only maps the fetched
//! records into its own track model. Remote metadata is already resolved
//! by the server, so no local tag extraction happens here.

use std::time::Duration;

use thiserror::Error;

use super::collection::Collection;
use super::model::Track;

// Most variants belong to client implementations, which live out of tree.
#[allow(dead_code)]
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("could not connect to {host}:{port}: {reason}")]
    Connect {
        host: String,
        port: u16,
        reason: String,
    },
    #[error("authentication rejected by {host}:{port}")]
    Auth { host: String, port: u16 },
    #[error("remote library error: {0}")]
    Protocol(String),
    #[error("no remote library client is configured")]
    NotConfigured,
}

/// One record of a remote track listing.
#[derive(Debug, Clone)]
pub struct RemoteTrack {
    pub uri: String,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub track: Option<u32>,
    pub year: Option<u32>,
    pub duration_seconds: Option<u64>,
}

/// Client for a remote music-sharing server.
pub trait RemoteClient {
    fn connect(&mut self, host: &str, port: u16, password: Option<&str>)
    -> Result<(), RemoteError>;
    fn fetch_tracks(&mut self) -> Result<Vec<RemoteTrack>, RemoteError>;
    fn close(&mut self);
}

impl From<RemoteTrack> for Track {
    fn from(remote: RemoteTrack) -> Self {
        Track {
            uri: remote.uri,
            path: None,
            name: remote.title,
            artist: remote.artist,
            album: remote.album,
            track: remote.track,
            disc: None,
            year: remote.year,
            duration: remote.duration_seconds.map(Duration::from_secs),
            format: None,
        }
    }
}

impl Collection {
    /// Populate a collection from a remote library service. Connection or
    /// authentication failure surfaces as an error and no collection is
    /// created.
    pub fn from_remote(
        client: &mut dyn RemoteClient,
        host: &str,
        port: u16,
        password: Option<&str>,
    ) -> Result<Self, RemoteError> {
        client.connect(host, port, password)?;
        let fetched = client.fetch_tracks();
        client.close();

        let tracks = fetched?.into_iter().map(Track::from).collect();
        Ok(Collection::from_tracks(tracks))
    }
}
