use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::playlist::Playlist;
use crate::search::Query;

use super::model::Track;

/// An immutable, sorted set of tracks.
///
/// A collection is built in one go by a populator (directory walk, remote
/// fetch or snapshot load) and never mutated afterwards; loading again
/// replaces the whole collection.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Collection {
    tracks: Vec<Arc<Track>>,
}

impl Collection {
    /// Wrap and sort a freshly populated track list.
    pub fn from_tracks(tracks: Vec<Track>) -> Self {
        let mut tracks: Vec<Arc<Track>> = tracks.into_iter().map(Arc::new).collect();
        sort_tracks(&mut tracks);
        Self { tracks }
    }

    pub fn tracks(&self) -> &[Arc<Track>] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Return all tracks matching `query` as a playlist, preserving
    /// collection order.
    pub fn search(&self, query: &Query) -> Playlist {
        let mut playlist = Playlist::new();
        playlist.extend(self.tracks.iter().filter(|t| query.matches(t)).cloned());
        playlist
    }
}

/// Successive stable sorts; the last key is the primary order. Final order
/// is by artist, ties broken by year, album, disc, track and uri. Absent
/// values sort before present ones.
fn sort_tracks(tracks: &mut [Arc<Track>]) {
    tracks.sort_by(|a, b| a.uri.cmp(&b.uri));
    tracks.sort_by_key(|t| t.track);
    tracks.sort_by_key(|t| t.disc);
    tracks.sort_by(|a, b| a.album.cmp(&b.album));
    tracks.sort_by_key(|t| t.year);
    tracks.sort_by(|a, b| a.artist.cmp(&b.artist));
}
