use std::fmt;
use std::sync::Arc;

use rand::seq::SliceRandom;

use crate::library::Track;
use crate::search::Query;

/// An ordered, mutable sequence of tracks. Insertion order is the playback
/// order; duplicates are allowed.
#[derive(Debug, Default, Clone)]
pub struct Playlist {
    tracks: Vec<Arc<Track>>,
}

impl Playlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<Track>> {
        self.tracks.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Track>> {
        self.tracks.iter()
    }

    #[allow(dead_code)]
    pub fn push(&mut self, track: Arc<Track>) {
        self.tracks.push(track);
    }

    pub fn extend(&mut self, tracks: impl IntoIterator<Item = Arc<Track>>) {
        self.tracks.extend(tracks);
    }

    /// Uniform random permutation of the whole sequence.
    pub fn shuffle(&mut self) {
        self.tracks.shuffle(&mut rand::rng());
    }

    /// Randomize the order of albums while keeping the track order within
    /// each album untouched. Tracks without an album form their own group.
    pub fn shuffle_albums(&mut self) {
        let mut groups: Vec<(Option<String>, Vec<Arc<Track>>)> = Vec::new();
        for track in self.tracks.drain(..) {
            match groups.iter_mut().find(|(album, _)| *album == track.album) {
                Some((_, group)) => group.push(track),
                None => groups.push((track.album.clone(), vec![track])),
            }
        }

        groups.shuffle(&mut rand::rng());
        for (_, group) in groups {
            self.tracks.extend(group);
        }
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    /// Positions of all tracks matching `query`, in playlist order.
    /// Positions rather than tracks, since playlist order is what callers
    /// like skip-to care about.
    pub fn search(&self, query: &Query) -> Vec<usize> {
        self.tracks
            .iter()
            .enumerate()
            .filter(|(_, t)| query.matches(t))
            .map(|(n, _)| n)
            .collect()
    }
}

impl fmt::Display for Playlist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (n, track) in self.tracks.iter().enumerate() {
            if n > 0 {
                writeln!(f)?;
            }
            write!(f, "{}: {}", n + 1, track)?;
        }
        Ok(())
    }
}
