use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::search::SearchField;

/// A single playable track with its metadata.
///
/// `uri` and `name` are always populated; every other field defaults to
/// absent when metadata extraction fails or the source does not carry it.
/// Tracks are created by a collection populator and read-only afterwards;
/// playlists share them through `Arc<Track>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub uri: String,
    pub path: Option<PathBuf>,
    pub name: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub track: Option<u32>,
    pub disc: Option<u32>,
    pub year: Option<u32>,
    pub duration: Option<Duration>,
    pub format: Option<String>,
}

impl Track {
    /// Value of a searchable field, or `None` when the track does not
    /// carry it. Absent fields never match a search.
    pub fn field(&self, field: SearchField) -> Option<&str> {
        let value = match field {
            SearchField::Name => Some(self.name.as_str()),
            SearchField::Artist => self.artist.as_deref(),
            SearchField::Album => self.album.as_deref(),
            SearchField::Format => self.format.as_deref(),
            SearchField::Filename => self
                .path
                .as_deref()
                .and_then(Path::file_name)
                .and_then(|n| n.to_str()),
        };
        value.filter(|v| !v.is_empty())
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(artist) = &self.artist {
            write!(f, "{artist} - ")?;
        }
        if let Some(album) = &self.album {
            write!(f, "{album}")?;
            if let Some(year) = self.year {
                write!(f, " ({year})")?;
            }
            write!(f, " - ")?;
        }
        if let Some(track) = self.track {
            write!(f, "{track} - ")?;
        }
        write!(f, "{}", self.name)?;
        if let Some(duration) = self.duration {
            write!(f, " [{:.2}]", duration.as_secs_f64())?;
        }
        if let Some(format) = &self.format {
            write!(f, " ({format})")?;
        }
        Ok(())
    }
}

/// Build a `file://` URI for a local path, percent-encoding everything
/// except the path separators.
pub fn file_uri(path: &Path) -> String {
    let raw = path.to_string_lossy();
    let encoded = urlencoding::encode(&raw).replace("%2F", "/");
    format!("file://{encoded}")
}
