//! Tag extraction boundary around `lofty`.
//!
//! The directory populator goes through `read_tags` so that unreadable or
//! corrupt files degrade to a track with default metadata instead of
//! aborting the scan.

use std::path::Path;
use std::time::Duration;

use lofty::error::LoftyError;
use lofty::file::FileType;
use lofty::prelude::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TagError {
    #[error("could not read {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: LoftyError,
    },
}

/// Metadata pulled out of an audio file. Every field is optional; the
/// caller decides the fallbacks.
#[derive(Debug, Default, Clone)]
pub struct FileTags {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub track: Option<u32>,
    pub disc: Option<u32>,
    pub year: Option<u32>,
    pub duration: Option<Duration>,
    pub format: Option<String>,
}

/// Read the tags of a single file.
pub fn read_tags(path: &Path) -> Result<FileTags, TagError> {
    let tagged = lofty::read_from_path(path).map_err(|source| TagError::Unreadable {
        path: path.display().to_string(),
        source,
    })?;

    let mut tags = FileTags {
        duration: Some(tagged.properties().duration()),
        format: format_name(tagged.file_type(), path),
        ..FileTags::default()
    };

    if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
        tags.title = non_empty(tag.get_string(&ItemKey::TrackTitle));
        tags.artist = non_empty(tag.get_string(&ItemKey::TrackArtist));
        tags.album = non_empty(tag.get_string(&ItemKey::AlbumTitle));
        tags.track = parse_number(tag.get_string(&ItemKey::TrackNumber));
        tags.disc = parse_number(tag.get_string(&ItemKey::DiscNumber));
        tags.year = parse_number(tag.get_string(&ItemKey::Year));
    }

    Ok(tags)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_number(value: Option<&str>) -> Option<u32> {
    // Tags like "3/12" carry the total after a slash; only the first part counts.
    value
        .map(str::trim)
        .and_then(|v| v.split('/').next())
        .and_then(|v| v.trim().parse().ok())
}

fn format_name(file_type: FileType, path: &Path) -> Option<String> {
    let name = match file_type {
        FileType::Mpeg => "mp3",
        FileType::Flac => "flac",
        FileType::Vorbis => "ogg",
        FileType::Opus => "opus",
        FileType::Wav => "wav",
        FileType::Mp4 => "m4a",
        FileType::Aac => "aac",
        _ => {
            return path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_ascii_lowercase());
        }
    };
    Some(name.to_string())
}
