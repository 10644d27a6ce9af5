use std::path::Path;

use log::{debug, warn};
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::collection::Collection;
use super::model::{Track, file_uri};
use super::tags::read_tags;

fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Build one track from a local file, falling back to defaults when the
/// tags cannot be read.
fn track_from_file(path: &Path) -> Track {
    let default_name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("UNKNOWN")
        .to_string();

    let tags = match read_tags(path) {
        Ok(tags) => tags,
        Err(err) => {
            warn!("could not read track metadata: {err}");
            Default::default()
        }
    };

    Track {
        uri: file_uri(path),
        path: Some(path.to_path_buf()),
        name: tags.title.unwrap_or(default_name),
        artist: tags.artist,
        album: tags.album,
        track: tags.track,
        disc: tags.disc,
        year: tags.year,
        duration: tags.duration,
        format: tags.format,
    }
}

impl Collection {
    /// Populate a collection by recursively walking `dir`, keeping files
    /// whose extension is in the configured allow-set (case-insensitive).
    /// Discovery order does not matter; the collection sort defines order.
    pub fn from_directory(dir: &Path, settings: &LibrarySettings) -> Self {
        let mut tracks: Vec<Track> = Vec::new();

        let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);

        // Non-recursive = only the root directory.
        let depth_cap = if settings.recursive {
            settings.max_depth
        } else {
            Some(1)
        };
        if let Some(d) = depth_cap {
            walker = walker.max_depth(d);
        }

        for entry in walker
            .into_iter()
            .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
            .filter_map(Result::ok)
        {
            let path = entry.path();
            if path.is_file()
                && (settings.include_hidden || !is_hidden(path))
                && is_audio_file(path, settings)
            {
                debug!("loading {}", path.display());
                tracks.push(track_from_file(path));
            }
        }

        Collection::from_tracks(tracks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_audio_file_matches_configured_extensions_case_insensitive() {
        let settings = LibrarySettings::default();
        assert!(is_audio_file(Path::new("/tmp/a.mp3"), &settings));
        assert!(is_audio_file(Path::new("/tmp/a.MP3"), &settings));
        assert!(is_audio_file(Path::new("/tmp/a.flac"), &settings));
        assert!(is_audio_file(Path::new("/tmp/a.wav"), &settings));
        assert!(is_audio_file(Path::new("/tmp/a.OGG"), &settings));
        assert!(!is_audio_file(Path::new("/tmp/a.txt"), &settings));
        assert!(!is_audio_file(Path::new("/tmp/a"), &settings));
    }

    #[test]
    fn extension_set_tolerates_dots_and_blanks() {
        let settings = LibrarySettings {
            extensions: vec![".Mp3".into(), "  ".into(), "opus".into()],
            ..LibrarySettings::default()
        };
        assert!(is_audio_file(Path::new("/tmp/a.mp3"), &settings));
        assert!(is_audio_file(Path::new("/tmp/a.opus"), &settings));
        assert!(!is_audio_file(Path::new("/tmp/a.flac"), &settings));
    }

    #[test]
    fn unreadable_file_still_becomes_a_track_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.mp3");
        std::fs::write(&path, b"not a real mp3").unwrap();

        let track = track_from_file(&path);
        assert_eq!(track.name, "broken");
        assert!(track.uri.starts_with("file://"));
        assert_eq!(track.artist, None);
        assert_eq!(track.album, None);
        assert_eq!(track.duration, None);
    }
}
