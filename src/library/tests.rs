use std::fs;
use std::path::Path;
use std::time::Duration;

use tempfile::tempdir;

use crate::config::LibrarySettings;
use crate::search::Query;

use super::{Collection, RemoteClient, RemoteError, RemoteTrack, Track, file_uri};

fn track(artist: &str, album: &str, year: u32, number: u32, name: &str) -> Track {
    Track {
        uri: format!("file:///music/{artist}/{album}/{name}"),
        path: None,
        name: name.to_string(),
        artist: Some(artist.to_string()),
        album: Some(album.to_string()),
        track: Some(number),
        disc: None,
        year: Some(year),
        duration: None,
        format: None,
    }
}

#[test]
fn sorted_by_artist_first() {
    let collection = Collection::from_tracks(vec![
        track("Zed", "First", 1990, 1, "z1"),
        track("Ann", "Late", 2010, 1, "a1"),
        track("Mid", "Mid", 2000, 1, "m1"),
    ]);

    let artists: Vec<&str> = collection
        .tracks()
        .iter()
        .map(|t| t.artist.as_deref().unwrap())
        .collect();
    assert_eq!(artists, vec!["Ann", "Mid", "Zed"]);
}

#[test]
fn same_artist_ordered_by_year_then_album_then_track() {
    let collection = Collection::from_tracks(vec![
        track("Ann", "Second", 2005, 2, "s2"),
        track("Ann", "Second", 2005, 1, "s1"),
        track("Ann", "First", 2001, 1, "f1"),
        // Same year as Second, album name breaks the tie.
        track("Ann", "Another", 2005, 1, "a1"),
    ]);

    let names: Vec<&str> = collection.tracks().iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["f1", "a1", "s1", "s2"]);
}

#[test]
fn missing_metadata_sorts_before_present() {
    let anonymous = Track {
        artist: None,
        year: None,
        ..track("x", "x", 0, 0, "bare")
    };
    let collection = Collection::from_tracks(vec![track("Ann", "A", 2001, 1, "a1"), anonymous]);

    assert_eq!(collection.tracks()[0].name, "bare");
    assert_eq!(collection.tracks()[1].name, "a1");
}

#[test]
fn sort_order_is_independent_of_discovery_order() {
    let tracks = vec![
        track("Ann", "A", 2001, 2, "a2"),
        track("Bob", "B", 2002, 1, "b1"),
        track("Ann", "A", 2001, 1, "a1"),
        track("Ann", "B", 2003, 1, "ab1"),
    ];
    let mut reversed = tracks.clone();
    reversed.reverse();

    let a = Collection::from_tracks(tracks);
    let b = Collection::from_tracks(reversed);
    for (x, y) in a.tracks().iter().zip(b.tracks()) {
        assert_eq!(**x, **y);
    }
}

#[test]
fn search_preserves_collection_order() {
    let collection = Collection::from_tracks(vec![
        track("Ann", "A", 2001, 1, "Blue Song"),
        track("Bob", "B", 2002, 1, "Red Song"),
        track("Col", "C", 2003, 1, "Bluebird"),
    ]);

    let q = Query::with_default_fields("blue").unwrap();
    let results = collection.search(&q);
    let names: Vec<String> = results.iter().map(|t| t.name.clone()).collect();
    assert_eq!(names, vec!["Blue Song", "Bluebird"]);
}

#[test]
fn scan_filters_by_extension() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("one.mp3"), b"not really audio").unwrap();
    fs::write(dir.path().join("two.flac"), b"not really audio").unwrap();
    fs::write(dir.path().join("notes.txt"), b"skip me").unwrap();

    let collection = Collection::from_directory(dir.path(), &LibrarySettings::default());
    assert_eq!(collection.len(), 2);
    // Junk bytes defeat tag extraction but the files still load with
    // filename-derived defaults.
    for t in collection.tracks() {
        assert!(t.uri.starts_with("file://"));
        assert!(t.artist.is_none());
    }
}

#[test]
fn scan_honours_recursive_setting() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();
    fs::write(dir.path().join("top.mp3"), b"x").unwrap();
    fs::write(sub.join("nested.mp3"), b"x").unwrap();

    let flat = LibrarySettings {
        recursive: false,
        ..LibrarySettings::default()
    };
    assert_eq!(Collection::from_directory(dir.path(), &flat).len(), 1);
    assert_eq!(
        Collection::from_directory(dir.path(), &LibrarySettings::default()).len(),
        2
    );
}

#[test]
fn snapshot_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("collection.json");

    let original = Collection::from_tracks(vec![
        Track {
            duration: Some(Duration::from_secs(241)),
            format: Some("mp3".to_string()),
            disc: Some(1),
            ..track("Ann", "A", 2001, 3, "a3")
        },
        track("Bob", "B", 2002, 1, "b1"),
    ]);
    original.save_snapshot(&path).unwrap();

    let restored = Collection::load_snapshot(&path).unwrap();
    assert_eq!(restored.len(), 2);
    for (a, b) in original.tracks().iter().zip(restored.tracks()) {
        assert_eq!(**a, **b);
    }
}

#[test]
fn snapshot_load_rejects_garbage() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, b"{ not json").unwrap();
    assert!(Collection::load_snapshot(&path).is_err());
}

#[test]
fn file_uri_escapes_spaces_but_not_separators() {
    let uri = file_uri(Path::new("/music/My Band/track 1.mp3"));
    assert_eq!(uri, "file:///music/My%20Band/track%201.mp3");
}

struct FakeRemote {
    fail_connect: bool,
    closed: bool,
}

impl RemoteClient for FakeRemote {
    fn connect(&mut self, host: &str, port: u16, _password: Option<&str>) -> Result<(), RemoteError> {
        if self.fail_connect {
            return Err(RemoteError::Connect {
                host: host.to_string(),
                port,
                reason: "refused".to_string(),
            });
        }
        Ok(())
    }

    fn fetch_tracks(&mut self) -> Result<Vec<RemoteTrack>, RemoteError> {
        Ok(vec![
            RemoteTrack {
                uri: "daap://server/2".to_string(),
                title: "Second".to_string(),
                artist: Some("Bob".to_string()),
                album: None,
                track: None,
                year: None,
                duration_seconds: Some(200),
            },
            RemoteTrack {
                uri: "daap://server/1".to_string(),
                title: "First".to_string(),
                artist: Some("Ann".to_string()),
                album: Some("A".to_string()),
                track: Some(1),
                year: Some(2001),
                duration_seconds: None,
            },
        ])
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

#[test]
fn remote_fetch_builds_sorted_collection() {
    let mut client = FakeRemote {
        fail_connect: false,
        closed: false,
    };
    let collection = Collection::from_remote(&mut client, "localhost", 3689, None).unwrap();

    assert!(client.closed);
    assert_eq!(collection.len(), 2);
    assert_eq!(collection.tracks()[0].name, "First");
    assert_eq!(collection.tracks()[0].duration, None);
    assert_eq!(
        collection.tracks()[1].duration,
        Some(Duration::from_secs(200))
    );
}

#[test]
fn remote_connect_failure_yields_no_collection() {
    let mut client = FakeRemote {
        fail_connect: true,
        closed: false,
    };
    let err = Collection::from_remote(&mut client, "localhost", 3689, None);
    assert!(err.is_err());
}
