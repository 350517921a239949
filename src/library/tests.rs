use super::*;
use crate::config::{LibrarySettings, TrackDisplayField};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::tempdir;

fn fields() -> [TrackDisplayField; 2] {
    [TrackDisplayField::Artist, TrackDisplayField::Title]
}

#[test]
fn display_from_fields_can_format_artist_title() {
    let src = "/tmp/Song.mp3";
    assert_eq!(
        display_from_fields(src, "Song", Some("Artist"), None, &fields(), " - "),
        "Artist - Song"
    );
    assert_eq!(
        display_from_fields(src, "Song", Some("  Artist  "), None, &fields(), " - "),
        "Artist - Song"
    );
    assert_eq!(
        display_from_fields(src, "Song", None, None, &fields(), " - "),
        "Song"
    );
}

#[test]
fn display_from_fields_filename_uses_source_stem() {
    assert_eq!(
        display_from_fields(
            "/music/tracks/Take Five.flac",
            "",
            None,
            None,
            &[TrackDisplayField::Filename],
            " - ",
        ),
        "Take Five"
    );
}

#[test]
fn display_from_fields_falls_back_to_title_when_empty() {
    assert_eq!(
        display_from_fields("/tmp/x.mp3", "Song", None, None, &[TrackDisplayField::Album], " - "),
        "Song"
    );
}

#[test]
fn load_manifest_builds_tracks_in_file_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tracks.toml");
    fs::write(
        &path,
        r#"
[[tracks]]
id = "t1"
title = "First"
artist = "Someone"
url = "https://cdn.example/previews/1.mp3"
artwork = "https://cdn.example/art/1.jpg"
duration_secs = 30

[[tracks]]
id = "t2"
title = "Second"
url = "/music/second.ogg"
"#,
    )
    .unwrap();

    let tracks = load_manifest(&path, &LibrarySettings::default()).unwrap();
    assert_eq!(tracks.len(), 2);

    assert_eq!(tracks[0].id, "t1");
    assert_eq!(tracks[0].display, "Someone - First");
    assert_eq!(tracks[0].audio_url, "https://cdn.example/previews/1.mp3");
    assert_eq!(
        tracks[0].artwork_url.as_deref(),
        Some("https://cdn.example/art/1.jpg")
    );
    assert_eq!(tracks[0].duration, Some(Duration::from_secs(30)));

    assert_eq!(tracks[1].id, "t2");
    assert_eq!(tracks[1].artist, None);
    assert_eq!(tracks[1].artwork_url, None);
    assert_eq!(tracks[1].duration, None);
}

#[test]
fn load_manifest_rejects_duplicate_ids() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tracks.toml");
    fs::write(
        &path,
        r#"
[[tracks]]
id = "dup"
title = "A"
url = "/a.mp3"

[[tracks]]
id = "dup"
title = "B"
url = "/b.mp3"
"#,
    )
    .unwrap();

    match load_manifest(&path, &LibrarySettings::default()) {
        Err(SourceError::DuplicateId(id)) => assert_eq!(id, "dup"),
        other => panic!("expected DuplicateId, got {other:?}"),
    }
}

#[test]
fn load_manifest_reports_parse_errors() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tracks.toml");
    fs::write(&path, "not [valid toml").unwrap();

    assert!(matches!(
        load_manifest(&path, &LibrarySettings::default()),
        Err(SourceError::Parse(_))
    ));
}

#[test]
fn scan_filters_non_audio_and_sorts_by_display_case_insensitive() {
    let dir = tempdir().unwrap();

    fs::write(dir.path().join("b.MP3"), b"not a real mp3").unwrap();
    fs::write(dir.path().join("A.ogg"), b"not a real ogg").unwrap();
    fs::write(dir.path().join("c.txt"), b"ignore me").unwrap();

    let tracks = scan(dir.path(), &LibrarySettings::default());
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0].title, "A");
    assert_eq!(tracks[1].title, "b");
    // Scanned tracks are identified by their path.
    assert_eq!(tracks[0].id, tracks[0].audio_url);
    assert!(Path::new(&tracks[0].audio_url).ends_with("A.ogg"));
}

#[test]
fn scan_respects_extension_settings() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("keep.opus"), b"x").unwrap();
    fs::write(dir.path().join("drop.mp3"), b"x").unwrap();

    let settings = LibrarySettings {
        extensions: vec!["opus".into()],
        ..LibrarySettings::default()
    };
    let tracks = scan(dir.path(), &settings);
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].title, "keep");
}

#[test]
fn scan_can_skip_hidden_files() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(".hidden.mp3"), b"x").unwrap();
    fs::write(dir.path().join("visible.mp3"), b"x").unwrap();

    let settings = LibrarySettings {
        include_hidden: false,
        ..LibrarySettings::default()
    };
    let tracks = scan(dir.path(), &settings);
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].title, "visible");
}

#[test]
fn scan_non_recursive_stays_in_root() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("sub").join("deep.mp3"), b"x").unwrap();
    fs::write(dir.path().join("top.mp3"), b"x").unwrap();

    let settings = LibrarySettings {
        recursive: false,
        ..LibrarySettings::default()
    };
    let tracks = scan(dir.path(), &settings);
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].title, "top");
}
