//! Track sources: where a library comes from.
//!
//! Two producers are supported: a recursive directory scan over local audio
//! files (tags read with `lofty`) and a TOML manifest for libraries whose
//! entries are not scannable files (remote previews, pre-curated lists).
//! Both yield the same `Vec<Track>`; the caller owns fallback policy.

use std::error::Error;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use lofty::file::{AudioFile, TaggedFileExt};
use lofty::tag::ItemKey;
use serde::Deserialize;
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::display::display_from_fields;
use super::model::Track;

/// Failure to produce a library from a manifest file.
#[derive(Debug)]
pub enum SourceError {
    Io(io::Error),
    Parse(toml::de::Error),
    /// Two manifest entries claimed the same id.
    DuplicateId(String),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Io(e) => write!(f, "failed to read manifest: {e}"),
            SourceError::Parse(e) => write!(f, "failed to parse manifest: {e}"),
            SourceError::DuplicateId(id) => write!(f, "duplicate track id in manifest: {id}"),
        }
    }
}

impl Error for SourceError {}

impl From<io::Error> for SourceError {
    fn from(e: io::Error) -> Self {
        SourceError::Io(e)
    }
}

impl From<toml::de::Error> for SourceError {
    fn from(e: toml::de::Error) -> Self {
        SourceError::Parse(e)
    }
}

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    tracks: Vec<ManifestTrack>,
}

/// One `[[tracks]]` table in a manifest.
#[derive(Debug, Deserialize)]
struct ManifestTrack {
    id: String,
    title: String,
    #[serde(default)]
    artist: Option<String>,
    #[serde(default)]
    album: Option<String>,
    url: String,
    #[serde(default)]
    artwork: Option<String>,
    #[serde(default)]
    duration_secs: Option<u64>,
}

/// Load a track list from a TOML manifest. Order in the file is library order.
pub fn load_manifest(path: &Path, settings: &LibrarySettings) -> Result<Vec<Track>, SourceError> {
    let text = fs::read_to_string(path)?;
    let manifest: Manifest = toml::from_str(&text)?;

    let mut tracks: Vec<Track> = Vec::with_capacity(manifest.tracks.len());
    for entry in manifest.tracks {
        if tracks.iter().any(|t| t.id == entry.id) {
            return Err(SourceError::DuplicateId(entry.id));
        }

        let display = display_from_fields(
            &entry.url,
            &entry.title,
            entry.artist.as_deref(),
            entry.album.as_deref(),
            &settings.display_fields,
            &settings.display_separator,
        );

        tracks.push(Track {
            id: entry.id,
            title: entry.title,
            artist: entry.artist,
            album: entry.album,
            audio_url: entry.url,
            artwork_url: entry.artwork,
            duration: entry.duration_secs.map(Duration::from_secs),
            display,
        });
    }

    Ok(tracks)
}

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

/// Scan a directory for audio files and build tracks from their tags.
///
/// The track id is the path as scanned (stable for a given tree); files that
/// `lofty` cannot read still become tracks, titled by file stem.
pub fn scan(dir: &Path, settings: &LibrarySettings) -> Vec<Track> {
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
        if !path.is_file()
            || (!settings.include_hidden && is_hidden(path))
            || !is_audio_file(path, settings)
        {
            continue;
        }

        let mut title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("UNKNOWN")
            .to_string();
        let mut artist: Option<String> = None;
        let mut album: Option<String> = None;
        let mut duration: Option<Duration> = None;

        if let Ok(tagged) = lofty::read_from_path(path) {
            duration = Some(tagged.properties().duration());

            if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
                if let Some(v) = tag.get_string(&ItemKey::TrackTitle) {
                    if !v.trim().is_empty() {
                        title = v.to_string();
                    }
                }
                if let Some(v) = tag.get_string(&ItemKey::TrackArtist) {
                    let v = v.trim();
                    if !v.is_empty() {
                        artist = Some(v.to_string());
                    }
                }
                if let Some(v) = tag.get_string(&ItemKey::AlbumTitle) {
                    let v = v.trim();
                    if !v.is_empty() {
                        album = Some(v.to_string());
                    }
                }
            }
        }

        let source = path.display().to_string();
        let display = display_from_fields(
            &source,
            &title,
            artist.as_deref(),
            album.as_deref(),
            &settings.display_fields,
            &settings.display_separator,
        );

        tracks.push(Track {
            id: source.clone(),
            title,
            artist,
            album,
            audio_url: source,
            artwork_url: None,
            duration,
            display,
        });
    }

    tracks.sort_by(|a, b| a.display.to_lowercase().cmp(&b.display.to_lowercase()));
    tracks
}
