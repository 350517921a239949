use std::path::Path;

use crate::config::TrackDisplayField;

/// Build a display string for a track according to the provided `fields` and
/// separator.
///
/// Composes metadata fields (artist, title, album, filename, source) in the
/// configured order and falls back to `title` when no parts were produced.
/// `source` is the track's `audio_url`; filename-ish fields are derived from
/// it, which works for file paths and degrades gracefully for URLs.
pub fn display_from_fields(
    source: &str,
    title: &str,
    artist: Option<&str>,
    album: Option<&str>,
    fields: &[TrackDisplayField],
    sep: &str,
) -> String {
    let mut parts: Vec<String> = Vec::new();

    let push_artist = |parts: &mut Vec<String>| {
        if let Some(a) = artist.map(str::trim).filter(|s| !s.is_empty()) {
            parts.push(a.to_string());
        }
    };
    let push_title = |parts: &mut Vec<String>| {
        if !title.trim().is_empty() {
            parts.push(title.trim().to_string());
        }
    };

    for f in fields {
        match f {
            TrackDisplayField::Display => {
                // If someone includes "display" here, treat it as "artist - title".
                push_artist(&mut parts);
                push_title(&mut parts);
            }
            TrackDisplayField::Title => push_title(&mut parts),
            TrackDisplayField::Artist => push_artist(&mut parts),
            TrackDisplayField::Album => {
                if let Some(a) = album.map(str::trim).filter(|s| !s.is_empty()) {
                    parts.push(a.to_string());
                }
            }
            TrackDisplayField::Filename => {
                if let Some(stem) = Path::new(source).file_stem().and_then(|s| s.to_str()) {
                    if !stem.trim().is_empty() {
                        parts.push(stem.to_string());
                    }
                }
            }
            TrackDisplayField::Source => parts.push(source.to_string()),
        }
    }

    if parts.is_empty() {
        title.to_string()
    } else {
        parts.join(sep)
    }
}
