//! Library model types: the immutable `Track` value.

use std::time::Duration;

/// A playable track. Identity is `id`; every lookup in the player goes
/// through it, so it must be unique and stable for the lifetime of the
/// library that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    /// Unique, stable identifier (manifest id or canonical file path).
    pub id: String,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    /// Whatever the audio sink knows how to open: a file path today,
    /// an http(s) URL if the sink grows a streaming backend.
    pub audio_url: String,
    /// Optional cover art location, surfaced over MPRIS as `mpris:artUrl`.
    pub artwork_url: Option<String>,
    /// Tagged duration; `None` when the source did not carry one.
    pub duration: Option<Duration>,
    /// Precomputed display string for lists and the now-playing line.
    pub display: String,
}
