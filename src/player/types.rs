//! Player-facing small types: modes, transport states, snapshots and the
//! event enums flowing across the sink and observer boundaries.

use std::time::Duration;

use crate::library::Track;

/// What happens when the queue runs out or a track ends.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RepeatMode {
    /// Stop at the end of the queue.
    Off,
    /// Wrap around to the start of the queue.
    All,
    /// Repeat the current track when it ends.
    One,
}

impl Default for RepeatMode {
    fn default() -> Self {
        Self::Off
    }
}

impl RepeatMode {
    /// The `r` key cycle: Off -> All -> One -> Off.
    pub fn next(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::Off,
        }
    }
}

/// The transport state machine, independent of which track is loaded.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransportState {
    /// Nothing loaded yet.
    Idle,
    /// A track was handed to the sink; playback outcome not yet known.
    Loading,
    Playing,
    Paused,
    /// Queue exhausted with repeat off.
    Ended,
}

impl Default for TransportState {
    fn default() -> Self {
        Self::Idle
    }
}

/// Events a sink reports back to the controller. Every variant names the
/// source it pertains to so the controller can drop stale completions after
/// the user has already skipped elsewhere.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    /// Playback position moved (periodic tick while playing).
    TimeAdvanced { source: String, position: Duration },
    /// The sink learned the track duration.
    MetadataReady { source: String, duration: Duration },
    /// The loaded source played to its end.
    Finished { source: String },
    /// The sink refused to play the source (missing file, decode failure,
    /// no output device).
    Rejected { source: String, reason: String },
}

impl SinkEvent {
    pub fn source(&self) -> &str {
        match self {
            SinkEvent::TimeAdvanced { source, .. }
            | SinkEvent::MetadataReady { source, .. }
            | SinkEvent::Finished { source }
            | SinkEvent::Rejected { source, .. } => source,
        }
    }
}

/// Non-fatal conditions surfaced to observers instead of being thrown.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerNotice {
    /// The sink refused to start playback; transport fell back to `Paused`.
    PlaybackBlocked { reason: String },
    /// `play_track_by_id` was handed an id the library does not contain.
    TrackNotFound { id: String },
}

/// One observer message: either a full state snapshot or a notice.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    StateChanged(PlaybackSnapshot),
    Notice(PlayerNotice),
}

/// Everything a view layer needs to render the player, emitted after every
/// state mutation. Owned data; observers never reach back into the player.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSnapshot {
    pub current_track: Option<Track>,
    pub transport: TransportState,
    pub position: Duration,
    /// `None` until the sink has reported metadata for the current source.
    pub duration: Option<Duration>,
    pub shuffle: bool,
    pub repeat: RepeatMode,
    /// Position within the queue, `None` when the queue is empty.
    pub queue_position: Option<usize>,
    pub queue_len: usize,
    pub volume: f32,
}

impl Default for PlaybackSnapshot {
    fn default() -> Self {
        Self {
            current_track: None,
            transport: TransportState::Idle,
            position: Duration::ZERO,
            duration: None,
            shuffle: false,
            repeat: RepeatMode::Off,
            queue_position: None,
            queue_len: 0,
            volume: 1.0,
        }
    }
}
