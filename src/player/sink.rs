//! The `AudioSink` capability: everything the player asks of an audio
//! backend, and nothing else.
//!
//! The controller never blocks on the sink. Commands apply immediately from
//! the controller's point of view; anything whose outcome is uncertain
//! (chiefly `play`) reports back later through `poll_event`, tagged with the
//! source it pertains to.

use std::time::Duration;

use super::types::SinkEvent;

pub trait AudioSink {
    /// Replace the loaded source. Resets position to zero; a failure to
    /// open/decode surfaces later as `SinkEvent::Rejected`.
    fn load(&mut self, url: &str);

    /// Request playback of the loaded source. Optimistic: rejection arrives
    /// as a `SinkEvent::Rejected` rather than a return value.
    fn play(&mut self);

    /// Stop producing sound. Synchronous and idempotent.
    fn pause(&mut self);

    /// Move the play position. Callers clamp; sinks may additionally clamp
    /// to the real media length.
    fn seek_to(&mut self, position: Duration);

    /// Set output volume in `[0, 1]` (pre-clamped by the caller).
    fn set_volume(&mut self, volume: f32);

    fn position(&self) -> Duration;

    /// Media duration, once known.
    fn duration(&self) -> Option<Duration>;

    fn volume(&self) -> f32;

    /// The url most recently handed to `load`, if any. Used to skip
    /// redundant reloads of the already-loaded source.
    fn loaded_source(&self) -> Option<&str>;

    /// Drain one pending sink event, if any.
    fn poll_event(&mut self) -> Option<SinkEvent>;
}
