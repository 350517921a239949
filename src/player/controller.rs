//! The playback queue controller.
//!
//! `QueueController` owns the library, the play order, the shuffle/repeat
//! modes and the transport state machine, and mediates every transition
//! between tracks. Audio output is delegated to an injected [`AudioSink`];
//! views (TUI, MPRIS) observe the controller through a subscribe channel and
//! never reach into it.
//!
//! Everything here runs on the owner's thread. Public operations never
//! return errors: anything that can go wrong either degrades to a no-op
//! (empty queue, unknown id) or is reported to observers as a
//! `PlayerNotice`.

use std::sync::mpsc;
use std::time::Duration;

use crate::library::Track;

use super::queue::{natural_order, shuffled_order_pinned};
use super::sink::AudioSink;
use super::types::{
    PlaybackSnapshot, PlayerEvent, PlayerNotice, RepeatMode, SinkEvent, TransportState,
};

/// Handle returned by `subscribe`, used to unsubscribe later.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SubscriberId(usize);

pub struct QueueController<S: AudioSink> {
    library: Vec<Track>,
    /// Play order: indices into `library`. A permutation of the full index
    /// range whenever non-empty (see `play_track_by_id` for the exception).
    queue: Vec<usize>,
    /// Position within `queue`; `None` iff the queue is empty.
    current: Option<usize>,
    shuffle: bool,
    repeat: RepeatMode,
    transport: TransportState,
    volume: f32,
    /// `prev()` restarts the current track instead of moving the queue when
    /// playback is further in than this.
    prev_restart_threshold: Duration,
    sink: S,
    subscribers: Vec<(SubscriberId, mpsc::Sender<PlayerEvent>)>,
    next_subscriber_id: usize,
}

impl<S: AudioSink> QueueController<S> {
    pub fn new(sink: S) -> Self {
        let volume = sink.volume();
        Self {
            library: Vec::new(),
            queue: Vec::new(),
            current: None,
            shuffle: false,
            repeat: RepeatMode::default(),
            transport: TransportState::default(),
            volume,
            prev_restart_threshold: Duration::from_secs(3),
            sink,
            subscribers: Vec::new(),
            next_subscriber_id: 0,
        }
    }

    // --- observer channel ---------------------------------------------------

    /// Register an observer. Events arrive on the returned receiver; drop it
    /// (or call `unsubscribe`) to stop receiving.
    pub fn subscribe(&mut self) -> (SubscriberId, mpsc::Receiver<PlayerEvent>) {
        let id = SubscriberId(self.next_subscriber_id);
        self.next_subscriber_id += 1;
        let (tx, rx) = mpsc::channel();
        self.subscribers.push((id, tx));
        (id, rx)
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) {
        self.subscribers.retain(|(sid, _)| *sid != id);
    }

    fn emit(&mut self, event: PlayerEvent) {
        // Dropped receivers make send fail; prune them as we go.
        self.subscribers
            .retain(|(_, tx)| tx.send(event.clone()).is_ok());
    }

    fn emit_state(&mut self) {
        let snapshot = self.snapshot();
        self.emit(PlayerEvent::StateChanged(snapshot));
    }

    // --- accessors ----------------------------------------------------------

    pub fn tracks(&self) -> &[Track] {
        &self.library
    }

    pub fn queue(&self) -> &[usize] {
        &self.queue
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn repeat(&self) -> RepeatMode {
        self.repeat
    }

    pub fn transport(&self) -> TransportState {
        self.transport
    }

    pub fn queue_position(&self) -> Option<usize> {
        self.current
    }

    /// The track at the current queue position, if any.
    pub fn current_track(&self) -> Option<&Track> {
        let pos = self.current?;
        let library_index = *self.queue.get(pos)?;
        self.library.get(library_index)
    }

    /// Build the full state snapshot observers receive on every change.
    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            current_track: self.current_track().cloned(),
            transport: self.transport,
            position: self.sink.position(),
            duration: self.sink.duration(),
            shuffle: self.shuffle,
            repeat: self.repeat,
            queue_position: self.current,
            queue_len: self.queue.len(),
            volume: self.volume,
        }
    }

    // --- library / queue ----------------------------------------------------

    /// Replace the library. The queue is rebuilt in natural order with the
    /// position at the top; shuffle is cleared because the old permutation
    /// described a library that no longer exists. Does not autoplay. An
    /// empty `tracks` degrades silently to the empty-queue state.
    pub fn initialize(&mut self, tracks: Vec<Track>) {
        self.library = tracks;
        self.queue = natural_order(self.library.len());
        self.current = if self.queue.is_empty() { None } else { Some(0) };
        self.shuffle = false;
        self.transport = TransportState::Idle;
        self.sink.pause();
        self.emit_state();
    }

    /// Make `pos` (clamped into the queue) current and hand its track to the
    /// sink. The sink is only reloaded when the source actually changes, so
    /// re-selecting the playing track does not restart it. A snapshot goes
    /// out before the playback outcome is known.
    pub fn load_track(&mut self, pos: usize, autoplay: bool) {
        if self.queue.is_empty() {
            return;
        }
        let pos = pos.min(self.queue.len() - 1);
        self.current = Some(pos);

        let url = match self.current_track() {
            Some(t) => t.audio_url.clone(),
            None => return,
        };

        let source_changed = self.sink.loaded_source() != Some(url.as_str());
        if source_changed {
            self.sink.load(&url);
            self.transport = TransportState::Loading;
        }
        self.emit_state();

        if autoplay {
            self.play();
        } else if source_changed {
            self.transport = TransportState::Paused;
            self.emit_state();
        }
    }

    // --- transport ----------------------------------------------------------

    /// Ask the sink to start playback. Optimistically `Playing`; if the sink
    /// later reports a rejection for this source, the transport falls back
    /// to `Paused` and observers get a `PlaybackBlocked` notice.
    pub fn play(&mut self) {
        let Some(pos) = self.current else {
            return;
        };
        let loaded = match (self.current_track(), self.sink.loaded_source()) {
            (Some(t), Some(src)) => t.audio_url == src,
            _ => false,
        };
        if !loaded {
            // Nothing (or something else) in the sink: go through load_track,
            // which ends up back here with the source in place.
            self.load_track(pos, true);
            return;
        }

        // After the queue ran out the sink has drained; rewind it or play
        // produces no audio and the next tick reports another finish.
        if self.transport == TransportState::Ended {
            self.sink.seek_to(Duration::ZERO);
        }
        self.sink.play();
        self.transport = TransportState::Playing;
        self.emit_state();
    }

    /// Stop producing sound. Idempotent; always leaves `Paused`.
    pub fn pause(&mut self) {
        if self.current.is_none() {
            return;
        }
        self.sink.pause();
        self.transport = TransportState::Paused;
        self.emit_state();
    }

    pub fn toggle_play(&mut self) {
        match self.transport {
            TransportState::Playing | TransportState::Loading => self.pause(),
            TransportState::Paused | TransportState::Ended | TransportState::Idle => self.play(),
        }
    }

    /// Advance the queue. At the last position this wraps under
    /// `RepeatMode::All` and otherwise stops where it is.
    pub fn next(&mut self) {
        if self.queue.is_empty() {
            return;
        }
        let cur = self.current.unwrap_or(0);
        if cur + 1 < self.queue.len() {
            self.load_track(cur + 1, true);
        } else if self.repeat == RepeatMode::All {
            self.load_track(0, true);
        }
    }

    /// Step back in the queue, unless playback is already more than the
    /// restart threshold into the track, in which case the same track
    /// restarts from zero and the queue position stays put.
    pub fn prev(&mut self) {
        if self.queue.is_empty() {
            return;
        }
        if self.current.is_some() && self.sink.position() > self.prev_restart_threshold {
            self.sink.seek_to(Duration::ZERO);
            self.play();
            return;
        }

        let cur = self.current.unwrap_or(0);
        if cur > 0 {
            self.load_track(cur - 1, true);
        } else if self.repeat == RepeatMode::All {
            self.load_track(self.queue.len() - 1, true);
        }
    }

    /// Seek relative to the current position, clamped into `[0, duration]`.
    /// No-op until the sink has reported a duration.
    pub fn seek_by(&mut self, delta_seconds: i64) {
        if self.current.is_none() {
            return;
        }
        let Some(duration) = self.sink.duration() else {
            return;
        };

        let pos = self.sink.position();
        let target = if delta_seconds >= 0 {
            pos + Duration::from_secs(delta_seconds as u64)
        } else {
            pos.saturating_sub(Duration::from_secs(delta_seconds.unsigned_abs()))
        };
        self.sink.seek_to(target.min(duration));
        self.emit_state();
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.sink.set_volume(self.volume);
        self.emit_state();
    }

    pub fn set_volume_by(&mut self, delta: f32) {
        self.set_volume(self.volume + delta);
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    // --- modes --------------------------------------------------------------

    /// Re-derive the queue for the new shuffle state while keeping the
    /// playing track playing: shuffling pins it to position 0, unshuffling
    /// finds it again by identity in the natural order.
    pub fn toggle_shuffle(&mut self) {
        self.shuffle = !self.shuffle;
        if self.library.is_empty() {
            self.emit_state();
            return;
        }

        let playing_id = self.current_track().map(|t| t.id.clone());

        if self.shuffle {
            let pin = self.current.and_then(|p| self.queue.get(p).copied());
            self.queue = shuffled_order_pinned(self.library.len(), pin);
            self.current = Some(0);
        } else {
            self.queue = natural_order(self.library.len());
            self.current = Some(match playing_id {
                Some(id) => self
                    .queue
                    .iter()
                    .position(|&li| self.library[li].id == id)
                    .unwrap_or(0),
                None => 0,
            });
        }
        self.emit_state();
    }

    /// Off -> All -> One -> Off. Pure state change; takes effect the next
    /// time a queue edge or track end is hit.
    pub fn cycle_repeat(&mut self) {
        self.repeat = self.repeat.next();
        self.emit_state();
    }

    pub fn set_repeat(&mut self, mode: RepeatMode) {
        self.repeat = mode;
        self.emit_state();
    }

    /// Start playing the track with the given id. Unknown ids are a no-op
    /// plus a `TrackNotFound` notice; a track that is in the library but was
    /// dropped from the queue is inserted at the front.
    pub fn play_track_by_id(&mut self, id: &str) {
        let Some(library_index) = self.library.iter().position(|t| t.id == id) else {
            self.emit(PlayerEvent::Notice(PlayerNotice::TrackNotFound {
                id: id.to_string(),
            }));
            return;
        };

        match self.queue.iter().position(|&li| li == library_index) {
            Some(pos) => self.load_track(pos, true),
            None => {
                self.queue.insert(0, library_index);
                self.load_track(0, true);
            }
        }
    }

    // --- sink events --------------------------------------------------------

    /// Drain and apply everything the sink has reported since the last call.
    /// The owner's loop calls this once per tick.
    pub fn process_sink_events(&mut self) {
        while let Some(event) = self.sink.poll_event() {
            self.handle_sink_event(event);
        }
    }

    /// Apply one sink event. Events for a source that is no longer current
    /// are stale completions (the user skipped on before the sink caught
    /// up) and are dropped without any side effect.
    pub fn handle_sink_event(&mut self, event: SinkEvent) {
        let is_current = self
            .current_track()
            .is_some_and(|t| t.audio_url == event.source());
        if !is_current {
            return;
        }

        match event {
            SinkEvent::TimeAdvanced { .. } | SinkEvent::MetadataReady { .. } => {
                // Snapshots read position/duration straight off the sink.
                self.emit_state();
            }
            SinkEvent::Finished { .. } => self.on_track_finished(),
            SinkEvent::Rejected { reason, .. } => {
                self.transport = TransportState::Paused;
                self.emit(PlayerEvent::Notice(PlayerNotice::PlaybackBlocked { reason }));
                self.emit_state();
            }
        }
    }

    fn on_track_finished(&mut self) {
        let Some(cur) = self.current else {
            return;
        };
        match self.repeat {
            RepeatMode::One => {
                self.sink.seek_to(Duration::ZERO);
                self.play();
            }
            _ if cur + 1 < self.queue.len() => self.load_track(cur + 1, true),
            RepeatMode::All => self.load_track(0, true),
            RepeatMode::Off => {
                self.sink.pause();
                self.transport = TransportState::Ended;
                self.emit_state();
            }
        }
    }

    // --- tuning -------------------------------------------------------------

    pub fn set_prev_restart_threshold(&mut self, threshold: Duration) {
        self.prev_restart_threshold = threshold;
    }
}
