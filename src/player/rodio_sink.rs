//! `RodioSink`: the production [`AudioSink`] backed by `rodio`.
//!
//! A worker thread owns the `OutputStream` and the current `rodio::Sink`;
//! commands arrive over an mpsc channel and outcomes flow back as
//! [`SinkEvent`]s. Elapsed time is tracked with an `Instant` plus the time
//! accumulated across pauses; seeking rebuilds the sink with
//! `Source::skip_duration`, which works for the common formats. End of
//! track is detected by `Sink::empty()` on the command-timeout tick.
//!
//! Nothing in here panics on bad media or a missing output device: those
//! conditions surface as `SinkEvent::Rejected` when playback is attempted.

use std::fs::File;
use std::io::BufReader;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};

use super::sink::AudioSink;
use super::types::SinkEvent;

const TICK: Duration = Duration::from_millis(200);

#[derive(Debug)]
enum SinkCmd {
    Load(String),
    Play,
    Pause,
    SeekTo(Duration),
    SetVolume(f32),
    Quit,
}

/// State shared between the handle and the worker thread so that
/// `position()`/`duration()` reads never block on audio work.
#[derive(Debug, Default)]
struct Shared {
    accumulated: Duration,
    started_at: Option<Instant>,
    duration: Option<Duration>,
    volume: f32,
}

impl Shared {
    fn position(&self) -> Duration {
        self.accumulated + self.started_at.map_or(Duration::ZERO, |t| t.elapsed())
    }
}

pub struct RodioSink {
    tx: Sender<SinkCmd>,
    events: Receiver<SinkEvent>,
    shared: Arc<Mutex<Shared>>,
    /// Mirror of the last `load`ed url; lets `loaded_source` hand out a
    /// borrow without going through the mutex.
    loaded: Option<String>,
}

impl RodioSink {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel::<SinkCmd>();
        let (event_tx, events) = mpsc::channel::<SinkEvent>();
        let shared = Arc::new(Mutex::new(Shared {
            volume: 1.0,
            ..Shared::default()
        }));

        let shared_for_thread = shared.clone();
        thread::spawn(move || worker(rx, event_tx, shared_for_thread));

        Self {
            tx,
            events,
            shared,
            loaded: None,
        }
    }

    fn with_shared<T>(&self, f: impl FnOnce(&Shared) -> T) -> T {
        // A poisoned mutex means the worker died mid-update; fall back to a
        // default view rather than propagating the panic.
        match self.shared.lock() {
            Ok(s) => f(&s),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }
}

impl Default for RodioSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RodioSink {
    fn drop(&mut self) {
        let _ = self.tx.send(SinkCmd::Quit);
    }
}

impl AudioSink for RodioSink {
    fn load(&mut self, url: &str) {
        self.loaded = Some(url.to_string());
        if let Ok(mut s) = self.shared.lock() {
            s.accumulated = Duration::ZERO;
            s.started_at = None;
            s.duration = None;
        }
        let _ = self.tx.send(SinkCmd::Load(url.to_string()));
    }

    fn play(&mut self) {
        let _ = self.tx.send(SinkCmd::Play);
    }

    fn pause(&mut self) {
        let _ = self.tx.send(SinkCmd::Pause);
    }

    fn seek_to(&mut self, position: Duration) {
        let _ = self.tx.send(SinkCmd::SeekTo(position));
    }

    fn set_volume(&mut self, volume: f32) {
        if let Ok(mut s) = self.shared.lock() {
            s.volume = volume;
        }
        let _ = self.tx.send(SinkCmd::SetVolume(volume));
    }

    fn position(&self) -> Duration {
        self.with_shared(|s| s.position())
    }

    fn duration(&self) -> Option<Duration> {
        self.with_shared(|s| s.duration)
    }

    fn volume(&self) -> f32 {
        self.with_shared(|s| s.volume)
    }

    fn loaded_source(&self) -> Option<&str> {
        // The handle mirrors the source it last sent; reading through the
        // mutex would force an owned return, so keep a borrow-friendly copy.
        self.loaded.as_deref()
    }

    fn poll_event(&mut self) -> Option<SinkEvent> {
        self.events.try_recv().ok()
    }
}

/// Open + decode a source and prepare a paused sink at `start_at`.
/// Returns the sink and the decoder-reported total duration.
fn build_sink(
    stream: &OutputStream,
    path: &str,
    start_at: Duration,
    volume: f32,
) -> Result<(Sink, Option<Duration>), String> {
    let file = File::open(path).map_err(|e| format!("failed to open {path}: {e}"))?;
    let decoder =
        Decoder::new(BufReader::new(file)).map_err(|e| format!("failed to decode {path}: {e}"))?;
    let total = decoder.total_duration();

    let sink = Sink::connect_new(stream.mixer());
    sink.set_volume(volume);
    // `skip_duration` is the seeking primitive; Duration::ZERO is fine.
    sink.append(decoder.skip_duration(start_at));
    sink.pause();
    Ok((sink, total))
}

fn worker(rx: Receiver<SinkCmd>, events: Sender<SinkEvent>, shared: Arc<Mutex<Shared>>) {
    let stream = match OutputStreamBuilder::open_default_stream() {
        Ok(mut s) => {
            // rodio logs to stderr when OutputStream is dropped. That's useful
            // in debugging, but noisy for a TUI app.
            s.log_on_drop(false);
            Some(s)
        }
        Err(_) => None,
    };

    let mut sink: Option<Sink> = None;
    let mut source: Option<String> = None;
    let mut paused = true;
    // Reason the source cannot play, reported when playback is attempted.
    let mut load_error: Option<String> = None;

    let set_shared = |f: &dyn Fn(&mut Shared)| {
        if let Ok(mut s) = shared.lock() {
            f(&mut s);
        }
    };

    loop {
        match rx.recv_timeout(TICK) {
            Ok(SinkCmd::Load(url)) => {
                if let Some(old) = sink.take() {
                    old.stop();
                }
                paused = true;
                load_error = None;
                source = Some(url.clone());

                let volume = shared.lock().map(|s| s.volume).unwrap_or(1.0);
                match stream.as_ref() {
                    Some(stream) => match build_sink(stream, &url, Duration::ZERO, volume) {
                        Ok((new_sink, total)) => {
                            set_shared(&|s| {
                                s.accumulated = Duration::ZERO;
                                s.started_at = None;
                                s.duration = total;
                            });
                            if let Some(total) = total {
                                let _ = events.send(SinkEvent::MetadataReady {
                                    source: url.clone(),
                                    duration: total,
                                });
                            }
                            sink = Some(new_sink);
                        }
                        Err(reason) => load_error = Some(reason),
                    },
                    None => load_error = Some("no audio output device".to_string()),
                }
            }

            Ok(SinkCmd::Play) => {
                if let Some(ref s) = sink {
                    s.play();
                    paused = false;
                    set_shared(&|s| s.started_at = Some(Instant::now()));
                } else if let Some(src) = source.clone() {
                    let reason = load_error
                        .clone()
                        .unwrap_or_else(|| "no source loaded".to_string());
                    let _ = events.send(SinkEvent::Rejected {
                        source: src,
                        reason,
                    });
                }
            }

            Ok(SinkCmd::Pause) => {
                if let Some(ref s) = sink {
                    s.pause();
                }
                paused = true;
                set_shared(&|s| {
                    if let Some(st) = s.started_at.take() {
                        s.accumulated += st.elapsed();
                    }
                });
            }

            Ok(SinkCmd::SeekTo(target)) => {
                let (Some(stream), Some(src)) = (stream.as_ref(), source.clone()) else {
                    continue;
                };
                if sink.is_none() {
                    continue;
                }

                let (duration, volume) = shared
                    .lock()
                    .map(|s| (s.duration, s.volume))
                    .unwrap_or((None, 1.0));
                let target = duration.map_or(target, |d| target.min(d));

                if let Some(old) = sink.take() {
                    old.stop();
                }
                match build_sink(stream, &src, target, volume) {
                    Ok((new_sink, _)) => {
                        if !paused {
                            new_sink.play();
                        }
                        set_shared(&|s| {
                            s.accumulated = target;
                            s.started_at = if paused { None } else { Some(Instant::now()) };
                        });
                        sink = Some(new_sink);
                    }
                    Err(reason) => {
                        load_error = Some(reason.clone());
                        let _ = events.send(SinkEvent::Rejected {
                            source: src,
                            reason,
                        });
                    }
                }
            }

            Ok(SinkCmd::SetVolume(v)) => {
                if let Some(ref s) = sink {
                    s.set_volume(v);
                }
            }

            Ok(SinkCmd::Quit) => {
                if let Some(ref s) = sink {
                    s.stop();
                }
                break;
            }

            Err(RecvTimeoutError::Timeout) => {
                let Some(src) = source.clone() else { continue };
                if paused {
                    continue;
                }
                if let Some(ref s) = sink {
                    if s.empty() {
                        // Played to the end. Park the elapsed clock at the
                        // track length and report.
                        paused = true;
                        set_shared(&|s| {
                            if let Some(st) = s.started_at.take() {
                                s.accumulated += st.elapsed();
                            }
                            if let Some(d) = s.duration {
                                s.accumulated = d;
                            }
                        });
                        let _ = events.send(SinkEvent::Finished { source: src });
                    } else {
                        let position = shared.lock().map(|s| s.position()).unwrap_or_default();
                        let _ = events.send(SinkEvent::TimeAdvanced {
                            source: src,
                            position,
                        });
                    }
                }
            }

            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}
