use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::config;
use crate::mpris::{ControlCmd, MprisHandle};
use crate::player::{AudioSink, PlayerEvent, PlayerNotice, QueueController, TransportState};
use crate::runtime::mpris_sync::update_mpris;
use crate::ui;

/// How long a player notice stays visible in the status line.
const NOTICE_TTL: Duration = Duration::from_secs(5);

/// State tracked by the runtime event loop across iterations.
pub struct EventLoopState {
    /// Library index of the cursor.
    pub selected: usize,
    /// Whether the cursor chases the playing track.
    pub follow_playback: bool,
    pub metadata_window: bool,
    /// Most recent player notice plus when it arrived.
    notice: Option<(String, Instant)>,
    /// Internal two-key prefix state used for `gg` handling.
    pending_gg: bool,
    pending_zz: bool,
    /// Last-known track id as emitted to MPRIS.
    last_mpris_track: Option<String>,
    /// Last-known transport state as emitted to MPRIS.
    last_mpris_transport: TransportState,
    last_mpris_volume: f32,
}

impl EventLoopState {
    /// Construct a new `EventLoopState` seeded from the controller.
    pub fn new<S: AudioSink>(
        controller: &QueueController<S>,
        settings: &config::Settings,
    ) -> Self {
        Self {
            selected: controller.queue().first().copied().unwrap_or(0),
            follow_playback: settings.ui.follow_playback,
            metadata_window: false,
            notice: None,
            pending_gg: false,
            pending_zz: false,
            last_mpris_track: None,
            last_mpris_transport: controller.transport(),
            last_mpris_volume: controller.volume(),
        }
    }
}

/// Main terminal event loop: handles input, UI drawing, sink event pumping
/// and sync with MPRIS. Returns `Ok(())` when shutdown is requested.
#[allow(clippy::too_many_arguments)]
pub fn run<S: AudioSink>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    controller: &mut QueueController<S>,
    mpris: &MprisHandle,
    control_tx: &mpsc::Sender<ControlCmd>,
    control_rx: &mpsc::Receiver<ControlCmd>,
    player_events: &mpsc::Receiver<PlayerEvent>,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        // Pump completions, time ticks and rejections out of the sink.
        controller.process_sink_events();

        while let Ok(ev) = player_events.try_recv() {
            if let PlayerEvent::Notice(notice) = ev {
                state.notice = Some((notice_text(&notice), Instant::now()));
            }
        }
        if let Some((_, at)) = &state.notice {
            if at.elapsed() > NOTICE_TTL {
                state.notice = None;
            }
        }

        let snapshot = controller.snapshot();

        // Follow now-playing with the cursor unless the user is roaming.
        if state.follow_playback {
            if let Some(idx) = snapshot
                .queue_position
                .and_then(|pos| controller.queue().get(pos))
            {
                state.selected = *idx;
            }
        }

        // Keep MPRIS in sync even when changes come from auto-advance or
        // media keys rather than our own key handling.
        let track_id = snapshot.current_track.as_ref().map(|t| t.id.clone());
        if track_id != state.last_mpris_track
            || snapshot.transport != state.last_mpris_transport
            || snapshot.volume != state.last_mpris_volume
        {
            update_mpris(mpris, &snapshot);
            state.last_mpris_track = track_id;
            state.last_mpris_transport = snapshot.transport;
            state.last_mpris_volume = snapshot.volume;
        }

        let view = ui::ViewState {
            tracks: controller.tracks(),
            queue: controller.queue(),
            selected: state.selected,
            snapshot: &snapshot,
            notice: state.notice.as_ref().map(|(text, _)| text.as_str()),
            follow_playback: state.follow_playback,
            metadata_window: state.metadata_window,
        };
        terminal.draw(|f| ui::draw(f, &view, &settings.ui, &settings.controls))?;

        while let Ok(cmd) = control_rx.try_recv() {
            if handle_control_cmd(cmd, controller, state) {
                return Ok(());
            }
        }

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, settings, controller, control_tx, state) {
                    break;
                }
            }
        }
    }

    Ok(())
}

fn notice_text(notice: &PlayerNotice) -> String {
    match notice {
        PlayerNotice::PlaybackBlocked { reason } => format!("playback blocked: {reason}"),
        PlayerNotice::TrackNotFound { id } => format!("track not found: {id}"),
    }
}

/// Returns `true` when the command requests shutdown.
fn handle_control_cmd<S: AudioSink>(
    cmd: ControlCmd,
    controller: &mut QueueController<S>,
    state: &mut EventLoopState,
) -> bool {
    match cmd {
        ControlCmd::Quit => return true,
        ControlCmd::Play => {
            state.follow_playback = true;
            controller.play();
        }
        ControlCmd::Pause => {
            controller.pause();
        }
        ControlCmd::PlayPause => {
            state.follow_playback = true;
            controller.toggle_play();
        }
        ControlCmd::Stop => {
            controller.pause();
        }
        ControlCmd::Next => {
            state.follow_playback = true;
            controller.next();
        }
        ControlCmd::Prev => {
            state.follow_playback = true;
            controller.prev();
        }
    }

    false
}

/// Move the cursor by `delta` positions through the queue order.
fn move_cursor<S: AudioSink>(
    controller: &QueueController<S>,
    state: &mut EventLoopState,
    delta: isize,
) {
    let queue = controller.queue();
    if queue.is_empty() {
        return;
    }
    let pos = queue
        .iter()
        .position(|&i| i == state.selected)
        .unwrap_or(0) as isize;
    let new_pos = (pos + delta).clamp(0, queue.len() as isize - 1) as usize;
    state.selected = queue[new_pos];
}

/// Returns `true` when the key requests shutdown.
fn handle_key_event<S: AudioSink>(
    key: KeyEvent,
    settings: &config::Settings,
    controller: &mut QueueController<S>,
    control_tx: &mpsc::Sender<ControlCmd>,
    state: &mut EventLoopState,
) -> bool {
    match key.code {
        KeyCode::Char('q') => {
            state.pending_gg = false;
            return true;
        }
        KeyCode::Char('s') => {
            state.pending_gg = false;
            controller.toggle_shuffle();
            // Reselect whatever ended up current so the cursor lands on top of
            // a fresh shuffle order.
            if let Some(idx) = controller
                .queue_position()
                .and_then(|pos| controller.queue().get(pos))
            {
                state.selected = *idx;
            }
        }
        KeyCode::Char('r') => {
            state.pending_gg = false;
            controller.cycle_repeat();
        }
        KeyCode::Char('z') => {
            if state.pending_zz {
                state.pending_zz = false;
                if let Some(idx) = controller
                    .queue_position()
                    .and_then(|pos| controller.queue().get(pos))
                {
                    state.selected = *idx;
                }
            } else {
                state.pending_zz = true;
            }
        }
        KeyCode::Char('g') => {
            if state.pending_gg {
                state.pending_gg = false;
                state.follow_playback = false;
                if let Some(&first) = controller.queue().first() {
                    state.selected = first;
                }
            } else {
                state.pending_gg = true;
            }
        }
        KeyCode::Char('G') => {
            state.pending_gg = false;
            state.follow_playback = false;
            if let Some(&last) = controller.queue().last() {
                state.selected = last;
            }
        }
        KeyCode::Char('j') => {
            state.pending_gg = false;
            state.follow_playback = false;
            move_cursor(controller, state, 1);
        }
        KeyCode::Char('k') => {
            state.pending_gg = false;
            state.follow_playback = false;
            move_cursor(controller, state, -1);
        }
        KeyCode::Enter => {
            state.pending_gg = false;
            let target = controller
                .queue()
                .iter()
                .position(|&i| i == state.selected);
            if let Some(pos) = target {
                let already_playing = controller.transport() == TransportState::Playing
                    && controller.queue_position() == Some(pos);
                if !already_playing {
                    state.follow_playback = true;
                    controller.load_track(pos, true);
                }
            }
        }
        KeyCode::Char('p') | KeyCode::Char(' ') => {
            state.pending_gg = false;
            let _ = control_tx.send(ControlCmd::PlayPause);
        }
        KeyCode::Char('l') => {
            state.pending_gg = false;
            let _ = control_tx.send(ControlCmd::Next);
        }
        KeyCode::Char('h') => {
            state.pending_gg = false;
            let _ = control_tx.send(ControlCmd::Prev);
        }
        KeyCode::Char('L') => {
            state.pending_gg = false;
            let secs = settings.controls.scrub_seconds.min(i64::MAX as u64) as i64;
            controller.seek_by(secs);
        }
        KeyCode::Char('H') => {
            state.pending_gg = false;
            let secs = settings.controls.scrub_seconds.min(i64::MAX as u64) as i64;
            controller.seek_by(-secs);
        }
        KeyCode::Char('-') => {
            state.pending_gg = false;
            controller.set_volume_by(-settings.controls.volume_step);
        }
        KeyCode::Char('=') | KeyCode::Char('+') => {
            state.pending_gg = false;
            controller.set_volume_by(settings.controls.volume_step);
        }
        KeyCode::Char('K') => {
            state.pending_gg = false;
            state.metadata_window = !state.metadata_window;
        }
        KeyCode::Char(_) => {
            // g pending should clear on any other printable char
            state.pending_gg = false;
        }
        _ => {}
    }

    false
}
