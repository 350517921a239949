use std::env;
use std::path::Path;
use std::sync::mpsc;

use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::config;
use crate::library::{Track, load_manifest, scan};
use crate::mpris::ControlCmd;
use crate::player::{QueueController, RodioSink};

mod event_loop;
mod mpris_sync;
mod settings;
mod startup;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = settings::load_settings();

    let source = env::args().nth(1).unwrap_or_else(|| {
        std::env::current_dir()
            .ok()
            .and_then(|p| p.to_str().map(|s| s.to_string()))
            .unwrap_or_else(|| "Music".to_string())
    });

    let tracks = load_tracks(&source, &settings.library)?;

    let mut controller = QueueController::new(RodioSink::new());
    controller.initialize(tracks);
    let (_sub_id, player_events) = controller.subscribe();

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let mpris = crate::mpris::spawn_mpris(control_tx.clone());

    startup::apply_playback_defaults(&mut controller, &settings);
    mpris_sync::update_mpris(&mpris, &controller.snapshot());

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result = {
        let mut state = event_loop::EventLoopState::new(&controller, &settings);
        event_loop::run(
            &mut terminal,
            &settings,
            &mut controller,
            &mpris,
            &control_tx,
            &control_rx,
            &player_events,
            &mut state,
        )
    };

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    run_result
}

/// A `.toml` argument is a track manifest, anything else is a directory to
/// scan for audio files.
fn load_tracks(
    source: &str,
    library: &config::LibrarySettings,
) -> Result<Vec<Track>, Box<dyn std::error::Error>> {
    let path = Path::new(source);
    if path.extension().and_then(|e| e.to_str()) == Some("toml") {
        Ok(load_manifest(path, library)?)
    } else {
        Ok(scan(path, library))
    }
}
