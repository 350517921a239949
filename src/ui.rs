//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Padding, Paragraph, Wrap},
};
use std::{collections::BTreeMap, path::Path, sync::LazyLock, time::Duration};

use crate::config::{ControlsSettings, TimeField, TrackDisplayField, UiSettings};
use crate::library::Track;
use crate::player::{PlaybackSnapshot, RepeatMode, TransportState};

static CONTROLS_MAP: LazyLock<BTreeMap<String, String>> = LazyLock::new(|| {
    let mut map: BTreeMap<String, String> = BTreeMap::new();
    map.insert("j/k".to_string(), "up/down".to_string());
    map.insert("gg/G".to_string(), "top/bottom".to_string());
    map.insert("enter".to_string(), "play selected track".to_string());
    map.insert("space/p".to_string(), "play/pause".to_string());
    map.insert("h/l".to_string(), "prev/next track".to_string());
    // H/L is filled dynamically from config.
    map.insert("s".to_string(), "shuffle".to_string());
    map.insert("r".to_string(), "repeat mode".to_string());
    map.insert("-/=".to_string(), "volume".to_string());
    map.insert("K".to_string(), "metadata".to_string());
    map.insert("q".to_string(), "quit".to_string());
    map
});

/// Everything the renderer needs for one frame.
pub struct ViewState<'a> {
    pub tracks: &'a [Track],
    /// Library indices in presentation order (the playback queue).
    pub queue: &'a [usize],
    /// Library index of the cursor.
    pub selected: usize,
    pub snapshot: &'a PlaybackSnapshot,
    /// Most recent player notice, if one is still on screen.
    pub notice: Option<&'a str>,
    pub follow_playback: bool,
    pub metadata_window: bool,
}

/// Render the controls help text, incorporating scrub seconds.
fn controls_text(scrub_seconds: u64) -> String {
    // Keep the rendered order stable and human-friendly.
    let order = [
        "j/k", "h/l", "H/L", "enter", "space/p", "gg/G", "K", "s", "r", "-/=", "q",
    ];
    order
        .iter()
        .filter_map(|k| {
            if *k == "H/L" {
                Some(format!("[H/L] scrub -/+{}s", scrub_seconds))
            } else {
                CONTROLS_MAP.get(*k).map(|v| format!("[{}] {}", k, v))
            }
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Format a `Duration` as `MM:SS`.
fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Build the "now playing" track text according to `ui` settings.
fn now_playing_track_text(track: &Track, ui: &UiSettings) -> String {
    let mut parts: Vec<String> = Vec::new();

    for f in &ui.now_playing_track_fields {
        match f {
            TrackDisplayField::Display => {
                if !track.display.trim().is_empty() {
                    parts.push(track.display.clone());
                }
            }
            TrackDisplayField::Title => {
                if !track.title.trim().is_empty() {
                    parts.push(track.title.clone());
                }
            }
            TrackDisplayField::Artist => {
                if let Some(a) = track
                    .artist
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                {
                    parts.push(a.to_string());
                }
            }
            TrackDisplayField::Album => {
                if let Some(a) = track
                    .album
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                {
                    parts.push(a.to_string());
                }
            }
            TrackDisplayField::Filename => {
                if let Some(stem) = Path::new(&track.audio_url)
                    .file_stem()
                    .and_then(|s| s.to_str())
                {
                    if !stem.trim().is_empty() {
                        parts.push(stem.to_string());
                    }
                }
            }
            TrackDisplayField::Source => {
                parts.push(track.audio_url.clone());
            }
        }
    }

    if parts.is_empty() {
        track.display.clone()
    } else {
        parts.join(&ui.now_playing_track_separator)
    }
}

/// Build the now-playing time text (elapsed/total/remaining) per `UiSettings`.
fn now_playing_time_text(
    elapsed: Duration,
    total: Option<Duration>,
    ui: &UiSettings,
) -> Option<String> {
    if ui.now_playing_time_fields.is_empty() {
        return None;
    }

    let mut parts: Vec<String> = Vec::new();
    for f in &ui.now_playing_time_fields {
        match f {
            TimeField::Elapsed => parts.push(format_mmss(elapsed)),
            TimeField::Total => {
                if let Some(t) = total {
                    parts.push(format_mmss(t));
                }
            }
            TimeField::Remaining => {
                if let Some(t) = total {
                    let rem = t.saturating_sub(elapsed);
                    parts.push(format!("-{}", format_mmss(rem)));
                }
            }
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(&ui.now_playing_time_separator))
    }
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    // Keep the popup smaller and avoid covering the entire UI.
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(5);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

/// Format an optional duration, rounding up partial seconds, showing total seconds.
fn format_duration_mmss_ceil(d: Option<Duration>) -> String {
    let Some(d) = d else {
        return "-".to_string();
    };

    let mut total_secs = d.as_secs();
    if d.subsec_nanos() > 0 {
        total_secs = total_secs.saturating_add(1);
    }

    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    format!("{}:{:02} ({}s)", minutes, seconds, total_secs)
}

fn transport_text(transport: TransportState) -> &'static str {
    match transport {
        TransportState::Idle => "Stopped",
        TransportState::Loading => "Loading",
        TransportState::Playing => "Playing",
        TransportState::Paused => "Paused",
        TransportState::Ended => "Ended",
    }
}

/// Render the entire UI into the provided `frame` using the current view.
pub fn draw(
    frame: &mut Frame,
    view: &ViewState,
    ui_settings: &UiSettings,
    controls_settings: &ControlsSettings,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Min(1),
            Constraint::Length(3),
            Constraint::Length(4),
        ])
        .split(frame.area());
    // Header
    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" trackdeck ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    // Status box
    let snapshot = view.snapshot;
    let status = {
        let mut parts: Vec<String> = Vec::new();

        // cursor mode
        if view.follow_playback {
            parts.push(" CURSOR: Follow".to_string());
        } else {
            parts.push(" CURSOR: Free-roam".to_string());
        }

        let repeat_text = match snapshot.repeat {
            RepeatMode::Off => "REPEAT: Off",
            RepeatMode::All => "REPEAT: All",
            RepeatMode::One => "REPEAT: One",
        };
        parts.push(repeat_text.to_string());

        // playback info
        if let Some(track) = &snapshot.current_track {
            let text = now_playing_track_text(track, ui_settings);
            let time = now_playing_time_text(snapshot.position, snapshot.duration, ui_settings);
            if let Some(time) = time {
                parts.push(format!("Track: {} [{}]", text, time));
            } else {
                parts.push(format!("Track: {}", text));
            }
        }
        parts.push(transport_text(snapshot.transport).to_string());

        // shuffle
        if snapshot.shuffle {
            parts.push("Shuffle: ON".to_string());
        } else {
            parts.push("Shuffle: OFF".to_string());
        }

        parts.push(format!("Vol: {:.0}%", snapshot.volume * 100.0));

        if let Some(notice) = view.notice {
            parts.push(format!("! {notice}"));
        }

        parts.join(" • ")
    };

    let status_par = Paragraph::new(status)
        .block(
            Block::bordered()
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                })
                .title(" status "),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(status_par, chunks[1]);

    // Main list, in queue order so shuffle is visible.
    {
        // Center the selected item when possible by creating a visible window.
        // Important: only build ListItems for the visible window (avoid allocating the entire list).
        let total = view.queue.len();
        let list_height = chunks[2].height as usize;
        let sel_pos = view
            .queue
            .iter()
            .position(|&i| i == view.selected)
            .unwrap_or(0);
        let (start, end, selected_pos_in_visible) = if total <= list_height || list_height == 0 {
            (0, total, sel_pos)
        } else {
            let half = list_height / 2;
            let mut start = if sel_pos > half { sel_pos - half } else { 0 };
            if start + list_height > total {
                start = total - list_height;
            }
            (start, start + list_height, sel_pos - start)
        };

        let playing_idx = snapshot
            .queue_position
            .and_then(|pos| view.queue.get(pos))
            .copied();

        let visible_items: Vec<ListItem> = view.queue[start..end]
            .iter()
            .map(|&i| {
                let title = view.tracks[i].display.as_str();
                if Some(i) == playing_idx {
                    ListItem::new(format!("♪ {title}"))
                } else {
                    ListItem::new(format!("  {title}"))
                }
            })
            .collect();

        let list = List::new(visible_items)
            .block(Block::default().borders(Borders::ALL).title(" tracks "))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ratatui::widgets::ListState::default();
        if total > 0 {
            state.select(Some(selected_pos_in_visible));
        }
        frame.render_stateful_widget(list, chunks[2], &mut state);
    }

    // Progress gauge
    {
        let (ratio, label) = match snapshot.duration {
            Some(total) if !total.is_zero() => {
                let ratio =
                    (snapshot.position.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0);
                let label = format!(
                    "{} / {}",
                    format_mmss(snapshot.position),
                    format_mmss(total)
                );
                (ratio, label)
            }
            _ => (0.0, format_mmss(snapshot.position)),
        };

        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(" progress "))
            .ratio(ratio)
            .label(label);
        frame.render_widget(gauge, chunks[3]);
    }

    // Overlay metadata popup (keeps list visible under it)
    if view.metadata_window {
        // Keep the popup inside the list area so it doesn't cover header/status/footer.
        let list_area = chunks[2];
        let popup_area = centered_rect_sized(72, 9, list_area);
        frame.render_widget(Clear, popup_area);

        let track = view.tracks.get(view.selected);
        let meta = if let Some(track) = track {
            let dur = format_duration_mmss_ceil(track.duration);
            format!(
                "Title: {}\nArtist: {}\nAlbum: {}\nDuration: {}\nSource: {}\nArtwork: {}",
                track.title,
                track.artist.as_deref().unwrap_or("-"),
                track.album.as_deref().unwrap_or("-"),
                dur,
                track.audio_url,
                track.artwork_url.as_deref().unwrap_or("-"),
            )
        } else {
            "No track selected".to_string()
        };
        let meta_paragraph = Paragraph::new(meta)
            .block(
                Block::default()
                    .padding(Padding {
                        left: 1,
                        right: 0,
                        top: 0,
                        bottom: 0,
                    })
                    .borders(Borders::ALL)
                    .title(" metadata (K closes) "),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(meta_paragraph, popup_area);
    }

    let footer_text = controls_text(controls_settings.scrub_seconds);
    let footer = Paragraph::new(footer_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                }),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(footer, chunks[4]);
}
