use std::time::Duration;

use crate::config;
use crate::player::{AudioSink, QueueController};

/// Push config-file playback defaults into a freshly initialized controller.
pub fn apply_playback_defaults<S: AudioSink>(
    controller: &mut QueueController<S>,
    settings: &config::Settings,
) {
    controller.set_repeat(settings.playback.repeat.into());
    controller.set_volume(settings.playback.volume);
    controller.set_prev_restart_threshold(Duration::from_secs(settings.controls.prev_restart_secs));

    // `initialize` always starts unshuffled, so a single toggle is enough.
    if settings.playback.shuffle {
        controller.toggle_shuffle();
    }
}
