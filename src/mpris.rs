use std::collections::HashMap;
use std::sync::{
    Arc, Mutex,
    mpsc::{Receiver, Sender, channel},
};
use std::time::Duration;

use async_io::{Timer, block_on};
use zbus::{Connection, interface};
use zvariant::{ObjectPath, OwnedObjectPath, OwnedValue, Value};

use crate::library::Track;
use crate::player::TransportState;

/// Remote control commands delivered from the D-Bus service thread to the
/// main event loop.
#[derive(Clone, Debug)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Prev,
}

/// Playback status as the MPRIS interface reports it.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
enum PlaybackStatus {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl From<TransportState> for PlaybackStatus {
    fn from(state: TransportState) -> Self {
        match state {
            TransportState::Playing | TransportState::Loading => PlaybackStatus::Playing,
            TransportState::Paused => PlaybackStatus::Paused,
            TransportState::Idle | TransportState::Ended => PlaybackStatus::Stopped,
        }
    }
}

#[derive(Debug, Default)]
struct SharedState {
    playback: PlaybackStatus,
    title: Option<String>,
    artist: Vec<String>,
    album: Option<String>,
    url: Option<String>,
    art_url: Option<String>,
    length_micros: Option<i64>,
    track_id: Option<OwnedObjectPath>,
    volume: f64,
}

pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
    notify: Sender<()>,
}

impl MprisHandle {
    pub fn set_playback(&self, transport: TransportState) {
        if let Ok(mut s) = self.state.lock() {
            s.playback = transport.into();
        }
        let _ = self.notify.send(());
    }

    pub fn set_volume(&self, volume: f32) {
        if let Ok(mut s) = self.state.lock() {
            s.volume = f64::from(volume);
        }
        let _ = self.notify.send(());
    }

    /// Publish the current track's metadata, or clear it when nothing is
    /// loaded.
    pub fn set_track_metadata(&self, index: Option<usize>, track: Option<&Track>) {
        if let Ok(mut s) = self.state.lock() {
            match track {
                Some(t) => {
                    s.title = Some(t.title.clone());
                    s.artist = t.artist.clone().into_iter().collect();
                    s.album = t.album.clone();
                    s.url = Some(as_url(&t.audio_url));
                    s.art_url = t.artwork_url.as_deref().map(as_url);
                    s.length_micros = t.duration.map(|d| d.as_micros() as i64);
                    s.track_id = index.and_then(|i| {
                        ObjectPath::try_from(format!("/org/mpris/MediaPlayer2/track/{i}"))
                            .ok()
                            .map(Into::into)
                    });
                }
                None => {
                    s.title = None;
                    s.artist.clear();
                    s.album = None;
                    s.url = None;
                    s.art_url = None;
                    s.length_micros = None;
                    s.track_id = None;
                }
            }
        }
        let _ = self.notify.send(());
    }
}

/// MPRIS wants URIs. Bare filesystem paths get the `file://` scheme, anything
/// that already looks like a URL passes through untouched.
fn as_url(source: &str) -> String {
    if source.contains("://") {
        source.to_string()
    } else {
        format!("file://{source}")
    }
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {
        // No-op for TUI.
    }

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "trackdeck"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec![]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        let _ = self.tx.send(ControlCmd::Next);
    }

    fn previous(&self) {
        let _ = self.tx.send(ControlCmd::Prev);
    }

    fn play(&self) {
        let _ = self.tx.send(ControlCmd::Play);
    }

    fn pause(&self) {
        let _ = self.tx.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        let _ = self.tx.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        let _ = self.tx.send(ControlCmd::Stop);
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        let Ok(s) = self.state.lock() else {
            return "Stopped";
        };
        match s.playback {
            PlaybackStatus::Stopped => "Stopped",
            PlaybackStatus::Playing => "Playing",
            PlaybackStatus::Paused => "Paused",
        }
    }

    #[zbus(property)]
    fn volume(&self) -> f64 {
        self.state.lock().map(|s| s.volume).unwrap_or(0.0)
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let mut map = HashMap::new();
        let Ok(s) = self.state.lock() else {
            return map;
        };

        let mut insert = |key: &str, value: Value<'_>| {
            if let Ok(owned) = OwnedValue::try_from(value) {
                map.insert(key.to_string(), owned);
            }
        };

        if let Some(id) = &s.track_id {
            insert("mpris:trackid", Value::from(id.clone()));
        }
        if let Some(title) = &s.title {
            insert("xesam:title", Value::from(title.clone()));
        }
        if !s.artist.is_empty() {
            insert("xesam:artist", Value::from(s.artist.clone()));
        }
        if let Some(album) = &s.album {
            insert("xesam:album", Value::from(album.clone()));
        }
        if let Some(url) = &s.url {
            insert("xesam:url", Value::from(url.clone()));
        }
        if let Some(art) = &s.art_url {
            insert("mpris:artUrl", Value::from(art.clone()));
        }
        if let Some(micros) = s.length_micros {
            insert("mpris:length", Value::from(micros));
        }

        map
    }
}

pub fn spawn_mpris(tx: Sender<ControlCmd>) -> MprisHandle {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (notify_tx, notify_rx) = channel::<()>();

    let state_for_thread = state.clone();
    std::thread::spawn(move || {
        block_on(serve(tx, state_for_thread, notify_rx));
    });

    MprisHandle {
        state,
        notify: notify_tx,
    }
}

async fn serve(tx: Sender<ControlCmd>, state: Arc<Mutex<SharedState>>, notify: Receiver<()>) {
    let path = "/org/mpris/MediaPlayer2";

    let connection = match Connection::session().await {
        Ok(c) => c,
        Err(e) => {
            eprintln!("MPRIS: failed to connect to session bus: {e}");
            return;
        }
    };

    if let Err(e) = connection
        .request_name("org.mpris.MediaPlayer2.trackdeck")
        .await
    {
        eprintln!("MPRIS: failed to acquire name: {e}");
        return;
    }

    let object_server = connection.object_server();

    if let Err(e) = object_server.at(path, RootIface { tx: tx.clone() }).await {
        eprintln!("MPRIS: failed to register root iface: {e}");
        return;
    }

    if let Err(e) = object_server
        .at(
            path,
            PlayerIface {
                tx,
                state: state.clone(),
            },
        )
        .await
    {
        eprintln!("MPRIS: failed to register player iface: {e}");
        return;
    }

    let iface_ref = match object_server
        .interface::<_, PlayerIface>(path)
        .await
    {
        Ok(r) => r,
        Err(e) => {
            eprintln!("MPRIS: failed to look up player iface: {e}");
            return;
        }
    };

    // Forward state pokes from the main loop as PropertiesChanged signals.
    loop {
        Timer::after(Duration::from_millis(250)).await;

        let mut changed = false;
        while notify.try_recv().is_ok() {
            changed = true;
        }
        if !changed {
            continue;
        }

        let iface = iface_ref.get().await;
        let emitter = iface_ref.signal_emitter();
        let _ = iface.playback_status_changed(emitter).await;
        let _ = iface.metadata_changed(emitter).await;
        let _ = iface.volume_changed(emitter).await;
    }
}

#[cfg(test)]
mod tests;
