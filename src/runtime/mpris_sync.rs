use crate::mpris::MprisHandle;
use crate::player::PlaybackSnapshot;

pub fn update_mpris(mpris: &MprisHandle, snapshot: &PlaybackSnapshot) {
    mpris.set_track_metadata(snapshot.queue_position, snapshot.current_track.as_ref());
    mpris.set_playback(snapshot.transport);
    mpris.set_volume(snapshot.volume);
}
