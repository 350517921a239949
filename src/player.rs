//! Playback: the queue controller, the audio sink capability it drives,
//! and the rodio implementation of that capability.

mod controller;
mod queue;
mod rodio_sink;
mod sink;
mod types;

pub use controller::{QueueController, SubscriberId};
pub use rodio_sink::RodioSink;
pub use sink::AudioSink;
pub use types::{
    PlaybackSnapshot, PlayerEvent, PlayerNotice, RepeatMode, SinkEvent, TransportState,
};
