//! Track library: model types, display formatting and track sources.
//!
//! A library is an ordered `Vec<Track>`; order here is display order and the
//! player's natural play order. Sources live in `library::source`.

mod display;
mod model;
mod source;

pub use display::display_from_fields;
pub use model::Track;
pub use source::{SourceError, load_manifest, scan};

#[cfg(test)]
mod tests;
