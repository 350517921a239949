//! Configuration schema and loading.
//!
//! The schema types drive runtime behavior (playback defaults, key tuning,
//! library scanning, UI); the loader layers environment variables over an
//! optional TOML file over struct defaults.

mod load;
mod schema;

pub use schema::*;

#[cfg(test)]
mod tests;
