//! Ordered playlists with fractional ranks, fed by an import pipeline for
//! Spotify, YouTube and SoundCloud sources.

pub mod cache;
pub mod clock;
pub mod commands;
pub mod config;
pub mod database;
pub mod errors;
pub mod import;
pub mod library;
pub mod normalize;
pub mod playlist;
pub mod providers;
pub mod rank;
pub mod soundcloud;
pub mod sources;
pub mod spotify;
pub mod youtube;

#[cfg(test)]
mod test_support;

pub use commands::{AppState, Caller};
pub use errors::AppError;
