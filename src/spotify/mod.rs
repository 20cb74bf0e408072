pub mod client;
pub mod models;
pub mod provider;

pub use client::{SpotifyApi, SpotifyClient};
pub use models::*;
pub use provider::SpotifyProvider;
