pub mod client;
pub mod provider;

pub use client::{OEmbedClient, OEmbedTrack, SoundcloudApi};
pub use provider::SoundcloudProvider;
