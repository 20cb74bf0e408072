pub mod client;
pub mod mirrors;
pub mod models;
pub mod provider;

pub use client::{MirrorApi, PipedClient};
pub use mirrors::{Mirror, MirrorPool};
pub use models::*;
pub use provider::YoutubeProvider;
