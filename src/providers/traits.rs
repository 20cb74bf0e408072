use async_trait::async_trait;

use super::error::ProviderError;
use super::types::{FetchedTrack, ProviderId};
use crate::sources::ClassifiedUrl;

#[async_trait]
pub trait TrackProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// User-friendly name
    fn name(&self) -> &str;

    /// Tracks behind `source`, in source order, titles already normalized.
    async fn fetch_tracks(&self, source: &ClassifiedUrl) -> Result<Vec<FetchedTrack>, ProviderError>;
}

/// Builds the related-content mix behind a radio playlist.
#[async_trait]
pub trait RadioSource: Send + Sync {
    /// Mix tracks for a seed described by `"{artist} {title}"`, seed excluded.
    async fn fetch_mix(&self, seed_query: &str) -> Result<Vec<FetchedTrack>, ProviderError>;
}
