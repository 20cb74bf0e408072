use async_trait::async_trait;
use std::sync::Arc;

use super::client::SpotifyApi;
use super::models::SpotifyTrack;
use crate::normalize::{StructuredTitle, TitleStrategy};
use crate::providers::{FetchedTrack, ProviderError, ProviderId, TrackProvider};
use crate::sources::{ClassifiedUrl, SourceKind};

/// Spotify tracks carry no playable URL; playback is resolved elsewhere.
pub struct SpotifyProvider {
    api: Arc<dyn SpotifyApi>,
    titles: Box<dyn TitleStrategy>,
}

impl SpotifyProvider {
    pub fn new(api: Arc<dyn SpotifyApi>) -> Self {
        Self {
            api,
            titles: Box::new(StructuredTitle),
        }
    }

    fn to_track(&self, track: &SpotifyTrack) -> FetchedTrack {
        let formatted = self.titles.format(&track.title, &track.artist);
        FetchedTrack::new(formatted.title, formatted.artist)
    }
}

#[async_trait]
impl TrackProvider for SpotifyProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Spotify
    }

    fn name(&self) -> &str {
        "Spotify"
    }

    async fn fetch_tracks(&self, source: &ClassifiedUrl) -> Result<Vec<FetchedTrack>, ProviderError> {
        let tracks = match source.kind {
            SourceKind::SpotifyPlaylist => self.api.playlist_tracks(&source.id).await?,
            SourceKind::SpotifyTrack => vec![self.api.track(&source.id).await?],
            other => {
                return Err(ProviderError::Unsupported(format!(
                    "Spotify cannot fetch a {}",
                    other
                )))
            }
        };
        Ok(tracks.iter().map(|t| self.to_track(t)).collect())
    }
}
