use async_trait::async_trait;
use std::sync::Arc;

use super::client::{OEmbedTrack, SoundcloudApi};
use crate::normalize::{DelimitedTitle, TitleStrategy};
use crate::providers::{FetchedTrack, ProviderError, ProviderId, TrackProvider};
use crate::sources::{ClassifiedUrl, SourceKind};

/// Single tracks only. Sets and user pages are rejected at classification.
pub struct SoundcloudProvider {
    api: Arc<dyn SoundcloudApi>,
    titles: Box<dyn TitleStrategy>,
}

impl SoundcloudProvider {
    pub fn new(api: Arc<dyn SoundcloudApi>) -> Self {
        Self {
            api,
            titles: Box::new(DelimitedTitle),
        }
    }

    fn to_track(&self, track: &OEmbedTrack, url: &str) -> FetchedTrack {
        // oEmbed titles read "{title} by {author}".
        let suffix = format!(" by {}", track.author_name);
        let raw = if track.author_name.is_empty() {
            track.title.as_str()
        } else {
            track.title.strip_suffix(&suffix).unwrap_or(track.title.as_str())
        };
        let formatted = self.titles.format(raw, &track.author_name);
        FetchedTrack::new(formatted.title, formatted.artist).with_source_url(url)
    }
}

#[async_trait]
impl TrackProvider for SoundcloudProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Soundcloud
    }

    fn name(&self) -> &str {
        "SoundCloud"
    }

    async fn fetch_tracks(&self, source: &ClassifiedUrl) -> Result<Vec<FetchedTrack>, ProviderError> {
        if source.kind != SourceKind::SoundcloudTrack {
            return Err(ProviderError::Unsupported(format!(
                "SoundCloud cannot fetch a {}",
                source.kind
            )));
        }
        let track = self.api.oembed(&source.url).await?;
        Ok(vec![self.to_track(&track, &source.url)])
    }
}
