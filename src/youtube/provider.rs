use async_trait::async_trait;
use std::sync::Arc;

use super::client::MirrorApi;
use super::mirrors::MirrorPool;
use super::models::{mix_playlist_id, VideoSummary};
use crate::normalize::{DelimitedTitle, TitleStrategy};
use crate::providers::{FetchedTrack, ProviderError, ProviderId, RadioSource, TrackProvider};
use crate::sources::{ClassifiedUrl, SourceKind};

pub struct YoutubeProvider {
    api: Arc<dyn MirrorApi>,
    mirrors: MirrorPool,
    titles: Box<dyn TitleStrategy>,
}

impl YoutubeProvider {
    pub fn new(api: Arc<dyn MirrorApi>, mirrors: MirrorPool) -> Self {
        Self {
            api,
            mirrors,
            titles: Box::new(DelimitedTitle),
        }
    }

    pub fn with_title_strategy(mut self, titles: Box<dyn TitleStrategy>) -> Self {
        self.titles = titles;
        self
    }

    pub fn mirrors(&self) -> &MirrorPool {
        &self.mirrors
    }

    fn to_track(&self, video: &VideoSummary) -> FetchedTrack {
        let formatted = self.titles.format(&video.title, &video.uploader);
        FetchedTrack::new(formatted.title, formatted.artist).with_source_url(video.watch_url())
    }

    pub async fn get_video(&self, video_id: &str) -> Result<VideoSummary, ProviderError> {
        let api = &self.api;
        self.mirrors
            .run("get_video", |mirror| async move { api.video(&mirror.url, video_id).await })
            .await
    }

    pub async fn get_playlist(&self, playlist_id: &str) -> Result<Vec<VideoSummary>, ProviderError> {
        let api = &self.api;
        self.mirrors
            .run("get_playlist", |mirror| async move {
                api.playlist(&mirror.url, playlist_id).await
            })
            .await
    }

    pub async fn search(&self, query: &str) -> Result<Vec<VideoSummary>, ProviderError> {
        let api = &self.api;
        self.mirrors
            .run("search", |mirror| async move { api.search(&mirror.url, query).await })
            .await
    }
}

#[async_trait]
impl TrackProvider for YoutubeProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Youtube
    }

    fn name(&self) -> &str {
        "YouTube"
    }

    async fn fetch_tracks(&self, source: &ClassifiedUrl) -> Result<Vec<FetchedTrack>, ProviderError> {
        match source.kind {
            SourceKind::YoutubeVideo => {
                let video = self.get_video(&source.id).await?;
                Ok(vec![self.to_track(&video)])
            }
            SourceKind::YoutubePlaylist => {
                let videos = self.get_playlist(&source.id).await?;
                Ok(videos.iter().map(|v| self.to_track(v)).collect())
            }
            other => Err(ProviderError::Unsupported(format!(
                "YouTube cannot fetch a {}",
                other
            ))),
        }
    }
}

#[async_trait]
impl RadioSource for YoutubeProvider {
    async fn fetch_mix(&self, seed_query: &str) -> Result<Vec<FetchedTrack>, ProviderError> {
        let seed = self
            .search(seed_query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::NotFound(format!("no video matches '{}'", seed_query)))?;

        // Confirms the seed is playable before asking for its mix.
        let seed = self.get_video(&seed.id).await?;
        let mix = self.get_playlist(&mix_playlist_id(&seed.id)).await?;

        log::info!(
            "Mix for '{}' (seed {}) has {} videos",
            seed_query,
            seed.id,
            mix.len()
        );

        Ok(mix
            .iter()
            .filter(|v| v.id != seed.id)
            .map(|v| self.to_track(v))
            .collect())
    }
}
