use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use super::models::*;
use crate::providers::ProviderError;

const MAX_PLAYLIST_PAGES: usize = 50;

/// Metadata lookups against one mirror. Failover across mirrors is the
/// caller's job (see `MirrorPool`).
#[async_trait]
pub trait MirrorApi: Send + Sync {
    async fn video(&self, mirror: &str, video_id: &str) -> Result<VideoSummary, ProviderError>;

    async fn playlist(&self, mirror: &str, playlist_id: &str) -> Result<Vec<VideoSummary>, ProviderError>;

    async fn search(&self, mirror: &str, query: &str) -> Result<Vec<VideoSummary>, ProviderError>;
}

/// Client for Piped-compatible API mirrors.
pub struct PipedClient {
    client: Client,
}

impl PipedClient {
    pub fn new(timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()?;
        Ok(Self { client })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let url = reqwest::Url::parse_with_params(url, params)
            .map_err(|e| ProviderError::Failed(format!("URL parse error: {}", e)))?;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let url_debug = response.url().to_string();
        let text = response.text().await?;

        if !status.is_success() {
            log::warn!("Mirror request failed ({}) at {}", status, url_debug);
            return Err(ProviderError::from_status(status.as_u16(), &text));
        }

        let data: Value = serde_json::from_str(&text)?;
        // Some mirrors answer 200 with an error object.
        if data.get("error").is_some_and(|e| !e.is_null()) {
            log::warn!("Mirror returned an error payload at {}", url_debug);
            return Err(ProviderError::from_status(status.as_u16(), &text));
        }
        Ok(serde_json::from_value(data)?)
    }
}

#[async_trait]
impl MirrorApi for PipedClient {
    async fn video(&self, mirror: &str, video_id: &str) -> Result<VideoSummary, ProviderError> {
        let stream: PipedStream = self
            .get_json(&format!("{}/streams/{}", mirror, video_id), &[])
            .await?;
        Ok(VideoSummary {
            id: video_id.to_string(),
            title: stream.title,
            uploader: stream.uploader,
        })
    }

    async fn playlist(&self, mirror: &str, playlist_id: &str) -> Result<Vec<VideoSummary>, ProviderError> {
        let mut page: PipedPlaylistPage = self
            .get_json(&format!("{}/playlists/{}", mirror, playlist_id), &[])
            .await?;
        let mut videos = Vec::new();

        for _ in 0..MAX_PLAYLIST_PAGES {
            videos.extend(
                std::mem::take(&mut page.related_streams)
                    .into_iter()
                    .filter_map(PipedItem::into_summary),
            );
            let Some(next) = page.nextpage.take() else {
                break;
            };
            page = self
                .get_json(
                    &format!("{}/nextpage/playlists/{}", mirror, playlist_id),
                    &[("nextpage", next.as_str())],
                )
                .await?;
        }

        log::debug!("Playlist {} has {} videos", playlist_id, videos.len());
        Ok(videos)
    }

    async fn search(&self, mirror: &str, query: &str) -> Result<Vec<VideoSummary>, ProviderError> {
        let page: PipedSearchPage = self
            .get_json(
                &format!("{}/search", mirror),
                &[("q", query), ("filter", "music_songs")],
            )
            .await?;
        Ok(page
            .items
            .into_iter()
            .filter_map(PipedItem::into_summary)
            .collect())
    }
}
