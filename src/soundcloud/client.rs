use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::providers::ProviderError;

/// Subset of the oEmbed document SoundCloud returns for a track page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OEmbedTrack {
    pub title: String,
    #[serde(default)]
    pub author_name: String,
}

#[async_trait]
pub trait SoundcloudApi: Send + Sync {
    async fn oembed(&self, track_url: &str) -> Result<OEmbedTrack, ProviderError>;
}

pub struct OEmbedClient {
    client: Client,
    endpoint: String,
}

impl OEmbedClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl SoundcloudApi for OEmbedClient {
    async fn oembed(&self, track_url: &str) -> Result<OEmbedTrack, ProviderError> {
        let url = format!(
            "{}?format=json&url={}",
            self.endpoint,
            urlencoding::encode(track_url)
        );
        log::debug!("Fetching SoundCloud oEmbed for {}", track_url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            log::warn!("SoundCloud oEmbed failed ({}) for {}", status, track_url);
            return Err(ProviderError::from_status(status.as_u16(), &text));
        }
        Ok(serde_json::from_str(&text)?)
    }
}
