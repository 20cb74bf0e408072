use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::models::*;
use crate::config::SpotifyCredentials;
use crate::providers::ProviderError;

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const API_BASE: &str = "https://api.spotify.com/v1";
const PAGE_LIMIT: &str = "100";
// Refresh a little before the token actually expires.
const TOKEN_SLACK: Duration = Duration::from_secs(30);

#[async_trait]
pub trait SpotifyApi: Send + Sync {
    async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<SpotifyTrack>, ProviderError>;

    async fn track(&self, track_id: &str) -> Result<SpotifyTrack, ProviderError>;
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Spotify Web API client using the client-credentials flow.
pub struct SpotifyClient {
    client: Client,
    credentials: SpotifyCredentials,
    token: Mutex<Option<CachedToken>>,
}

impl SpotifyClient {
    pub fn new(credentials: SpotifyCredentials, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            credentials,
            token: Mutex::new(None),
        })
    }

    async fn access_token(&self) -> Result<String, ProviderError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.value.clone());
            }
        }

        let basic = base64::engine::general_purpose::STANDARD.encode(format!(
            "{}:{}",
            self.credentials.client_id, self.credentials.client_secret
        ));
        let response = self
            .client
            .post(TOKEN_URL)
            .header("Authorization", format!("Basic {}", basic))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            log::warn!("Spotify token request failed ({})", status);
            return Err(ProviderError::from_status(status.as_u16(), &text));
        }

        let token: TokenResponse = serde_json::from_str(&text)?;
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_SLACK);
        log::debug!("Obtained Spotify token valid for {}s", lifetime.as_secs());
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(token.access_token)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ProviderError> {
        let token = self.access_token().await?;
        let response = self.client.get(url).bearer_auth(token).send().await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            log::warn!("Spotify request failed ({}) at {}", status, url);
            return Err(ProviderError::from_status(status.as_u16(), &text));
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl SpotifyApi for SpotifyClient {
    async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<SpotifyTrack>, ProviderError> {
        log::info!("Fetching Spotify playlist: {}", playlist_id);

        let mut url = Some(format!(
            "{}/playlists/{}/tracks?limit={}",
            API_BASE,
            urlencoding::encode(playlist_id),
            PAGE_LIMIT
        ));
        let mut tracks = Vec::new();

        while let Some(page_url) = url {
            let page: PlaylistTracksPage = self.get_json(&page_url).await?;
            tracks.extend(
                page.items
                    .into_iter()
                    .filter_map(|item| item.track)
                    .filter(|track| !track.is_local)
                    .map(SpotifyTrack::from),
            );
            url = page.next;
        }

        log::info!("Fetched {} tracks from playlist {}", tracks.len(), playlist_id);
        Ok(tracks)
    }

    async fn track(&self, track_id: &str) -> Result<SpotifyTrack, ProviderError> {
        let track: ApiTrack = self
            .get_json(&format!("{}/tracks/{}", API_BASE, urlencoding::encode(track_id)))
            .await?;
        Ok(track.into())
    }
}
