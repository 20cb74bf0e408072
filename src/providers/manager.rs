use std::collections::HashMap;
use std::sync::Arc;

use super::error::ProviderError;
use super::traits::{RadioSource, TrackProvider};
use super::types::ProviderId;
use crate::cache::MemoryCooldownCache;
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::soundcloud::{OEmbedClient, SoundcloudProvider};
use crate::sources::SourceKind;
use crate::spotify::{SpotifyClient, SpotifyProvider};
use crate::youtube::{MirrorPool, PipedClient, YoutubeProvider};

/// Maps each source kind to the provider that can fetch it.
#[derive(Default)]
pub struct ProviderManager {
    providers: HashMap<ProviderId, Arc<dyn TrackProvider>>,
    radio: Option<Arc<dyn RadioSource>>,
}

impl ProviderManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_provider(mut self, provider: Arc<dyn TrackProvider>) -> Self {
        let id = provider.id();
        log::info!("Registering music provider: {} ({})", provider.name(), id);
        self.providers.insert(id, provider);
        self
    }

    pub fn with_radio(mut self, radio: Arc<dyn RadioSource>) -> Self {
        self.radio = Some(radio);
        self
    }

    /// Builds the real HTTP-backed providers from configuration.
    ///
    /// Spotify is only registered when credentials are present.
    pub fn from_config(config: &EngineConfig, clock: Arc<dyn Clock>) -> Result<Self, ProviderError> {
        let timeout = config.provider_timeout();

        let mirrors = MirrorPool::new(
            &config.youtube_mirrors,
            Arc::new(MemoryCooldownCache::new(clock)),
            config.mirror_cooldown(),
        )
        .with_attempt_timeout(config.mirror_attempt_timeout());
        let youtube = Arc::new(YoutubeProvider::new(Arc::new(PipedClient::new(timeout)?), mirrors));
        let soundcloud = SoundcloudProvider::new(Arc::new(OEmbedClient::new(
            config.soundcloud_oembed_url.clone(),
            timeout,
        )?));

        let mut manager = Self::new()
            .register_provider(youtube.clone())
            .register_provider(Arc::new(soundcloud))
            .with_radio(youtube);

        match &config.spotify {
            Some(credentials) => {
                let client = SpotifyClient::new(credentials.clone(), timeout)?;
                manager = manager.register_provider(Arc::new(SpotifyProvider::new(Arc::new(client))));
            }
            None => log::warn!("Spotify credentials missing, Spotify imports are disabled"),
        }

        Ok(manager)
    }

    pub fn get_provider(&self, id: ProviderId) -> Option<Arc<dyn TrackProvider>> {
        self.providers.get(&id).cloned()
    }

    pub fn provider_for(&self, kind: SourceKind) -> Result<Arc<dyn TrackProvider>, ProviderError> {
        let id = kind.provider();
        self.get_provider(id)
            .ok_or_else(|| ProviderError::NotConfigured(id.to_string()))
    }

    pub fn radio(&self) -> Result<Arc<dyn RadioSource>, ProviderError> {
        self.radio
            .clone()
            .ok_or_else(|| ProviderError::NotConfigured("radio".into()))
    }

    pub fn list_providers(&self) -> Vec<ProviderId> {
        let mut ids: Vec<ProviderId> = self.providers.keys().copied().collect();
        ids.sort_by_key(|id| id.to_string());
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn from_config_without_spotify_credentials() {
        let config = EngineConfig::default();
        let manager = ProviderManager::from_config(&config, Arc::new(ManualClock::default())).unwrap();

        assert_eq!(
            manager.list_providers(),
            vec![ProviderId::Soundcloud, ProviderId::Youtube]
        );
        assert!(manager.provider_for(SourceKind::YoutubePlaylist).is_ok());
        assert!(manager.radio().is_ok());
        assert!(matches!(
            manager.provider_for(SourceKind::SpotifyPlaylist),
            Err(ProviderError::NotConfigured(_))
        ));
    }

    #[test]
    fn empty_manager_has_no_radio() {
        assert!(matches!(
            ProviderManager::new().radio(),
            Err(ProviderError::NotConfigured(_))
        ));
    }
}
