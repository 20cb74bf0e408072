//! Hand-written fakes for provider traits and a ready-wired in-memory state.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::MemoryCooldownCache;
use crate::clock::ManualClock;
use crate::commands::AppState;
use crate::config::EngineConfig;
use crate::database::DatabaseManager;
use crate::providers::{FetchedTrack, ProviderError, ProviderId, ProviderManager, TrackProvider};
use crate::sources::ClassifiedUrl;
use crate::youtube::{MirrorApi, MirrorPool, VideoSummary, YoutubeProvider};

pub const MIRRORS: &[&str] = &["https://m1.example", "https://m2.example", "https://m3.example"];

type Outcome = Box<dyn Fn() -> Result<Vec<FetchedTrack>, ProviderError> + Send + Sync>;

/// Provider that answers every fetch from a fixed closure.
pub struct StaticProvider {
    id: ProviderId,
    outcome: Outcome,
}

impl StaticProvider {
    pub fn tracks(id: ProviderId, tracks: Vec<FetchedTrack>) -> Self {
        Self {
            id,
            outcome: Box::new(move || Ok(tracks.clone())),
        }
    }

    pub fn failing(id: ProviderId, error: fn() -> ProviderError) -> Self {
        Self {
            id,
            outcome: Box::new(move || Err(error())),
        }
    }
}

#[async_trait]
impl TrackProvider for StaticProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_tracks(&self, _source: &ClassifiedUrl) -> Result<Vec<FetchedTrack>, ProviderError> {
        (self.outcome)()
    }
}

/// Mirror API backed by in-memory tables. Mirrors listed in `down` answer
/// every request with an error page, mirrors in `slow` never answer; the
/// rest answer from the same data.
#[derive(Default)]
pub struct FakeMirrors {
    pub videos: HashMap<String, VideoSummary>,
    pub playlists: HashMap<String, Vec<VideoSummary>>,
    pub search_results: Vec<VideoSummary>,
    pub down: Vec<String>,
    pub slow: Vec<String>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeMirrors {
    pub fn video(id: &str, title: &str, uploader: &str) -> VideoSummary {
        VideoSummary {
            id: id.to_string(),
            title: title.to_string(),
            uploader: uploader.to_string(),
        }
    }

    async fn answer<T>(&self, mirror: &str, found: Option<T>, what: &str) -> Result<T, ProviderError> {
        self.calls.lock().push(mirror.to_string());
        if self.slow.iter().any(|m| m == mirror) {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        if self.down.iter().any(|m| m == mirror) {
            return Err(ProviderError::from_status(
                503,
                "<html><body>503 Service Unavailable</body></html>",
            ));
        }
        found.ok_or_else(|| ProviderError::NotFound(format!("{} does not exist", what)))
    }
}

#[async_trait]
impl MirrorApi for FakeMirrors {
    async fn video(&self, mirror: &str, video_id: &str) -> Result<VideoSummary, ProviderError> {
        self.answer(mirror, self.videos.get(video_id).cloned(), video_id).await
    }

    async fn playlist(&self, mirror: &str, playlist_id: &str) -> Result<Vec<VideoSummary>, ProviderError> {
        self.answer(mirror, self.playlists.get(playlist_id).cloned(), playlist_id)
            .await
    }

    async fn search(&self, mirror: &str, _query: &str) -> Result<Vec<VideoSummary>, ProviderError> {
        self.answer(mirror, Some(self.search_results.clone()), "search").await
    }
}

pub fn youtube(api: Arc<FakeMirrors>, clock: Arc<ManualClock>) -> Arc<YoutubeProvider> {
    let urls: Vec<String> = MIRRORS.iter().map(|m| m.to_string()).collect();
    let pool = MirrorPool::new(
        &urls,
        Arc::new(MemoryCooldownCache::new(clock)),
        Duration::from_secs(900),
    )
    .with_attempt_timeout(Duration::from_millis(200));
    Arc::new(YoutubeProvider::new(api, pool))
}

pub async fn state(providers: ProviderManager, clock: Arc<ManualClock>) -> AppState {
    let db = DatabaseManager::in_memory().await.unwrap();
    AppState::new(db.pool, &EngineConfig::default(), Arc::new(providers), clock)
}

pub async fn count(state: &AppState, table: &str) -> i64 {
    let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(state.pool())
        .await
        .unwrap();
    count
}
