//! Operations exposed to callers. Every entry point takes the authenticated
//! [`Caller`] and checks playlist ownership before touching anything.

use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use std::sync::Arc;

pub mod import;
pub mod playlist;

pub use playlist::{MoveTarget, SongsToAdd};

use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::database::DatabaseManager;
use crate::errors::AppError;
use crate::import::ImportOrchestrator;
use crate::library::SongStore;
use crate::playlist::{Playlist, PlaylistManager};
use crate::providers::ProviderManager;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: String,
}

impl Caller {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

pub struct AppState {
    pool: Pool<Sqlite>,
    songs: Arc<SongStore>,
    playlists: Arc<PlaylistManager>,
    importer: ImportOrchestrator,
}

impl AppState {
    pub fn new(
        pool: Pool<Sqlite>,
        config: &EngineConfig,
        providers: Arc<ProviderManager>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let songs = Arc::new(
            SongStore::new(pool.clone(), clock.clone()).with_chunk_size(config.upsert_chunk_size),
        );
        let playlists = Arc::new(
            PlaylistManager::new(pool.clone(), clock).with_rank_length_warning(config.rank_length_warning),
        );
        let importer = ImportOrchestrator::new(pool.clone(), providers, songs.clone(), playlists.clone())
            .with_config(config);

        Self {
            pool,
            songs,
            playlists,
            importer,
        }
    }

    /// Opens the configured database and wires the HTTP providers.
    pub async fn from_config(config: &EngineConfig, clock: Arc<dyn Clock>) -> Result<Self, AppError> {
        let db = DatabaseManager::connect(&config.database_path).await?;
        let providers = ProviderManager::from_config(config, clock.clone())?;
        Ok(Self::new(db.pool, config, Arc::new(providers), clock))
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub fn songs(&self) -> &SongStore {
        &self.songs
    }

    pub fn playlists(&self) -> &PlaylistManager {
        &self.playlists
    }

    pub fn importer(&self) -> &ImportOrchestrator {
        &self.importer
    }

    /// Loads a playlist and checks the caller owns it.
    async fn owned_playlist(&self, caller: &Caller, playlist_id: &str) -> Result<Playlist, AppError> {
        let playlist = self.playlists.get_playlist(playlist_id).await?;
        if playlist.owner_id != caller.user_id {
            log::warn!(
                "User {} tried to access playlist {} owned by {}",
                caller.user_id,
                playlist_id,
                playlist.owner_id
            );
            return Err(AppError::Unauthorized(format!(
                "playlist {} belongs to another user",
                playlist_id
            )));
        }
        Ok(playlist)
    }

    /// Like `owned_playlist`, and also rejects generated RADIO playlists.
    async fn editable_playlist(&self, caller: &Caller, playlist_id: &str) -> Result<Playlist, AppError> {
        self.importer.editable_playlist(&caller.user_id, playlist_id).await
    }
}
