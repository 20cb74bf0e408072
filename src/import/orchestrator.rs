use sqlx::{Pool, Sqlite, SqliteConnection};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::ImportStage;
use crate::config::{EngineConfig, IMPORT_PLACEHOLDER_NAME, IMPORT_TIMEOUT_SECONDS};
use crate::errors::AppError;
use crate::library::{index_by_key, NewSong, SongKey, SongStore};
use crate::normalize::{collapse_whitespace, UNKNOWN_ARTIST};
use crate::playlist::{MembershipEntry, NewPlaylist, Playlist, PlaylistKind, PlaylistManager};
use crate::providers::{FetchedTrack, ProviderError, ProviderManager};
use crate::sources::classify;

/// A fetched track ready for storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTrack {
    pub song: NewSong,
    pub source_url: Option<String>,
}

/// Trims fields, drops tracks without a title and keeps the first occurrence
/// of each identity key. Source order is preserved.
pub fn normalize_tracks(tracks: Vec<FetchedTrack>) -> Vec<NormalizedTrack> {
    let mut seen = HashSet::new();
    tracks
        .into_iter()
        .filter_map(|track| {
            let title = collapse_whitespace(&track.title);
            if title.is_empty() {
                return None;
            }
            let artist = match collapse_whitespace(&track.artist) {
                a if a.is_empty() => UNKNOWN_ARTIST.to_string(),
                a => a,
            };
            Some(NormalizedTrack {
                song: NewSong::new(title, artist),
                source_url: track.source_url.filter(|u| !u.trim().is_empty()),
            })
        })
        .filter(|t| seen.insert(t.song.key()))
        .collect()
}

pub struct ImportOrchestrator {
    pool: Pool<Sqlite>,
    providers: Arc<ProviderManager>,
    pub(crate) songs: Arc<SongStore>,
    pub(crate) playlists: Arc<PlaylistManager>,
    fetch_timeout: Duration,
    placeholder_name: String,
}

impl ImportOrchestrator {
    pub fn new(
        pool: Pool<Sqlite>,
        providers: Arc<ProviderManager>,
        songs: Arc<SongStore>,
        playlists: Arc<PlaylistManager>,
    ) -> Self {
        Self {
            pool,
            providers,
            songs,
            playlists,
            fetch_timeout: Duration::from_secs(IMPORT_TIMEOUT_SECONDS),
            placeholder_name: IMPORT_PLACEHOLDER_NAME.to_string(),
        }
    }

    pub fn with_config(mut self, config: &EngineConfig) -> Self {
        self.fetch_timeout = config.import_timeout();
        self.placeholder_name = config.import_placeholder_name.clone();
        self
    }

    pub fn providers(&self) -> &ProviderManager {
        &self.providers
    }

    /// Imports every track behind `url` into `target`, or into a new
    /// playlist owned by `owner_id` when no target is given.
    ///
    /// All-or-nothing: on any failure the store is left as it was.
    pub async fn import_playlist(
        &self,
        owner_id: &str,
        url: &str,
        target: Option<&str>,
    ) -> Result<Playlist, AppError> {
        log::info!("[{}] {}", ImportStage::Classify, url);
        let classified = classify(url).ok_or_else(|| {
            log::warn!("[{}] unsupported URL: {}", ImportStage::Aborted, url);
            AppError::InvalidUrl(url.to_string())
        })?;

        let target = match target {
            Some(id) => Some(self.editable_playlist(owner_id, id).await?),
            None => None,
        };

        log::info!("[{}] {} {}", ImportStage::Fetch, classified.kind, classified.id);
        let provider = self.providers.provider_for(classified.kind)?;
        let fetched = self
            .bounded(provider.fetch_tracks(&classified))
            .await
            .inspect_err(|e| log::warn!("[{}] fetch failed: {}", ImportStage::Aborted, e))?;

        let tracks = normalize_tracks(fetched);
        log::info!("[{}] {} distinct tracks", ImportStage::Normalize, tracks.len());
        if tracks.is_empty() {
            return Err(AppError::NoTracksFound(url.to_string()));
        }

        let new_playlist = NewPlaylist::playlist(self.placeholder_name.clone(), owner_id);
        let playlist = self
            .commit(target, new_playlist, &[], &tracks)
            .await
            .inspect_err(|e| log::warn!("[{}] import of {} rolled back: {}", ImportStage::Aborted, url, e))?;

        log::info!(
            "[{}] {} tracks from {} into playlist {}",
            ImportStage::Committed,
            tracks.len(),
            url,
            playlist.id
        );
        Ok(playlist)
    }

    /// Loads a playlist the caller may add songs to.
    pub(crate) async fn editable_playlist(&self, owner_id: &str, playlist_id: &str) -> Result<Playlist, AppError> {
        let playlist = self.playlists.get_playlist(playlist_id).await?;
        if playlist.owner_id != owner_id {
            return Err(AppError::Unauthorized(format!(
                "playlist {} belongs to another user",
                playlist_id
            )));
        }
        if playlist.kind == PlaylistKind::Radio {
            return Err(AppError::Unauthorized(format!(
                "radio playlist {} cannot be edited",
                playlist_id
            )));
        }
        Ok(playlist)
    }

    /// Bounds a whole provider fetch, mirror failover and paging included.
    pub(crate) async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, ProviderError>>,
    ) -> Result<T, AppError> {
        match tokio::time::timeout(self.fetch_timeout, call).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(ProviderError::Timeout(self.fetch_timeout).into()),
        }
    }

    /// One transaction: create the playlist if needed, upsert songs, append.
    ///
    /// `leading` song ids go first, before the upserted tracks.
    pub(crate) async fn commit(
        &self,
        target: Option<Playlist>,
        new_playlist: NewPlaylist,
        leading: &[String],
        tracks: &[NormalizedTrack],
    ) -> Result<Playlist, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::from)?;

        let playlist = self
            .write(&mut *tx, target, new_playlist, leading, tracks)
            .await
            .map_err(AppError::into_transaction_error)?;

        tx.commit()
            .await
            .map_err(|e| AppError::from(e).into_transaction_error())?;
        Ok(playlist)
    }

    async fn write(
        &self,
        conn: &mut SqliteConnection,
        target: Option<Playlist>,
        new_playlist: NewPlaylist,
        leading: &[String],
        tracks: &[NormalizedTrack],
    ) -> Result<Playlist, AppError> {
        let playlist = match target {
            Some(playlist) => playlist,
            None => self.playlists.insert_playlist(&mut *conn, new_playlist).await?,
        };

        log::info!("[{}] {} songs", ImportStage::Upsert, tracks.len());
        let songs: Vec<NewSong> = tracks.iter().map(|t| t.song.clone()).collect();
        let stored = index_by_key(self.songs.upsert_songs(&mut *conn, &songs).await?);

        let mut entries: Vec<MembershipEntry> = leading.iter().map(MembershipEntry::new).collect();
        for track in tracks {
            let key: SongKey = track.song.key();
            let song = stored.get(&key).ok_or_else(|| {
                AppError::Database(format!("upsert returned no row for '{}'", key.title))
            })?;
            entries.push(MembershipEntry {
                song_id: song.id.clone(),
                source_url_override: track.source_url.clone(),
            });
        }

        log::info!("[{}] {} memberships", ImportStage::RankInsert, entries.len());
        self.playlists.append(&mut *conn, &playlist.id, &entries).await?;
        Ok(playlist)
    }
}
