use super::models::{
    AppendOutcome, Membership, MembershipEntry, NewPlaylist, Playlist, PlaylistDetails, PlaylistSong,
};
use crate::clock::Clock;
use crate::config::RANK_LENGTH_WARNING;
use crate::errors::AppError;
use crate::rank::{self, Rank};
use sqlx::{Pool, QueryBuilder, Sqlite, SqliteConnection};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

const PLAYLIST_COLUMNS: &str = "id, name, owner_id, kind, radio_seed_song_id, created_at";
const INSERT_CHUNK_SIZE: usize = 50;

pub struct PlaylistManager {
    pool: Pool<Sqlite>,
    clock: Arc<dyn Clock>,
    rank_length_warning: usize,
}

impl PlaylistManager {
    pub fn new(pool: Pool<Sqlite>, clock: Arc<dyn Clock>) -> Self {
        Self {
            pool,
            clock,
            rank_length_warning: RANK_LENGTH_WARNING,
        }
    }

    pub fn with_rank_length_warning(mut self, length: usize) -> Self {
        self.rank_length_warning = length;
        self
    }

    pub async fn create_playlist(&self, new: NewPlaylist) -> Result<Playlist, AppError> {
        let mut conn = self.pool.acquire().await?;
        self.insert_playlist(&mut conn, new).await
    }

    /// Inserts a playlist on the caller's connection, so an import can
    /// create its target inside its own transaction.
    pub async fn insert_playlist(
        &self,
        conn: &mut SqliteConnection,
        new: NewPlaylist,
    ) -> Result<Playlist, AppError> {
        let id = Uuid::new_v4().to_string();

        let playlist = sqlx::query_as::<_, Playlist>(&format!(
            "INSERT INTO playlists (id, name, owner_id, kind, radio_seed_song_id, created_at) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING {}",
            PLAYLIST_COLUMNS
        ))
        .bind(&id)
        .bind(&new.name)
        .bind(&new.owner_id)
        .bind(new.kind)
        .bind(&new.radio_seed_song_id)
        .bind(self.clock.now_millis())
        .fetch_one(&mut *conn)
        .await?;

        log::info!("Created {} '{}' ({})", playlist.kind, playlist.name, playlist.id);
        Ok(playlist)
    }

    pub async fn get_playlist(&self, playlist_id: &str) -> Result<Playlist, AppError> {
        sqlx::query_as::<_, Playlist>(&format!(
            "SELECT {} FROM playlists WHERE id = ?",
            PLAYLIST_COLUMNS
        ))
        .bind(playlist_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("playlist {}", playlist_id)))
    }

    pub async fn list_playlists(&self, owner_id: &str) -> Result<Vec<Playlist>, AppError> {
        let playlists = sqlx::query_as::<_, Playlist>(&format!(
            "SELECT {} FROM playlists WHERE owner_id = ? ORDER BY created_at DESC, id ASC",
            PLAYLIST_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(playlists)
    }

    /// Songs in playlist order: ascending rank, song id breaking ties.
    pub async fn get_playlist_songs(&self, playlist_id: &str) -> Result<Vec<PlaylistSong>, AppError> {
        let songs = sqlx::query_as::<_, PlaylistSong>(
            r#"
            SELECT
                ps.song_id, s.title, s.artist, s.album,
                ps.rank, ps.source_url_override,
                ps.created_at as added_at
            FROM playlist_songs ps
            JOIN songs s ON ps.song_id = s.id
            WHERE ps.playlist_id = ?
            ORDER BY ps.rank ASC, ps.song_id ASC
            "#,
        )
        .bind(playlist_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(songs)
    }

    pub async fn get_playlist_details(&self, playlist_id: &str) -> Result<PlaylistDetails, AppError> {
        let playlist = self.get_playlist(playlist_id).await?;
        let songs = self.get_playlist_songs(playlist_id).await?;
        Ok(PlaylistDetails { playlist, songs })
    }

    pub async fn get_membership(&self, playlist_id: &str, song_id: &str) -> Result<Membership, AppError> {
        sqlx::query_as::<_, Membership>(
            "SELECT playlist_id, song_id, rank, source_url_override, created_at \
             FROM playlist_songs WHERE playlist_id = ? AND song_id = ?",
        )
        .bind(playlist_id)
        .bind(song_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("song {} in playlist {}", song_id, playlist_id)))
    }

    /// Appends `entries` after the current last song, in order.
    ///
    /// Songs already in the playlist are skipped. If nothing new remains the
    /// call fails with `Conflict` and the caller's transaction should roll back.
    pub async fn append(
        &self,
        conn: &mut SqliteConnection,
        playlist_id: &str,
        entries: &[MembershipEntry],
    ) -> Result<AppendOutcome, AppError> {
        let mut seen = HashSet::new();
        let entries: Vec<&MembershipEntry> = entries
            .iter()
            .filter(|e| seen.insert(e.song_id.as_str()))
            .collect();
        if entries.is_empty() {
            return Ok(AppendOutcome::default());
        }

        let (max_rank,): (Option<String>,) =
            sqlx::query_as("SELECT MAX(rank) FROM playlist_songs WHERE playlist_id = ?")
                .bind(playlist_id)
                .fetch_one(&mut *conn)
                .await?;

        let mut last = max_rank.as_deref().map(Rank::parse).transpose()?;
        let mut ranked = Vec::with_capacity(entries.len());
        for entry in entries {
            let next = match &last {
                Some(rank) => rank::gen_next(rank),
                None => rank::middle(),
            };
            ranked.push((entry, next.clone()));
            last = Some(next);
        }

        let now = self.clock.now_millis();
        let mut added = 0;
        for chunk in ranked.chunks(INSERT_CHUNK_SIZE) {
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO playlist_songs (playlist_id, song_id, rank, source_url_override, created_at) ",
            );
            qb.push_values(chunk, |mut row, (entry, rank)| {
                row.push_bind(playlist_id.to_string())
                    .push_bind(entry.song_id.clone())
                    .push_bind(rank.to_string())
                    .push_bind(entry.source_url_override.clone())
                    .push_bind(now);
            });
            qb.push(" ON CONFLICT(playlist_id, song_id) DO NOTHING RETURNING song_id");

            let inserted: Vec<(String,)> = qb.build_query_as::<(String,)>().fetch_all(&mut *conn).await?;
            added += inserted.len();
        }

        let skipped = ranked.len() - added;
        if added == 0 {
            log::warn!(
                "All {} songs are already in playlist {}",
                skipped,
                playlist_id
            );
            return Err(AppError::Conflict(format!(
                "every song is already in playlist {}",
                playlist_id
            )));
        }

        if let Some(rank) = &last {
            self.check_rank_length(playlist_id, rank);
        }
        log::info!(
            "Appended {} songs to playlist {} ({} skipped)",
            added,
            playlist_id,
            skipped
        );
        Ok(AppendOutcome { added, skipped })
    }

    /// Gives `song_id` a rank between the given neighbours and returns it.
    ///
    /// Only the moved row is written. With no neighbours the song goes just
    /// after its current rank.
    pub async fn move_song(
        &self,
        playlist_id: &str,
        song_id: &str,
        previous: Option<&Rank>,
        next: Option<&Rank>,
    ) -> Result<Rank, AppError> {
        let current = Rank::parse(&self.get_membership(playlist_id, song_id).await?.rank)?;

        let rank = match (previous, next) {
            (Some(previous), Some(next)) => rank::between(previous, next)?,
            (None, Some(next)) => rank::gen_prev(next),
            (Some(previous), None) => rank::gen_next(previous),
            (None, None) => rank::gen_next(&current),
        };

        sqlx::query("UPDATE playlist_songs SET rank = ? WHERE playlist_id = ? AND song_id = ?")
            .bind(rank.as_str())
            .bind(playlist_id)
            .bind(song_id)
            .execute(&self.pool)
            .await?;

        self.check_rank_length(playlist_id, &rank);
        log::debug!("Moved {} in {} from {} to {}", song_id, playlist_id, current, rank);
        Ok(rank)
    }

    /// Moves `song_id` so it ends up at `index` in the ordered playlist.
    /// Indexes past the end move the song to the end.
    pub async fn move_to_index(
        &self,
        playlist_id: &str,
        song_id: &str,
        index: usize,
    ) -> Result<Rank, AppError> {
        let songs = self.get_playlist_songs(playlist_id).await?;
        if !songs.iter().any(|s| s.song_id == song_id) {
            return Err(AppError::NotFound(format!(
                "song {} in playlist {}",
                song_id, playlist_id
            )));
        }

        let others: Vec<&PlaylistSong> = songs.iter().filter(|s| s.song_id != song_id).collect();
        let index = index.min(others.len());
        let previous = match index {
            0 => None,
            i => Some(Rank::parse(&others[i - 1].rank)?),
        };
        let next = others.get(index).map(|s| Rank::parse(&s.rank)).transpose()?;

        self.move_song(playlist_id, song_id, previous.as_ref(), next.as_ref())
            .await
    }

    pub async fn remove_song(&self, playlist_id: &str, song_id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM playlist_songs WHERE playlist_id = ? AND song_id = ?")
            .bind(playlist_id)
            .bind(song_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "song {} in playlist {}",
                song_id, playlist_id
            )));
        }
        log::info!("Removed {} from playlist {}", song_id, playlist_id);
        Ok(())
    }

    pub async fn delete_playlist(&self, playlist_id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM playlist_songs WHERE playlist_id = ?")
            .bind(playlist_id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM playlists WHERE id = ?")
            .bind(playlist_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("playlist {}", playlist_id)));
        }

        tx.commit().await?;
        log::info!("Deleted playlist {}", playlist_id);
        Ok(())
    }

    fn check_rank_length(&self, playlist_id: &str, rank: &Rank) {
        if rank.len() > self.rank_length_warning {
            log::warn!(
                "Rank in playlist {} has grown to {} symbols",
                playlist_id,
                rank.len()
            );
        }
    }
}
