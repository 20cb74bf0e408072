//! Song identity store. Songs are created or refreshed by upsert and never
//! deleted; callers join results back to their input through [`SongKey`].

pub mod models;

pub use models::{NewSong, Song, SongKey};

use sqlx::{Pool, QueryBuilder, Sqlite, SqliteConnection};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::clock::Clock;
use crate::config::UPSERT_CHUNK_SIZE;
use crate::errors::AppError;

const SONG_COLUMNS: &str = "id, title, artist, album, created_at, updated_at";

pub struct SongStore {
    pool: Pool<Sqlite>,
    clock: Arc<dyn Clock>,
    chunk_size: usize,
}

impl SongStore {
    pub fn new(pool: Pool<Sqlite>, clock: Arc<dyn Clock>) -> Self {
        Self {
            pool,
            clock,
            chunk_size: UPSERT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Inserts new songs and bumps `updated_at` on existing ones.
    ///
    /// Runs on the caller's connection so it can share an import transaction.
    /// Duplicate keys in `songs` are collapsed; the result holds one row per
    /// distinct key, in no particular order.
    pub async fn upsert_songs(
        &self,
        conn: &mut SqliteConnection,
        songs: &[NewSong],
    ) -> Result<Vec<Song>, AppError> {
        let mut seen = HashSet::new();
        let keys: Vec<SongKey> = songs
            .iter()
            .map(NewSong::key)
            .filter(|key| seen.insert(key.clone()))
            .collect();

        let now = self.clock.now_millis();
        let mut stored = Vec::with_capacity(keys.len());

        for chunk in keys.chunks(self.chunk_size) {
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO songs (id, title, artist, album, created_at, updated_at) ",
            );
            qb.push_values(chunk, |mut row, key| {
                row.push_bind(key.song_id())
                    .push_bind(key.title.clone())
                    .push_bind(key.artist.clone())
                    .push_bind(key.album.clone())
                    .push_bind(now)
                    .push_bind(now);
            });
            // The id is derived from the key, so either constraint may fire.
            qb.push(
                " ON CONFLICT(title, artist, album) DO UPDATE SET updated_at = excluded.updated_at \
                 ON CONFLICT(id) DO UPDATE SET updated_at = excluded.updated_at",
            );
            qb.push(" RETURNING ");
            qb.push(SONG_COLUMNS);

            let rows: Vec<Song> = qb.build_query_as::<Song>().fetch_all(&mut *conn).await?;
            stored.extend(rows);
        }

        log::debug!("Upserted {} songs ({} submitted)", stored.len(), songs.len());
        Ok(stored)
    }

    pub async fn get_song(&self, id: &str) -> Result<Song, AppError> {
        sqlx::query_as::<_, Song>(&format!("SELECT {} FROM songs WHERE id = ?", SONG_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("song {}", id)))
    }

    pub async fn find_by_key(&self, key: &SongKey) -> Result<Option<Song>, AppError> {
        let song = sqlx::query_as::<_, Song>(&format!(
            "SELECT {} FROM songs WHERE title = ? AND artist = ? AND album = ?",
            SONG_COLUMNS
        ))
        .bind(&key.title)
        .bind(&key.artist)
        .bind(&key.album)
        .fetch_optional(&self.pool)
        .await?;
        Ok(song)
    }

    /// Ids from `ids` that exist, in input order.
    pub async fn existing_ids(&self, ids: &[String]) -> Result<Vec<String>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut found = HashSet::new();
        for chunk in ids.chunks(self.chunk_size) {
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT id FROM songs WHERE id IN (");
            let mut separated = qb.separated(", ");
            for id in chunk {
                separated.push_bind(id.clone());
            }
            separated.push_unseparated(")");
            let rows: Vec<(String,)> = qb.build_query_as::<(String,)>().fetch_all(&self.pool).await?;
            found.extend(rows.into_iter().map(|(id,)| id));
        }
        Ok(ids.iter().filter(|id| found.contains(*id)).cloned().collect())
    }
}

/// Indexes upserted rows by identity so callers can join back to their input.
pub fn index_by_key(songs: Vec<Song>) -> HashMap<SongKey, Song> {
    songs.into_iter().map(|song| (song.key(), song)).collect()
}
