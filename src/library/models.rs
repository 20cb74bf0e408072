use serde::{Deserialize, Serialize};

const KEY_SEPARATOR: char = '\u{1f}';

/// Identity of a song: `(title, artist, album)`, case-sensitive as stored.
/// A missing album is the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SongKey {
    pub title: String,
    pub artist: String,
    pub album: String,
}

impl SongKey {
    pub fn new(title: impl Into<String>, artist: impl Into<String>, album: Option<&str>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            album: album.unwrap_or_default().to_string(),
        }
    }

    /// Content-addressed id: the same key always yields the same id.
    pub fn song_id(&self) -> String {
        let joined = format!(
            "{}{sep}{}{sep}{}",
            self.title,
            self.artist,
            self.album,
            sep = KEY_SEPARATOR
        );
        format!("{:x}", md5::compute(joined.as_bytes()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSong {
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
}

impl NewSong {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            album: None,
        }
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    pub fn key(&self) -> SongKey {
        SongKey::new(self.title.clone(), self.artist.clone(), self.album.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Song {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Song {
    pub fn key(&self) -> SongKey {
        SongKey {
            title: self.title.clone(),
            artist: self.artist.clone(),
            album: self.album.clone(),
        }
    }

    pub fn album(&self) -> Option<&str> {
        Some(self.album.as_str()).filter(|a| !a.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_stable_and_key_sensitive() {
        let a = SongKey::new("Song", "Artist", None);
        assert_eq!(a.song_id(), SongKey::new("Song", "Artist", Some("")).song_id());
        assert_eq!(a.song_id().len(), 32);
        assert_ne!(a.song_id(), SongKey::new("song", "Artist", None).song_id());
        assert_ne!(a.song_id(), SongKey::new("Song", "Artist", Some("LP")).song_id());
        // The separator keeps field boundaries apart.
        assert_ne!(
            SongKey::new("a b", "c", None).song_id(),
            SongKey::new("a", "b c", None).song_id()
        );
    }
}
