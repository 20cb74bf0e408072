use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlaylistKind {
    Playlist,
    /// Generated from a seed song; membership is not user-editable.
    Radio,
}

impl fmt::Display for PlaylistKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaylistKind::Playlist => write!(f, "PLAYLIST"),
            PlaylistKind::Radio => write!(f, "RADIO"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub kind: PlaylistKind,
    pub radio_seed_song_id: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone)]
pub struct NewPlaylist {
    pub name: String,
    pub owner_id: String,
    pub kind: PlaylistKind,
    pub radio_seed_song_id: Option<String>,
}

impl NewPlaylist {
    pub fn playlist(name: impl Into<String>, owner_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner_id: owner_id.into(),
            kind: PlaylistKind::Playlist,
            radio_seed_song_id: None,
        }
    }

    pub fn radio(name: impl Into<String>, owner_id: impl Into<String>, seed_song_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner_id: owner_id.into(),
            kind: PlaylistKind::Radio,
            radio_seed_song_id: Some(seed_song_id.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    pub playlist_id: String,
    pub song_id: String,
    pub rank: String,
    pub source_url_override: Option<String>,
    pub created_at: i64,
}

/// A song as it appears in one playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PlaylistSong {
    pub song_id: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub rank: String,
    pub source_url_override: Option<String>,
    pub added_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistDetails {
    pub playlist: Playlist,
    pub songs: Vec<PlaylistSong>,
}

/// One song to append, with an optional playback URL for this playlist only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipEntry {
    pub song_id: String,
    pub source_url_override: Option<String>,
}

impl MembershipEntry {
    pub fn new(song_id: impl Into<String>) -> Self {
        Self {
            song_id: song_id.into(),
            source_url_override: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendOutcome {
    pub added: usize,
    pub skipped: usize,
}
