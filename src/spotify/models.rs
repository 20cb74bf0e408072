use serde::{Deserialize, Serialize};

/// Represents a track from a Spotify playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotifyTrack {
    pub title: String,
    /// All credited artists joined with ", "
    pub artist: String,
    pub album: String,
    pub duration_ms: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_expiry")]
    pub expires_in: u64,
}

fn default_expiry() -> u64 {
    3600
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiArtist {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiAlbum {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiTrack {
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ApiArtist>,
    #[serde(default)]
    pub album: ApiAlbum,
    #[serde(default)]
    pub duration_ms: u32,
    #[serde(default)]
    pub is_local: bool,
}

impl From<ApiTrack> for SpotifyTrack {
    fn from(track: ApiTrack) -> Self {
        let artist = track
            .artists
            .iter()
            .map(|a| a.name.as_str())
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>()
            .join(", ");

        SpotifyTrack {
            title: track.name,
            artist,
            album: track.album.name,
            duration_ms: track.duration_ms,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistItem {
    /// Null for removed or unavailable tracks.
    pub track: Option<ApiTrack>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistTracksPage {
    #[serde(default)]
    pub items: Vec<PlaylistItem>,
    pub next: Option<String>,
}
