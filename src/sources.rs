//! URL classification. Pure host and path matching, no network access.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::providers::ProviderId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    SpotifyPlaylist,
    SpotifyTrack,
    YoutubeVideo,
    YoutubePlaylist,
    SoundcloudTrack,
}

impl SourceKind {
    pub fn provider(&self) -> ProviderId {
        match self {
            SourceKind::SpotifyPlaylist | SourceKind::SpotifyTrack => ProviderId::Spotify,
            SourceKind::YoutubeVideo | SourceKind::YoutubePlaylist => ProviderId::Youtube,
            SourceKind::SoundcloudTrack => ProviderId::Soundcloud,
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, SourceKind::SpotifyPlaylist | SourceKind::YoutubePlaylist)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceKind::SpotifyPlaylist => "spotify playlist",
            SourceKind::SpotifyTrack => "spotify track",
            SourceKind::YoutubeVideo => "youtube video",
            SourceKind::YoutubePlaylist => "youtube playlist",
            SourceKind::SoundcloudTrack => "soundcloud track",
        };
        f.write_str(name)
    }
}

/// A recognised source URL with the provider-side identifier pulled out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedUrl {
    pub kind: SourceKind,
    pub id: String,
    pub url: String,
}

impl ClassifiedUrl {
    fn new(kind: SourceKind, id: impl Into<String>, url: &str) -> Self {
        Self {
            kind,
            id: id.into(),
            url: url.to_string(),
        }
    }
}

const YOUTUBE_HOSTS: &[&str] = &["youtube.com", "www.youtube.com", "m.youtube.com", "music.youtube.com"];
const SOUNDCLOUD_HOSTS: &[&str] = &["soundcloud.com", "www.soundcloud.com", "m.soundcloud.com"];
const SOUNDCLOUD_RESERVED: &[&str] = &[
    "discover", "stream", "search", "upload", "you", "charts", "pages", "settings", "messages",
];

/// Returns `None` for anything that is not a supported source URL.
pub fn classify(input: &str) -> Option<ClassifiedUrl> {
    let trimmed = input.trim();

    if let Some(rest) = trimmed.strip_prefix("spotify:") {
        return classify_spotify_uri(rest, trimmed);
    }

    let url = Url::parse(trimmed).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let host = url.host_str()?.to_ascii_lowercase();
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    match host.as_str() {
        "open.spotify.com" | "play.spotify.com" => classify_spotify_path(&segments, trimmed),
        "youtu.be" => segments
            .first()
            .filter(|id| is_youtube_id(id))
            .map(|id| ClassifiedUrl::new(SourceKind::YoutubeVideo, *id, trimmed)),
        h if YOUTUBE_HOSTS.contains(&h) => classify_youtube(&url, &segments, trimmed),
        h if SOUNDCLOUD_HOSTS.contains(&h) => classify_soundcloud(&segments, trimmed),
        _ => None,
    }
}

fn classify_spotify_uri(rest: &str, original: &str) -> Option<ClassifiedUrl> {
    let (kind, id) = rest.split_once(':')?;
    spotify_kind(kind)
        .filter(|_| is_spotify_id(id))
        .map(|kind| ClassifiedUrl::new(kind, id, original))
}

fn classify_spotify_path(segments: &[&str], original: &str) -> Option<ClassifiedUrl> {
    // Localised links look like /intl-de/playlist/{id}
    let segments = match segments.first() {
        Some(first) if first.starts_with("intl-") => &segments[1..],
        _ => segments,
    };
    match segments {
        [kind, id, ..] => spotify_kind(kind)
            .filter(|_| is_spotify_id(id))
            .map(|kind| ClassifiedUrl::new(kind, *id, original)),
        _ => None,
    }
}

fn spotify_kind(segment: &str) -> Option<SourceKind> {
    match segment {
        "playlist" => Some(SourceKind::SpotifyPlaylist),
        "track" => Some(SourceKind::SpotifyTrack),
        _ => None,
    }
}

fn is_spotify_id(id: &str) -> bool {
    id.len() == 22 && id.chars().all(|c| c.is_ascii_alphanumeric())
}

fn classify_youtube(url: &Url, segments: &[&str], original: &str) -> Option<ClassifiedUrl> {
    let query = |key: &str| {
        url.query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    };

    match segments {
        ["watch"] => query("v")
            .filter(|id| is_youtube_id(id))
            .map(|id| ClassifiedUrl::new(SourceKind::YoutubeVideo, id, original)),
        ["playlist"] => query("list")
            .filter(|id| is_youtube_list_id(id))
            .map(|id| ClassifiedUrl::new(SourceKind::YoutubePlaylist, id, original)),
        ["shorts", id] | ["live", id] if is_youtube_id(id) => {
            Some(ClassifiedUrl::new(SourceKind::YoutubeVideo, *id, original))
        }
        _ => None,
    }
}

fn is_youtube_id(id: &str) -> bool {
    id.len() == 11
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn is_youtube_list_id(id: &str) -> bool {
    id.len() >= 2
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn classify_soundcloud(segments: &[&str], original: &str) -> Option<ClassifiedUrl> {
    match segments {
        [user, track] if !SOUNDCLOUD_RESERVED.contains(user) && !is_soundcloud_user_page(track) => {
            Some(ClassifiedUrl::new(
                SourceKind::SoundcloudTrack,
                format!("{}/{}", user, track),
                original,
            ))
        }
        _ => None,
    }
}

fn is_soundcloud_user_page(segment: &str) -> bool {
    matches!(
        segment,
        "sets" | "tracks" | "albums" | "reposts" | "likes" | "followers" | "following" | "popular-tracks"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(url: &str) -> Option<SourceKind> {
        classify(url).map(|c| c.kind)
    }

    #[test]
    fn spotify_urls() {
        let c = classify("https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M?si=abc").unwrap();
        assert_eq!(c.kind, SourceKind::SpotifyPlaylist);
        assert_eq!(c.id, "37i9dQZF1DXcBWIGoYBM5M");

        assert_eq!(
            kind("https://open.spotify.com/intl-de/track/4uLU6hMCjMI75M1A2tKUQC"),
            Some(SourceKind::SpotifyTrack)
        );
        assert_eq!(kind("spotify:playlist:37i9dQZF1DXcBWIGoYBM5M"), Some(SourceKind::SpotifyPlaylist));
        assert_eq!(kind("https://open.spotify.com/album/37i9dQZF1DXcBWIGoYBM5M"), None);
        assert_eq!(kind("https://spotify.link/abcdef"), None);
    }

    #[test]
    fn youtube_urls() {
        let c = classify("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42").unwrap();
        assert_eq!(c.kind, SourceKind::YoutubeVideo);
        assert_eq!(c.id, "dQw4w9WgXcQ");

        assert_eq!(kind("https://youtu.be/dQw4w9WgXcQ"), Some(SourceKind::YoutubeVideo));
        assert_eq!(kind("https://m.youtube.com/shorts/dQw4w9WgXcQ"), Some(SourceKind::YoutubeVideo));

        let c = classify("https://music.youtube.com/playlist?list=PLFgquLnL59alCl_2TQvOiD5Vgm1hCaGSI").unwrap();
        assert_eq!(c.kind, SourceKind::YoutubePlaylist);
        assert_eq!(c.id, "PLFgquLnL59alCl_2TQvOiD5Vgm1hCaGSI");

        assert_eq!(kind("https://www.youtube.com/watch?v=short"), None);
        assert_eq!(kind("https://www.youtube.com/@channel"), None);
    }

    #[test]
    fn soundcloud_urls() {
        let c = classify("https://soundcloud.com/artist-name/track-name").unwrap();
        assert_eq!(c.kind, SourceKind::SoundcloudTrack);
        assert_eq!(c.id, "artist-name/track-name");

        assert_eq!(kind("https://soundcloud.com/artist-name/sets/my-playlist"), None);
        assert_eq!(kind("https://soundcloud.com/artist-name"), None);
        assert_eq!(kind("https://soundcloud.com/artist-name/likes"), None);
        assert_eq!(kind("https://soundcloud.com/discover/sets"), None);
    }

    #[test]
    fn everything_else_is_unknown() {
        assert_eq!(kind(""), None);
        assert_eq!(kind("not a url"), None);
        assert_eq!(kind("ftp://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M"), None);
        assert_eq!(kind("https://example.com/watch?v=dQw4w9WgXcQ"), None);
    }

    #[test]
    fn kinds_map_to_providers() {
        assert_eq!(SourceKind::SpotifyTrack.provider(), ProviderId::Spotify);
        assert_eq!(SourceKind::YoutubePlaylist.provider(), ProviderId::Youtube);
        assert_eq!(SourceKind::SoundcloudTrack.provider(), ProviderId::Soundcloud);
    }
}
