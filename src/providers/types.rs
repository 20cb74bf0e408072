use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Spotify,
    Youtube,
    Soundcloud,
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderId::Spotify => write!(f, "spotify"),
            ProviderId::Youtube => write!(f, "youtube"),
            ProviderId::Soundcloud => write!(f, "soundcloud"),
        }
    }
}

impl FromStr for ProviderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "spotify" => Ok(ProviderId::Spotify),
            "youtube" => Ok(ProviderId::Youtube),
            "soundcloud" => Ok(ProviderId::Soundcloud),
            _ => Err(format!(
                "Invalid provider: '{}'. Valid: spotify, youtube, soundcloud",
                s
            )),
        }
    }
}

/// One track as delivered by a provider, already normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedTrack {
    pub title: String,
    pub artist: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

impl FetchedTrack {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            source_url: None,
        }
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }
}
