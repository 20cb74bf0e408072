//! Artist/title extraction from raw provider titles.
//!
//! Sources disagree on conventions: YouTube and SoundCloud pack
//! "Artist - Title" into one string under an uploader name, while Spotify
//! ships structured artist metadata. Each source picks a [`TitleStrategy`].

pub mod sanitize;

pub use sanitize::{collapse_whitespace, sanitize_title};

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

const DELIMITERS: &[&str] = &[" - ", " – ", " — ", " ~ ", " | "];
const TOPIC_SUFFIX: &str = " - Topic";

static STRAY_COLON: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(^|\s):+(\w)").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedTitle {
    pub artist: String,
    pub title: String,
}

pub trait TitleStrategy: Send + Sync {
    fn format(&self, raw_title: &str, fallback_artist: &str) -> FormattedTitle;
}

/// "Artist - Title" splitting for uploader-titled sources.
#[derive(Debug, Default, Clone, Copy)]
pub struct DelimitedTitle;

/// Artist comes from provider metadata; only the title is cleaned.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredTitle;

impl TitleStrategy for DelimitedTitle {
    fn format(&self, raw_title: &str, fallback_artist: &str) -> FormattedTitle {
        format(raw_title, fallback_artist)
    }
}

impl TitleStrategy for StructuredTitle {
    fn format(&self, raw_title: &str, fallback_artist: &str) -> FormattedTitle {
        FormattedTitle {
            artist: clean_artist(fallback_artist),
            title: sanitize_title(raw_title),
        }
    }
}

/// Splits a raw title into artist and title.
///
/// Falls back to `fallback_artist` when no delimiter is present. Never fails;
/// the worst case is the raw title with the fallback artist.
pub fn format(raw_title: &str, fallback_artist: &str) -> FormattedTitle {
    let uncoloned = STRAY_COLON.replace_all(raw_title, "$1$2");
    let uncoloned = collapse_whitespace(&uncoloned);

    let (artist, title) = match split_artist_title(&uncoloned) {
        Some((artist, title)) => (artist, title),
        None => (fallback_artist.to_string(), uncoloned.clone()),
    };

    FormattedTitle {
        artist: clean_artist(&artist),
        title: sanitize_title(&title),
    }
}

fn split_artist_title(text: &str) -> Option<(String, String)> {
    let (pos, delimiter) = DELIMITERS
        .iter()
        .filter_map(|d| text.find(d).map(|pos| (pos, *d)))
        .min_by_key(|(pos, _)| *pos)?;

    let artist = text[..pos].trim();
    let title = text[pos + delimiter.len()..].trim();
    if artist.is_empty() || title.is_empty() {
        return None;
    }
    Some((artist.to_string(), title.to_string()))
}

fn clean_artist(artist: &str) -> String {
    let artist = collapse_whitespace(artist);
    let artist = artist.strip_suffix(TOPIC_SUFFIX).unwrap_or(artist.as_str()).trim();
    if artist.is_empty() {
        UNKNOWN_ARTIST.to_string()
    } else {
        artist.to_string()
    }
}
