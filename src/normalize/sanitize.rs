//! Title cleanup shared by ingestion and playback queries.

use regex::Regex;
use std::sync::LazyLock;

static BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*(?:\([^()]*\)|\[[^\[\]]*\]|【[^【】]*】)").unwrap());

static FEATURING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s+(?:feat\.?|ft\.?|featuring)\s+.*$").unwrap()
});

// Hearts, dingbats, and the pictographic emoji blocks.
static SYMBOLS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x{2600}-\x{27BF}\x{1F000}-\x{1FAFF}\x{2B50}\x{2B55}\x{FE0F}\x{200D}]").unwrap()
});

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Removes annotations, featured-artist tokens and decorative symbols from a
/// title. Returns the trimmed input unchanged if cleaning would leave nothing.
pub fn sanitize_title(title: &str) -> String {
    let cleaned = BRACKETED.replace_all(title, "");
    let cleaned = FEATURING.replace(&cleaned, "");
    let cleaned = SYMBOLS.replace_all(&cleaned, "");
    let cleaned = WHITESPACE.replace_all(&cleaned, " ");
    let cleaned = cleaned.trim().trim_end_matches(&['-', '|', '~'][..]).trim();

    if cleaned.is_empty() {
        collapse_whitespace(title)
    } else {
        cleaned.to_string()
    }
}

pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_annotations() {
        assert_eq!(sanitize_title("Song (Official Video)"), "Song");
        assert_eq!(sanitize_title("Song [HD] (Lyrics)"), "Song");
        assert_eq!(sanitize_title("Song 【MV】"), "Song");
    }

    #[test]
    fn strips_featuring_tokens() {
        assert_eq!(sanitize_title("Song feat. Someone Else"), "Song");
        assert_eq!(sanitize_title("Song ft. X"), "Song");
        assert_eq!(sanitize_title("Song (feat. X)"), "Song");
        assert_eq!(sanitize_title("Song Featuring X & Y"), "Song");
    }

    #[test]
    fn keeps_words_that_merely_contain_feat() {
        assert_eq!(sanitize_title("Defeat the Night"), "Defeat the Night");
        assert_eq!(sanitize_title("Left Behind"), "Left Behind");
    }

    #[test]
    fn strips_hearts_and_emoji() {
        assert_eq!(sanitize_title("♥ Love Song ❤️"), "Love Song");
        assert_eq!(sanitize_title("Fire 🔥🔥 Track"), "Fire Track");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(sanitize_title("  A    B   C "), "A B C");
        assert_eq!(sanitize_title("A\tB"), "A B");
        assert_eq!(collapse_whitespace("A\nB"), "A B");
        assert_eq!(collapse_whitespace(" A \r\n B "), "A B");
    }

    #[test]
    fn never_returns_empty_for_non_empty_input() {
        assert_eq!(sanitize_title("(Intro)"), "(Intro)");
        assert_eq!(sanitize_title("❤"), "❤");
    }

    #[test]
    fn is_idempotent() {
        for raw in ["Song (Live) feat. X", "♥ A  B ♥", "Plain"] {
            let once = sanitize_title(raw);
            assert_eq!(sanitize_title(&once), once);
        }
    }
}
