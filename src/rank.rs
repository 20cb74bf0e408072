//! Fractional rank keys.
//!
//! A rank is a non-empty string over `0-9a-z` read as the base-36 digits of a
//! fraction in (0, 1). Byte-wise string order equals numeric order, so SQLite
//! can sort memberships with its default BINARY collation. Ranks never end in
//! `0`; that keeps every pair of distinct ranks separable by a third one.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const BASE: usize = ALPHABET.len();

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RankError {
    #[error("'{rank}' is not a valid rank: {reason}")]
    Malformed { rank: String, reason: &'static str },

    #[error("'{low}' must sort strictly before '{high}'")]
    OutOfOrder { low: String, high: String },
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rank(String);

fn digit(symbol: u8) -> Option<usize> {
    match symbol {
        b'0'..=b'9' => Some((symbol - b'0') as usize),
        b'a'..=b'z' => Some((symbol - b'a') as usize + 10),
        _ => None,
    }
}

impl Rank {
    pub fn parse(raw: &str) -> Result<Self, RankError> {
        let malformed = |reason| RankError::Malformed {
            rank: raw.to_string(),
            reason,
        };

        if raw.is_empty() {
            return Err(malformed("empty"));
        }
        if raw.bytes().any(|b| digit(b).is_none()) {
            return Err(malformed("contains symbols outside 0-9a-z"));
        }
        if raw.ends_with('0') {
            return Err(malformed("ends with the zero symbol"));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn from_symbols(symbols: Vec<u8>) -> Self {
        // Every symbol comes from ALPHABET, which is ASCII.
        Self(symbols.into_iter().map(char::from).collect())
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Rank {
    type Err = RankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rank::parse(s)
    }
}

impl TryFrom<String> for Rank {
    type Error = RankError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rank::parse(&value)
    }
}

impl From<Rank> for String {
    fn from(rank: Rank) -> Self {
        rank.0
    }
}

/// Starting rank for an empty sequence.
pub fn middle() -> Rank {
    Rank::from_symbols(midpoint(&[], None))
}

/// Shortest rank strictly greater than `rank`.
pub fn gen_next(rank: &Rank) -> Rank {
    let symbols = rank.0.as_bytes();
    for (i, &symbol) in symbols.iter().enumerate() {
        if symbol != b'z' {
            let mut out = symbols[..i].to_vec();
            out.push(ALPHABET[digit(symbol).unwrap_or(0) + 1]);
            return Rank::from_symbols(out);
        }
    }
    let mut out = symbols.to_vec();
    out.push(b'1');
    Rank::from_symbols(out)
}

/// Shortest rank strictly less than `rank` and still above the lower bound.
pub fn gen_prev(rank: &Rank) -> Rank {
    let symbols = rank.0.as_bytes();
    for (i, &symbol) in symbols.iter().enumerate() {
        if symbol > b'1' {
            let mut out = symbols[..i].to_vec();
            out.push(ALPHABET[digit(symbol).unwrap_or(1) - 1]);
            return Rank::from_symbols(out);
        }
    }
    // Only '0' and '1' symbols remain, and the last one is '1'.
    let mut out = symbols[..symbols.len() - 1].to_vec();
    out.extend_from_slice(b"0z");
    Rank::from_symbols(out)
}

/// A rank strictly between `low` and `high`, growing the key when the two are
/// adjacent at their current length.
pub fn between(low: &Rank, high: &Rank) -> Result<Rank, RankError> {
    if low >= high {
        return Err(RankError::OutOfOrder {
            low: low.to_string(),
            high: high.to_string(),
        });
    }
    Ok(Rank::from_symbols(midpoint(
        low.0.as_bytes(),
        Some(high.0.as_bytes()),
    )))
}

/// Midpoint of `low` and `high` (or the upper bound when `high` is `None`).
/// `low` may be empty, meaning the lower bound.
fn midpoint(low: &[u8], high: Option<&[u8]>) -> Vec<u8> {
    if let Some(high) = high {
        let mut n = 0;
        while n < high.len() && low.get(n).copied().unwrap_or(b'0') == high[n] {
            n += 1;
        }
        if n > 0 {
            let mut out = high[..n].to_vec();
            out.extend(midpoint(&low[n.min(low.len())..], Some(&high[n..])));
            return out;
        }
    }

    let digit_low = low.first().and_then(|&s| digit(s)).unwrap_or(0);
    let digit_high = high
        .and_then(|h| h.first())
        .and_then(|&s| digit(s))
        .unwrap_or(BASE);

    if digit_high - digit_low > 1 {
        return vec![ALPHABET[(digit_low + digit_high + 1) / 2]];
    }

    if let Some(high) = high {
        if high.len() > 1 {
            return high[..1].to_vec();
        }
    }

    let mut out = vec![ALPHABET[digit_low]];
    out.extend(midpoint(low.get(1..).unwrap_or(&[]), None));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(s: &str) -> Rank {
        Rank::parse(s).unwrap()
    }

    #[test]
    fn middle_is_i() {
        assert_eq!(middle().as_str(), "i");
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!(matches!(Rank::parse(""), Err(RankError::Malformed { .. })));
        assert!(matches!(Rank::parse("aB"), Err(RankError::Malformed { .. })));
        assert!(matches!(Rank::parse("a-1"), Err(RankError::Malformed { .. })));
        assert!(matches!(Rank::parse("a0"), Err(RankError::Malformed { .. })));
        assert!(Rank::parse("0z").is_ok());
    }

    #[test]
    fn next_is_greater_and_short() {
        assert_eq!(gen_next(&r("i")).as_str(), "j");
        assert_eq!(gen_next(&r("i5")).as_str(), "j");
        assert_eq!(gen_next(&r("z")).as_str(), "z1");
        assert_eq!(gen_next(&r("z1")).as_str(), "z2");
        assert_eq!(gen_next(&r("zz")).as_str(), "zz1");
    }

    #[test]
    fn prev_is_less_and_above_lower_bound() {
        assert_eq!(gen_prev(&r("i")).as_str(), "h");
        assert_eq!(gen_prev(&r("1")).as_str(), "0z");
        assert_eq!(gen_prev(&r("01")).as_str(), "00z");
        assert_eq!(gen_prev(&r("1z")).as_str(), "1y");
        assert_eq!(gen_prev(&r("11")).as_str(), "10z");
    }

    #[test]
    fn long_append_and_prepend_runs_stay_ordered() {
        let mut current = middle();
        for _ in 0..500 {
            let next = gen_next(&current);
            assert!(current < next, "{} !< {}", current, next);
            assert!(Rank::parse(next.as_str()).is_ok());
            current = next;
        }
        assert!(current.len() < 20);

        let mut current = middle();
        for _ in 0..500 {
            let prev = gen_prev(&current);
            assert!(prev < current, "{} !< {}", prev, current);
            assert!(Rank::parse(prev.as_str()).is_ok());
            current = prev;
        }
    }

    #[test]
    fn between_extends_precision_for_adjacent_symbols() {
        let mid = between(&r("a1"), &r("a2")).unwrap();
        assert!(r("a1") < mid && mid < r("a2"));
        assert_eq!(mid.as_str(), "a1i");

        let mid = between(&r("a"), &r("b")).unwrap();
        assert!(r("a") < mid && mid < r("b"));
    }

    #[test]
    fn between_handles_prefix_pairs() {
        let cases = [("a", "a1"), ("a", "az"), ("0z", "1"), ("1", "11"), ("y", "z1")];
        for (low, high) in cases {
            let mid = between(&r(low), &r(high)).unwrap();
            assert!(r(low) < mid && mid < r(high), "{} < {} < {}", low, mid, high);
            assert!(Rank::parse(mid.as_str()).is_ok());
        }
    }

    #[test]
    fn between_rejects_inverted_or_equal_bounds() {
        assert!(matches!(
            between(&r("b"), &r("a")),
            Err(RankError::OutOfOrder { .. })
        ));
        assert!(matches!(
            between(&r("b"), &r("b")),
            Err(RankError::OutOfOrder { .. })
        ));
    }

    #[test]
    fn repeated_inserts_at_one_boundary_stay_strict() {
        let low = r("i");
        let mut high = r("j");
        for _ in 0..200 {
            let mid = between(&low, &high).unwrap();
            assert!(low < mid && mid < high);
            high = mid;
        }

        let mut low = r("i");
        let high = r("j");
        for _ in 0..200 {
            let mid = between(&low, &high).unwrap();
            assert!(low < mid && mid < high);
            low = mid;
        }
    }

    #[test]
    fn interleaved_inserts_keep_a_total_order() {
        let mut ranks = vec![middle()];
        for step in 0..300usize {
            let at = (step * 7919) % (ranks.len() + 1);
            let rank = match (at.checked_sub(1).map(|i| &ranks[i]), ranks.get(at)) {
                (Some(prev), Some(next)) => between(prev, next).unwrap(),
                (Some(prev), None) => gen_next(prev),
                (None, Some(next)) => gen_prev(next),
                (None, None) => middle(),
            };
            ranks.insert(at, rank);
        }
        for pair in ranks.windows(2) {
            assert!(pair[0] < pair[1], "{} !< {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn serde_validates() {
        let ok: Rank = serde_json::from_str("\"k3\"").unwrap();
        assert_eq!(ok.as_str(), "k3");
        assert!(serde_json::from_str::<Rank>("\"K3\"").is_err());
    }
}
