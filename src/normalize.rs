// src/normalize.rs
//! Team-name canonicalization used for every feed/catalog comparison.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Club-name decorations dropped when they stand alone ("FC Barcelona").
pub const DECORATIONS: [&str; 6] = ["fc", "cf", "sc", "ac", "rc", "cd"];

// ASCII word boundaries so that non-ASCII letters act as separators.
static RE_DECORATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u:\b)(?:fc|cf|sc|ac|rc|cd)(?-u:\b)").expect("static regex"));

/// Canonical comparison key for a free-text team name.
///
/// Lower-case, strip diacritics, drop standalone decorations, keep `[a-z0-9]`.
/// A name that collapses to a bare decoration ("F.C.") yields the empty key,
/// which keeps the function idempotent.
pub fn normalize_name(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let folded: String = lowered.nfd().filter(|c| !is_combining_mark(*c)).collect();
    let undecorated = RE_DECORATION.replace_all(&folded, "");
    let key: String = undecorated
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect();

    if DECORATIONS.contains(&key.as_str()) {
        String::new()
    } else {
        key
    }
}

/// Bidirectional substring test on two normalized keys. An empty key is a
/// substring of every key, so it corresponds to anything.
pub fn names_correspond(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}

/// Team-pair key used to collapse repeated feed records.
pub fn pair_key(home: &str, away: &str) -> String {
    format!("{}_vs_{}", normalize_name(home), normalize_name(away))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decorations_and_accents() {
        assert_eq!(normalize_name("FC Barcelona"), normalize_name("barcelona"));
        assert_eq!(normalize_name("Atlético Madrid"), "atleticomadrid");
        assert_eq!(normalize_name("São Paulo FC"), "saopaulo");
        assert_eq!(normalize_name("AC Milan"), "milan");
    }

    #[test]
    fn decoration_inside_a_word_is_kept() {
        // "sc" inside "Oscar" is not a standalone token.
        assert_eq!(normalize_name("Oscar SC"), "oscar");
        assert_eq!(normalize_name("Racing Club"), "racingclub");
    }

    #[test]
    fn empty_and_symbol_only_inputs() {
        assert_eq!(normalize_name(""), "");
        assert_eq!(normalize_name("  --  "), "");
        assert_eq!(normalize_name("F.C."), "");
    }

    #[test]
    fn correspondence_is_symmetric_substring() {
        assert!(names_correspond("realmadrid", "madrid"));
        assert!(names_correspond("madrid", "realmadrid"));
        assert!(names_correspond("", "madrid"));
        assert!(names_correspond("madrid", ""));
        assert!(!names_correspond("chelsea", "arsenal"));
    }

    #[test]
    fn pair_key_shape() {
        assert_eq!(pair_key("Real Madrid", "FC Barcelona"), "realmadrid_vs_barcelona");
    }
}
