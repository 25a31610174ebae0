//! Comparison keys for fuzzy title matching

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Stand-in for characters with no 7-bit equivalent
///
/// It is outside the kept alphabet, so it never reaches the final key.
pub const PLACEHOLDER: char = '?';

/// Reduce a display string to a comparison key
///
/// Lower-cases, transliterates to ASCII (accents are stripped, characters
/// with no ASCII form become [`PLACEHOLDER`]) and keeps only `a-z`, `0-9`
/// and the space character.
pub fn normalize(s: &str) -> String {
    s.to_lowercase()
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| {
            if c.is_ascii() {
                c.to_ascii_lowercase()
            } else {
                PLACEHOLDER
            }
        })
        .filter(|c| matches!(c, 'a'..='z' | '0'..='9' | ' '))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "",
        "Song One",
        "01 - song_one.mp3",
        "Beyoncé – Déjà Vu",
        "Sigur Rós / Hoppípolla",
        "Motörhead!!",
        "ØRESUND straße",
        "日本語のタイトル",
        "Ⅻ ＦＵＬＬＷＩＤＴＨ",
        "tabs\tand\nnewlines",
        "emoji 🎵 track",
    ];

    #[test]
    fn test_basic_lowercase_and_strip() {
        assert_eq!(normalize("Song One"), "song one");
        assert_eq!(normalize("01 - song_one.mp3"), "01  songonemp3");
        assert_eq!(normalize("AC/DC"), "acdc");
    }

    #[test]
    fn test_transliteration() {
        assert_eq!(normalize("Beyoncé"), "beyonce");
        assert_eq!(normalize("Déjà Vu"), "deja vu");
        assert_eq!(normalize("Ｆｕｌｌ"), "full");
        assert_eq!(normalize("Ⅻ"), "xii");
    }

    #[test]
    fn test_untransliterable_chars_are_dropped() {
        assert_eq!(normalize("日本"), "");
        assert_eq!(normalize("straße"), "strae");
        assert_eq!(normalize("emoji 🎵 track"), "emoji  track");
    }

    #[test]
    fn test_output_alphabet() {
        for sample in SAMPLES {
            let key = normalize(sample);
            assert!(
                key.chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == ' '),
                "unexpected character in {:?} -> {:?}",
                sample,
                key
            );
        }
    }

    #[test]
    fn test_idempotent() {
        for sample in SAMPLES {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", sample);
        }
    }
}
