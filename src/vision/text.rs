//! Cleanup of raw OCR output.
//!
//! Recognition engines can emit letters or a pipe for glyphs that look like
//! digits even with a character whitelist in place, so the text is normalized
//! before any number is looked for.

/// Revision of [`CONFUSABLE_GLYPHS`]. Bump when the table changes.
pub const CONFUSABLE_GLYPHS_VERSION: u32 = 1;

/// Confusable glyph → intended digit, applied in order
pub const CONFUSABLE_GLYPHS: &[(char, char)] = &[
    ('O', '0'),
    ('o', '0'),
    ('I', '1'),
    ('|', '1'),
    ('l', '1'),
];

/// Strip whitespace and replace confusable glyphs with their digits
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .map(substitute)
        .collect()
}

fn substitute(c: char) -> char {
    CONFUSABLE_GLYPHS
        .iter()
        .find(|(from, _)| *from == c)
        .map(|(_, to)| *to)
        .unwrap_or(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letters_become_digits() {
        assert_eq!(normalize("1O2I"), "1021");
        assert_eq!(normalize("o|l"), "011");
    }

    #[test]
    fn test_whitespace_and_newlines_removed() {
        assert_eq!(normalize(" 12 34,5\n"), "1234,5");
        assert_eq!(normalize("\t1\r\n2 \u{a0}3"), "123");
    }

    #[test]
    fn test_other_characters_untouched() {
        assert_eq!(normalize("1234.5L"), "1234.5L");
        assert_eq!(normalize("B8"), "B8");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \n "), "");
    }

    #[test]
    fn test_idempotent() {
        for raw in ["1O2I", " O o I | l ", "12,5 L", "abc\nIOl", ""] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn test_table_targets_are_digits() {
        assert!(CONFUSABLE_GLYPHS.iter().all(|(_, to)| to.is_ascii_digit()));
    }
}
