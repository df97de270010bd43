// src/formatting/normalize.rs
//! Canonicalization of text scraped from notebook pages.
//!
//! Kindle pages mix typographic punctuation, non-breaking spaces, soft
//! hyphens and zero-width joiners into highlight text. Everything stored or
//! uploaded goes through [`normalize`] exactly once so the destination sees
//! one spelling of every quote regardless of how the page encoded it.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s+").expect("Failed to compile whitespace regex - this is a bug in the code")
});

/// Cleans scraped text. Pure, total and idempotent.
///
/// Steps, in order:
/// 1. Unicode compatibility normalization (NFKC)
/// 2. curly single/double quotes to `'` and `"`
/// 3. en/em dashes (and figure dash, horizontal bar) to `-`
/// 4. ellipsis to `...`
/// 5. every Unicode space variant (including tabs and line breaks) to `' '`
/// 6. zero-width characters and the soft hyphen removed
/// 7. remaining C0/C1 control characters removed
/// 8. whitespace runs collapsed to one space, then trimmed
///
/// A final canonical recomposition runs last: removing a zero-width
/// character can leave a combining mark next to a base letter, and without
/// recomposing a second pass would produce a different string.
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut mapped = String::with_capacity(text.len());
    for c in text.nfkc() {
        match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' => mapped.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' => mapped.push('"'),
            '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}' => mapped.push('-'),
            '\u{2026}' => mapped.push_str("..."),
            c if is_zero_width(c) => {}
            c if c.is_whitespace() => mapped.push(' '),
            c if c.is_control() => {}
            c => mapped.push(c),
        }
    }

    let collapsed = WHITESPACE_RUN.replace_all(&mapped, " ");
    collapsed.trim().nfc().collect()
}

fn is_zero_width(c: char) -> bool {
    matches!(
        c,
        '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}' | '\u{00AD}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn straightens_typographic_punctuation() {
        assert_eq!(
            normalize("\u{201C}It\u{2019}s\u{201D} \u{2014} she said\u{2026}"),
            "\"It's\" - she said..."
        );
        assert_eq!(normalize("1990\u{2013}1995"), "1990-1995");
    }

    #[test]
    fn collapses_space_variants_and_line_breaks() {
        assert_eq!(
            normalize("  one\u{00A0}two\u{2003}three\n\tfour\r\n "),
            "one two three four"
        );
        assert_eq!(normalize("a\u{3000}\u{202F}b"), "a b");
    }

    #[test]
    fn strips_invisible_and_control_characters() {
        assert_eq!(normalize("in\u{00AD}vis\u{200B}ible\u{FEFF}"), "invisible");
        assert_eq!(normalize("bell\u{0007}\u{0085}char"), "bell char");
        assert_eq!(normalize("esc\u{001B}ape"), "escape");
    }

    #[test]
    fn applies_compatibility_normalization() {
        assert_eq!(normalize("\u{FB01}nance"), "finance");
        assert_eq!(normalize("\u{FF21}\u{FF22}"), "AB");
        assert_eq!(normalize("e\u{0301}"), "\u{00E9}");
    }

    #[test]
    fn empty_and_blank_inputs_become_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \u{200B}\u{00A0}\n"), "");
    }

    #[test]
    fn is_idempotent_on_awkward_inputs() {
        let samples = [
            "plain text",
            "  \u{201C}quoted\u{201D}\u{2026}  ",
            "e\u{200B}\u{0301}",
            "a\u{00AD}\u{0308}b",
            "\u{2014}\u{2014}\u{00A0}\u{00A0}",
            "\u{0301}leading mark",
            "tab\tand\u{000B}vertical",
            "\u{00A8}diaeresis \u{2025} two dots",
            "mixed \u{2018}single\u{2019} and \u{201E}low\u{201C}",
        ];
        for sample in samples {
            let once = normalize(sample);
            let twice = normalize(&once);
            assert_eq!(once, twice, "not idempotent for {:?}", sample);
        }
    }
}
