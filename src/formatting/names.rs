// src/formatting/names.rs
//! Pure functions shaping listing titles and author names.

use crate::constants::TITLE_SUBTITLE_DELIMITER;

/// Splits a listing title into `(title, subtitle)` at the first delimiter.
///
/// Only the first occurrence splits, so
/// `format!("{title}: {subtitle}")` reproduces the input whenever the
/// subtitle is non-empty. A title without the delimiter has an empty subtitle.
pub fn split_title(raw: &str) -> (String, String) {
    match raw.split_once(TITLE_SUBTITLE_DELIMITER) {
        Some((title, subtitle)) => (title.to_string(), subtitle.to_string()),
        None => (raw.to_string(), String::new()),
    }
}

/// Reorders a catalog author from `"Last, First"` to `"First Last"`.
///
/// One trailing colon is dropped first (the listing sometimes renders
/// `"Herbert, Frank:"`). Anything that does not split into exactly two
/// comma-separated parts is returned as-is, minus that colon.
pub fn format_author(author: &str) -> String {
    let author = author.strip_suffix(':').unwrap_or(author);
    let parts: Vec<&str> = author.split(',').map(str::trim).collect();
    match parts.as_slice() {
        [last, first] => format!("{} {}", first, last),
        _ => author.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_first_delimiter_only() {
        assert_eq!(
            split_title("Dune: Part One"),
            ("Dune".to_string(), "Part One".to_string())
        );
        assert_eq!(
            split_title("Gödel, Escher, Bach: An Eternal Golden Braid: 20th Anniversary"),
            (
                "Gödel, Escher, Bach".to_string(),
                "An Eternal Golden Braid: 20th Anniversary".to_string()
            )
        );
        assert_eq!(split_title("1984"), ("1984".to_string(), String::new()));
        assert_eq!(
            split_title("Ratio:10"),
            ("Ratio:10".to_string(), String::new())
        );
    }

    #[test]
    fn rejoining_reproduces_the_title() {
        for raw in ["A: B", "A: B: C", ": leading", "trailing: ", "x: y: z: w"] {
            let (title, subtitle) = split_title(raw);
            let rejoined = format!("{}{}{}", title, TITLE_SUBTITLE_DELIMITER, subtitle);
            assert_eq!(rejoined, raw);
        }
    }

    #[test]
    fn reorders_last_first() {
        assert_eq!(format_author("Herbert, Frank"), "Frank Herbert");
        assert_eq!(format_author("Herbert,Frank"), "Frank Herbert");
        assert_eq!(format_author("Herbert, Frank:"), "Frank Herbert");
        assert_eq!(format_author("  Le Guin ,  Ursula K. "), "Ursula K. Le Guin");
    }

    #[test]
    fn passes_through_unexpected_shapes() {
        assert_eq!(format_author("Orwell"), "Orwell");
        assert_eq!(format_author("Orwell:"), "Orwell");
        assert_eq!(format_author("King, Jr., Martin Luther"), "King, Jr., Martin Luther");
        assert_eq!(format_author("a, b, c:"), "a, b, c");
        assert_eq!(format_author(""), "");
    }
}
