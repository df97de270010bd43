// src/model/annotation.rs
//! Highlights and the per-book pagination cursor used to read them.

use serde::{Deserialize, Serialize};

/// One highlight with its optional note.
///
/// All text fields are already normalized when an `Annotation` exists;
/// the extractor is the only producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub quote_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note_text: Option<String>,
    /// Free-text color label as shown by the source, e.g. "Yellow highlight".
    pub color_tag: String,
    /// Free-text position marker, e.g. "Location: 1520" or "Page: 12".
    pub location_label: String,
}

/// Transient pagination state for one book's notebook.
///
/// Both markers are opaque. A cursor with no continuation token is either
/// the start of a scrape or its end, depending on whether a page was read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeCursor {
    pub continuation_token: Option<String>,
    pub content_limit_state: Option<String>,
}

impl ScrapeCursor {
    /// The cursor for the first notebook page.
    pub fn start() -> Self {
        Self::default()
    }

    /// Whether another page remains after the one that produced this cursor.
    pub fn has_more(&self) -> bool {
        self.continuation_token.is_some()
    }

    /// Moves to the markers reported by the page just parsed.
    ///
    /// Empty marker values count as absent.
    pub fn advance(&mut self, continuation_token: Option<String>, content_limit_state: Option<String>) {
        self.continuation_token = continuation_token.filter(|t| !t.is_empty());
        self.content_limit_state = content_limit_state.filter(|s| !s.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_treats_empty_markers_as_absent() {
        let mut cursor = ScrapeCursor::start();
        assert!(!cursor.has_more());

        cursor.advance(Some("tok-2".to_string()), Some("".to_string()));
        assert!(cursor.has_more());
        assert_eq!(cursor.content_limit_state, None);

        cursor.advance(Some(String::new()), None);
        assert!(!cursor.has_more());
    }

    #[test]
    fn annotation_serializes_camel_case_without_empty_note() {
        let annotation = Annotation {
            quote_text: "Fear is the mind-killer.".to_string(),
            note_text: None,
            color_tag: "Yellow highlight".to_string(),
            location_label: "Location: 210".to_string(),
        };
        let json = serde_json::to_value(&annotation).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "quoteText": "Fear is the mind-killer.",
                "colorTag": "Yellow highlight",
                "locationLabel": "Location: 210"
            })
        );
    }
}
