// src/api/extractor.rs
//! Pulls annotations and continuation markers out of a notebook page.
//!
//! The notebook renders three parallel node lists (quotes, notes, headers)
//! rather than one element per annotation. They are zipped by position;
//! if the lists disagree in length the extra entries are dropped.

use crate::constants::HEADER_COLOR_LOCATION_SEPARATOR;
use crate::formatting::normalize;
use crate::model::Annotation;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

static QUOTE: Lazy<Selector> = Lazy::new(|| selector("#highlight"));
static NOTE: Lazy<Selector> = Lazy::new(|| selector("#note"));
static HEADER: Lazy<Selector> = Lazy::new(|| selector("#annotationHighlightHeader"));
static NEXT_PAGE_TOKEN: Lazy<Selector> =
    Lazy::new(|| selector(".kp-notebook-annotations-next-page-start"));
static CONTENT_LIMIT_STATE: Lazy<Selector> =
    Lazy::new(|| selector(".kp-notebook-content-limit-state"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("Failed to compile notebook selector - this is a bug in the code")
}

/// What one notebook page yielded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedPage {
    pub annotations: Vec<Annotation>,
    pub continuation_token: Option<String>,
    pub content_limit_state: Option<String>,
}

/// Parses a notebook page. Never fails: a page with none of the expected
/// nodes simply yields no annotations and no continuation.
pub fn extract(document: &str) -> ExtractedPage {
    let html = Html::parse_document(document);

    let quotes: Vec<ElementRef> = html.select(&QUOTE).collect();
    let notes: Vec<ElementRef> = html.select(&NOTE).collect();
    let headers: Vec<ElementRef> = html.select(&HEADER).collect();

    let count = quotes.len().min(notes.len()).min(headers.len());
    if count < quotes.len().max(notes.len()).max(headers.len()) {
        log::debug!(
            "Misaligned notebook lists (quotes={}, notes={}, headers={}); keeping {}",
            quotes.len(),
            notes.len(),
            headers.len(),
            count
        );
    }

    let annotations = quotes
        .iter()
        .zip(&notes)
        .zip(&headers)
        .map(|((quote, note), header)| {
            let (color_tag, location_label) = split_header(&node_text(header));
            let note_text = normalize(&node_text(note));
            Annotation {
                quote_text: normalize(&node_text(quote)),
                note_text: (!note_text.is_empty()).then_some(note_text),
                color_tag,
                location_label,
            }
        })
        .collect();

    ExtractedPage {
        annotations,
        continuation_token: marker_value(&html, &NEXT_PAGE_TOKEN),
        content_limit_state: marker_value(&html, &CONTENT_LIMIT_STATE),
    }
}

/// All descendant text of a node, concatenated.
fn node_text(element: &ElementRef) -> String {
    element.text().collect()
}

/// Splits `"Yellow highlight | Location: 120"` into color and location.
/// Only the first two segments count; anything after a second separator is
/// dropped. Without a separator the whole text is the color.
fn split_header(raw: &str) -> (String, String) {
    let header = normalize(raw);
    let mut segments = header.split(HEADER_COLOR_LOCATION_SEPARATOR);
    let color = segments.next().map(normalize).unwrap_or_default();
    let location = segments.next().map(normalize).unwrap_or_default();
    (color, location)
}

fn marker_value(html: &Html, selector: &Selector) -> Option<String> {
    html.select(selector)
        .next()
        .and_then(|node| node.value().attr("value"))
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
