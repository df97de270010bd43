// src/formatting/csv.rs
//! CSV export of the working set.
//!
//! One row per annotation. A book without annotations still gets one row so
//! it shows up in the export. Every cell is quoted, embedded quotes are
//! doubled, rows are joined with `\n`, and the file starts with a UTF-8 BOM
//! so spreadsheet tools pick the right encoding.

use crate::model::{Annotation, CatalogItem};

const BYTE_ORDER_MARK: &str = "\u{FEFF}";

const HEADER: [&str; 9] = [
    "title",
    "subtitle",
    "author",
    "imageUrl",
    "externalId",
    "content",
    "note",
    "color",
    "location",
];

/// Renders items as a complete CSV document.
pub fn render_csv<'a>(items: impl IntoIterator<Item = &'a CatalogItem>) -> String {
    let mut rows = vec![render_row(HEADER.iter().copied())];

    for item in items {
        if item.annotations.is_empty() {
            rows.push(render_row(book_cells(item, None)));
        } else {
            for annotation in &item.annotations {
                rows.push(render_row(book_cells(item, Some(annotation))));
            }
        }
    }

    let mut out = String::from(BYTE_ORDER_MARK);
    out.push_str(&rows.join("\n"));
    out
}

fn book_cells<'a>(item: &'a CatalogItem, annotation: Option<&'a Annotation>) -> [&'a str; 9] {
    let (content, note, color, location) = match annotation {
        Some(a) => (
            a.quote_text.as_str(),
            a.note_text.as_deref().unwrap_or(""),
            a.color_tag.as_str(),
            a.location_label.as_str(),
        ),
        None => ("", "", "", ""),
    };
    [
        item.title.as_str(),
        item.subtitle.as_str(),
        item.author.as_str(),
        item.cover_image_url.as_deref().unwrap_or(""),
        item.external_id.as_str(),
        content,
        note,
        color,
        location,
    ]
}

fn render_row<'a>(cells: impl IntoIterator<Item = &'a str>) -> String {
    cells
        .into_iter()
        .map(quote_cell)
        .collect::<Vec<_>>()
        .join(",")
}

fn quote_cell(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}
