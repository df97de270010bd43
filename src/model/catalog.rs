// src/model/catalog.rs
//! Library entries and the working set they accumulate into.

use super::Annotation;
use crate::constants::{UNKNOWN_AUTHOR, UNTITLED};
use crate::formatting::{format_author, split_title};
use crate::types::{ExternalId, RemoteId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One book in the user's library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub external_id: ExternalId,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<RemoteId>,
}

impl CatalogItem {
    /// Builds an item from the raw listing fields.
    ///
    /// The raw title is trimmed and split into title/subtitle; the first
    /// author is reordered to "First Last". Missing values fall back to
    /// "Untitled" and "Unknown".
    pub fn from_listing(
        external_id: ExternalId,
        raw_title: Option<&str>,
        first_author: Option<&str>,
        cover_image_url: Option<String>,
    ) -> Self {
        let raw_title = raw_title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(UNTITLED);
        let (title, subtitle) = split_title(raw_title);
        let author = first_author
            .filter(|a| !a.is_empty())
            .map(format_author)
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());

        Self {
            external_id,
            title,
            subtitle,
            author,
            cover_image_url: cover_image_url.filter(|u| !u.is_empty()),
            annotations: Vec::new(),
            remote_id: None,
        }
    }

    /// Title and subtitle joined the way the listing displayed them.
    pub fn full_title(&self) -> String {
        if self.subtitle.is_empty() {
            self.title.clone()
        } else {
            format!(
                "{}{}{}",
                self.title,
                crate::constants::TITLE_SUBTITLE_DELIMITER,
                self.subtitle
            )
        }
    }

    /// Overwrites the mutable display fields with a newer listing of the same book.
    ///
    /// Annotations and the remote id belong to this item's history and are kept.
    pub fn absorb(&mut self, newer: CatalogItem) {
        debug_assert_eq!(self.external_id, newer.external_id);
        self.title = newer.title;
        self.subtitle = newer.subtitle;
        self.author = newer.author;
        self.cover_image_url = newer.cover_image_url;
    }
}

/// Counts from one [`Catalog::merge`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub inserted: usize,
    pub updated: usize,
}

/// The working set: every known book keyed by external id, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<CatalogItem>", into = "Vec<CatalogItem>")]
pub struct Catalog {
    items: IndexMap<ExternalId, CatalogItem>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges items by external id: a match takes the newer display fields,
    /// anything else is appended. Never produces duplicates.
    pub fn merge(&mut self, items: impl IntoIterator<Item = CatalogItem>) -> MergeStats {
        let mut stats = MergeStats::default();
        for item in items {
            match self.items.get_mut(&item.external_id) {
                Some(existing) => {
                    log::debug!("Updating known book {}", item.external_id);
                    existing.absorb(item);
                    stats.updated += 1;
                }
                None => {
                    self.items.insert(item.external_id.clone(), item);
                    stats.inserted += 1;
                }
            }
        }
        stats
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &ExternalId) -> Option<&CatalogItem> {
        self.items.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogItem> {
        self.items.values()
    }

    /// Items the filter lets through, in working-set order.
    pub fn select(&self, filter: &TitleFilter) -> Vec<CatalogItem> {
        self.items
            .values()
            .filter(|item| filter.permits(item))
            .cloned()
            .collect()
    }

    /// Records the outcome of a fresh scrape and upload for one book.
    ///
    /// A scrape re-reads the whole notebook, so its annotations replace the
    /// previous ones rather than extending them.
    pub fn record_sync(
        &mut self,
        id: &ExternalId,
        annotations: Vec<Annotation>,
        remote_id: Option<RemoteId>,
    ) {
        if let Some(item) = self.items.get_mut(id) {
            item.annotations = annotations;
            if remote_id.is_some() {
                item.remote_id = remote_id;
            }
        }
    }
}

impl From<Vec<CatalogItem>> for Catalog {
    fn from(items: Vec<CatalogItem>) -> Self {
        let mut catalog = Catalog::new();
        catalog.merge(items);
        catalog
    }
}

impl From<Catalog> for Vec<CatalogItem> {
    fn from(catalog: Catalog) -> Self {
        catalog.items.into_values().collect()
    }
}

/// Restricts a run to part of the library.
///
/// Titles match either the short title or the full "title: subtitle" form.
/// The deny-list wins over the allow-list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleFilter {
    allow: Option<Vec<String>>,
    deny: Vec<String>,
}

impl TitleFilter {
    /// A filter that lets every book through.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_allowed(mut self, titles: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.allow
            .get_or_insert_with(Vec::new)
            .extend(titles.into_iter().map(Into::into));
        self
    }

    pub fn with_denied(mut self, titles: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.deny.extend(titles.into_iter().map(Into::into));
        self
    }

    pub fn permits(&self, item: &CatalogItem) -> bool {
        let full = item.full_title();
        let matches = |titles: &[String]| titles.iter().any(|t| *t == item.title || *t == full);

        if matches(&self.deny) {
            return false;
        }
        match &self.allow {
            Some(allowed) => matches(allowed),
            None => true,
        }
    }
}
