// src/api/responses.rs
//! Wire shapes exchanged with the content source and the destination store.
//!
//! These mirror the JSON exactly; conversion into the domain model happens
//! in [`super::parser`].

use crate::model::{Annotation, CatalogItem};
use crate::types::RemoteId;
use serde::{Deserialize, Serialize};

// --- Content source ---

/// One page of the library listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryResponse {
    #[serde(default)]
    pub items_list: Vec<RawLibraryItem>,
    #[serde(default)]
    pub pagination_token: Option<String>,
}

/// A listing entry as the source sends it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLibraryItem {
    #[serde(default)]
    pub asin: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub product_url: Option<String>,
}

// --- Destination store ---

/// Book metadata posted to the bulk insert endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub image_url: String,
    pub asin: String,
}

impl From<&CatalogItem> for ItemRecord {
    fn from(item: &CatalogItem) -> Self {
        Self {
            title: item.title.clone(),
            subtitle: item.subtitle.clone(),
            author: item.author.clone(),
            image_url: item.cover_image_url.clone().unwrap_or_default(),
            asin: item.external_id.as_str().to_string(),
        }
    }
}

/// One annotation posted to the quotes endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationRecord {
    pub source_id: RemoteId,
    pub content: String,
    pub note: String,
    pub color: String,
    pub location: String,
}

impl AnnotationRecord {
    pub fn new(source_id: &RemoteId, annotation: &Annotation) -> Self {
        Self {
            source_id: source_id.clone(),
            content: annotation.quote_text.clone(),
            note: annotation.note_text.clone().unwrap_or_default(),
            color: annotation.color_tag.clone(),
            location: annotation.location_label.clone(),
        }
    }
}

/// Answer of the bulk insert: records created now and records already known.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertItemsResponse {
    #[serde(default)]
    pub inserted_records: Vec<StoreRecord>,
    #[serde(default)]
    pub existing_records: Vec<StoreRecord>,
}

/// A book as the store knows it.
///
/// Some deployments echo the external id back, as `externalId` or `asin`;
/// older ones only return the title.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "WireStoreRecord")]
pub struct StoreRecord {
    pub title: String,
    pub id: RemoteId,
    pub external_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireStoreRecord {
    #[serde(default)]
    title: String,
    id: RemoteId,
    #[serde(default)]
    external_id: Option<String>,
    #[serde(default)]
    asin: Option<String>,
}

impl From<WireStoreRecord> for StoreRecord {
    fn from(wire: WireStoreRecord) -> Self {
        Self {
            title: wire.title,
            id: wire.id,
            external_id: wire.external_id.or(wire.asin),
        }
    }
}

/// Answer of the connect handshake.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectResponse {
    pub data: ConnectData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectData {
    pub secret: String,
}
