// src/api/parser.rs
//! Classification and parsing of raw HTTP answers.
//!
//! Everything here is pure: it takes an [`ApiResponse<String>`] already read
//! off the wire and decides whether it is data, a rate-limit signal, or a
//! failure.

use super::client::ApiResponse;
use super::responses::{LibraryResponse, RawLibraryItem};
use crate::algebras::{FetchError, LibraryPage, UploadError};
use crate::constants::ERROR_BODY_PREVIEW_LENGTH;
use crate::model::CatalogItem;
use crate::types::ExternalId;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use std::time::Duration;

/// Maps a source answer's status to a [`FetchError`] when it is not a success.
pub fn check_source_status(result: &ApiResponse<String>) -> Result<(), FetchError> {
    if result.status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = result
            .retry_after
            .as_deref()
            .and_then(|value| parse_retry_after(value, Utc::now()));
        log::info!("Rate limited by {} (retry after {:?})", result.url, retry_after);
        return Err(FetchError::RateLimited { retry_after });
    }
    if !result.status.is_success() {
        log::warn!(
            "HTTP {} from {}: {}",
            result.status,
            result.url,
            preview(&result.data)
        );
        return Err(FetchError::Status {
            status: result.status.as_u16(),
            url: result.url.clone(),
        });
    }
    Ok(())
}

/// Reads a `Retry-After` header value.
///
/// Accepts delta-seconds (`"120"`) or an HTTP-date
/// (`"Wed, 21 Oct 2015 07:28:00 GMT"`). A date in the past means "now".
/// Anything else is ignored.
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }
    let at = DateTime::parse_from_rfc2822(value).ok()?;
    Some(
        at.with_timezone(&Utc)
            .signed_duration_since(now)
            .to_std()
            .unwrap_or(Duration::ZERO),
    )
}

/// Parses one page of the library listing.
pub fn parse_library_page(result: ApiResponse<String>) -> Result<LibraryPage, FetchError> {
    check_source_status(&result)?;

    let response: LibraryResponse = serde_json::from_str(&result.data).map_err(|e| {
        log::error!("Failed to parse listing from {}: {}", result.url, e);
        FetchError::MalformedResponse {
            reason: format!("{} (body: {})", e, preview(&result.data)),
        }
    })?;

    let items = response
        .items_list
        .into_iter()
        .filter_map(catalog_item_from_raw)
        .collect();

    Ok(LibraryPage {
        items,
        pagination_token: response.pagination_token.filter(|t| !t.is_empty()),
    })
}

/// Maps a raw listing entry; entries without a usable id are skipped.
pub fn catalog_item_from_raw(raw: RawLibraryItem) -> Option<CatalogItem> {
    let id = match raw.asin.as_deref().map(ExternalId::parse) {
        Some(Ok(id)) => id,
        Some(Err(e)) => {
            log::warn!("Skipping listing entry {:?}: {}", raw.title, e);
            return None;
        }
        None => {
            log::warn!("Skipping listing entry {:?} without an id", raw.title);
            return None;
        }
    };

    Some(CatalogItem::from_listing(
        id,
        raw.title.as_deref(),
        raw.authors.first().map(String::as_str),
        raw.product_url,
    ))
}

/// Returns the notebook HTML of a successful answer.
pub fn parse_notebook_page(result: ApiResponse<String>) -> Result<String, FetchError> {
    check_source_status(&result)?;
    Ok(result.data)
}

/// Maps a store answer's status to an [`UploadError`] when it is not a success.
pub fn check_store_status(result: &ApiResponse<String>, endpoint: &str) -> Result<(), UploadError> {
    if result.status.is_success() {
        return Ok(());
    }
    log::warn!(
        "Store answered HTTP {} for {}: {}",
        result.status,
        endpoint,
        preview(&result.data)
    );
    Err(UploadError::Rejected {
        status: result.status.as_u16(),
        endpoint: endpoint.to_string(),
    })
}

/// Parses a successful store answer as JSON.
pub fn parse_store_response<T>(result: ApiResponse<String>, endpoint: &str) -> Result<T, UploadError>
where
    T: serde::de::DeserializeOwned,
{
    check_store_status(&result, endpoint)?;
    serde_json::from_str(&result.data).map_err(|e| UploadError::MalformedResponse {
        reason: format!("{} from {} (body: {})", e, endpoint, preview(&result.data)),
    })
}

fn preview(body: &str) -> String {
    if body.chars().count() > ERROR_BODY_PREVIEW_LENGTH {
        let cut: String = body.chars().take(ERROR_BODY_PREVIEW_LENGTH).collect();
        format!("{}...", cut)
    } else {
        body.to_string()
    }
}
