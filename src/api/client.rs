// src/api/client.rs
//! Thin HTTP client wrappers for the reading service and the highlight store.
//!
//! These wrap reqwest, attach authentication and build URLs. They make one
//! request per call and leave retries, pacing and interpretation of the
//! answer to the layers above.

use super::parser;
use super::responses::{AnnotationRecord, ConnectResponse, InsertItemsResponse, ItemRecord};
use crate::algebras::{DestinationStore, FetchError, LibraryPage, LibrarySource, UploadError};
use crate::constants::{LIBRARY_PAGE_SIZE, STORE_AUTH_SEPARATOR};
use crate::error::AppError;
use crate::model::ScrapeCursor;
use crate::types::{ApiKey, ExternalId, SessionCookie, StoreSecret, ValidatedUrl};
use parking_lot::RwLock;
use reqwest::{header, Client, Response};
use serde::Serialize;
use std::time::Duration;
use url::Url;

const LIBRARY_PATH: &str = "/kindle-library/search";
const NOTEBOOK_PATH: &str = "/notebook";

pub const CONNECT_ENDPOINT: &str = "/api/public/connect";
pub const BOOKS_INSERT_ENDPOINT: &str = "/api/public/books-insert";
pub const QUOTES_INSERT_ENDPOINT: &str = "/api/public/quotes-insert";

// ---------------------------------------------------------------------------
// Reading service
// ---------------------------------------------------------------------------

/// Client for the reading service's library listing and notebook pages.
///
/// Authenticates with the session cookie of a signed-in browser.
#[derive(Clone)]
pub struct SourceHttpClient {
    client: Client,
    base_url: ValidatedUrl,
}

impl SourceHttpClient {
    pub fn new(
        cookie: &SessionCookie,
        base_url: ValidatedUrl,
        request_timeout: Duration,
    ) -> Result<Self, AppError> {
        let client = Client::builder()
            .default_headers(Self::create_headers(cookie)?)
            .timeout(request_timeout)
            .build()?;
        Ok(Self { client, base_url })
    }

    fn create_headers(cookie: &SessionCookie) -> Result<header::HeaderMap, AppError> {
        let mut headers = header::HeaderMap::new();
        let mut cookie_value = header::HeaderValue::from_str(cookie.as_str()).map_err(|e| {
            AppError::MissingConfiguration(format!("Invalid session cookie: {}", e))
        })?;
        cookie_value.set_sensitive(true);
        headers.insert(header::COOKIE, cookie_value);
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("*/*"));
        headers.insert(
            "x-requested-with",
            header::HeaderValue::from_static("XMLHttpRequest"),
        );
        Ok(headers)
    }

    /// URL of one library listing page.
    pub fn library_url(&self, token: Option<&str>) -> Result<Url, FetchError> {
        let mut url = self.join(LIBRARY_PATH)?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("libraryType", "BOOKS")
                .append_pair("sortType", "recency")
                .append_pair("querySize", &LIBRARY_PAGE_SIZE.to_string());
            if let Some(token) = token {
                query.append_pair("paginationToken", token);
            }
        }
        Ok(url)
    }

    /// URL of one notebook page. The first page carries an empty
    /// content-limit state; later pages forward both markers.
    pub fn notebook_url(&self, id: &ExternalId, cursor: &ScrapeCursor) -> Result<Url, FetchError> {
        let mut url = self.join(NOTEBOOK_PATH)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("asin", id.as_str());
            if let Some(token) = &cursor.continuation_token {
                query.append_pair("token", token);
            }
            query.append_pair(
                "contentLimitState",
                cursor.content_limit_state.as_deref().unwrap_or(""),
            );
        }
        Ok(url)
    }

    fn join(&self, path: &str) -> Result<Url, FetchError> {
        self.base_url
            .join(path)
            .map_err(|e| FetchError::MalformedResponse {
                reason: e.to_string(),
            })
    }

    async fn get(&self, url: Url) -> Result<ApiResponse<String>, FetchError> {
        log::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        Ok(extract_response_text(response).await?)
    }
}

#[async_trait::async_trait]
impl LibrarySource for SourceHttpClient {
    async fn fetch_library_page(&self, token: Option<&str>) -> Result<LibraryPage, FetchError> {
        let url = self.library_url(token)?;
        let result = self.get(url).await?;
        parser::parse_library_page(result)
    }

    async fn fetch_notebook_page(
        &self,
        id: &ExternalId,
        cursor: &ScrapeCursor,
    ) -> Result<String, FetchError> {
        let url = self.notebook_url(id, cursor)?;
        let result = self.get(url).await?;
        parser::parse_notebook_page(result)
    }
}

// ---------------------------------------------------------------------------
// Highlight store
// ---------------------------------------------------------------------------

/// Client for the store's public API.
///
/// Every write is authorized with `Bearer <api key>~~~<secret>`. The secret
/// comes from the connect handshake and is requested lazily the first time
/// it is needed, unless one was supplied up front.
pub struct StoreHttpClient {
    client: Client,
    base_url: ValidatedUrl,
    api_key: ApiKey,
    secret: RwLock<Option<StoreSecret>>,
}

impl StoreHttpClient {
    pub fn new(
        api_key: ApiKey,
        base_url: ValidatedUrl,
        secret: Option<StoreSecret>,
        request_timeout: Duration,
    ) -> Result<Self, AppError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url,
            api_key,
            secret: RwLock::new(secret),
        })
    }

    /// The secret currently in use, if the handshake has happened.
    pub fn secret(&self) -> Option<StoreSecret> {
        self.secret.read().clone()
    }

    /// Exchanges the API key for a secret and remembers it.
    pub async fn connect(&self) -> Result<StoreSecret, UploadError> {
        let url = self.join(CONNECT_ENDPOINT)?;
        log::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key.as_str()))
            .send()
            .await?;
        let result = extract_response_text(response).await?;
        let connect: ConnectResponse = parser::parse_store_response(result, CONNECT_ENDPOINT)?;
        let secret = StoreSecret::new(connect.data.secret).map_err(|e| UploadError::NotConnected {
            reason: e.to_string(),
        })?;

        log::info!("Connected to store at {}", self.base_url);
        *self.secret.write() = Some(secret.clone());
        Ok(secret)
    }

    /// Returns the known secret, performing the handshake if there is none.
    pub async fn ensure_connected(&self) -> Result<StoreSecret, UploadError> {
        if let Some(secret) = self.secret() {
            return Ok(secret);
        }
        self.connect().await
    }

    fn authorization(&self, secret: &StoreSecret) -> String {
        format!(
            "Bearer {}{}{}",
            self.api_key.as_str(),
            STORE_AUTH_SEPARATOR,
            secret.as_str()
        )
    }

    fn join(&self, path: &str) -> Result<Url, UploadError> {
        self.base_url
            .join(path)
            .map_err(|e| UploadError::NotConnected {
                reason: e.to_string(),
            })
    }

    /// Makes an authorized POST with a JSON body.
    pub async fn post<T: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &T,
    ) -> Result<ApiResponse<String>, UploadError> {
        let secret = self.ensure_connected().await?;
        let url = self.join(endpoint)?;
        log::debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .header(header::AUTHORIZATION, self.authorization(&secret))
            .json(body)
            .send()
            .await?;
        Ok(extract_response_text(response).await?)
    }
}

#[async_trait::async_trait]
impl DestinationStore for StoreHttpClient {
    async fn insert_items(&self, items: &[ItemRecord]) -> Result<InsertItemsResponse, UploadError> {
        let result = self.post(BOOKS_INSERT_ENDPOINT, items).await?;
        parser::parse_store_response(result, BOOKS_INSERT_ENDPOINT)
    }

    async fn insert_annotations(&self, records: &[AnnotationRecord]) -> Result<(), UploadError> {
        let result = self.post(QUOTES_INSERT_ENDPOINT, records).await?;
        parser::check_store_status(&result, QUOTES_INSERT_ENDPOINT)
    }
}

// ---------------------------------------------------------------------------
// Response capture
// ---------------------------------------------------------------------------

/// Result of an HTTP operation with response metadata.
#[derive(Debug)]
pub struct ApiResponse<T> {
    pub data: T,
    pub status: reqwest::StatusCode,
    pub url: String,
    /// Raw `Retry-After` header, when present.
    pub retry_after: Option<String>,
}

/// Extracts the response body as text with metadata.
pub async fn extract_response_text(response: Response) -> Result<ApiResponse<String>, reqwest::Error> {
    let status = response.status();
    let url = response.url().to_string();
    let retry_after = response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let text = response.text().await?;

    Ok(ApiResponse {
        data: text,
        status,
        url,
        retry_after,
    })
}
