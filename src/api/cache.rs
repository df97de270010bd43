// src/api/cache.rs
//! On-disk state carried from one run to the next.
//!
//! Holds the working set (so repeated runs merge by external id), the store
//! secret from the connect handshake, and the date of the last run for
//! once-a-day gating.

use crate::model::Catalog;
use crate::types::StoreSecret;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const STATE_FILE: &str = "state.json";

/// Everything persisted between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
    #[serde(default)]
    pub catalog: Catalog,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<StoreSecret>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync_date: Option<NaiveDate>,
}

impl SyncState {
    pub fn synced_on(&self, day: NaiveDate) -> bool {
        self.last_sync_date == Some(day)
    }

    pub fn mark_synced(&mut self, day: NaiveDate) {
        self.last_sync_date = Some(day);
    }
}

/// File-backed store for [`SyncState`].
///
/// Cache operations are best-effort: a missing or corrupt file loads as an
/// empty state and write failures are logged, so a broken cache never
/// prevents a sync.
pub struct LibraryCache {
    cache_dir: PathBuf,
}

impl LibraryCache {
    /// A cache in `$XDG_CACHE_HOME/unearthed-sync` (or `~/.cache/unearthed-sync`).
    pub fn new() -> Self {
        Self::at(Self::default_cache_dir())
    }

    pub fn at(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    fn default_cache_dir() -> PathBuf {
        std::env::var("XDG_CACHE_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
                PathBuf::from(home).join(".cache")
            })
            .join("unearthed-sync")
    }

    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    fn state_path(&self) -> PathBuf {
        self.cache_dir.join(STATE_FILE)
    }

    pub async fn load(&self) -> SyncState {
        let path = self.state_path();
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) => {
                log::debug!("No cached state at {}: {}", path.display(), e);
                return SyncState::default();
            }
        };
        match serde_json::from_str(&content) {
            Ok(state) => state,
            Err(e) => {
                log::warn!("Ignoring unreadable cache {}: {}", path.display(), e);
                SyncState::default()
            }
        }
    }

    pub async fn save(&self, state: &SyncState) {
        if let Err(e) = self.try_save(state).await {
            log::warn!("Failed to write cache {}: {}", self.state_path().display(), e);
        }
    }

    async fn try_save(&self, state: &SyncState) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.cache_dir).await?;
        let json = serde_json::to_string_pretty(state)?;
        let tmp = self.cache_dir.join(format!("{}.tmp", STATE_FILE));
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, self.state_path()).await
    }
}

impl Default for LibraryCache {
    fn default() -> Self {
        Self::new()
    }
}
