// src/orchestrator.rs
//! One sync run, start to finish.
//!
//! enumerate → merge into the working set → filter → for each book:
//! scrape, then upload → [`SyncReport`].
//!
//! Books are handled strictly one after another. The working-set lock is
//! only taken for short synchronous sections and never held across an
//! `.await`.

use crate::algebras::{DestinationStore, LibrarySource};
use crate::api::{
    DetailScraper, LibraryEnumerator, ScrapeOutcome, ScrapePolicy, UploadOutcome, UploadReconciler,
};
use crate::error::AppError;
use crate::model::{
    Catalog, CatalogItem, FailedItem, FailureReason, SyncEvent, SyncReport, TitleFilter,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Whether a run is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
}

/// Puts the orchestrator back to [`RunState::Idle`] on every exit path.
struct RunGuard<'a> {
    state: &'a Mutex<RunState>,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        *self.state.lock() = RunState::Idle;
    }
}

pub struct SyncOrchestrator {
    source: Arc<dyn LibrarySource>,
    enumerator: LibraryEnumerator,
    scraper: DetailScraper,
    /// `None` in scrape-only mode.
    reconciler: Option<UploadReconciler>,
    run_state: Mutex<RunState>,
    catalog: Mutex<Catalog>,
    events: Option<UnboundedSender<SyncEvent>>,
}

impl SyncOrchestrator {
    /// A full sync: scraped books are uploaded to `store`.
    pub fn new(source: Arc<dyn LibrarySource>, store: Arc<dyn DestinationStore>) -> Self {
        let mut orchestrator = Self::scrape_only(source);
        orchestrator.reconciler = Some(UploadReconciler::new(store));
        orchestrator
    }

    /// Enumerates and scrapes without uploading. Every fully scraped book
    /// counts as succeeded.
    pub fn scrape_only(source: Arc<dyn LibrarySource>) -> Self {
        Self {
            enumerator: LibraryEnumerator::new(source.clone()),
            scraper: DetailScraper::new(source.clone(), ScrapePolicy::default()),
            source,
            reconciler: None,
            run_state: Mutex::new(RunState::Idle),
            catalog: Mutex::new(Catalog::new()),
            events: None,
        }
    }

    pub fn with_scrape_policy(mut self, policy: ScrapePolicy) -> Self {
        self.scraper = DetailScraper::new(self.source.clone(), policy);
        self
    }

    /// Starts from a working set carried over from earlier runs.
    pub fn with_catalog(self, catalog: Catalog) -> Self {
        *self.catalog.lock() = catalog;
        self
    }

    pub fn with_events(mut self, events: UnboundedSender<SyncEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn state(&self) -> RunState {
        *self.run_state.lock()
    }

    /// A snapshot of the working set.
    pub fn catalog(&self) -> Catalog {
        self.catalog.lock().clone()
    }

    /// Runs one sync over the books `filter` lets through.
    ///
    /// Fails only when another run is in flight or the library listing
    /// cannot be read; everything that goes wrong for a single book ends up
    /// in the report instead.
    pub async fn run(&self, filter: &TitleFilter) -> Result<SyncReport, AppError> {
        let Some(_guard) = self.try_begin() else {
            log::warn!("Sync requested while another run is in progress");
            self.emit(SyncEvent::AlreadyRunning);
            return Err(AppError::AlreadyRunning);
        };

        let listed = match self.enumerator.enumerate().await {
            Ok(items) => items,
            Err(e) => {
                self.emit(SyncEvent::SourceUnreachable);
                return Err(e.into());
            }
        };

        let selection = {
            let mut catalog = self.catalog.lock();
            let stats = catalog.merge(listed);
            log::info!(
                "Working set: {} books ({} new, {} updated)",
                catalog.len(),
                stats.inserted,
                stats.updated
            );
            catalog.select(filter)
        };

        if selection.is_empty() {
            log::info!("Nothing selected for this run");
            self.emit(SyncEvent::NoItemsSelected);
            return Ok(SyncReport::empty());
        }
        self.emit(SyncEvent::ItemsFound {
            count: selection.len(),
        });

        let mut succeeded = Vec::new();
        let mut failed = Vec::new();

        for item in selection {
            let result = self.scraper.scrape(&item).await;
            match result.outcome {
                ScrapeOutcome::Failed(error) => failed.push(FailedItem {
                    item,
                    reason: FailureReason::ScrapeFailed { error },
                }),
                ScrapeOutcome::Truncated { pages } => failed.push(FailedItem {
                    item,
                    reason: FailureReason::Truncated { pages },
                }),
                ScrapeOutcome::Complete => {
                    let scraped = CatalogItem {
                        annotations: result.annotations,
                        ..item
                    };
                    match &self.reconciler {
                        Some(reconciler) => {
                            let outcome = reconciler.upload(std::slice::from_ref(&scraped)).await;
                            self.absorb_upload(outcome, &mut succeeded, &mut failed);
                        }
                        None => {
                            self.catalog.lock().record_sync(
                                &scraped.external_id,
                                scraped.annotations.clone(),
                                None,
                            );
                            succeeded.push(scraped);
                        }
                    }
                }
            }
        }

        log::info!(
            "Sync finished: {} succeeded, {} failed",
            succeeded.len(),
            failed.len()
        );
        self.emit(SyncEvent::Finished {
            succeeded: succeeded.len(),
            failed: failed.len(),
        });
        Ok(SyncReport::new(succeeded, failed))
    }

    fn absorb_upload(
        &self,
        outcome: UploadOutcome,
        succeeded: &mut Vec<CatalogItem>,
        failed: &mut Vec<FailedItem>,
    ) {
        let mut catalog = self.catalog.lock();
        for item in outcome.uploaded {
            catalog.record_sync(
                &item.external_id,
                item.annotations.clone(),
                item.remote_id.clone(),
            );
            self.emit(SyncEvent::ItemUploaded {
                title: item.title.clone(),
            });
            succeeded.push(item);
        }
        for failure in outcome.failed {
            // The scrape itself succeeded; keep what was read for export.
            catalog.record_sync(
                &failure.item.external_id,
                failure.item.annotations.clone(),
                failure.item.remote_id.clone(),
            );
            failed.push(failure);
        }
    }

    fn try_begin(&self) -> Option<RunGuard<'_>> {
        let mut state = self.run_state.lock();
        if *state == RunState::Running {
            return None;
        }
        *state = RunState::Running;
        Some(RunGuard {
            state: &self.run_state,
        })
    }

    fn emit(&self, event: SyncEvent) {
        log::debug!("Event: {:?}", event);
        if let Some(events) = &self.events {
            // A dropped receiver only means nobody is listening anymore.
            let _ = events.send(event);
        }
    }
}
