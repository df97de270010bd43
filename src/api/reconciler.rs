// src/api/reconciler.rs
//! Pushes scraped books into the store and ties them to store ids.
//!
//! Two steps: one bulk insert-or-match of the book metadata, then one
//! annotation post per book that got an id. A failure in step two only
//! affects its own book.

use super::responses::{AnnotationRecord, InsertItemsResponse, ItemRecord, StoreRecord};
use crate::algebras::{DestinationStore, UploadError};
use crate::model::{CatalogItem, FailedItem, FailureReason, RemoteIdentifierMap};
use crate::types::ExternalId;
use std::collections::HashSet;
use std::sync::Arc;

/// Per-book result of an upload call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadOutcome {
    /// Books whose metadata and annotations reached the store, stamped
    /// with their store id.
    pub uploaded: Vec<CatalogItem>,
    pub failed: Vec<FailedItem>,
    pub remote_ids: RemoteIdentifierMap,
}

impl UploadOutcome {
    /// `false` if any book failed at any step.
    pub fn success(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct UploadReconciler {
    store: Arc<dyn DestinationStore>,
}

impl UploadReconciler {
    pub fn new(store: Arc<dyn DestinationStore>) -> Self {
        Self { store }
    }

    pub async fn upload(&self, items: &[CatalogItem]) -> UploadOutcome {
        let mut outcome = UploadOutcome::default();
        if items.is_empty() {
            return outcome;
        }

        let records: Vec<ItemRecord> = items.iter().map(ItemRecord::from).collect();
        let response = match self.store.insert_items(&records).await {
            Ok(response) => response,
            Err(e) => {
                log::error!("Bulk insert of {} books failed: {}", items.len(), e);
                let reason = e.to_string();
                outcome.failed = items
                    .iter()
                    .map(|item| FailedItem {
                        item: item.clone(),
                        reason: FailureReason::Upload {
                            error: UploadError::BatchFailed {
                                reason: reason.clone(),
                            },
                        },
                    })
                    .collect();
                return outcome;
            }
        };

        outcome.remote_ids = reconcile(items, &response);
        log::debug!(
            "Store matched {} of {} books ({} new, {} existing)",
            outcome.remote_ids.len(),
            items.len(),
            outcome.remote_ids.inserted().len(),
            outcome.remote_ids.existing().len()
        );

        for item in items {
            let Some(remote_id) = outcome.remote_ids.get(&item.external_id).cloned() else {
                log::warn!("No store record matched '{}'", item.title);
                outcome.failed.push(FailedItem {
                    item: item.clone(),
                    reason: FailureReason::Upload {
                        error: UploadError::Unmatched {
                            title: item.title.clone(),
                        },
                    },
                });
                continue;
            };

            let mut stamped = item.clone();
            stamped.remote_id = Some(remote_id.clone());

            if item.annotations.is_empty() {
                outcome.uploaded.push(stamped);
                continue;
            }

            let annotation_records: Vec<AnnotationRecord> = item
                .annotations
                .iter()
                .map(|a| AnnotationRecord::new(&remote_id, a))
                .collect();

            match self.store.insert_annotations(&annotation_records).await {
                Ok(()) => {
                    log::info!(
                        "Uploaded {} annotations for '{}'",
                        annotation_records.len(),
                        item.title
                    );
                    outcome.uploaded.push(stamped);
                }
                Err(error) => {
                    log::error!("Annotation upload for '{}' failed: {}", item.title, error);
                    outcome.failed.push(FailedItem {
                        item: stamped,
                        reason: FailureReason::Upload { error },
                    });
                }
            }
        }

        outcome
    }
}

/// Assigns store ids to books.
///
/// Records that echo an external id are matched on it. The rest are matched
/// by title; when several records share a title the first one wins, so two
/// books with identical titles can end up with the same id.
pub fn reconcile(items: &[CatalogItem], response: &InsertItemsResponse) -> RemoteIdentifierMap {
    let mut map = RemoteIdentifierMap::new();
    let known: HashSet<&ExternalId> = items.iter().map(|i| &i.external_id).collect();

    let tagged = response
        .inserted_records
        .iter()
        .map(|r| (r, true))
        .chain(response.existing_records.iter().map(|r| (r, false)));

    let mut untagged: Vec<(&StoreRecord, bool)> = Vec::new();
    for (record, inserted) in tagged {
        match record
            .external_id
            .as_deref()
            .and_then(|id| ExternalId::parse(id).ok())
        {
            Some(id) if known.contains(&id) && map.get(&id).is_none() => {
                record_match(&mut map, id, record, inserted)
            }
            Some(_) => {}
            None => untagged.push((record, inserted)),
        }
    }

    for item in items {
        if map.get(&item.external_id).is_some() {
            continue;
        }
        if let Some((record, inserted)) = untagged.iter().find(|(r, _)| r.title == item.title) {
            record_match(&mut map, item.external_id.clone(), record, *inserted);
        }
    }

    map
}

fn record_match(map: &mut RemoteIdentifierMap, id: ExternalId, record: &StoreRecord, inserted: bool) {
    if inserted {
        map.record_inserted(id, record.id.clone());
    } else {
        map.record_existing(id, record.id.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebras::store::tests::MockDestinationStore;
    use crate::model::Annotation;
    use crate::types::RemoteId;
    use pretty_assertions::assert_eq;

    fn book(id: &str, title: &str, quotes: &[&str]) -> CatalogItem {
        let mut item =
            CatalogItem::from_listing(ExternalId::parse(id).unwrap(), Some(title), None, None);
        item.annotations = quotes
            .iter()
            .map(|q| Annotation {
                quote_text: q.to_string(),
                note_text: None,
                color_tag: "Yellow highlight".to_string(),
                location_label: "Location: 1".to_string(),
            })
            .collect();
        item
    }

    fn store_record(title: &str, id: i64, external_id: Option<&str>) -> StoreRecord {
        StoreRecord {
            title: title.to_string(),
            id: RemoteId::Number(id),
            external_id: external_id.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn inserted_and_existing_books_both_get_annotations() {
        let store = MockDestinationStore::new();
        store.preload("Emma", RemoteId::Number(41)).await;
        let reconciler = UploadReconciler::new(Arc::new(store.clone()));

        let items = vec![book("B1", "Dune", &["d1", "d2"]), book("B2", "Emma", &["e1"])];
        let outcome = reconciler.upload(&items).await;

        assert!(outcome.success());
        assert_eq!(outcome.remote_ids.inserted().len(), 1);
        assert_eq!(
            outcome.remote_ids.existing().get(&ExternalId::parse("B2").unwrap()),
            Some(&RemoteId::Number(41))
        );
        let stamped: Vec<_> = outcome
            .uploaded
            .iter()
            .map(|i| (i.title.as_str(), i.remote_id.clone()))
            .collect();
        assert_eq!(
            stamped,
            vec![
                ("Dune", Some(RemoteId::Number(2))),
                ("Emma", Some(RemoteId::Number(41)))
            ]
        );

        let posted: Vec<_> = store
            .annotations()
            .await
            .into_iter()
            .map(|r| (r.source_id, r.content))
            .collect();
        assert_eq!(
            posted,
            vec![
                (RemoteId::Number(2), "d1".to_string()),
                (RemoteId::Number(2), "d2".to_string()),
                (RemoteId::Number(41), "e1".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn annotation_failure_is_isolated() {
        let store = MockDestinationStore::new();
        store.preload("Bad", RemoteId::Number(7)).await;
        store.fail_annotations_for(RemoteId::Number(7)).await;
        let reconciler = UploadReconciler::new(Arc::new(store.clone()));

        let items = vec![
            book("B1", "Bad", &["x"]),
            book("B2", "Good", &["y"]),
        ];
        let outcome = reconciler.upload(&items).await;

        assert!(!outcome.success());
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].item.title, "Bad");
        assert_eq!(outcome.uploaded.len(), 1);
        assert_eq!(outcome.uploaded[0].title, "Good");
        assert_eq!(store.annotations().await.len(), 1);
    }

    #[tokio::test]
    async fn failed_bulk_insert_fails_every_book() {
        let store = MockDestinationStore::new();
        store.fail_next_insert().await;
        let reconciler = UploadReconciler::new(Arc::new(store.clone()));

        let outcome = reconciler
            .upload(&[book("B1", "One", &["a"]), book("B2", "Two", &[])])
            .await;

        assert_eq!(outcome.failed.len(), 2);
        assert!(outcome.uploaded.is_empty());
        assert!(matches!(
            outcome.failed[0].reason,
            FailureReason::Upload {
                error: UploadError::BatchFailed { .. }
            }
        ));
        assert!(store.annotations().await.is_empty());
    }

    #[tokio::test]
    async fn books_without_annotations_skip_the_quote_post() {
        let store = MockDestinationStore::echoing_external_ids();
        let reconciler = UploadReconciler::new(Arc::new(store.clone()));

        let outcome = reconciler.upload(&[book("B1", "Quiet", &[])]).await;
        assert!(outcome.success());
        assert_eq!(outcome.uploaded[0].remote_id, Some(RemoteId::Number(1)));
        assert!(store.annotations().await.is_empty());
    }

    #[test]
    fn external_id_beats_title() {
        let items = vec![book("B1", "Same", &[]), book("B2", "Same", &[])];
        let response = InsertItemsResponse {
            inserted_records: vec![store_record("Same", 10, Some("B2"))],
            existing_records: vec![store_record("Same", 20, Some("B1"))],
        };
        let map = reconcile(&items, &response);
        assert_eq!(map.get(&items[0].external_id), Some(&RemoteId::Number(20)));
        assert_eq!(map.get(&items[1].external_id), Some(&RemoteId::Number(10)));
    }

    #[test]
    fn title_fallback_first_record_wins() {
        let items = vec![book("B1", "Same", &[]), book("B2", "Same", &[]), book("B3", "Lost", &[])];
        let response = InsertItemsResponse {
            inserted_records: vec![store_record("Same", 10, None)],
            existing_records: vec![store_record("Same", 20, None)],
        };
        let map = reconcile(&items, &response);
        assert_eq!(map.get(&items[0].external_id), Some(&RemoteId::Number(10)));
        assert_eq!(map.get(&items[1].external_id), Some(&RemoteId::Number(10)));
        assert_eq!(map.get(&items[2].external_id), None);
    }

    #[tokio::test]
    async fn unmatched_books_are_failures() {
        struct Forgetful;

        #[async_trait::async_trait]
        impl DestinationStore for Forgetful {
            async fn insert_items(
                &self,
                _: &[ItemRecord],
            ) -> Result<InsertItemsResponse, UploadError> {
                Ok(InsertItemsResponse::default())
            }

            async fn insert_annotations(&self, _: &[AnnotationRecord]) -> Result<(), UploadError> {
                Ok(())
            }
        }

        let outcome = UploadReconciler::new(Arc::new(Forgetful))
            .upload(&[book("B1", "Ghost", &["boo"])])
            .await;
        assert_eq!(
            outcome.failed[0].reason,
            FailureReason::Upload {
                error: UploadError::Unmatched {
                    title: "Ghost".to_string()
                }
            }
        );
    }
}
