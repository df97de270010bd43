// src/model/remote.rs
//! Identifiers handed out by the destination store.

use crate::types::{ExternalId, RemoteId};
use indexmap::IndexMap;

/// External id to store id, split by whether the store created the record
/// in this call or already had it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteIdentifierMap {
    inserted: IndexMap<ExternalId, RemoteId>,
    existing: IndexMap<ExternalId, RemoteId>,
}

impl RemoteIdentifierMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_inserted(&mut self, id: ExternalId, remote: RemoteId) {
        self.inserted.insert(id, remote);
    }

    pub fn record_existing(&mut self, id: ExternalId, remote: RemoteId) {
        self.existing.insert(id, remote);
    }

    /// The store id for a book, whichever subset it landed in.
    pub fn get(&self, id: &ExternalId) -> Option<&RemoteId> {
        self.inserted.get(id).or_else(|| self.existing.get(id))
    }

    pub fn inserted(&self) -> &IndexMap<ExternalId, RemoteId> {
        &self.inserted
    }

    pub fn existing(&self) -> &IndexMap<ExternalId, RemoteId> {
        &self.existing
    }

    pub fn len(&self) -> usize {
        self.inserted.len() + self.existing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.existing.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_spans_both_subsets() {
        let mut map = RemoteIdentifierMap::new();
        let a = ExternalId::parse("A1").unwrap();
        let b = ExternalId::parse("B2").unwrap();
        map.record_inserted(a.clone(), RemoteId::Number(10));
        map.record_existing(b.clone(), RemoteId::Text("uuid-b".to_string()));

        assert_eq!(map.get(&a), Some(&RemoteId::Number(10)));
        assert_eq!(map.get(&b), Some(&RemoteId::Text("uuid-b".to_string())));
        assert_eq!(map.len(), 2);
        assert_eq!(map.inserted().len(), 1);
        assert_eq!(map.existing().len(), 1);
        assert!(map.get(&ExternalId::parse("C3").unwrap()).is_none());
    }
}
