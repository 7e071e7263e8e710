//! Volatile in-memory record store.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::field::Empty;

use crate::model::Record;
use crate::observability::tracing::record_outcome;
use crate::store::{RecordStore, StoreError};

/// Concurrency-safe map from record id to value.
///
/// DashMap shards the key space, so writers on disjoint keys rarely contend,
/// while every operation on a single key runs under that key's shard lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently stored.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordStore for MemoryStore {
    fn create(&self, id: &str, value: &str) -> Result<(), StoreError> {
        let span = tracing::debug_span!(
            "CreateDataInStore",
            record.id = id,
            otel.status_code = Empty,
            error.message = Empty,
        );
        let _enter = span.enter();

        // Holding the entry keeps the shard locked between the membership
        // test and the insert.
        let result = match self.records.entry(id.to_owned()) {
            Entry::Occupied(_) => Err(StoreError::already_exists(id)),
            Entry::Vacant(slot) => {
                slot.insert(value.to_owned());
                Ok(())
            }
        };
        record_outcome(&span, &result);
        result
    }

    fn get(&self, id: &str) -> Result<String, StoreError> {
        let span = tracing::debug_span!(
            "GetDataFromStore",
            record.id = id,
            otel.status_code = Empty,
            error.message = Empty,
        );
        let _enter = span.enter();

        let result = self
            .records
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::not_found(id));
        record_outcome(&span, &result);
        result
    }

    fn update(&self, id: &str, value: &str) -> Result<(), StoreError> {
        let span = tracing::debug_span!(
            "UpdateDataInStore",
            record.id = id,
            otel.status_code = Empty,
            error.message = Empty,
        );
        let _enter = span.enter();

        let result = match self.records.get_mut(id) {
            Some(mut entry) => {
                *entry = value.to_owned();
                Ok(())
            }
            None => Err(StoreError::not_found(id)),
        };
        record_outcome(&span, &result);
        result
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        let span = tracing::debug_span!(
            "DeleteDataInStore",
            record.id = id,
            otel.status_code = Empty,
            error.message = Empty,
        );
        let _enter = span.enter();

        let result = self
            .records
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(id));
        record_outcome(&span, &result);
        result
    }

    fn list_all(&self) -> Result<Vec<Record>, StoreError> {
        let span = tracing::debug_span!("ListAllDataInStore", otel.status_code = Empty);
        let _enter = span.enter();

        let records: Vec<Record> = self
            .records
            .iter()
            .map(|entry| Record::new(entry.key().clone(), entry.value().clone()))
            .collect();
        tracing::debug!(count = records.len(), "Listed all records");

        let result = Ok(records);
        record_outcome(&span, &result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_crud_operations() {
        let store = MemoryStore::new();
        assert!(store.is_empty());

        store.create("1", "a").unwrap();
        assert_eq!(store.get("1").unwrap(), "a");

        store.update("1", "b").unwrap();
        assert_eq!(store.get("1").unwrap(), "b");

        store.delete("1").unwrap();
        assert_eq!(store.get("1"), Err(StoreError::not_found("1")));
        assert!(store.is_empty());
    }

    #[test]
    fn test_duplicate_create_keeps_value() {
        let store = MemoryStore::new();
        store.create("1", "a").unwrap();

        let err = store.create("1", "b").unwrap_err();
        assert_eq!(err, StoreError::already_exists("1"));
        assert_eq!(store.get("1").unwrap(), "a");
    }

    #[test]
    fn test_missing_record() {
        let store = MemoryStore::new();
        store.create("other", "x").unwrap();

        assert_eq!(store.get("1"), Err(StoreError::not_found("1")));
        assert_eq!(store.update("1", "b"), Err(StoreError::not_found("1")));
        assert_eq!(store.delete("1"), Err(StoreError::not_found("1")));

        // nothing was created by the failed update
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("other").unwrap(), "x");
    }

    #[test]
    fn test_list_all_snapshot() {
        let store = MemoryStore::new();
        for i in 0..10 {
            store.create(&i.to_string(), "first").unwrap();
        }
        store.update("3", "second").unwrap();

        let records = store.list_all().unwrap();
        assert_eq!(records.len(), 10);

        let unique: HashSet<_> = records.iter().map(|r| r.id.clone()).collect();
        assert_eq!(unique.len(), 10);

        let three = records.iter().find(|r| r.id == "3").unwrap();
        assert_eq!(three.value, "second");
    }

    #[test]
    fn test_concurrent_create_same_id() {
        let store = MemoryStore::new();
        let created = AtomicUsize::new(0);
        let conflicts = AtomicUsize::new(0);

        std::thread::scope(|s| {
            for t in 0..16 {
                let store = &store;
                let created = &created;
                let conflicts = &conflicts;
                s.spawn(move || match store.create("shared", &t.to_string()) {
                    Ok(()) => {
                        created.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(StoreError::AlreadyExists { .. }) => {
                        conflicts.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(e) => panic!("unexpected error: {e}"),
                });
            }
        });

        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert_eq!(conflicts.load(Ordering::SeqCst), 15);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_concurrent_create_delete_disjoint_keys() {
        let store = MemoryStore::new();

        std::thread::scope(|s| {
            for t in 0..8 {
                let store = &store;
                s.spawn(move || {
                    for i in 0..100 {
                        let id = format!("{t}-{i}");
                        store.create(&id, "v").unwrap();
                        if i % 2 == 0 {
                            store.delete(&id).unwrap();
                        }
                    }
                });
            }
        });

        assert_eq!(store.len(), 8 * 50);
        assert!(store.list_all().unwrap().iter().all(|r| r.value == "v"));
    }
}
