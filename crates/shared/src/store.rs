//! Persistent marker store.
//!
//! Owns the canonical ordered marker collection and mirrors it into a
//! key-value backing store under a single fixed key after every mutation.
//! Loading never writes, so a fuller persisted state can't be clobbered by
//! an empty pre-load snapshot. Persistence failures are logged and skipped;
//! the in-memory collection stays authoritative for the session.

use crate::error::{StorageError, StoreError};
use crate::models::{Marker, MarkerCategory, SearchCandidate};
use crate::projection::GeoPoint;

/// The single backing-store key holding the JSON-serialized marker list.
pub const STORAGE_KEY: &str = "hkmap.markers";

/// Contract with the persistent key-value collaborator (the browser's
/// `localStorage` in the shipped frontend, an in-memory map in tests).
pub trait KeyValueStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Partial marker update; only supplied fields are touched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MarkerPatch {
    pub name_zh: Option<String>,
    pub description: Option<String>,
    pub category: Option<u8>,
}

pub struct MarkerStore<S> {
    storage: S,
    markers: Vec<Marker>,
    next_id: u64,
}

impl<S: KeyValueStorage> MarkerStore<S> {
    pub fn new(storage: S) -> Self {
        MarkerStore {
            storage,
            markers: Vec::new(),
            next_id: 1,
        }
    }

    /// Replace the in-memory collection with persisted state, if any exists
    /// and passes structural validation; otherwise the collection stays
    /// empty. Never writes back.
    pub fn load(&mut self) {
        let raw = match self.storage.get(STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return,
            Err(err) => {
                tracing::warn!("marker load failed, starting empty: {err}");
                return;
            }
        };
        match serde_json::from_str::<Vec<Marker>>(&raw) {
            Ok(markers) => {
                self.next_id = markers.iter().map(|m| m.id).max().map_or(1, |id| id + 1);
                self.markers = markers;
            }
            Err(err) => {
                tracing::warn!("discarding malformed persisted markers: {err}");
            }
        }
    }

    /// Markers in insertion order.
    pub fn list(&self) -> &[Marker] {
        &self.markers
    }

    /// Append a new marker built from a chosen candidate and its converted
    /// position. Fresh id, default category, empty description.
    pub fn create(&mut self, candidate: &SearchCandidate, position: GeoPoint) -> Marker {
        let marker = Marker {
            id: self.next_id,
            name_zh: candidate.name_zh.clone(),
            name_en: candidate.name_en.clone(),
            district_zh: candidate.district_zh.clone().unwrap_or_default(),
            lat: position.lat,
            lon: position.lon,
            category: MarkerCategory::DEFAULT.index(),
            description: String::new(),
        };
        self.next_id += 1;
        self.markers.push(marker.clone());
        self.persist();
        marker
    }

    /// Merge the supplied patch fields into the marker. Unknown category
    /// indices are normalized to the default palette entry.
    pub fn update(&mut self, id: u64, patch: MarkerPatch) -> Result<Marker, StoreError> {
        let updated = {
            let marker = self
                .markers
                .iter_mut()
                .find(|m| m.id == id)
                .ok_or(StoreError::NotFound(id))?;
            if let Some(name_zh) = patch.name_zh {
                marker.name_zh = name_zh;
            }
            if let Some(description) = patch.description {
                marker.description = description;
            }
            if let Some(category) = patch.category {
                marker.category = MarkerCategory::from_index(category).index();
            }
            marker.clone()
        };
        self.persist();
        Ok(updated)
    }

    /// Remove the marker. Idempotent: deleting an absent id changes nothing
    /// and writes nothing.
    pub fn delete(&mut self, id: u64) {
        let before = self.markers.len();
        self.markers.retain(|m| m.id != id);
        if self.markers.len() != before {
            self.persist();
        }
    }

    /// Erase persisted state and empty the collection.
    pub fn clear(&mut self) {
        self.markers.clear();
        if let Err(err) = self.storage.remove(STORAGE_KEY) {
            tracing::warn!("failed to clear persisted markers: {err}");
        }
    }

    fn persist(&self) {
        let json = match serde_json::to_string(&self.markers) {
            Ok(json) => json,
            Err(err) => {
                tracing::warn!("marker serialization failed, skipping save: {err}");
                return;
            }
        };
        if let Err(err) = self.storage.set(STORAGE_KEY, &json) {
            tracing::warn!("marker save failed, in-memory state stays authoritative: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    #[derive(Default)]
    struct MemoryInner {
        map: HashMap<String, String>,
        writes: usize,
        fail_writes: bool,
    }

    #[derive(Clone, Default)]
    struct MemoryStorage {
        inner: Rc<RefCell<MemoryInner>>,
    }

    impl MemoryStorage {
        fn seeded(key: &str, value: &str) -> Self {
            let storage = MemoryStorage::default();
            storage
                .inner
                .borrow_mut()
                .map
                .insert(key.to_string(), value.to_string());
            storage
        }

        fn writes(&self) -> usize {
            self.inner.borrow().writes
        }

        fn stored(&self) -> Option<String> {
            self.inner.borrow().map.get(STORAGE_KEY).cloned()
        }
    }

    impl KeyValueStorage for MemoryStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            Ok(self.inner.borrow().map.get(key).cloned())
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            let mut inner = self.inner.borrow_mut();
            inner.writes += 1;
            if inner.fail_writes {
                return Err(StorageError::Write("quota exceeded".to_string()));
            }
            inner.map.insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.borrow_mut().map.remove(key);
            Ok(())
        }
    }

    fn candidate(zh: &str, en: &str) -> SearchCandidate {
        SearchCandidate {
            name_zh: zh.to_string(),
            name_en: en.to_string(),
            x: 835508.1,
            y: 817176.0,
            district_zh: Some("油尖旺區".to_string()),
            address_en: None,
            source: Default::default(),
        }
    }

    fn geo(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint { lat, lon }
    }

    #[test]
    fn test_create_assigns_unique_ids_and_defaults() {
        let storage = MemoryStorage::default();
        let mut store = MarkerStore::new(storage);
        let a = store.create(&candidate("甲", "A"), geo(22.29, 114.17));
        let b = store.create(&candidate("乙", "B"), geo(22.30, 114.18));
        assert_ne!(a.id, b.id);
        assert_eq!(a.category, MarkerCategory::DEFAULT.index());
        assert!(a.description.is_empty());
        assert_eq!(a.district_zh, "油尖旺區");
    }

    #[test]
    fn test_list_preserves_insertion_order() {
        let mut store = MarkerStore::new(MemoryStorage::default());
        for name in ["甲", "乙", "丙"] {
            store.create(&candidate(name, ""), geo(22.3, 114.2));
        }
        let names: Vec<_> = store.list().iter().map(|m| m.name_zh.as_str()).collect();
        assert_eq!(names, ["甲", "乙", "丙"]);
    }

    #[test]
    fn test_update_merges_only_supplied_fields() {
        let mut store = MarkerStore::new(MemoryStorage::default());
        let created = store.create(&candidate("甲", "A"), geo(22.29, 114.17));
        let updated = store
            .update(
                created.id,
                MarkerPatch {
                    description: Some("favourite".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name_zh, "甲");
        assert_eq!(updated.description, "favourite");
        assert_eq!(updated.category, created.category);
    }

    #[test]
    fn test_update_normalizes_out_of_range_category() {
        let mut store = MarkerStore::new(MemoryStorage::default());
        let created = store.create(&candidate("甲", "A"), geo(22.29, 114.17));
        let updated = store
            .update(
                created.id,
                MarkerPatch {
                    category: Some(200),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.category, MarkerCategory::DEFAULT.index());
    }

    #[test]
    fn test_update_missing_id_is_not_found() {
        let mut store = MarkerStore::new(MemoryStorage::default());
        assert_eq!(
            store.update(42, MarkerPatch::default()),
            Err(StoreError::NotFound(42))
        );
    }

    #[test]
    fn test_delete_is_idempotent() {
        let mut store = MarkerStore::new(MemoryStorage::default());
        let a = store.create(&candidate("甲", "A"), geo(22.29, 114.17));
        store.create(&candidate("乙", "B"), geo(22.30, 114.18));
        store.delete(a.id);
        let after_first: Vec<_> = store.list().to_vec();
        store.delete(a.id);
        assert_eq!(store.list(), after_first.as_slice());
        store.delete(99999); // absent id: no-op
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn test_load_does_not_write_back() {
        let stored = r#"[{"id":3,"nameZH":"甲","nameEN":"A","districtZH":"南區","lat":22.21,"lon":114.21,"type":1,"description":"d"}]"#;
        let storage = MemoryStorage::seeded(STORAGE_KEY, stored);
        let mut store = MarkerStore::new(storage.clone());
        store.load();
        assert_eq!(store.list().len(), 1);
        assert_eq!(storage.writes(), 0, "load must not trigger a save");
    }

    #[test]
    fn test_ids_continue_past_loaded_maximum() {
        let stored = r#"[{"id":7,"nameZH":"甲","nameEN":"A","districtZH":"","lat":22.21,"lon":114.21}]"#;
        let storage = MemoryStorage::seeded(STORAGE_KEY, stored);
        let mut store = MarkerStore::new(storage);
        store.load();
        let created = store.create(&candidate("乙", "B"), geo(22.3, 114.2));
        assert_eq!(created.id, 8);
    }

    #[test]
    fn test_malformed_persisted_json_degrades_to_empty() {
        // Valid JSON, wrong shape: must not crash, must not load anything.
        for bad in ["42", r#"{"id":1}"#, r#""markers""#, "not json at all"] {
            let storage = MemoryStorage::seeded(STORAGE_KEY, bad);
            let mut store = MarkerStore::new(storage.clone());
            store.load();
            assert!(store.list().is_empty(), "loaded from {bad:?}");
            assert_eq!(storage.writes(), 0);
        }
    }

    #[test]
    fn test_mutations_persist_full_collection() {
        let storage = MemoryStorage::default();
        let mut store = MarkerStore::new(storage.clone());
        let a = store.create(&candidate("甲", "A"), geo(22.29, 114.17));
        store.create(&candidate("乙", "B"), geo(22.30, 114.18));
        store.delete(a.id);
        let persisted: Vec<Marker> = serde_json::from_str(&storage.stored().unwrap()).unwrap();
        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted[0].name_zh, "乙");
        assert_eq!(storage.writes(), 3); // one per mutation
    }

    #[test]
    fn test_write_failure_keeps_memory_authoritative() {
        let storage = MemoryStorage::default();
        storage.inner.borrow_mut().fail_writes = true;
        let mut store = MarkerStore::new(storage.clone());
        let created = store.create(&candidate("甲", "A"), geo(22.29, 114.17));
        assert_eq!(store.list().len(), 1);
        assert_eq!(store.list()[0].id, created.id);
        assert!(storage.stored().is_none());
    }

    #[test]
    fn test_clear_erases_persisted_state() {
        let storage = MemoryStorage::default();
        let mut store = MarkerStore::new(storage.clone());
        store.create(&candidate("甲", "A"), geo(22.29, 114.17));
        assert!(storage.stored().is_some());
        store.clear();
        assert!(store.list().is_empty());
        assert!(storage.stored().is_none());
    }
}
