//! Browser `localStorage` adapter for the marker store.

use hkmap_shared::error::StorageError;
use hkmap_shared::store::KeyValueStorage;

/// `localStorage`-backed key-value storage. Each call re-resolves the
/// backing object, so a storage that becomes unavailable mid-session
/// degrades to errors instead of stale handles.
#[derive(Clone, Copy, Default)]
pub struct LocalStorage;

impl LocalStorage {
    pub fn new() -> Self {
        LocalStorage
    }

    fn backing() -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok()?
    }
}

impl KeyValueStorage for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let storage = Self::backing()
            .ok_or_else(|| StorageError::Read("localStorage unavailable".to_string()))?;
        storage
            .get_item(key)
            .map_err(|e| StorageError::Read(format!("{e:?}")))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let storage = Self::backing()
            .ok_or_else(|| StorageError::Write("localStorage unavailable".to_string()))?;
        storage
            .set_item(key, value)
            .map_err(|e| StorageError::Write(format!("{e:?}")))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let storage = Self::backing()
            .ok_or_else(|| StorageError::Write("localStorage unavailable".to_string()))?;
        storage
            .remove_item(key)
            .map_err(|e| StorageError::Write(format!("{e:?}")))
    }
}
