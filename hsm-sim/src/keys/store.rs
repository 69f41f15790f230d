//! Key storage
//!
//! The store the import handler writes keys into. The protocol core only ever
//! stores keys and counts them; the read-side helpers exist for
//! administration and tests.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use zeroize::{Zeroize, Zeroizing};

use super::algorithm_for_length;

/// Errors raised by a key store
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("key store capacity exceeded ({0} keys)")]
    CapacityExceeded(usize),

    #[error("duplicate key id: {0}")]
    DuplicateKey(String),
}

/// Key storage used by the host command handlers
///
/// Implementations must tolerate concurrent callers: each insert is
/// independently atomic.
pub trait KeyStore: Send + Sync {
    /// Store a key under `id`
    fn store_key(
        &self,
        id: &str,
        data: &[u8],
        key_type: &str,
        metadata: Option<Value>,
    ) -> Result<(), StoreError>;

    /// Number of keys currently held
    fn key_count(&self) -> usize;
}

struct StoredKey {
    key_type: String,
    algorithm: &'static str,
    data: Zeroizing<Vec<u8>>,
    created_at: DateTime<Utc>,
    usage_count: u64,
    metadata: Option<Value>,
}

/// Public description of a stored key, without its material
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyInfo {
    pub id: String,
    pub key_type: String,
    pub algorithm: String,
    pub created_at: DateTime<Utc>,
    pub usage_count: u64,
    pub metadata: Option<Value>,
}

/// In-memory key store guarded by a mutex
pub struct InMemoryKeyStore {
    keys: Mutex<HashMap<String, StoredKey>>,
    max_keys: usize,
}

impl InMemoryKeyStore {
    /// Default capacity
    pub const DEFAULT_MAX_KEYS: usize = 1000;

    /// Create a store holding at most `max_keys` keys
    pub fn new(max_keys: usize) -> Self {
        Self {
            keys: Mutex::new(HashMap::new()),
            max_keys,
        }
    }

    /// Retrieve a copy of a key, counting the use
    pub fn get_key(&self, id: &str) -> Option<Zeroizing<Vec<u8>>> {
        let mut keys = self.keys.lock();
        let stored = keys.get_mut(id)?;
        stored.usage_count += 1;
        Some(stored.data.clone())
    }

    /// Check if a key exists
    pub fn has_key(&self, id: &str) -> bool {
        self.keys.lock().contains_key(id)
    }

    /// Delete a key, returning whether it existed
    pub fn delete_key(&self, id: &str) -> bool {
        let existed = self.keys.lock().remove(id).is_some();
        if existed {
            info!("Deleted key {}", id);
        }
        existed
    }

    /// Key metadata without the key material
    pub fn get_key_info(&self, id: &str) -> Option<KeyInfo> {
        let keys = self.keys.lock();
        keys.get(id).map(|stored| KeyInfo {
            id: id.to_string(),
            key_type: stored.key_type.clone(),
            algorithm: stored.algorithm.to_string(),
            created_at: stored.created_at,
            usage_count: stored.usage_count,
            metadata: stored.metadata.clone(),
        })
    }

    /// All key ids, sorted
    pub fn list_keys(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.keys.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Overwrite and drop every stored key
    pub fn zeroize(&self) {
        let mut keys = self.keys.lock();
        for stored in keys.values_mut() {
            stored.data.zeroize();
        }
        keys.clear();
        warn!("Key store zeroized");
    }
}

impl Default for InMemoryKeyStore {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_KEYS)
    }
}

impl KeyStore for InMemoryKeyStore {
    fn store_key(
        &self,
        id: &str,
        data: &[u8],
        key_type: &str,
        metadata: Option<Value>,
    ) -> Result<(), StoreError> {
        let mut keys = self.keys.lock();

        if keys.contains_key(id) {
            return Err(StoreError::DuplicateKey(id.to_string()));
        }
        if keys.len() >= self.max_keys {
            return Err(StoreError::CapacityExceeded(self.max_keys));
        }

        keys.insert(
            id.to_string(),
            StoredKey {
                key_type: key_type.to_string(),
                algorithm: algorithm_for_length(data.len()),
                data: Zeroizing::new(data.to_vec()),
                created_at: Utc::now(),
                usage_count: 0,
                metadata,
            },
        );
        debug!("Stored key {} (type {}, {} bytes)", id, key_type, data.len());
        Ok(())
    }

    fn key_count(&self) -> usize {
        self.keys.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_store_and_get() {
        let store = InMemoryKeyStore::default();
        store.store_key("KEY_1", &[0x11; 16], "001", None).unwrap();

        assert!(store.has_key("KEY_1"));
        assert_eq!(store.key_count(), 1);
        assert_eq!(store.get_key("KEY_1").unwrap().as_slice(), &[0x11; 16]);
        assert!(store.get_key("missing").is_none());
    }

    #[test]
    fn test_key_info_tracks_usage() {
        let store = InMemoryKeyStore::default();
        let metadata = serde_json::json!({ "kcv": "8CA64D" });
        store.store_key("KEY_1", &[0u8; 8], "ZPK", Some(metadata.clone())).unwrap();
        store.get_key("KEY_1");
        store.get_key("KEY_1");

        let info = store.get_key_info("KEY_1").unwrap();
        assert_eq!(info.key_type, "ZPK");
        assert_eq!(info.algorithm, "DES");
        assert_eq!(info.usage_count, 2);
        assert_eq!(info.metadata, Some(metadata));
    }

    #[test]
    fn test_duplicate_rejected() {
        let store = InMemoryKeyStore::default();
        store.store_key("KEY_1", &[0u8; 16], "001", None).unwrap();
        assert_eq!(
            store.store_key("KEY_1", &[1u8; 16], "001", None),
            Err(StoreError::DuplicateKey("KEY_1".into()))
        );
        assert_eq!(store.get_key("KEY_1").unwrap().as_slice(), &[0u8; 16]);
    }

    #[test]
    fn test_capacity() {
        let store = InMemoryKeyStore::new(2);
        store.store_key("a", &[0u8; 16], "001", None).unwrap();
        store.store_key("b", &[0u8; 16], "001", None).unwrap();
        assert_eq!(
            store.store_key("c", &[0u8; 16], "001", None),
            Err(StoreError::CapacityExceeded(2))
        );
    }

    #[test]
    fn test_delete_list_zeroize() {
        let store = InMemoryKeyStore::default();
        store.store_key("b", &[0u8; 16], "001", None).unwrap();
        store.store_key("a", &[0u8; 16], "001", None).unwrap();
        assert_eq!(store.list_keys(), vec!["a".to_string(), "b".to_string()]);

        assert!(store.delete_key("a"));
        assert!(!store.delete_key("a"));

        store.zeroize();
        assert_eq!(store.key_count(), 0);
    }

    #[test]
    fn test_concurrent_inserts() {
        let store = Arc::new(InMemoryKeyStore::default());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..50 {
                        store
                            .store_key(&format!("KEY_{}_{}", t, i), &[t as u8; 16], "001", None)
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.key_count(), 400);
    }
}
