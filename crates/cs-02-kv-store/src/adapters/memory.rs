//! Ordered in-memory key-value store for unit tests.
//!
//! Backed by a `BTreeMap` so range scans observe the same key order the
//! production engine does.

use std::collections::BTreeMap;
use std::ops::Bound;

use parking_lot::RwLock;

use crate::error::StoreError;
use crate::ports::{BatchOperation, KeyValueStore, ScanDirection};

/// In-memory [`KeyValueStore`] with the same ordering and close semantics
/// as the RocksDB adapter.
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<Option<BTreeMap<Vec<u8>, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(Some(BTreeMap::new())),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let guard = self.data.read();
        let map = guard.as_ref().ok_or(StoreError::Closed)?;
        Ok(map.get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        let mut guard = self.data.write();
        let map = guard.as_mut().ok_or(StoreError::Closed)?;
        map.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        let mut guard = self.data.write();
        let map = guard.as_mut().ok_or(StoreError::Closed)?;
        map.remove(key);
        Ok(())
    }

    fn write_batch(&self, operations: Vec<BatchOperation>) -> Result<(), StoreError> {
        let mut guard = self.data.write();
        let map = guard.as_mut().ok_or(StoreError::Closed)?;
        // Applied under one write lock, so the batch is atomic as far as
        // any other caller can observe.
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => {
                    map.insert(key, value);
                }
                BatchOperation::Delete { key } => {
                    map.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn scan(
        &self,
        start: &[u8],
        end_exclusive: &[u8],
        direction: ScanDirection,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let guard = self.data.read();
        let map = guard.as_ref().ok_or(StoreError::Closed)?;
        if start >= end_exclusive {
            return Ok(Vec::new());
        }

        let range = map.range::<[u8], _>((Bound::Included(start), Bound::Excluded(end_exclusive)));
        let mut results: Vec<(Vec<u8>, Vec<u8>)> =
            range.map(|(k, v)| (k.clone(), v.clone())).collect();
        if direction == ScanDirection::Reverse {
            results.reverse();
        }
        Ok(results)
    }

    fn close(&self) -> Result<(), StoreError> {
        self.data.write().take();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        for key in [b"aa", b"ab", b"ba", b"bb", b"ca"] {
            store.put(key, key).unwrap();
        }
        store
    }

    // ========== Test Group 1: Basic Operations ==========

    #[test]
    fn test_put_get_delete() {
        let store = MemoryStore::new();
        assert_eq!(store.get(b"k").unwrap(), None);

        store.put(b"k", b"v").unwrap();
        assert_eq!(store.get(b"k").unwrap(), Some(b"v".to_vec()));

        store.put(b"k", b"v2").unwrap();
        assert_eq!(store.get(b"k").unwrap(), Some(b"v2".to_vec()), "overwrite");

        store.delete(b"k").unwrap();
        assert_eq!(store.get(b"k").unwrap(), None);

        store.delete(b"k").unwrap(); // absent key is fine
    }

    #[test]
    fn test_write_batch_applies_all_operations() {
        let store = MemoryStore::new();
        store.put(b"stale", b"x").unwrap();

        store
            .write_batch(vec![
                BatchOperation::put(b"a".to_vec(), b"1".to_vec()),
                BatchOperation::put(b"b".to_vec(), b"2".to_vec()),
                BatchOperation::delete(b"stale".to_vec()),
            ])
            .unwrap();

        assert_eq!(store.get(b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.get(b"b").unwrap(), Some(b"2".to_vec()));
        assert_eq!(store.get(b"stale").unwrap(), None);
    }

    #[test]
    fn test_batch_operations_apply_in_order() {
        let store = MemoryStore::new();
        store
            .write_batch(vec![
                BatchOperation::put(b"k".to_vec(), b"first".to_vec()),
                BatchOperation::delete(b"k".to_vec()),
                BatchOperation::put(b"k".to_vec(), b"last".to_vec()),
            ])
            .unwrap();
        assert_eq!(store.get(b"k").unwrap(), Some(b"last".to_vec()));
    }

    // ========== Test Group 2: Range Scans ==========

    #[test]
    fn test_forward_scan_is_half_open_and_ordered() {
        let store = seeded();
        let results = store.scan(b"ab", b"bb", ScanDirection::Forward).unwrap();
        let keys: Vec<&[u8]> = results.iter().map(|(k, _)| k.as_slice()).collect();
        assert_eq!(keys, vec![&b"ab"[..], &b"ba"[..]], "start in, end out");
    }

    #[test]
    fn test_reverse_scan_descends_from_below_upper_bound() {
        let store = seeded();
        let results = store.scan(b"aa", b"bb", ScanDirection::Reverse).unwrap();
        let keys: Vec<&[u8]> = results.iter().map(|(k, _)| k.as_slice()).collect();
        assert_eq!(keys, vec![&b"ba"[..], &b"ab"[..], &b"aa"[..]]);
    }

    #[test]
    fn test_scan_empty_and_inverted_ranges() {
        let store = seeded();
        assert!(store.scan(b"ab", b"ab", ScanDirection::Forward).unwrap().is_empty());
        assert!(store.scan(b"zz", b"aa", ScanDirection::Forward).unwrap().is_empty());
        assert!(store.scan(b"zz", b"aa", ScanDirection::Reverse).unwrap().is_empty());
    }

    #[test]
    fn test_scan_respects_unsigned_byte_order() {
        let store = MemoryStore::new();
        store.put(&[0x00, 0x7f], b"low").unwrap();
        store.put(&[0x00, 0x80], b"high").unwrap();
        store.put(&[0x01, 0x00], b"next-prefix").unwrap();

        let results = store
            .scan(&[0x00], &[0x01], ScanDirection::Forward)
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].1, b"low");
        assert_eq!(results[1].1, b"high", "0x80 sorts after 0x7f unsigned");
    }

    // ========== Test Group 3: Close Semantics ==========

    #[test]
    fn test_closed_store_rejects_every_operation() {
        let store = seeded();
        store.close().unwrap();

        assert!(matches!(store.get(b"aa"), Err(StoreError::Closed)));
        assert!(matches!(store.put(b"k", b"v"), Err(StoreError::Closed)));
        assert!(matches!(store.delete(b"aa"), Err(StoreError::Closed)));
        assert!(matches!(
            store.write_batch(vec![BatchOperation::delete(b"aa".to_vec())]),
            Err(StoreError::Closed)
        ));
        assert!(matches!(
            store.scan(b"a", b"z", ScanDirection::Forward),
            Err(StoreError::Closed)
        ));

        store.close().unwrap(); // idempotent
    }
}
