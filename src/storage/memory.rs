use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use super::{KvOp, KvStore, StorageError};

/// In-memory store, optionally capped at a byte quota the way browser
/// local storage is.
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    entries: RefCell<BTreeMap<String, String>>,
    quota: Cell<Option<usize>>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Quota counts key and value bytes of every entry
    #[cfg(test)]
    pub(crate) fn with_quota(quota: usize) -> Self {
        Self {
            entries: RefCell::new(BTreeMap::new()),
            quota: Cell::new(Some(quota)),
        }
    }

    #[cfg(test)]
    pub(crate) fn set_quota(&self, quota: Option<usize>) {
        self.quota.set(quota);
    }

    #[cfg(test)]
    pub(crate) fn used_bytes(&self) -> usize {
        footprint(&self.entries.borrow())
    }
}

fn footprint(entries: &BTreeMap<String, String>) -> usize {
    entries.iter().map(|(k, v)| k.len() + v.len()).sum()
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn apply(&self, ops: &[KvOp]) -> Result<(), StorageError> {
        // Stage on a copy so a quota failure leaves the live map alone
        let mut staged = self.entries.borrow().clone();
        let mut last_set = None;
        for op in ops {
            match op {
                KvOp::Set { key, value } => {
                    staged.insert(key.clone(), value.clone());
                    last_set = Some(key);
                }
                KvOp::Remove { key } => {
                    staged.remove(key);
                }
            }
        }
        if let (Some(limit), Some(key)) = (self.quota.get(), last_set) {
            let needed = footprint(&staged);
            if needed > limit {
                return Err(StorageError::QuotaExceeded {
                    key: key.clone(),
                    needed,
                    limit,
                });
            }
        }
        *self.entries.borrow_mut() = staged;
        Ok(())
    }
}
