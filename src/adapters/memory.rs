use async_trait::async_trait;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::adapters::{KeyValue, LedgerStore, ScanCursor, in_range};
use crate::error::Error;

#[derive(Clone, Default)]
struct MemoryState {
    entries: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
    open_cursors: Arc<AtomicUsize>,
}

/// In-memory ledger store. Clones share the same state.
#[derive(Clone, Default)]
pub struct MemoryAdapter {
    state: MemoryState,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of scan cursors opened and not yet released.
    pub fn open_cursors(&self) -> usize {
        self.state.open_cursors.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> Result<usize, Error> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>>, Error> {
        self.state
            .entries
            .lock()
            .map_err(|_| Error::Storage("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl LedgerStore for MemoryAdapter {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), Error> {
        self.lock()?.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        self.lock()?.remove(key);
        Ok(())
    }

    async fn scan(&self, start: &str, end: &str) -> Result<Box<dyn ScanCursor>, Error> {
        // Snapshot the range so the lock is not held while the cursor lives.
        let pending = self
            .lock()?
            .range(start.to_string()..)
            .take_while(|(key, _)| in_range(key, start, end))
            .map(|(key, value)| KeyValue {
                key: key.clone(),
                value: value.clone(),
            })
            .collect();

        self.state.open_cursors.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryCursor {
            pending,
            open_cursors: Arc::clone(&self.state.open_cursors),
        }))
    }
}

struct MemoryCursor {
    pending: VecDeque<KeyValue>,
    open_cursors: Arc<AtomicUsize>,
}

#[async_trait]
impl ScanCursor for MemoryCursor {
    async fn next(&mut self) -> Result<Option<KeyValue>, Error> {
        Ok(self.pending.pop_front())
    }

    async fn close(self: Box<Self>) -> Result<(), Error> {
        // Release happens in Drop.
        Ok(())
    }
}

impl Drop for MemoryCursor {
    fn drop(&mut self) {
        self.open_cursors.fetch_sub(1, Ordering::SeqCst);
    }
}
