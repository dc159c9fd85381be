pub mod memory;
pub mod namespace;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "sqlite")]
pub mod sqlite;

use async_trait::async_trait;

pub use memory::MemoryAdapter;
pub use namespace::Namespaced;

use crate::error::Error;

/// A single entry produced by a range scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: Vec<u8>,
}

/// -----------------------------
/// Ledger store contract
/// -----------------------------
///
/// The registry assumes every call is atomic and durable once it returns.
/// Transactions, endorsement and conflict detection belong to the store.
#[async_trait]
pub trait LedgerStore: Send + Sync + 'static {
    /// `None` means the key is absent. Absence is not an error.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error>;

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), Error>;

    async fn delete(&self, key: &str) -> Result<(), Error>;

    /// Open a cursor over `[start, end)` in key order.
    /// An empty `start` or `end` leaves that side of the range open.
    async fn scan(&self, start: &str, end: &str) -> Result<Box<dyn ScanCursor>, Error>;
}

/// An in-progress range enumeration.
///
/// Callers should `close` a cursor once they are done with it, on error
/// paths too. Implementations also release on drop.
#[async_trait]
pub trait ScanCursor: Send {
    async fn next(&mut self) -> Result<Option<KeyValue>, Error>;

    async fn close(self: Box<Self>) -> Result<(), Error>;
}

#[async_trait]
impl<S: LedgerStore + ?Sized> LedgerStore for Box<S> {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
        (**self).get(key).await
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), Error> {
        (**self).put(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        (**self).delete(key).await
    }

    async fn scan(&self, start: &str, end: &str) -> Result<Box<dyn ScanCursor>, Error> {
        (**self).scan(start, end).await
    }
}

/// Does `key` fall inside the scan range `[start, end)`?
pub(crate) fn in_range(key: &str, start: &str, end: &str) -> bool {
    key >= start && (end.is_empty() || key < end)
}

/// Page size used by the SQL adapters when walking a range.
#[cfg(any(feature = "sqlite", feature = "postgres"))]
pub(crate) const SCAN_PAGE_SIZE: i64 = 100;
