use async_trait::async_trait;

use crate::adapters::{KeyValue, LedgerStore, ScanCursor};
use crate::error::Error;

// Postgres TEXT cannot hold NUL, so the separator is U+0001.
const SEPARATOR: char = '\u{1}';
// Sorts directly after SEPARATOR, so it bounds the whole namespace.
const SEPARATOR_END: char = '\u{2}';

/// Confines a store to one namespace of a shared key space.
///
/// Every key is stored as `"<namespace>\u{1}<key>"`. Scans only see keys of
/// this namespace and return them with the prefix stripped, so the registry
/// can keep scanning `("", "")` as if it owned the whole store.
pub struct Namespaced<S> {
    inner: S,
    prefix: String,
    upper: String,
}

impl<S: LedgerStore> Namespaced<S> {
    pub fn new(inner: S, namespace: &str) -> Result<Self, Error> {
        if namespace.is_empty() || namespace.contains(SEPARATOR) {
            return Err(Error::Config(format!(
                "invalid namespace {:?}: must be non-empty and contain no U+0001",
                namespace
            )));
        }

        Ok(Self {
            inner,
            prefix: format!("{}{}", namespace, SEPARATOR),
            upper: format!("{}{}", namespace, SEPARATOR_END),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.prefix[..self.prefix.len() - SEPARATOR.len_utf8()]
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn qualify(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

#[async_trait]
impl<S: LedgerStore> LedgerStore for Namespaced<S> {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
        self.inner.get(&self.qualify(key)).await
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), Error> {
        self.inner.put(&self.qualify(key), value).await
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        self.inner.delete(&self.qualify(key)).await
    }

    async fn scan(&self, start: &str, end: &str) -> Result<Box<dyn ScanCursor>, Error> {
        let start = self.qualify(start);
        let end = if end.is_empty() {
            self.upper.clone()
        } else {
            self.qualify(end)
        };

        let inner = self.inner.scan(&start, &end).await?;
        Ok(Box::new(NamespacedCursor {
            inner,
            prefix_len: self.prefix.len(),
        }))
    }
}

struct NamespacedCursor {
    inner: Box<dyn ScanCursor>,
    prefix_len: usize,
}

#[async_trait]
impl ScanCursor for NamespacedCursor {
    async fn next(&mut self) -> Result<Option<KeyValue>, Error> {
        Ok(self.inner.next().await?.map(|mut kv| {
            kv.key.replace_range(..self.prefix_len, "");
            kv
        }))
    }

    async fn close(self: Box<Self>) -> Result<(), Error> {
        self.inner.close().await
    }
}
