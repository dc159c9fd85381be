//! # Dealer Registry
//!
//! A small record layer for dealer accounts kept in a key-addressed ledger
//! store. Each [`Asset`] lives under its `DealerID`; the registry creates,
//! reads, overwrites, deletes and enumerates them, and can swap a dealer's
//! balance while handing back the previous value.
//!
//! ## What the registry enforces
//!
//! The store underneath is a bare key-value interface. The registry adds:
//! - **Existence gating**: create needs an absent key; read, update,
//!   delete and transfer need a present one.
//! - **Deterministic encoding**: records are JSON with their fields in
//!   alphabetical order, so independent peers re-encode identically.
//! - **Full-range enumeration**: [`Registry::get_all_assets`] scans the
//!   whole key space and releases its cursor on every exit path.
//!
//! Durability, isolation and conflict detection belong to the store. The
//! registry does not lock, retry or roll back.
//!
//! ```rust,ignore
//! use dealer_registry::{Registry, adapters::MemoryAdapter};
//!
//! let registry = Registry::new(Box::new(MemoryAdapter::new()));
//! registry.init_ledger().await?;
//!
//! let old = registry.transfer_asset("DEALER001", 9000).await?;
//! assert_eq!(old, "10000");
//! ```
//!
//! ## Stores
//!
//! | Store                | Feature    | Notes                              |
//! |----------------------|------------|------------------------------------|
//! | `MemoryAdapter`      | always     | in-process, for tests and tooling  |
//! | `SqliteAdapter`      | `sqlite` ✓ | file or in-memory database         |
//! | `PostgresAdapter`    | `postgres` | shared database                    |
//! | `Namespaced<S>`      | always     | confines any store to a key prefix |
//!
//! [`StoreConfig`] and [`open_store`] pick one from a URL.

pub mod adapters;
pub mod asset;
pub mod config;
pub mod error;

use metrics::{counter, histogram};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

pub use crate::adapters::{KeyValue, LedgerStore, ScanCursor};
pub use crate::asset::{Asset, seed_assets};
pub use crate::config::{StoreConfig, open_store};
pub use crate::error::Error;

/// The registry is the caller-facing surface over a [`LedgerStore`].
/// Cloning is cheap; clones share the store.
#[derive(Clone)]
pub struct Registry {
    store: Arc<dyn LedgerStore>,
}

impl Registry {
    pub fn new(store: Box<dyn LedgerStore>) -> Self {
        Self {
            store: store.into(),
        }
    }

    pub fn from_arc(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Open the configured store and build a registry over it.
    pub async fn open(config: &StoreConfig) -> Result<Self, Error> {
        Ok(Self::new(open_store(config).await?))
    }

    pub fn store(&self) -> &dyn LedgerStore {
        self.store.as_ref()
    }

    /// Write the sample dealers, overwriting whatever those keys held.
    ///
    /// Stops at the first failure. Records written before it stay written.
    pub async fn init_ledger(&self) -> Result<(), Error> {
        observed("init_ledger", async {
            let assets = seed_assets();
            for asset in &assets {
                self.put_asset(&asset.dealer_id, asset).await?;
            }
            info!(count = assets.len(), "seeded ledger");
            Ok(())
        })
        .await
    }

    pub async fn asset_exists(&self, dealer_id: &str) -> Result<bool, Error> {
        observed("asset_exists", self.exists(dealer_id)).await
    }

    /// Issue a new asset. Fails with [`Error::AlreadyExists`] if the dealer
    /// is already on the ledger. Field values are stored as given.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_asset(
        &self,
        dealer_id: &str,
        mpin: &str,
        msisdn: &str,
        status: &str,
        balance: i64,
        trans_amount: i64,
        trans_type: &str,
        remarks: &str,
    ) -> Result<(), Error> {
        observed("create_asset", async {
            if self.exists(dealer_id).await? {
                return Err(Error::AlreadyExists(dealer_id.to_string()));
            }

            let asset = Asset {
                balance,
                dealer_id: dealer_id.to_string(),
                mpin: mpin.to_string(),
                msisdn: msisdn.to_string(),
                remarks: remarks.to_string(),
                status: status.to_string(),
                trans_amount,
                trans_type: trans_type.to_string(),
            };
            self.put_asset(dealer_id, &asset).await?;
            debug!(dealer_id, "created asset");
            Ok(())
        })
        .await
    }

    pub async fn read_asset(&self, dealer_id: &str) -> Result<Asset, Error> {
        observed("read_asset", self.fetch(dealer_id)).await
    }

    /// Overwrite every field of an existing asset. Nothing from the previous
    /// record is merged in.
    #[allow(clippy::too_many_arguments)]
    pub async fn update_asset(
        &self,
        dealer_id: &str,
        msisdn: &str,
        status: &str,
        balance: i64,
        mpin: &str,
        trans_amount: i64,
        trans_type: &str,
        remarks: &str,
    ) -> Result<(), Error> {
        observed("update_asset", async {
            if !self.exists(dealer_id).await? {
                return Err(Error::NotFound(dealer_id.to_string()));
            }

            let asset = Asset {
                balance,
                dealer_id: dealer_id.to_string(),
                mpin: mpin.to_string(),
                msisdn: msisdn.to_string(),
                remarks: remarks.to_string(),
                status: status.to_string(),
                trans_amount,
                trans_type: trans_type.to_string(),
            };
            self.put_asset(dealer_id, &asset).await?;
            debug!(dealer_id, "updated asset");
            Ok(())
        })
        .await
    }

    pub async fn delete_asset(&self, dealer_id: &str) -> Result<(), Error> {
        observed("delete_asset", async {
            if !self.exists(dealer_id).await? {
                return Err(Error::NotFound(dealer_id.to_string()));
            }

            self.store.delete(dealer_id).await?;
            debug!(dealer_id, "deleted asset");
            Ok(())
        })
        .await
    }

    /// Set the balance of an existing asset and return the previous balance
    /// as a decimal string. Every other field is left untouched.
    pub async fn transfer_asset(&self, dealer_id: &str, new_balance: i64) -> Result<String, Error> {
        observed("transfer_asset", async {
            let mut asset = self.fetch(dealer_id).await?;
            let old_balance = asset.balance;
            asset.balance = new_balance;

            self.put_asset(dealer_id, &asset).await?;
            debug!(dealer_id, old_balance, new_balance, "transferred asset balance");
            Ok(old_balance.to_string())
        })
        .await
    }

    /// Every asset in the store, in key order.
    ///
    /// The first undecodable entry aborts the scan and nothing is returned.
    pub async fn get_all_assets(&self) -> Result<Vec<Asset>, Error> {
        observed("get_all_assets", async {
            // Open-ended range: the registry owns the whole key space.
            let mut cursor = self.store.scan("", "").await?;
            let drained = drain_assets(cursor.as_mut()).await;
            let closed = cursor.close().await;

            let assets = drained?;
            closed?;
            Ok(assets)
        })
        .await
    }

    async fn exists(&self, dealer_id: &str) -> Result<bool, Error> {
        Ok(self.store.get(dealer_id).await?.is_some())
    }

    async fn fetch(&self, dealer_id: &str) -> Result<Asset, Error> {
        match self.store.get(dealer_id).await? {
            Some(bytes) => Asset::decode(dealer_id, &bytes),
            None => Err(Error::NotFound(dealer_id.to_string())),
        }
    }

    /// Writes under `key`, which is the caller's key and not
    /// necessarily the DealerID inside a stored body.
    async fn put_asset(&self, key: &str, asset: &Asset) -> Result<(), Error> {
        let bytes = asset.encode()?;
        self.store.put(key, bytes).await
    }
}

async fn drain_assets(cursor: &mut dyn ScanCursor) -> Result<Vec<Asset>, Error> {
    let mut assets = Vec::new();
    while let Some(entry) = cursor.next().await? {
        assets.push(Asset::decode(&entry.key, &entry.value)?);
    }
    Ok(assets)
}

async fn observed<T>(
    op: &'static str,
    fut: impl Future<Output = Result<T, Error>>,
) -> Result<T, Error> {
    let start = Instant::now();
    let result = fut.await;

    histogram!("registry.operation.duration_ms", "op" => op)
        .record(start.elapsed().as_millis() as f64);
    counter!("registry.operations.total",
        "op" => op,
        "status" => if result.is_ok() { "success" } else { "failed" }
    )
    .increment(1);

    result
}
