use std::sync::Arc;

use thiserror::Error;

use stockroom_core::{ExpectedVersion, ProductId, StockItemId};
use stockroom_inventory::{StockAdjustment, StockItem};

/// Stock store operation error.
///
/// These are **infrastructure errors** (storage, concurrency) as opposed to
/// domain errors (validation, invariants). `Concurrency` is deliberately kept
/// apart from `Storage`: a stale-version rejection is a retryable business
/// outcome, a storage failure is not.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Versioned stock item store.
///
/// One row per stock item, keyed by `ProductId` (unique). Implementations must:
/// - enforce optimistic concurrency: `commit` succeeds only if no other writer
///   committed since the caller's load (compared via `ExpectedVersion`)
/// - commit atomically: the quantity, the reservation set, and any audit rows
///   in one `commit` call become visible together or not at all
/// - keep adjustment rows append-only (never mutated, never deleted, and they
///   outlive their stock item row)
///
/// Loads return reservations as stored, expired ones included; availability
/// math filters them by timestamp, so physical pruning is hygiene, not
/// correctness.
pub trait StockStore: Send + Sync {
    /// Create a stock item with zero quantity for `product_id` if none exists.
    ///
    /// Idempotent: returns the existing item's id when one is already present.
    fn create_if_absent(&self, product_id: ProductId) -> Result<StockItemId, StoreError>;

    /// Load the stock item for a product, including the version observed now.
    fn load_by_product(&self, product_id: ProductId) -> Result<Option<StockItem>, StoreError>;

    /// Batch load for multi-product queries. Missing products are simply absent
    /// from the result.
    fn load_many(&self, product_ids: &[ProductId]) -> Result<Vec<StockItem>, StoreError>;

    /// Commit a mutated stock item together with any adjustment audit rows.
    ///
    /// Rejects with `StoreError::Concurrency` unless the stored row's version
    /// still matches `expected`. On success the row's version is bumped and the
    /// new version returned.
    fn commit(
        &self,
        item: StockItem,
        expected: ExpectedVersion,
        adjustments: Vec<StockAdjustment>,
    ) -> Result<u64, StoreError>;

    /// Adjustment audit rows for a stock item, most recent first.
    fn adjustment_history(
        &self,
        stock_item_id: StockItemId,
    ) -> Result<Vec<StockAdjustment>, StoreError>;
}

impl<S> StockStore for Arc<S>
where
    S: StockStore + ?Sized,
{
    fn create_if_absent(&self, product_id: ProductId) -> Result<StockItemId, StoreError> {
        (**self).create_if_absent(product_id)
    }

    fn load_by_product(&self, product_id: ProductId) -> Result<Option<StockItem>, StoreError> {
        (**self).load_by_product(product_id)
    }

    fn load_many(&self, product_ids: &[ProductId]) -> Result<Vec<StockItem>, StoreError> {
        (**self).load_many(product_ids)
    }

    fn commit(
        &self,
        item: StockItem,
        expected: ExpectedVersion,
        adjustments: Vec<StockAdjustment>,
    ) -> Result<u64, StoreError> {
        (**self).commit(item, expected, adjustments)
    }

    fn adjustment_history(
        &self,
        stock_item_id: StockItemId,
    ) -> Result<Vec<StockAdjustment>, StoreError> {
        (**self).adjustment_history(stock_item_id)
    }
}
