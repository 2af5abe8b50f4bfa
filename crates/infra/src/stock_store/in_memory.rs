use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::anyhow;

use stockroom_core::{AggregateRoot, ExpectedVersion, ProductId, StockItemId};
use stockroom_inventory::{StockAdjustment, StockItem};

use super::r#trait::{StockStore, StoreError};

#[derive(Debug, Default)]
struct Inner {
    items: HashMap<ProductId, StockItem>,
    adjustments: HashMap<StockItemId, Vec<StockAdjustment>>,
}

/// In-memory stock store.
///
/// Intended for tests/dev. A single lock guards items and adjustments so a
/// commit is atomic: partial writes are never visible.
#[derive(Debug, Default)]
pub struct InMemoryStockStore {
    inner: RwLock<Inner>,
}

impl InMemoryStockStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StockStore for InMemoryStockStore {
    fn create_if_absent(&self, product_id: ProductId) -> Result<StockItemId, StoreError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| StoreError::Storage(anyhow!("lock poisoned")))?;

        if let Some(existing) = inner.items.get(&product_id) {
            return Ok(existing.item_id());
        }

        let item = StockItem::create(product_id);
        let item_id = item.item_id();
        inner.items.insert(product_id, item);
        Ok(item_id)
    }

    fn load_by_product(&self, product_id: ProductId) -> Result<Option<StockItem>, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::Storage(anyhow!("lock poisoned")))?;

        Ok(inner.items.get(&product_id).cloned())
    }

    fn load_many(&self, product_ids: &[ProductId]) -> Result<Vec<StockItem>, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::Storage(anyhow!("lock poisoned")))?;

        Ok(product_ids
            .iter()
            .filter_map(|id| inner.items.get(id).cloned())
            .collect())
    }

    fn commit(
        &self,
        item: StockItem,
        expected: ExpectedVersion,
        adjustments: Vec<StockAdjustment>,
    ) -> Result<u64, StoreError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| StoreError::Storage(anyhow!("lock poisoned")))?;

        let current = inner.items.get(&item.product_id()).ok_or_else(|| {
            StoreError::Concurrency(format!(
                "stock item row for product {} no longer exists",
                item.product_id()
            ))
        })?;

        if current.item_id() != item.item_id() {
            return Err(StoreError::Storage(anyhow!(
                "stock item id mismatch for product {}",
                item.product_id()
            )));
        }

        let current_version = current.version();
        if !expected.matches(current_version) {
            return Err(StoreError::Concurrency(format!(
                "expected {expected:?}, found {current_version}"
            )));
        }

        // Persist the new row state with a bumped version; the recorded-event
        // buffer is transient and never stored.
        let next = StockItem::from_parts(
            item.item_id(),
            item.product_id(),
            item.quantity_on_hand(),
            item.reservations().to_vec(),
            current_version + 1,
        );
        let new_version = next.version();
        inner.items.insert(item.product_id(), next);

        for adjustment in adjustments {
            inner
                .adjustments
                .entry(adjustment.stock_item_id())
                .or_default()
                .push(adjustment);
        }

        Ok(new_version)
    }

    fn adjustment_history(
        &self,
        stock_item_id: StockItemId,
    ) -> Result<Vec<StockAdjustment>, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::Storage(anyhow!("lock poisoned")))?;

        // Appends are chronological, so reversed order is most recent first.
        Ok(inner
            .adjustments
            .get(&stock_item_id)
            .map(|rows| rows.iter().rev().cloned().collect())
            .unwrap_or_default())
    }
}
