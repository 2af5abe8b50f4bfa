//! Read-only stock projections for dashboards and admin tooling.
//!
//! Pure queries with no side effects: expired reservations are excluded by
//! timestamp, never by requiring physical deletion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::ProductId;
use stockroom_inventory::{StockAdjustment, StockItem, StockPolicy};

use crate::engine::EngineError;
use crate::stock_store::StockStore;

/// Current stock info for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockInfo {
    pub product_id: ProductId,
    pub quantity_on_hand: i64,
    pub available_quantity: i64,
    pub is_in_stock: bool,
    pub is_low_stock: bool,
}

impl StockInfo {
    fn from_item(item: &StockItem, policy: &StockPolicy, now: DateTime<Utc>) -> Self {
        let available = item.available_quantity(now);
        Self {
            product_id: item.product_id(),
            quantity_on_hand: item.quantity_on_hand(),
            available_quantity: available,
            is_in_stock: available > 0,
            is_low_stock: available > 0 && available <= policy.low_stock_threshold,
        }
    }

    /// Placeholder row for a product with no stock item yet.
    fn missing(product_id: ProductId) -> Self {
        Self {
            product_id,
            quantity_on_hand: 0,
            available_quantity: 0,
            is_in_stock: false,
            is_low_stock: false,
        }
    }
}

/// Read-side query handlers over the stock store.
#[derive(Debug)]
pub struct StockQueries<S> {
    store: S,
    policy: StockPolicy,
}

impl<S> StockQueries<S> {
    pub fn new(store: S, policy: StockPolicy) -> Self {
        Self { store, policy }
    }
}

impl<S> StockQueries<S>
where
    S: StockStore,
{
    /// Stock info for a single product; `None` when no stock item exists.
    pub fn stock_by_product(
        &self,
        product_id: ProductId,
        now: DateTime<Utc>,
    ) -> Result<Option<StockInfo>, EngineError> {
        let item = self.store.load_by_product(product_id)?;
        Ok(item.map(|item| StockInfo::from_item(&item, &self.policy, now)))
    }

    /// Stock levels for a batch of products, one entry per requested id.
    ///
    /// Products without a stock item yield a zeroed row rather than being
    /// dropped, so dashboards render a complete list.
    pub fn stock_levels(
        &self,
        product_ids: &[ProductId],
        now: DateTime<Utc>,
    ) -> Result<Vec<StockInfo>, EngineError> {
        let items = self.store.load_many(product_ids)?;

        Ok(product_ids
            .iter()
            .map(|product_id| {
                items
                    .iter()
                    .find(|item| item.product_id() == *product_id)
                    .map(|item| StockInfo::from_item(item, &self.policy, now))
                    .unwrap_or_else(|| StockInfo::missing(*product_id))
            })
            .collect())
    }

    /// Adjustment audit trail for a product, most recent first.
    ///
    /// Empty when the product has no stock item (or no adjustments yet).
    pub fn adjustment_history(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<StockAdjustment>, EngineError> {
        match self.store.load_by_product(product_id)? {
            Some(item) => Ok(self.store.adjustment_history(item.item_id())?),
            None => Ok(Vec::new()),
        }
    }
}
