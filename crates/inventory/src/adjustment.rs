//! Append-only stock adjustment audit records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{AdjustmentId, StockItemId};

/// Audit record for one administrative stock change.
///
/// Independent of the aggregate on purpose: adjustments are appended in the same
/// store commit as the item update, but never re-loaded into invariant checks and
/// must survive even if the stock item row is later deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjustment {
    id: AdjustmentId,
    stock_item_id: StockItemId,
    adjustment: i64,
    quantity_after: i64,
    reason: Option<String>,
    adjusted_by: Option<String>,
    created_at: DateTime<Utc>,
}

impl StockAdjustment {
    pub fn new(
        stock_item_id: StockItemId,
        adjustment: i64,
        quantity_after: i64,
        reason: Option<String>,
        adjusted_by: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AdjustmentId::new(),
            stock_item_id,
            adjustment,
            quantity_after,
            reason,
            adjusted_by,
            created_at: now,
        }
    }

    pub fn adjustment_id(&self) -> AdjustmentId {
        self.id
    }

    pub fn stock_item_id(&self) -> StockItemId {
        self.stock_item_id
    }

    /// Signed delta applied to the on-hand quantity.
    pub fn adjustment(&self) -> i64 {
        self.adjustment
    }

    /// Snapshot of the on-hand quantity after the adjustment was applied.
    pub fn quantity_after(&self) -> i64 {
        self.quantity_after
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn adjusted_by(&self) -> Option<&str> {
        self.adjusted_by.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
