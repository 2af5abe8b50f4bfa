//! Domain events recorded by the stock item aggregate.
//!
//! Events describe committed facts for downstream consumers (dashboards,
//! replenishment alerts). Transport is out of scope here; the application layer
//! drains them from the aggregate after a successful commit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{Event, ProductId, ReservationId, StockItemId};

/// Event: StockReserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReserved {
    pub stock_item_id: StockItemId,
    pub product_id: ProductId,
    pub reservation_id: ReservationId,
    pub quantity: i64,
    pub expires_at: DateTime<Utc>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockReleased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReleased {
    pub stock_item_id: StockItemId,
    pub product_id: ProductId,
    pub reservation_id: ReservationId,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockConsumed (reservation converted into a permanent deduction).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockConsumed {
    pub stock_item_id: StockItemId,
    pub product_id: ProductId,
    pub reservation_id: ReservationId,
    pub quantity: i64,
    pub quantity_on_hand: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockAdjusted (administrative on-hand change).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjusted {
    pub stock_item_id: StockItemId,
    pub product_id: ProductId,
    pub delta: i64,
    pub quantity_on_hand: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockLow (on-hand quantity fell to or below the configured threshold).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLow {
    pub stock_item_id: StockItemId,
    pub product_id: ProductId,
    pub quantity_on_hand: i64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockEvent {
    StockReserved(StockReserved),
    StockReleased(StockReleased),
    StockConsumed(StockConsumed),
    StockAdjusted(StockAdjusted),
    StockLow(StockLow),
}

impl Event for StockEvent {
    fn event_type(&self) -> &'static str {
        match self {
            StockEvent::StockReserved(_) => "stock.reserved",
            StockEvent::StockReleased(_) => "stock.released",
            StockEvent::StockConsumed(_) => "stock.consumed",
            StockEvent::StockAdjusted(_) => "stock.adjusted",
            StockEvent::StockLow(_) => "stock.low",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            StockEvent::StockReserved(e) => e.occurred_at,
            StockEvent::StockReleased(e) => e.occurred_at,
            StockEvent::StockConsumed(e) => e.occurred_at,
            StockEvent::StockAdjusted(e) => e.occurred_at,
            StockEvent::StockLow(e) => e.occurred_at,
        }
    }
}
