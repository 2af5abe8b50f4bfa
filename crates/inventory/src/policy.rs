//! Stock tracking policy knobs.

use chrono::Duration;

/// Configuration inputs for the stock engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockPolicy {
    /// How long a reservation holds stock before it stops counting against
    /// availability.
    pub reservation_ttl: Duration,

    /// On-hand level at or below which a `StockLow` event is recorded, and
    /// available level at or below which a stock-info row is flagged low.
    pub low_stock_threshold: i64,
}

impl Default for StockPolicy {
    fn default() -> Self {
        Self {
            reservation_ttl: Duration::minutes(15),
            low_stock_threshold: 10,
        }
    }
}
