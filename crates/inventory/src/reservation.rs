//! Time-limited stock reservations.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{Entity, ReservationId, StockItemId};

/// A time-bounded hold on a quantity of stock.
///
/// Owned by its parent [`crate::StockItem`]: a reservation is never persisted,
/// queried, or released outside the aggregate it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReservation {
    id: ReservationId,
    stock_item_id: StockItemId,
    quantity: i64,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl StockReservation {
    /// Create a reservation expiring `ttl` after `now`.
    ///
    /// Quantity validation happens in `StockItem::reserve`; this constructor is
    /// crate-internal plumbing.
    pub(crate) fn new(
        stock_item_id: StockItemId,
        quantity: i64,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ReservationId::new(),
            stock_item_id,
            quantity,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn reservation_id(&self) -> ReservationId {
        self.id
    }

    pub fn stock_item_id(&self) -> StockItemId {
        self.stock_item_id
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Expired reservations never count against availability, whether or not
    /// they have been physically pruned yet.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

impl Entity for StockReservation {
    type Id = ReservationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reservation_expires_at_creation_plus_ttl() {
        let now = Utc::now();
        let r = StockReservation::new(StockItemId::new(), 3, Duration::minutes(15), now);

        assert_eq!(r.created_at(), now);
        assert_eq!(r.expires_at(), now + Duration::minutes(15));
        assert!(!r.is_expired(now));
        assert!(!r.is_expired(now + Duration::minutes(14)));
    }

    #[test]
    fn reservation_is_expired_exactly_at_expiry_instant() {
        let now = Utc::now();
        let r = StockReservation::new(StockItemId::new(), 1, Duration::minutes(15), now);

        assert!(r.is_expired(now + Duration::minutes(15)));
        assert!(r.is_expired(now + Duration::hours(1)));
    }
}
