//! StockItem aggregate root.

use chrono::{DateTime, Utc};

use stockroom_core::{
    AggregateRoot, DomainError, DomainResult, ProductId, ReservationId, StockItemId,
};

use crate::events::{
    StockAdjusted, StockConsumed, StockEvent, StockLow, StockReleased, StockReserved,
};
use crate::policy::StockPolicy;
use crate::reservation::StockReservation;

/// Aggregate root: StockItem.
///
/// Tracks the on-hand quantity for one product and owns the live reservations
/// against it. All decision logic is synchronous and side-effect-free; the
/// storage layer enforces optimistic concurrency at commit time using the
/// version observed at load.
#[derive(Debug, Clone)]
pub struct StockItem {
    id: StockItemId,
    product_id: ProductId,
    quantity_on_hand: i64,
    reservations: Vec<StockReservation>,
    version: u64,
    events: Vec<StockEvent>,
}

impl StockItem {
    /// Create a new stock item with zero quantity.
    ///
    /// No event is recorded on creation: stock items are created by the catalog
    /// collaborator when a product appears, not by user action.
    pub fn create(product_id: ProductId) -> Self {
        Self {
            id: StockItemId::new(),
            product_id,
            quantity_on_hand: 0,
            reservations: Vec::new(),
            version: 0,
            events: Vec::new(),
        }
    }

    /// Rehydrate an aggregate from its persisted parts (storage layer only).
    pub fn from_parts(
        id: StockItemId,
        product_id: ProductId,
        quantity_on_hand: i64,
        reservations: Vec<StockReservation>,
        version: u64,
    ) -> Self {
        Self {
            id,
            product_id,
            quantity_on_hand,
            reservations,
            version,
            events: Vec::new(),
        }
    }

    pub fn item_id(&self) -> StockItemId {
        self.id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn quantity_on_hand(&self) -> i64 {
        self.quantity_on_hand
    }

    pub fn reservations(&self) -> &[StockReservation] {
        &self.reservations
    }

    /// Quantity not held by any active (non-expired) reservation.
    ///
    /// Expired reservations are filtered here by timestamp, so a stale row that
    /// has not been pruned yet never counts against availability.
    pub fn available_quantity(&self, now: DateTime<Utc>) -> i64 {
        let reserved: i64 = self
            .reservations
            .iter()
            .filter(|r| !r.is_expired(now))
            .map(|r| r.quantity())
            .sum();
        self.quantity_on_hand - reserved
    }

    /// Place a time-limited hold on `quantity` units.
    ///
    /// Fails with `InsufficientStock` (no mutation) when the request exceeds the
    /// currently available quantity. The storage commit's version check is what
    /// makes this race-free across concurrent writers.
    pub fn reserve(
        &mut self,
        quantity: i64,
        policy: &StockPolicy,
        now: DateTime<Utc>,
    ) -> DomainResult<ReservationId> {
        if quantity <= 0 {
            return Err(DomainError::validation(
                "reservation quantity must be positive",
            ));
        }

        let available = self.available_quantity(now);
        if quantity > available {
            return Err(DomainError::InsufficientStock {
                requested: quantity,
                available,
            });
        }

        let reservation =
            StockReservation::new(self.id, quantity, policy.reservation_ttl, now);
        let reservation_id = reservation.reservation_id();
        let expires_at = reservation.expires_at();
        self.reservations.push(reservation);

        self.record(StockEvent::StockReserved(StockReserved {
            stock_item_id: self.id,
            product_id: self.product_id,
            reservation_id,
            quantity,
            expires_at,
            occurred_at: now,
        }));

        Ok(reservation_id)
    }

    /// Remove a reservation, making its quantity available again.
    ///
    /// Works on expired reservations too (explicit release beats lazy pruning).
    /// An unknown id fails with `NotFound`; callers retrying a release treat
    /// that as a no-op.
    pub fn release_reservation(
        &mut self,
        reservation_id: ReservationId,
        now: DateTime<Utc>,
    ) -> DomainResult<i64> {
        let idx = self
            .reservations
            .iter()
            .position(|r| r.reservation_id() == reservation_id)
            .ok_or(DomainError::NotFound)?;

        let reservation = self.reservations.remove(idx);

        self.record(StockEvent::StockReleased(StockReleased {
            stock_item_id: self.id,
            product_id: self.product_id,
            reservation_id,
            quantity: reservation.quantity(),
            occurred_at: now,
        }));

        Ok(reservation.quantity())
    }

    /// Convert a reservation into a permanent deduction of on-hand stock.
    ///
    /// The only path that reduces on-hand quantity for a sale. Fails with
    /// `NotFound` for an unknown id and `ReservationExpired` for a stale one;
    /// in both cases the caller must re-derive whether the sale can proceed
    /// (e.g. attempt a fresh reserve).
    pub fn consume(
        &mut self,
        reservation_id: ReservationId,
        policy: &StockPolicy,
        now: DateTime<Utc>,
    ) -> DomainResult<i64> {
        let idx = self
            .reservations
            .iter()
            .position(|r| r.reservation_id() == reservation_id)
            .ok_or(DomainError::NotFound)?;

        if self.reservations[idx].is_expired(now) {
            return Err(DomainError::ReservationExpired(reservation_id));
        }

        let quantity = self.reservations[idx].quantity();
        if quantity > self.quantity_on_hand {
            // On-hand stock was drawn down below the reserved sum by an
            // administrative adjustment; deducting would go negative.
            return Err(DomainError::InvalidAdjustment {
                on_hand: self.quantity_on_hand,
                delta: -quantity,
            });
        }

        self.reservations.remove(idx);
        self.quantity_on_hand -= quantity;

        self.record(StockEvent::StockConsumed(StockConsumed {
            stock_item_id: self.id,
            product_id: self.product_id,
            reservation_id,
            quantity,
            quantity_on_hand: self.quantity_on_hand,
            occurred_at: now,
        }));
        self.record_low_stock_if_needed(policy, now);

        Ok(quantity)
    }

    /// Apply an administrative adjustment (positive restock, negative removal).
    ///
    /// The non-negative check considers only on-hand stock: reservations are a
    /// hold against availability, not against on-hand accounting.
    pub fn adjust_stock(
        &mut self,
        delta: i64,
        policy: &StockPolicy,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if delta == 0 {
            return Err(DomainError::validation("adjustment delta cannot be zero"));
        }

        let new_quantity = self.quantity_on_hand + delta;
        if new_quantity < 0 {
            return Err(DomainError::InvalidAdjustment {
                on_hand: self.quantity_on_hand,
                delta,
            });
        }

        self.quantity_on_hand = new_quantity;

        self.record(StockEvent::StockAdjusted(StockAdjusted {
            stock_item_id: self.id,
            product_id: self.product_id,
            delta,
            quantity_on_hand: new_quantity,
            occurred_at: now,
        }));
        self.record_low_stock_if_needed(policy, now);

        Ok(())
    }

    /// Physically drop expired reservations (storage hygiene only).
    ///
    /// Availability math never depends on this; expired rows are already
    /// excluded by timestamp wherever quantities are computed.
    pub fn prune_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.reservations.len();
        self.reservations.retain(|r| !r.is_expired(now));
        before - self.reservations.len()
    }

    /// Drain the events recorded since load.
    ///
    /// The application layer calls this right before the commit and publishes
    /// (or logs) the events only after the commit succeeds.
    pub fn take_events(&mut self) -> Vec<StockEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn recorded_events(&self) -> &[StockEvent] {
        &self.events
    }

    fn record(&mut self, event: StockEvent) {
        self.events.push(event);
    }

    fn record_low_stock_if_needed(&mut self, policy: &StockPolicy, now: DateTime<Utc>) {
        if self.quantity_on_hand <= policy.low_stock_threshold {
            self.record(StockEvent::StockLow(StockLow {
                stock_item_id: self.id,
                product_id: self.product_id,
                quantity_on_hand: self.quantity_on_hand,
                occurred_at: now,
            }));
        }
    }
}

impl AggregateRoot for StockItem {
    type Id = StockItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}
