//! Application-level stock operations.
//!
//! `StockEngine` orchestrates one write per operation: load the stock item,
//! capture the version observed at load, run the pure aggregate logic, and
//! commit atomically with an optimistic concurrency check. The engine never
//! loops on conflict — `EngineError::Conflict` is surfaced so the caller owns
//! the retry boundary (see [`crate::retry`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use stockroom_core::{
    AggregateRoot, DomainError, Event, ExpectedVersion, ProductId, ReservationId, StockItemId,
};
use stockroom_inventory::{StockAdjustment, StockEvent, StockItem, StockPolicy};

use crate::stock_store::{StockStore, StoreError};

/// Command: ReserveStock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveStock {
    pub product_id: ProductId,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReleaseReservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseReservation {
    pub product_id: ProductId,
    pub reservation_id: ReservationId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ConsumeReservation (order confirmed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumeReservation {
    pub product_id: ProductId,
    pub reservation_id: ReservationId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AdjustStock (administrative correction).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustStock {
    pub product_id: ProductId,
    pub delta: i64,
    pub reason: Option<String>,
    pub adjusted_by: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Engine operation error: the business outcomes callers branch on plus the
/// infrastructure channel.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Stock item or reservation does not exist.
    #[error("not found")]
    NotFound,

    /// Requested reservation quantity exceeds available quantity. Terminal for
    /// this attempt; never retried automatically.
    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i64, available: i64 },

    /// Adjustment would drive the on-hand quantity negative.
    #[error("invalid adjustment: on hand {on_hand}, delta {delta}")]
    InvalidAdjustment { on_hand: i64, delta: i64 },

    /// Consume attempted against an expired reservation.
    #[error("reservation {0} has expired")]
    ReservationExpired(ReservationId),

    /// Optimistic version check failed at write time. The caller must reload
    /// and retry the whole operation, not just the write.
    #[error("concurrency conflict: {0}")]
    Conflict(String),

    /// Deterministic input validation failure.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Unexpected storage failure (connectivity, poisoned state). Distinct
    /// from `Conflict` on purpose.
    #[error("storage failure: {0}")]
    Store(#[source] StoreError),
}

impl From<DomainError> for EngineError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => EngineError::Validation(msg),
            DomainError::InvalidId(msg) => EngineError::Validation(msg),
            DomainError::NotFound => EngineError::NotFound,
            DomainError::InsufficientStock {
                requested,
                available,
            } => EngineError::InsufficientStock {
                requested,
                available,
            },
            DomainError::InvalidAdjustment { on_hand, delta } => {
                EngineError::InvalidAdjustment { on_hand, delta }
            }
            DomainError::ReservationExpired(id) => EngineError::ReservationExpired(id),
            DomainError::Conflict(msg) => EngineError::Conflict(msg),
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Concurrency(msg) => EngineError::Conflict(msg),
            other => EngineError::Store(other),
        }
    }
}

/// Stock-reservation engine: the four mutators consumed by catalog, checkout,
/// and admin tooling.
#[derive(Debug)]
pub struct StockEngine<S> {
    store: S,
    policy: StockPolicy,
}

impl<S> StockEngine<S> {
    pub fn new(store: S, policy: StockPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &StockPolicy {
        &self.policy
    }
}

impl<S> StockEngine<S>
where
    S: StockStore,
{
    /// Create a stock item for a product with zero quantity (catalog path).
    ///
    /// Idempotent: a second call for the same product returns the existing id.
    pub fn create_stock_item(&self, product_id: ProductId) -> Result<StockItemId, EngineError> {
        let item_id = self.store.create_if_absent(product_id)?;
        debug!(%product_id, %item_id, "stock item ensured");
        Ok(item_id)
    }

    /// Place a time-limited hold on stock for a pending order.
    pub fn reserve(&self, cmd: ReserveStock) -> Result<ReservationId, EngineError> {
        let mut item = self.load(cmd.product_id)?;
        let expected = ExpectedVersion::Exact(item.version());
        item.prune_expired(cmd.occurred_at);

        let reservation_id = item.reserve(cmd.quantity, &self.policy, cmd.occurred_at)?;

        let events = item.take_events();
        self.commit(cmd.product_id, item, expected, Vec::new())?;

        info!(
            product_id = %cmd.product_id,
            reservation_id = %reservation_id,
            quantity = cmd.quantity,
            "stock reserved"
        );
        log_events(&events);
        Ok(reservation_id)
    }

    /// Release a reservation (cart abandoned, payment failed).
    ///
    /// An unknown id fails with `NotFound`; a caller retrying a release treats
    /// that as a no-op.
    pub fn release(&self, cmd: ReleaseReservation) -> Result<(), EngineError> {
        let mut item = self.load(cmd.product_id)?;
        let expected = ExpectedVersion::Exact(item.version());

        let quantity = item.release_reservation(cmd.reservation_id, cmd.occurred_at)?;
        // Release must reach expired-but-unpruned reservations too, so pruning
        // happens after the lookup.
        item.prune_expired(cmd.occurred_at);

        let events = item.take_events();
        self.commit(cmd.product_id, item, expected, Vec::new())?;

        info!(
            product_id = %cmd.product_id,
            reservation_id = %cmd.reservation_id,
            quantity,
            "stock reservation released"
        );
        log_events(&events);
        Ok(())
    }

    /// Convert a reservation into a permanent deduction (payment confirmed).
    ///
    /// On `NotFound`/`ReservationExpired` the ordering workflow must re-derive
    /// whether the sale can proceed, e.g. by attempting a fresh reserve.
    pub fn consume(&self, cmd: ConsumeReservation) -> Result<(), EngineError> {
        let mut item = self.load(cmd.product_id)?;
        let expected = ExpectedVersion::Exact(item.version());

        let quantity = item.consume(cmd.reservation_id, &self.policy, cmd.occurred_at)?;
        // Prune only after the lookup so an expired target still reports
        // `ReservationExpired` rather than `NotFound`.
        item.prune_expired(cmd.occurred_at);

        let events = item.take_events();
        self.commit(cmd.product_id, item, expected, Vec::new())?;

        info!(
            product_id = %cmd.product_id,
            reservation_id = %cmd.reservation_id,
            quantity,
            "stock consumed"
        );
        log_events(&events);
        Ok(())
    }

    /// Apply an administrative adjustment and append its audit row in the same
    /// commit.
    pub fn adjust_stock(&self, cmd: AdjustStock) -> Result<(), EngineError> {
        let mut item = self.load(cmd.product_id)?;
        let expected = ExpectedVersion::Exact(item.version());
        item.prune_expired(cmd.occurred_at);

        item.adjust_stock(cmd.delta, &self.policy, cmd.occurred_at)?;

        let audit = StockAdjustment::new(
            item.item_id(),
            cmd.delta,
            item.quantity_on_hand(),
            cmd.reason.clone(),
            cmd.adjusted_by.clone(),
            cmd.occurred_at,
        );

        let quantity_after = item.quantity_on_hand();
        let events = item.take_events();
        self.commit(cmd.product_id, item, expected, vec![audit])?;

        info!(
            product_id = %cmd.product_id,
            delta = cmd.delta,
            quantity_after,
            "stock adjusted"
        );
        log_events(&events);
        Ok(())
    }

    fn load(&self, product_id: ProductId) -> Result<StockItem, EngineError> {
        self.store
            .load_by_product(product_id)?
            .ok_or(EngineError::NotFound)
    }

    fn commit(
        &self,
        product_id: ProductId,
        item: StockItem,
        expected: ExpectedVersion,
        adjustments: Vec<StockAdjustment>,
    ) -> Result<u64, EngineError> {
        self.store
            .commit(item, expected, adjustments)
            .map_err(|e| {
                if matches!(e, StoreError::Concurrency(_)) {
                    warn!(%product_id, "concurrent stock write rejected");
                }
                EngineError::from(e)
            })
    }
}

/// Committed domain events go to the log; transport is someone else's job.
fn log_events(events: &[StockEvent]) {
    for event in events {
        debug!(event_type = event.event_type(), "stock event committed");
    }
}
