//! Inventory stock-reservation domain.
//!
//! This crate contains the business rules for stock tracking, implemented purely
//! as deterministic domain logic (no IO, no HTTP, no storage). Callers pass
//! business time (`now`) explicitly so expiry math stays testable.

pub mod adjustment;
pub mod events;
pub mod item;
pub mod policy;
pub mod reservation;

pub use adjustment::StockAdjustment;
pub use events::{
    StockAdjusted, StockConsumed, StockEvent, StockLow, StockReleased, StockReserved,
};
pub use item::StockItem;
pub use policy::StockPolicy;
pub use reservation::StockReservation;
