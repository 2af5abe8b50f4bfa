//! Infrastructure layer: storage boundary, application engine, read-side queries.

pub mod engine;
pub mod queries;
pub mod retry;
pub mod stock_store;
pub mod telemetry;

#[cfg(test)]
mod integration_tests;

pub use engine::{
    AdjustStock, ConsumeReservation, EngineError, ReleaseReservation, ReserveStock, StockEngine,
};
pub use queries::{StockInfo, StockQueries};
pub use retry::{with_retry, RetryPolicy};
pub use stock_store::{InMemoryStockStore, StockStore, StoreError};
