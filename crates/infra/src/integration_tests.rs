//! Integration tests for the full stock pipeline.
//!
//! Tests: Engine → StockStore → Queries
//!
//! Verifies:
//! - the four mutators against an in-memory store
//! - optimistic concurrency keeps concurrent reserves from overselling
//! - expiry exclusion holds without physical deletion
//! - the adjustment audit trail is complete

use std::sync::{Arc, Barrier};
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};

use stockroom_core::{ProductId, ReservationId};
use stockroom_inventory::StockPolicy;

use crate::engine::{
    AdjustStock, ConsumeReservation, EngineError, ReleaseReservation, ReserveStock, StockEngine,
};
use crate::queries::StockQueries;
use crate::retry::{with_retry, RetryPolicy};
use crate::stock_store::{InMemoryStockStore, StockStore};

type TestEngine = StockEngine<Arc<InMemoryStockStore>>;

fn setup() -> (
    Arc<TestEngine>,
    StockQueries<Arc<InMemoryStockStore>>,
    Arc<InMemoryStockStore>,
) {
    crate::telemetry::init();

    let store = Arc::new(InMemoryStockStore::new());
    let engine = Arc::new(StockEngine::new(store.clone(), StockPolicy::default()));
    let queries = StockQueries::new(store.clone(), StockPolicy::default());
    (engine, queries, store)
}

fn stocked_product(engine: &TestEngine, quantity: i64) -> ProductId {
    let product_id = ProductId::new();
    engine.create_stock_item(product_id).unwrap();
    if quantity > 0 {
        engine
            .adjust_stock(AdjustStock {
                product_id,
                delta: quantity,
                reason: Some("initial stock".to_string()),
                adjusted_by: None,
                occurred_at: Utc::now(),
            })
            .unwrap();
    }
    product_id
}

#[test]
fn stock_item_creation_is_idempotent() {
    let (engine, queries, _store) = setup();
    let product_id = ProductId::new();

    let first = engine.create_stock_item(product_id).unwrap();
    let second = engine.create_stock_item(product_id).unwrap();

    assert_eq!(first, second);
    let info = queries
        .stock_by_product(product_id, Utc::now())
        .unwrap()
        .unwrap();
    assert_eq!(info.quantity_on_hand, 0);
    assert!(!info.is_in_stock);
}

#[test]
fn operations_on_unknown_product_fail_with_not_found() {
    let (engine, _queries, _store) = setup();
    let product_id = ProductId::new();

    let err = engine
        .reserve(ReserveStock {
            product_id,
            quantity: 1,
            occurred_at: Utc::now(),
        })
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound));

    let err = engine
        .adjust_stock(AdjustStock {
            product_id,
            delta: 5,
            reason: None,
            adjusted_by: None,
            occurred_at: Utc::now(),
        })
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound));
}

#[test]
fn reserve_then_consume_permanently_deducts_stock() {
    let (engine, queries, _store) = setup();
    let product_id = stocked_product(&engine, 20);
    let now = Utc::now();

    let reservation_id = engine
        .reserve(ReserveStock {
            product_id,
            quantity: 5,
            occurred_at: now,
        })
        .unwrap();

    engine
        .consume(ConsumeReservation {
            product_id,
            reservation_id,
            occurred_at: now,
        })
        .unwrap();

    let info = queries.stock_by_product(product_id, now).unwrap().unwrap();
    assert_eq!(info.quantity_on_hand, 15);
    assert_eq!(info.available_quantity, 15);

    // The reservation is gone; consuming it again reports that.
    let err = engine
        .consume(ConsumeReservation {
            product_id,
            reservation_id,
            occurred_at: now,
        })
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound));
}

#[test]
fn consume_of_expired_reservation_is_rejected() {
    let (engine, _queries, _store) = setup();
    let product_id = stocked_product(&engine, 10);
    let now = Utc::now();

    let reservation_id = engine
        .reserve(ReserveStock {
            product_id,
            quantity: 4,
            occurred_at: now,
        })
        .unwrap();

    let later = now + engine.policy().reservation_ttl + Duration::seconds(1);
    let err = engine
        .consume(ConsumeReservation {
            product_id,
            reservation_id,
            occurred_at: later,
        })
        .unwrap_err();

    assert!(matches!(err, EngineError::ReservationExpired(id) if id == reservation_id));
}

#[test]
fn release_of_unknown_reservation_fails_with_not_found() {
    let (engine, _queries, _store) = setup();
    let product_id = stocked_product(&engine, 10);

    let err = engine
        .release(ReleaseReservation {
            product_id,
            reservation_id: ReservationId::new(),
            occurred_at: Utc::now(),
        })
        .unwrap_err();

    assert!(matches!(err, EngineError::NotFound));
}

#[test]
fn concurrent_reserves_never_oversell() {
    let (engine, queries, _store) = setup();
    let product_id = stocked_product(&engine, 10);

    let barrier = Arc::new(Barrier::new(2));
    let mut handles = Vec::new();

    for _ in 0..2 {
        let engine = engine.clone();
        let barrier = barrier.clone();
        handles.push(std::thread::spawn(move || {
            barrier.wait();
            engine.reserve(ReserveStock {
                product_id,
                quantity: 7,
                occurred_at: Utc::now(),
            })
        }));
    }

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let successes = results.iter().filter(|r| r.is_ok()).count();

    assert_eq!(successes, 1, "exactly one of two 7-unit reserves may win");
    for result in results {
        if let Err(err) = result {
            assert!(
                matches!(
                    err,
                    EngineError::InsufficientStock { .. } | EngineError::Conflict(_)
                ),
                "loser must see insufficient stock or a conflict, got {err:?}"
            );
        }
    }

    let info = queries
        .stock_by_product(product_id, Utc::now())
        .unwrap()
        .unwrap();
    assert_eq!(info.available_quantity, 3);
}

#[test]
fn conflicted_reserves_succeed_under_retry() {
    let (engine, queries, _store) = setup();
    let product_id = stocked_product(&engine, 100);

    let barrier = Arc::new(Barrier::new(8));
    let policy = RetryPolicy {
        max_attempts: 20,
        backoff: StdDuration::from_millis(1),
    };

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = engine.clone();
            let barrier = barrier.clone();
            let policy = policy.clone();
            std::thread::spawn(move || {
                barrier.wait();
                with_retry(&policy, || {
                    engine.reserve(ReserveStock {
                        product_id,
                        quantity: 1,
                        occurred_at: Utc::now(),
                    })
                })
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    let info = queries
        .stock_by_product(product_id, Utc::now())
        .unwrap()
        .unwrap();
    assert_eq!(info.available_quantity, 92);
}

#[test]
fn expired_reservations_are_excluded_without_deletion_and_pruned_on_write() {
    let (engine, queries, store) = setup();
    let product_id = stocked_product(&engine, 10);
    let now = Utc::now();

    engine
        .reserve(ReserveStock {
            product_id,
            quantity: 6,
            occurred_at: now,
        })
        .unwrap();

    let info = queries.stock_by_product(product_id, now).unwrap().unwrap();
    assert_eq!(info.available_quantity, 4);

    // Past the TTL the hold stops counting even though the row still exists.
    let later = now + engine.policy().reservation_ttl + Duration::minutes(1);
    let item = store.load_by_product(product_id).unwrap().unwrap();
    assert_eq!(item.reservations().len(), 1);
    let info = queries.stock_by_product(product_id, later).unwrap().unwrap();
    assert_eq!(info.available_quantity, 10);

    // The next write-path load prunes it physically.
    engine
        .reserve(ReserveStock {
            product_id,
            quantity: 2,
            occurred_at: later,
        })
        .unwrap();

    let item = store.load_by_product(product_id).unwrap().unwrap();
    assert_eq!(item.reservations().len(), 1);
    assert_eq!(item.reservations()[0].quantity(), 2);
    let info = queries.stock_by_product(product_id, later).unwrap().unwrap();
    assert_eq!(info.available_quantity, 8);
}

#[test]
fn every_successful_adjustment_writes_exactly_one_audit_row() {
    let (engine, queries, _store) = setup();
    let product_id = stocked_product(&engine, 0);
    let now = Utc::now();

    for (delta, reason) in [(10i64, "restock"), (-2, "damaged"), (4, "recount")] {
        engine
            .adjust_stock(AdjustStock {
                product_id,
                delta,
                reason: Some(reason.to_string()),
                adjusted_by: Some("ops".to_string()),
                occurred_at: now,
            })
            .unwrap();
    }

    // A rejected adjustment writes nothing.
    let err = engine
        .adjust_stock(AdjustStock {
            product_id,
            delta: -100,
            reason: None,
            adjusted_by: None,
            occurred_at: now,
        })
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::InvalidAdjustment {
            on_hand: 12,
            delta: -100
        }
    ));

    let history = queries.adjustment_history(product_id).unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].adjustment(), 4);
    assert_eq!(history[0].quantity_after(), 12);
    assert_eq!(history[0].reason(), Some("recount"));
    assert_eq!(history[2].quantity_after(), 10);
}

#[test]
fn adjustment_history_for_unknown_product_is_empty() {
    let (_engine, queries, _store) = setup();
    assert!(queries
        .adjustment_history(ProductId::new())
        .unwrap()
        .is_empty());
}

#[test]
fn stock_levels_include_zeroed_rows_for_missing_products() {
    let (engine, queries, _store) = setup();
    let stocked = stocked_product(&engine, 12);
    let low = stocked_product(&engine, 3);
    let missing = ProductId::new();
    let now = Utc::now();

    let levels = queries
        .stock_levels(&[stocked, missing, low], now)
        .unwrap();

    assert_eq!(levels.len(), 3);

    assert_eq!(levels[0].product_id, stocked);
    assert!(levels[0].is_in_stock);
    assert!(!levels[0].is_low_stock);

    assert_eq!(levels[1].product_id, missing);
    assert_eq!(levels[1].quantity_on_hand, 0);
    assert!(!levels[1].is_in_stock);
    assert!(!levels[1].is_low_stock);

    assert_eq!(levels[2].product_id, low);
    assert!(levels[2].is_in_stock);
    assert!(levels[2].is_low_stock);
}

#[test]
fn reserve_release_adjust_scenario_end_to_end() {
    let (engine, queries, _store) = setup();
    let product_id = stocked_product(&engine, 10);
    let now = Utc::now();

    let first = engine
        .reserve(ReserveStock {
            product_id,
            quantity: 6,
            occurred_at: now,
        })
        .unwrap();
    let info = queries.stock_by_product(product_id, now).unwrap().unwrap();
    assert_eq!(info.available_quantity, 4);

    let err = engine
        .reserve(ReserveStock {
            product_id,
            quantity: 5,
            occurred_at: now,
        })
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::InsufficientStock {
            requested: 5,
            available: 4
        }
    ));

    engine
        .release(ReleaseReservation {
            product_id,
            reservation_id: first,
            occurred_at: now,
        })
        .unwrap();
    let info = queries.stock_by_product(product_id, now).unwrap().unwrap();
    assert_eq!(info.available_quantity, 10);

    engine
        .adjust_stock(AdjustStock {
            product_id,
            delta: -3,
            reason: Some("damaged".to_string()),
            adjusted_by: Some("warehouse".to_string()),
            occurred_at: now,
        })
        .unwrap();

    let info = queries.stock_by_product(product_id, now).unwrap().unwrap();
    assert_eq!(info.quantity_on_hand, 7);

    let history = queries.adjustment_history(product_id).unwrap();
    // One row for the initial stocking, one for the damage write-off.
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].adjustment(), -3);
    assert_eq!(history[0].quantity_after(), 7);
    assert_eq!(history[0].reason(), Some("damaged"));
    assert_eq!(history[0].adjusted_by(), Some("warehouse"));
}
