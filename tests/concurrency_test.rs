//! Concurrency guarantees: per-actor linearization, cross-actor
//! isolation, and order-id monotonicity under contention.

use papertrade::application::system::Engine;
use papertrade::config::{Config, Mode};
use papertrade::domain::market::instrument::Instrument;
use papertrade::domain::trading::types::{OrderId, OrderSide};
use papertrade::infrastructure::feed::mock::MockPriceFeed;
use papertrade::infrastructure::repositories::in_memory::{
    InMemoryOrderRepository, InMemoryPositionRepository, InMemoryWalletRepository,
};
use rust_decimal_macros::dec;
use std::collections::HashSet;
use std::sync::Arc;

fn test_config() -> Config {
    Config {
        mode: Mode::Sim,
        feed_base_url: String::new(),
        feed_timeout_ms: 100,
        // Long TTL: one upstream fetch, then a stable price for the whole test.
        quote_ttl_ms: 60_000,
        initial_cash: dec!(1000000),
        fallback_price: dec!(1000),
        min_tick: dec!(1),
        database_url: None,
        instruments: Some(vec![Instrument {
            code: "X".to_string(),
            name: "Test Instrument".to_string(),
        }]),
    }
}

async fn engine() -> Arc<Engine> {
    let feed = Arc::new(MockPriceFeed::new());
    feed.set_price("X", dec!(100));
    Arc::new(
        Engine::with_parts(
            &test_config(),
            feed,
            Arc::new(InMemoryWalletRepository::new()),
            Arc::new(InMemoryPositionRepository::new()),
            Arc::new(InMemoryOrderRepository::new()),
        )
        .await
        .unwrap(),
    )
}

#[tokio::test]
async fn concurrent_buys_for_one_actor_lose_no_updates() {
    let engine = engine().await;

    let tasks: Vec<_> = (0..20)
        .map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.place_order(1, "X", OrderSide::Buy, 1).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let snap = engine.portfolio(1).await.unwrap();
    assert_eq!(snap.cash, dec!(1000000) - dec!(2000));
    assert_eq!(snap.positions[0].quantity, 20);
    assert_eq!(engine.order_history(1).await.unwrap().len(), 20);
}

#[tokio::test]
async fn mixed_buys_and_sells_replay_to_a_consistent_state() {
    let engine = engine().await;
    engine.place_order(1, "X", OrderSide::Buy, 10).await.unwrap();

    let tasks: Vec<_> = (0..20)
        .map(|i| {
            let engine = engine.clone();
            let side = if i % 2 == 0 { OrderSide::Buy } else { OrderSide::Sell };
            tokio::spawn(async move { engine.place_order(1, "X", side, 1).await })
        })
        .collect();
    for task in tasks {
        // Starting 10 shares against at most 10 sells: nothing can be rejected.
        task.await.unwrap().unwrap();
    }

    // 10 buys and 10 sells at the same price cancel out exactly.
    let snap = engine.portfolio(1).await.unwrap();
    assert_eq!(snap.positions[0].quantity, 10);
    assert_eq!(snap.cash, dec!(1000000) - dec!(1000));
    assert_eq!(engine.order_history(1).await.unwrap().len(), 21);
}

#[tokio::test]
async fn actors_do_not_interfere() {
    let engine = engine().await;

    let tasks: Vec<_> = (1i64..=4)
        .flat_map(|actor| (0..5).map(move |_| actor).collect::<Vec<_>>())
        .map(|actor| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.place_order(actor, "X", OrderSide::Buy, 2).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    for actor in 1..=4 {
        let snap = engine.portfolio(actor).await.unwrap();
        assert_eq!(snap.cash, dec!(1000000) - dec!(1000));
        assert_eq!(snap.positions[0].quantity, 10);
        assert_eq!(engine.order_history(actor).await.unwrap().len(), 5);
    }
}

#[tokio::test]
async fn order_ids_are_unique_and_monotonic_under_contention() {
    let engine = engine().await;

    let tasks: Vec<_> = (0i64..30)
        .map(|i| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.place_order(i % 3, "X", OrderSide::Buy, 1).await })
        })
        .collect();

    let mut ids: Vec<OrderId> = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap().unwrap().id);
    }

    let unique: HashSet<OrderId> = ids.iter().copied().collect();
    assert_eq!(unique.len(), 30);
    assert_eq!(*ids.iter().min().unwrap(), 1);
    assert_eq!(*ids.iter().max().unwrap(), 30);
}
