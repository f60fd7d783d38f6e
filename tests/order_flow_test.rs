//! End-to-end order flow against the assembled engine: the buy/sell
//! scenario, rejection no-ops, and history ordering.

use anyhow::Result;
use async_trait::async_trait;
use papertrade::application::system::Engine;
use papertrade::config::{Config, Mode};
use papertrade::domain::errors::OrderError;
use papertrade::domain::market::instrument::Instrument;
use papertrade::domain::repositories::{OrderRepository, WalletRepository};
use papertrade::domain::trading::types::{ActorId, Order, OrderId, OrderSide};
use papertrade::infrastructure::feed::mock::MockPriceFeed;
use papertrade::infrastructure::repositories::in_memory::{
    InMemoryOrderRepository, InMemoryPositionRepository, InMemoryWalletRepository,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Order store whose appends can be switched to fail, for exercising the
/// executor's behavior when persistence dies mid-fill.
struct FlakyOrderRepository {
    inner: InMemoryOrderRepository,
    failing: AtomicBool,
}

impl FlakyOrderRepository {
    fn new() -> Self {
        Self {
            inner: InMemoryOrderRepository::new(),
            failing: AtomicBool::new(false),
        }
    }

    fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl OrderRepository for FlakyOrderRepository {
    async fn append(&self, order: &Order) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("order storage unavailable");
        }
        self.inner.append(order).await
    }

    async fn list_for_actor(&self, actor_id: ActorId) -> Result<Vec<Order>> {
        self.inner.list_for_actor(actor_id).await
    }

    async fn find_recent(&self, limit: usize) -> Result<Vec<Order>> {
        self.inner.find_recent(limit).await
    }

    async fn count(&self) -> Result<usize> {
        self.inner.count().await
    }

    async fn max_order_id(&self) -> Result<Option<OrderId>> {
        self.inner.max_order_id().await
    }
}

fn test_config() -> Config {
    Config {
        mode: Mode::Sim,
        feed_base_url: String::new(),
        feed_timeout_ms: 100,
        // Every read refreshes, so scripted price changes take effect immediately.
        quote_ttl_ms: 0,
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

async fn engine(feed: Arc<MockPriceFeed>) -> Engine {
    Engine::with_parts(
        &test_config(),
        feed,
        Arc::new(InMemoryWalletRepository::new()),
        Arc::new(InMemoryPositionRepository::new()),
        Arc::new(InMemoryOrderRepository::new()),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn buy_sell_scenario_keeps_the_ledger_consistent() {
    let feed = Arc::new(MockPriceFeed::new());
    let engine = engine(feed.clone()).await;

    // BUY 10 @ 1000
    feed.set_price("X", dec!(1000));
    let order = engine.place_order(1, "X", OrderSide::Buy, 10).await.unwrap();
    assert_eq!(order.exec_price, dec!(1000));

    let snap = engine.portfolio(1).await.unwrap();
    assert_eq!(snap.cash, dec!(990000));
    assert_eq!(snap.positions[0].quantity, 10);
    assert_eq!(snap.positions[0].avg_cost, dec!(1000));

    // SELL 4 @ 1200
    feed.set_price("X", dec!(1200));
    engine.place_order(1, "X", OrderSide::Sell, 4).await.unwrap();

    let snap = engine.portfolio(1).await.unwrap();
    assert_eq!(snap.cash, dec!(994800));
    assert_eq!(snap.positions[0].quantity, 6);
    // Average cost of the remaining shares is untouched by the sell.
    assert_eq!(snap.positions[0].avg_cost, dec!(1000));

    // SELL 10 with only 6 held: rejected, nothing changes.
    let err = engine
        .place_order(1, "X", OrderSide::Sell, 10)
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<OrderError>(),
        Some(OrderError::InsufficientPosition {
            requested: 10,
            held: 6,
        })
    ));
    let snap = engine.portfolio(1).await.unwrap();
    assert_eq!(snap.cash, dec!(994800));
    assert_eq!(snap.positions[0].quantity, 6);

    // Upstream dies: the order still executes at a positive simulated price.
    feed.set_failing("X");
    let order = engine.place_order(1, "X", OrderSide::Buy, 1).await.unwrap();
    assert!(order.exec_price > Decimal::ZERO);
}

#[tokio::test]
async fn insufficient_funds_rejection_is_a_noop() {
    let feed = Arc::new(MockPriceFeed::new());
    let engine = engine(feed.clone()).await;
    feed.set_price("X", dec!(1000));

    let before = engine.portfolio(1).await.unwrap();

    let err = engine
        .place_order(1, "X", OrderSide::Buy, 2000)
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<OrderError>(),
        Some(OrderError::InsufficientFunds { .. })
    ));

    let after = engine.portfolio(1).await.unwrap();
    assert_eq!(after.cash, before.cash);
    assert_eq!(after.positions, before.positions);
    assert!(engine.order_history(1).await.unwrap().is_empty());
}

#[tokio::test]
async fn zero_quantity_and_unknown_code_are_typed_rejections() {
    let feed = Arc::new(MockPriceFeed::new());
    let engine = engine(feed).await;

    let err = engine.place_order(1, "X", OrderSide::Buy, 0).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<OrderError>(),
        Some(OrderError::InvalidQuantity { qty: 0 })
    ));

    let err = engine
        .place_order(1, "NOPE", OrderSide::Buy, 1)
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<OrderError>(),
        Some(OrderError::UnknownInstrument { code }) if code == "NOPE"
    ));

    assert!(engine.order_history(1).await.unwrap().is_empty());
}

#[tokio::test]
async fn average_cost_is_weighted_and_rounded_half_up() {
    let feed = Arc::new(MockPriceFeed::new());
    let engine = engine(feed.clone()).await;

    feed.set_price("X", dec!(1000));
    engine.place_order(1, "X", OrderSide::Buy, 3).await.unwrap();
    feed.set_price("X", dec!(1001));
    engine.place_order(1, "X", OrderSide::Buy, 3).await.unwrap();

    // (3*1000 + 3*1001) / 6 = 1000.5
    let snap = engine.portfolio(1).await.unwrap();
    assert_eq!(snap.positions[0].avg_cost, dec!(1000.50));
    assert_eq!(snap.cash, dec!(1000000) - dec!(3000) - dec!(3003));
}

#[tokio::test]
async fn history_lists_most_recent_first() {
    let feed = Arc::new(MockPriceFeed::new());
    let engine = engine(feed.clone()).await;
    feed.set_price("X", dec!(100));

    engine.place_order(1, "X", OrderSide::Buy, 5).await.unwrap();
    engine.place_order(1, "X", OrderSide::Sell, 2).await.unwrap();
    engine.place_order(1, "X", OrderSide::Buy, 1).await.unwrap();
    engine.place_order(2, "X", OrderSide::Buy, 9).await.unwrap();

    let history = engine.order_history(1).await.unwrap();
    assert_eq!(history.len(), 3);
    assert!(history[0].id > history[1].id && history[1].id > history[2].id);
    assert_eq!(history[0].side, OrderSide::Buy);
    assert_eq!(history[0].quantity, 1);
    assert!(history.iter().all(|o| o.actor_id == 1));
}

#[tokio::test]
async fn failed_order_append_leaves_ledger_and_storage_unchanged() {
    let feed = Arc::new(MockPriceFeed::new());
    feed.set_price("X", dec!(1000));
    let wallets = Arc::new(InMemoryWalletRepository::new());
    let orders = Arc::new(FlakyOrderRepository::new());
    let engine = Engine::with_parts(
        &test_config(),
        feed,
        wallets.clone(),
        Arc::new(InMemoryPositionRepository::new()),
        orders.clone(),
    )
    .await
    .unwrap();

    orders.set_failing(true);
    let err = engine
        .place_order(1, "X", OrderSide::Buy, 10)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("append order record"));

    // In-memory ledger, order log, and the stored wallet are all untouched.
    let snap = engine.portfolio(1).await.unwrap();
    assert_eq!(snap.cash, dec!(1000000));
    assert!(snap.positions.is_empty());
    assert!(engine.order_history(1).await.unwrap().is_empty());
    assert_eq!(wallets.load(1).await.unwrap().unwrap().cash, dec!(1000000));

    // A retry once storage recovers applies the fill exactly once.
    orders.set_failing(false);
    engine.place_order(1, "X", OrderSide::Buy, 10).await.unwrap();
    let snap = engine.portfolio(1).await.unwrap();
    assert_eq!(snap.cash, dec!(990000));
    assert_eq!(snap.positions[0].quantity, 10);
    assert_eq!(engine.order_history(1).await.unwrap().len(), 1);
    assert_eq!(wallets.load(1).await.unwrap().unwrap().cash, dec!(990000));
}

#[tokio::test]
async fn selling_out_drops_the_position_from_the_snapshot() {
    let feed = Arc::new(MockPriceFeed::new());
    let engine = engine(feed.clone()).await;
    feed.set_price("X", dec!(500));

    engine.place_order(1, "X", OrderSide::Buy, 4).await.unwrap();
    engine.place_order(1, "X", OrderSide::Sell, 4).await.unwrap();

    let snap = engine.portfolio(1).await.unwrap();
    assert!(snap.positions.is_empty());
    assert_eq!(snap.cash, dec!(1000000));
    assert_eq!(snap.equity, dec!(1000000));
}
