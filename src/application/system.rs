//! Engine assembly: picks the feed and storage once at startup and wires
//! the services together. Nothing here re-decides a collaborator per call.

use crate::application::executor::OrderExecutor;
use crate::application::ledger::Ledger;
use crate::application::quotes::QuoteService;
use crate::application::valuator::{PortfolioSnapshot, PortfolioValuator};
use crate::config::{Config, Mode};
use crate::domain::market::instrument::InstrumentCatalog;
use crate::domain::market::quote::Quote;
use crate::domain::ports::PriceFeed;
use crate::domain::repositories::{OrderRepository, PositionRepository, WalletRepository};
use crate::domain::trading::types::{ActorId, Order, OrderSide};
use crate::infrastructure::feed::offline::OfflineFeed;
use crate::infrastructure::feed::polling::PollingPriceFeed;
use crate::infrastructure::persistence::database::Database;
use crate::infrastructure::persistence::repositories::{
    SqliteOrderRepository, SqlitePositionRepository, SqliteWalletRepository,
};
use crate::infrastructure::repositories::in_memory::{
    InMemoryOrderRepository, InMemoryPositionRepository, InMemoryWalletRepository,
};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// The assembled engine exposing the four operations the presentation
/// layer needs: place order, portfolio snapshot, order history, quote.
pub struct Engine {
    quotes: Arc<QuoteService>,
    executor: Arc<OrderExecutor>,
    valuator: Arc<PortfolioValuator>,
    orders: Arc<dyn OrderRepository>,
}

impl Engine {
    /// Builds from configuration: feed by `MODE`, storage by presence of
    /// `DATABASE_URL`.
    pub async fn build(config: Config) -> Result<Self> {
        let feed: Arc<dyn PriceFeed> = match config.mode {
            Mode::Live => {
                info!(base_url = %config.feed_base_url, "using polling price feed");
                Arc::new(PollingPriceFeed::new(
                    &config.feed_base_url,
                    Duration::from_millis(config.feed_timeout_ms),
                )?)
            }
            Mode::Sim => {
                info!("using offline feed, all prices simulated");
                Arc::new(OfflineFeed)
            }
        };

        match &config.database_url {
            Some(url) => {
                let db = Database::new(url)
                    .await
                    .context("open order/ledger database")?;
                let wallets = Arc::new(SqliteWalletRepository::new(db.pool.clone()));
                let positions = Arc::new(SqlitePositionRepository::new(db.pool.clone()));
                let orders = Arc::new(SqliteOrderRepository::new(db.pool.clone()));
                Self::with_parts(&config, feed, wallets, positions, orders).await
            }
            None => {
                info!("no DATABASE_URL set, running on in-memory storage");
                let wallets = Arc::new(InMemoryWalletRepository::new());
                let positions = Arc::new(InMemoryPositionRepository::new());
                let orders = Arc::new(InMemoryOrderRepository::new());
                Self::with_parts(&config, feed, wallets, positions, orders).await
            }
        }
    }

    /// Assembles from explicit collaborators. Tests use this to inject
    /// mock feeds and scratch repositories.
    pub async fn with_parts(
        config: &Config,
        feed: Arc<dyn PriceFeed>,
        wallets: Arc<dyn WalletRepository>,
        positions: Arc<dyn PositionRepository>,
        orders: Arc<dyn OrderRepository>,
    ) -> Result<Self> {
        let catalog = config
            .instruments
            .clone()
            .map(InstrumentCatalog::new)
            .unwrap_or_default();
        info!(instruments = catalog.len(), "instrument catalog loaded");

        let quotes = Arc::new(QuoteService::new(
            feed,
            catalog,
            Duration::from_millis(config.quote_ttl_ms),
            Duration::from_millis(config.feed_timeout_ms),
            config.fallback_price,
            config.min_tick,
        ));
        let ledger = Arc::new(Ledger::new(
            wallets.clone(),
            positions.clone(),
            config.initial_cash,
        ));
        let executor = Arc::new(
            OrderExecutor::new(
                quotes.clone(),
                ledger.clone(),
                wallets,
                positions,
                orders.clone(),
            )
            .await?,
        );
        let valuator = Arc::new(PortfolioValuator::new(ledger, quotes.clone()));

        Ok(Self {
            quotes,
            executor,
            valuator,
            orders,
        })
    }

    pub async fn place_order(
        &self,
        actor_id: ActorId,
        code: &str,
        side: OrderSide,
        quantity: u64,
    ) -> Result<Order> {
        self.executor.execute(actor_id, code, side, quantity).await
    }

    pub async fn portfolio(&self, actor_id: ActorId) -> Result<PortfolioSnapshot> {
        self.valuator.snapshot(actor_id).await
    }

    pub async fn order_history(&self, actor_id: ActorId) -> Result<Vec<Order>> {
        self.orders.list_for_actor(actor_id).await
    }

    pub async fn quote(&self, code: &str) -> Result<Quote> {
        self.quotes.quote(code).await
    }

    pub async fn quotes(&self, codes: &[String]) -> Vec<Quote> {
        self.quotes.quotes(codes).await
    }

    pub fn catalog(&self) -> &InstrumentCatalog {
        self.quotes.catalog()
    }
}
