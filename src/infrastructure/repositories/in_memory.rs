//! In-memory repository implementations.
//!
//! Thread-safe maps behind `tokio::sync::RwLock`, used by tests and by
//! runs without a `DATABASE_URL`. Nothing survives a restart.

use crate::domain::repositories::{OrderRepository, PositionRepository, WalletRepository};
use crate::domain::trading::account::{Position, Wallet};
use crate::domain::trading::types::{ActorId, Order, OrderId};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

pub struct InMemoryWalletRepository {
    wallets: RwLock<HashMap<ActorId, Wallet>>,
}

impl InMemoryWalletRepository {
    pub fn new() -> Self {
        Self {
            wallets: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryWalletRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WalletRepository for InMemoryWalletRepository {
    async fn load(&self, actor_id: ActorId) -> Result<Option<Wallet>> {
        Ok(self.wallets.read().await.get(&actor_id).cloned())
    }

    async fn save(&self, wallet: &Wallet) -> Result<()> {
        self.wallets
            .write()
            .await
            .insert(wallet.actor_id, wallet.clone());
        Ok(())
    }
}

pub struct InMemoryPositionRepository {
    positions: RwLock<HashMap<(ActorId, String), Position>>,
}

impl InMemoryPositionRepository {
    pub fn new() -> Self {
        Self {
            positions: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryPositionRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PositionRepository for InMemoryPositionRepository {
    async fn load_for_actor(&self, actor_id: ActorId) -> Result<Vec<Position>> {
        Ok(self
            .positions
            .read()
            .await
            .iter()
            .filter(|((actor, _), _)| *actor == actor_id)
            .map(|(_, p)| p.clone())
            .collect())
    }

    async fn find(&self, actor_id: ActorId, code: &str) -> Result<Option<Position>> {
        Ok(self
            .positions
            .read()
            .await
            .get(&(actor_id, code.to_string()))
            .cloned())
    }

    async fn save(&self, actor_id: ActorId, position: &Position) -> Result<()> {
        self.positions
            .write()
            .await
            .insert((actor_id, position.code.clone()), position.clone());
        Ok(())
    }

    async fn delete(&self, actor_id: ActorId, code: &str) -> Result<()> {
        self.positions
            .write()
            .await
            .remove(&(actor_id, code.to_string()));
        Ok(())
    }
}

pub struct InMemoryOrderRepository {
    orders: RwLock<Vec<Order>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self {
            orders: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryOrderRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn append(&self, order: &Order) -> Result<()> {
        self.orders.write().await.push(order.clone());
        Ok(())
    }

    async fn list_for_actor(&self, actor_id: ActorId) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut found: Vec<Order> = orders
            .iter()
            .filter(|o| o.actor_id == actor_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(found)
    }

    async fn find_recent(&self, limit: usize) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut all: Vec<Order> = orders.clone();
        all.sort_by(|a, b| b.id.cmp(&a.id));
        all.truncate(limit);
        Ok(all)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.orders.read().await.len())
    }

    async fn max_order_id(&self) -> Result<Option<OrderId>> {
        Ok(self.orders.read().await.iter().map(|o| o.id).max())
    }
}
