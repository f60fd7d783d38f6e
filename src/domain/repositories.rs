//! Repository traits behind which the persistence collaborator lives.
//!
//! The engine assumes a save that returns `Ok` is durable, and serializes
//! concurrent saves for one actor itself (the actor lock is held across
//! load-mutate-save). Implementations: SQLite under
//! `infrastructure::persistence` and in-memory under
//! `infrastructure::repositories` for tests and storage-free runs.

use crate::domain::trading::account::{Position, Wallet};
use crate::domain::trading::types::{ActorId, Order, OrderId};
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait WalletRepository: Send + Sync {
    async fn load(&self, actor_id: ActorId) -> Result<Option<Wallet>>;
    async fn save(&self, wallet: &Wallet) -> Result<()>;
}

#[async_trait]
pub trait PositionRepository: Send + Sync {
    /// All open positions of one actor, for account hydration.
    async fn load_for_actor(&self, actor_id: ActorId) -> Result<Vec<Position>>;

    async fn find(&self, actor_id: ActorId, code: &str) -> Result<Option<Position>>;

    /// Insert-or-update the `(actor, code)` row.
    async fn save(&self, actor_id: ActorId, position: &Position) -> Result<()>;

    /// Drop the row once a position is sold down to zero.
    async fn delete(&self, actor_id: ActorId, code: &str) -> Result<()>;
}

/// The append-only order log. No update, no delete.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn append(&self, order: &Order) -> Result<()>;

    /// One actor's history, most recent first.
    async fn list_for_actor(&self, actor_id: ActorId) -> Result<Vec<Order>>;

    /// Most recent orders across all actors.
    async fn find_recent(&self, limit: usize) -> Result<Vec<Order>>;

    async fn count(&self) -> Result<usize>;

    /// Highest id ever appended, used to seed the id counter at startup.
    async fn max_order_id(&self) -> Result<Option<OrderId>>;
}
