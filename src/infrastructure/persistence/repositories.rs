//! SQLite implementations of the persistence ports. Decimals are stored
//! as TEXT so no binary-float rounding ever touches ledger amounts.

use crate::domain::repositories::{OrderRepository, PositionRepository, WalletRepository};
use crate::domain::trading::account::{Position, Wallet};
use crate::domain::trading::types::{ActorId, Order, OrderId, OrderSide};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

pub struct SqliteWalletRepository {
    pool: SqlitePool,
}

impl SqliteWalletRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WalletRepository for SqliteWalletRepository {
    async fn load(&self, actor_id: ActorId) -> Result<Option<Wallet>> {
        let row = sqlx::query("SELECT cash FROM wallets WHERE actor_id = ?")
            .bind(actor_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to load wallet")?;

        match row {
            Some(row) => {
                let cash_str: String = row.try_get("cash")?;
                let cash = Decimal::from_str(&cash_str)
                    .with_context(|| format!("Invalid cash value in wallet row: {}", cash_str))?;
                Ok(Some(Wallet { actor_id, cash }))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, wallet: &Wallet) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO wallets (actor_id, cash) VALUES (?, ?)
            ON CONFLICT(actor_id) DO UPDATE SET cash = excluded.cash
            "#,
        )
        .bind(wallet.actor_id)
        .bind(wallet.cash.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to save wallet")?;
        Ok(())
    }
}

pub struct SqlitePositionRepository {
    pool: SqlitePool,
}

impl SqlitePositionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn map_row(row: &sqlx::sqlite::SqliteRow) -> Result<Position> {
        let avg_cost_str: String = row.try_get("avg_cost")?;
        Ok(Position {
            code: row.try_get("code")?,
            quantity: row.try_get::<i64, _>("quantity")? as u64,
            avg_cost: Decimal::from_str(&avg_cost_str)
                .with_context(|| format!("Invalid avg_cost in position row: {}", avg_cost_str))?,
        })
    }
}

#[async_trait]
impl PositionRepository for SqlitePositionRepository {
    async fn load_for_actor(&self, actor_id: ActorId) -> Result<Vec<Position>> {
        let rows = sqlx::query("SELECT code, quantity, avg_cost FROM positions WHERE actor_id = ?")
            .bind(actor_id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to load positions")?;
        rows.iter().map(Self::map_row).collect()
    }

    async fn find(&self, actor_id: ActorId, code: &str) -> Result<Option<Position>> {
        let row = sqlx::query(
            "SELECT code, quantity, avg_cost FROM positions WHERE actor_id = ? AND code = ?",
        )
        .bind(actor_id)
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find position")?;
        row.as_ref().map(Self::map_row).transpose()
    }

    async fn save(&self, actor_id: ActorId, position: &Position) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO positions (actor_id, code, quantity, avg_cost)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(actor_id, code) DO UPDATE SET
                quantity = excluded.quantity,
                avg_cost = excluded.avg_cost
            "#,
        )
        .bind(actor_id)
        .bind(&position.code)
        .bind(position.quantity as i64)
        .bind(position.avg_cost.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to save position")?;
        Ok(())
    }

    async fn delete(&self, actor_id: ActorId, code: &str) -> Result<()> {
        sqlx::query("DELETE FROM positions WHERE actor_id = ? AND code = ?")
            .bind(actor_id)
            .bind(code)
            .execute(&self.pool)
            .await
            .context("Failed to delete position")?;
        Ok(())
    }
}

pub struct SqliteOrderRepository {
    pool: SqlitePool,
}

impl SqliteOrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn map_rows(rows: Vec<sqlx::sqlite::SqliteRow>) -> Result<Vec<Order>> {
        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let side_str: String = row.try_get("side")?;
            let side = side_str.parse::<OrderSide>()?;
            let price_str: String = row.try_get("exec_price")?;
            orders.push(Order {
                id: row.try_get("id")?,
                actor_id: row.try_get("actor_id")?,
                code: row.try_get("code")?,
                side,
                quantity: row.try_get::<i64, _>("quantity")? as u64,
                exec_price: Decimal::from_str(&price_str)
                    .with_context(|| format!("Invalid exec_price in order row: {}", price_str))?,
                executed_at: row.try_get::<DateTime<Utc>, _>("executed_at")?,
            });
        }
        Ok(orders)
    }
}

#[async_trait]
impl OrderRepository for SqliteOrderRepository {
    async fn append(&self, order: &Order) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, actor_id, code, side, quantity, exec_price, executed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(order.id)
        .bind(order.actor_id)
        .bind(&order.code)
        .bind(order.side.to_string())
        .bind(order.quantity as i64)
        .bind(order.exec_price.to_string())
        .bind(order.executed_at)
        .execute(&self.pool)
        .await
        .context("Failed to append order")?;
        Ok(())
    }

    async fn list_for_actor(&self, actor_id: ActorId) -> Result<Vec<Order>> {
        let rows = sqlx::query("SELECT * FROM orders WHERE actor_id = ? ORDER BY id DESC")
            .bind(actor_id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list orders")?;
        Self::map_rows(rows)
    }

    async fn find_recent(&self, limit: usize) -> Result<Vec<Order>> {
        let rows = sqlx::query("SELECT * FROM orders ORDER BY id DESC LIMIT ?")
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch recent orders")?;
        Self::map_rows(rows)
    }

    async fn count(&self) -> Result<usize> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM orders")
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = row.try_get("count")?;
        Ok(count as usize)
    }

    async fn max_order_id(&self) -> Result<Option<OrderId>> {
        let row = sqlx::query("SELECT MAX(id) as max_id FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<Option<i64>, _>("max_id")?)
    }
}
