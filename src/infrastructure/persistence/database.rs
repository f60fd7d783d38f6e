use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tokio::fs;
use tracing::info;

/// SQLite pool plus schema bootstrap for the ledger and order log.
#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    pub async fn new(db_url: &str) -> Result<Self> {
        // A file-backed URL may point into a directory that does not exist yet.
        if let Some(path_part) = db_url.strip_prefix("sqlite://") {
            let path = Path::new(path_part);
            if let Some(parent) = path.parent()
                && !parent.exists()
            {
                fs::create_dir_all(parent)
                    .await
                    .context("Failed to create database directory")?;
            }
        }

        let options = SqliteConnectOptions::from_str(db_url)?
            .create_if_missing(true)
            // WAL keeps snapshot reads from blocking behind order writes
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("Failed to open SQLite pool")?;

        info!("SQLite pool ready: {}", db_url);

        let db = Self { pool };
        db.init().await?;

        Ok(db)
    }

    /// Creates the wallet, position, and order tables if missing.
    async fn init(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS wallets (
                actor_id INTEGER PRIMARY KEY,
                cash TEXT NOT NULL
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create wallets table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS positions (
                actor_id INTEGER NOT NULL,
                code TEXT NOT NULL,
                quantity INTEGER NOT NULL,
                avg_cost TEXT NOT NULL,
                PRIMARY KEY (actor_id, code)
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create positions table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS orders (
                id INTEGER PRIMARY KEY,
                actor_id INTEGER NOT NULL,
                code TEXT NOT NULL,
                side TEXT NOT NULL,
                quantity INTEGER NOT NULL,
                exec_price TEXT NOT NULL,
                executed_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create orders table")?;

        // Index for the per-actor, most-recent-first history query
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_orders_actor_id
            ON orders (actor_id, id);
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create order index")?;

        info!("Ledger schema ensured.");
        Ok(())
    }
}
