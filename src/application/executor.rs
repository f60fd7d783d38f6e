//! Order execution: one atomic cash/position mutation per accepted order.
//!
//! The price is resolved to a concrete value before the actor lock is
//! taken, so a slow upstream never holds up the ledger and a rejected
//! order has nothing to unwind. Load-mutate-save runs entirely under the
//! actor lock; a concurrent reader sees the full pre-order or full
//! post-order state, never anything in between.

use crate::application::ledger::Ledger;
use crate::application::quotes::QuoteService;
use crate::domain::errors::OrderError;
use crate::domain::repositories::{OrderRepository, PositionRepository, WalletRepository};
use crate::domain::trading::account::Account;
use crate::domain::trading::types::{ActorId, Order, OrderSide};
use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::{error, info};

pub struct OrderExecutor {
    quotes: Arc<QuoteService>,
    ledger: Arc<Ledger>,
    wallets: Arc<dyn WalletRepository>,
    positions: Arc<dyn PositionRepository>,
    orders: Arc<dyn OrderRepository>,
    next_order_id: AtomicI64,
}

impl OrderExecutor {
    /// Builds the executor, seeding the order-id counter from the highest
    /// id already in the store so ids stay monotonic across restarts.
    pub async fn new(
        quotes: Arc<QuoteService>,
        ledger: Arc<Ledger>,
        wallets: Arc<dyn WalletRepository>,
        positions: Arc<dyn PositionRepository>,
        orders: Arc<dyn OrderRepository>,
    ) -> Result<Self> {
        let next_id = orders
            .max_order_id()
            .await
            .context("seed order id counter")?
            .map_or(1, |max| max + 1);
        Ok(Self {
            quotes,
            ledger,
            wallets,
            positions,
            orders,
            next_order_id: AtomicI64::new(next_id),
        })
    }

    /// Validates and applies one market order. Business rejections are
    /// typed [`OrderError`]s inside the returned error and leave the
    /// ledger and order log untouched.
    pub async fn execute(
        &self,
        actor_id: ActorId,
        code: &str,
        side: OrderSide,
        quantity: u64,
    ) -> Result<Order> {
        if quantity == 0 {
            return Err(OrderError::InvalidQuantity { qty: quantity }.into());
        }

        // Unknown codes fail here, before any ledger state is touched.
        let quote = self.quotes.quote(code).await?;
        let price = quote.price;

        let mut account = self.ledger.lock(actor_id).await?;

        // The fill lands on a staged copy; the live account only changes
        // once every save has succeeded, so a persistence failure leaves
        // the ledger exactly as it was.
        let mut staged = account.clone();

        let position_closed = match side {
            OrderSide::Buy => {
                let fill = staged.apply_buy(code, price, quantity)?;
                info!(
                    actor_id, code, quantity, price = %price, cost = %fill.cost,
                    cash = %staged.wallet.cash, "buy filled"
                );
                false
            }
            OrderSide::Sell => {
                let fill = staged.apply_sell(code, price, quantity)?;
                info!(
                    actor_id, code, quantity, price = %price, proceeds = %fill.proceeds,
                    realized_pnl = %fill.realized_pnl, cash = %staged.wallet.cash, "sell filled"
                );
                fill.position_closed
            }
        };

        let order = Order {
            id: self.next_order_id.fetch_add(1, Ordering::SeqCst),
            actor_id,
            code: code.to_string(),
            side,
            quantity,
            exec_price: price,
            executed_at: Utc::now(),
        };

        if let Err(err) = self
            .persist(actor_id, code, &staged, position_closed, &order)
            .await
        {
            if let Err(undo_err) = self.restore(actor_id, code, &account).await {
                error!(
                    actor_id, code, %err, %undo_err,
                    "failed to restore storage after aborted fill"
                );
            }
            return Err(err);
        }

        *account = staged;
        Ok(order)
    }

    /// Write-through of one fill: wallet, position, order record.
    async fn persist(
        &self,
        actor_id: ActorId,
        code: &str,
        staged: &Account,
        position_closed: bool,
        order: &Order,
    ) -> Result<()> {
        self.wallets
            .save(&staged.wallet)
            .await
            .context("persist wallet after fill")?;
        if position_closed {
            self.positions
                .delete(actor_id, code)
                .await
                .context("delete closed position")?;
        } else {
            let position = staged
                .position(code)
                .expect("open position present after fill");
            self.positions
                .save(actor_id, position)
                .await
                .context("persist position after fill")?;
        }
        self.orders
            .append(order)
            .await
            .context("append order record")?;
        Ok(())
    }

    /// Puts back whatever a failed [`persist`](Self::persist) may already
    /// have written, so storage matches the untouched in-memory account.
    async fn restore(&self, actor_id: ActorId, code: &str, account: &Account) -> Result<()> {
        self.wallets
            .save(&account.wallet)
            .await
            .context("restore wallet")?;
        match account.position(code) {
            Some(position) => self
                .positions
                .save(actor_id, position)
                .await
                .context("restore position"),
            None => self
                .positions
                .delete(actor_id, code)
                .await
                .context("restore absent position"),
        }
    }
}
