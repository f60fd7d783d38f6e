//! Point-in-time portfolio valuation.
//!
//! Clones the actor's account under its lock (so a half-applied order is
//! never visible), releases, then prices every held instrument
//! concurrently. Individual prices may be stale per the quote TTL; this
//! is a display computation, not a ledger mutation.

use crate::application::ledger::Ledger;
use crate::application::quotes::QuoteService;
use crate::domain::trading::account::Account;
use crate::domain::trading::types::ActorId;
use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionValuation {
    pub code: String,
    pub quantity: u64,
    pub avg_cost: Decimal,
    pub price: Decimal,
    pub market_value: Decimal,
    pub cost_basis: Decimal,
    pub unrealized_pnl: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSnapshot {
    pub actor_id: ActorId,
    pub cash: Decimal,
    pub positions: Vec<PositionValuation>,
    pub equity: Decimal,
    pub unrealized_pnl: Decimal,
    pub as_of: DateTime<Utc>,
}

pub struct PortfolioValuator {
    ledger: Arc<Ledger>,
    quotes: Arc<QuoteService>,
}

impl PortfolioValuator {
    pub fn new(ledger: Arc<Ledger>, quotes: Arc<QuoteService>) -> Self {
        Self { ledger, quotes }
    }

    pub async fn snapshot(&self, actor_id: ActorId) -> Result<PortfolioSnapshot> {
        // First read of an unseen actor seeds the wallet, like the order path.
        let account: Account = {
            let guard = self.ledger.lock(actor_id).await?;
            guard.clone()
        };

        let mut held: Vec<_> = account.positions.into_values().collect();
        held.sort_by(|a, b| a.code.cmp(&b.code));

        let quotes = try_join_all(held.iter().map(|p| self.quotes.quote(&p.code))).await?;

        let positions: Vec<PositionValuation> = held
            .into_iter()
            .zip(quotes)
            .map(|(p, q)| {
                let market_value = q.price * Decimal::from(p.quantity);
                let cost_basis = p.avg_cost * Decimal::from(p.quantity);
                PositionValuation {
                    code: p.code,
                    quantity: p.quantity,
                    avg_cost: p.avg_cost,
                    price: q.price,
                    market_value,
                    cost_basis,
                    unrealized_pnl: market_value - cost_basis,
                }
            })
            .collect();

        let market_value: Decimal = positions.iter().map(|p| p.market_value).sum();
        let unrealized_pnl: Decimal = positions.iter().map(|p| p.unrealized_pnl).sum();

        Ok(PortfolioSnapshot {
            actor_id,
            cash: account.wallet.cash,
            equity: account.wallet.cash + market_value,
            positions,
            unrealized_pnl,
            as_of: Utc::now(),
        })
    }
}
