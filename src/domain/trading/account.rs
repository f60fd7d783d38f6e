//! Per-actor ledger state: wallet cash plus held positions.
//!
//! All mutation goes through [`Account::apply_buy`] / [`Account::apply_sell`],
//! which validate before touching anything. A rejected order returns the
//! account bit-for-bit unchanged.

use crate::domain::errors::OrderError;
use crate::domain::trading::types::ActorId;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::HashMap;

/// Scale of all cash and average-cost figures.
pub const MONEY_SCALE: u32 = 2;

/// Round-half-up at the ledger's money scale. Half-up equals
/// midpoint-away-from-zero for the non-negative amounts handled here.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Wallet {
    pub actor_id: ActorId,
    /// Never negative: every debit is checked against the balance first.
    pub cash: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub code: String,
    pub quantity: u64,
    /// Quantity-weighted average of the BUY fills currently held,
    /// rounded half-up to [`MONEY_SCALE`].
    pub avg_cost: Decimal,
}

/// Result of a successful BUY application.
#[derive(Debug, Clone, PartialEq)]
pub struct BuyFill {
    pub cost: Decimal,
}

/// Result of a successful SELL application. `realized_pnl` is reported for
/// logging and tests; the ledger does not persist it separately.
#[derive(Debug, Clone, PartialEq)]
pub struct SellFill {
    pub proceeds: Decimal,
    pub realized_pnl: Decimal,
    /// True when the sell emptied the position and it was dropped.
    pub position_closed: bool,
}

/// One actor's wallet and positions, the unit guarded by the actor lock.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub wallet: Wallet,
    pub positions: HashMap<String, Position>,
}

impl Account {
    pub fn new(actor_id: ActorId, initial_cash: Decimal) -> Self {
        Self {
            wallet: Wallet {
                actor_id,
                cash: initial_cash,
            },
            positions: HashMap::new(),
        }
    }

    pub fn position(&self, code: &str) -> Option<&Position> {
        self.positions.get(code)
    }

    /// Debit `price * qty` and fold the fill into the weighted average cost.
    pub fn apply_buy(&mut self, code: &str, price: Decimal, qty: u64) -> Result<BuyFill, OrderError> {
        let cost = price * Decimal::from(qty);
        if self.wallet.cash < cost {
            return Err(OrderError::InsufficientFunds {
                need: cost,
                available: self.wallet.cash,
            });
        }

        let position = self
            .positions
            .entry(code.to_string())
            .or_insert_with(|| Position {
                code: code.to_string(),
                quantity: 0,
                avg_cost: Decimal::ZERO,
            });

        let held_value = position.avg_cost * Decimal::from(position.quantity);
        let total_qty = position.quantity + qty;
        position.avg_cost = round_money((held_value + cost) / Decimal::from(total_qty));
        position.quantity = total_qty;

        // Cash moves by the exact cost; only the average is rounded.
        self.wallet.cash -= cost;

        Ok(BuyFill { cost })
    }

    /// Credit `price * qty`, shrink the position, and drop it at zero.
    /// The average cost of any remaining shares is unchanged.
    pub fn apply_sell(
        &mut self,
        code: &str,
        price: Decimal,
        qty: u64,
    ) -> Result<SellFill, OrderError> {
        let held = self.positions.get(code).map_or(0, |p| p.quantity);
        if held < qty {
            return Err(OrderError::InsufficientPosition {
                requested: qty,
                held,
            });
        }

        let proceeds = price * Decimal::from(qty);
        let position = self
            .positions
            .get_mut(code)
            .expect("position presence checked above");
        let realized_pnl = (price - position.avg_cost) * Decimal::from(qty);

        position.quantity -= qty;
        let position_closed = position.quantity == 0;
        if position_closed {
            self.positions.remove(code);
        }

        self.wallet.cash += proceeds;

        Ok(SellFill {
            proceeds,
            realized_pnl,
            position_closed,
        })
    }
}
