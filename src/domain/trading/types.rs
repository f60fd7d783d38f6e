use crate::domain::errors::OrderError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque identifier of the party owning a wallet/position set.
/// Issued by the identity collaborator; the engine never creates one.
pub type ActorId = i64;

/// Monotonic, process-wide order identifier. Never reused.
pub type OrderId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

impl FromStr for OrderSide {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BUY" => Ok(OrderSide::Buy),
            "SELL" => Ok(OrderSide::Sell),
            other => Err(OrderError::InvalidSide {
                side: other.to_string(),
            }),
        }
    }
}

/// Immutable record of one executed fill. Appended exactly once per
/// successful execution; rejected orders leave no record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub actor_id: ActorId,
    pub code: String,
    pub side: OrderSide,
    pub quantity: u64,
    pub exec_price: Decimal,
    pub executed_at: DateTime<Utc>,
}
