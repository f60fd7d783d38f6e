use rust_decimal::Decimal;
use thiserror::Error;

/// Business-rule failures of order execution. All are synchronous and
/// leave the ledger untouched; the caller decides whether to resubmit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("quantity must be positive, got {qty}")]
    InvalidQuantity { qty: u64 },

    #[error("unknown order side: {side}")]
    InvalidSide { side: String },

    #[error("unknown instrument code: {code}")]
    UnknownInstrument { code: String },

    #[error("insufficient funds: need {need}, available {available}")]
    InsufficientFunds { need: Decimal, available: Decimal },

    #[error("insufficient position: requested {requested}, held {held}")]
    InsufficientPosition { requested: u64, held: u64 },
}

/// Upstream quote-fetch failures. Internal to the quote service: every
/// variant is masked by the random-walk fallback and never reaches
/// executor or valuator callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    #[error("upstream unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("upstream timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("malformed upstream payload: {reason}")]
    Malformed { reason: String },

    #[error("upstream returned non-positive price {price}")]
    NonPositivePrice { price: Decimal },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn insufficient_funds_message_carries_amounts() {
        let err = OrderError::InsufficientFunds {
            need: dec!(5000),
            available: dec!(1200.50),
        };
        let msg = err.to_string();
        assert!(msg.contains("5000"));
        assert!(msg.contains("1200.50"));
    }

    #[test]
    fn feed_timeout_message_carries_duration() {
        let err = FeedError::Timeout { timeout_ms: 4000 };
        assert!(err.to_string().contains("4000"));
    }
}
