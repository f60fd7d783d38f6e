use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// Where a quoted price came from. Surfaces in logs and snapshots so a
/// reader can tell live prices from simulated ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QuoteSource {
    /// Fetched from the upstream feed within this refresh cycle.
    Live,
    /// Random-walk perturbation of the last known price.
    Simulated,
    /// Configured default used when no price was ever known.
    Fallback,
}

/// A point-in-time price for one instrument. Transient: superseded by the
/// next refresh, never a source of truth.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub code: String,
    /// Strictly positive; the quote service never emits anything else.
    pub price: Decimal,
    pub fetched_at: DateTime<Utc>,
    pub source: QuoteSource,
}
