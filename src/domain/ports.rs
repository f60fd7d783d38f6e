use crate::domain::errors::FeedError;
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Upstream price-feed capability. Implementations may hit the network,
/// fail, or time out; the quote service masks every failure with the
/// simulated fallback, so the engine keeps working with no upstream at all.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Current price for an upstream provider symbol.
    async fn fetch(&self, provider_symbol: &str) -> Result<Decimal, FeedError>;
}
