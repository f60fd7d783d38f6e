use crate::domain::errors::FeedError;
use crate::domain::ports::PriceFeed;
use async_trait::async_trait;
use rust_decimal::Decimal;

/// A feed that is never available. Every quote refresh takes the
/// simulated-walk path, so the engine runs with zero external
/// dependencies.
pub struct OfflineFeed;

#[async_trait]
impl PriceFeed for OfflineFeed {
    async fn fetch(&self, _provider_symbol: &str) -> Result<Decimal, FeedError> {
        Err(FeedError::Unavailable {
            reason: "offline feed".to_string(),
        })
    }
}
