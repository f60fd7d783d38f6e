//! Scriptable price feed used by tests and shipped in the production
//! tree so integration tests and the sim scenario share one mock.

use crate::domain::errors::FeedError;
use crate::domain::ports::PriceFeed;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone)]
enum Script {
    Price(Decimal),
    Fail,
}

pub struct MockPriceFeed {
    scripts: Mutex<HashMap<String, Script>>,
    fetches: AtomicUsize,
}

impl MockPriceFeed {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Next fetches of `code` return this price.
    pub fn set_price(&self, code: &str, price: Decimal) {
        self.scripts
            .lock()
            .expect("mock feed lock poisoned")
            .insert(code.to_string(), Script::Price(price));
    }

    /// Next fetches of `code` fail as unavailable.
    pub fn set_failing(&self, code: &str) {
        self.scripts
            .lock()
            .expect("mock feed lock poisoned")
            .insert(code.to_string(), Script::Fail);
    }

    /// How many times `fetch` has been called, scripted or not.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl Default for MockPriceFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceFeed for MockPriceFeed {
    async fn fetch(&self, provider_symbol: &str) -> Result<Decimal, FeedError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let script = self
            .scripts
            .lock()
            .expect("mock feed lock poisoned")
            .get(provider_symbol)
            .cloned();
        match script {
            Some(Script::Price(price)) => Ok(price),
            Some(Script::Fail) => Err(FeedError::Unavailable {
                reason: "scripted failure".to_string(),
            }),
            None => Err(FeedError::Unavailable {
                reason: format!("no price scripted for {}", provider_symbol),
            }),
        }
    }
}
