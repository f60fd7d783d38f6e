//! Staleness-cached quote lookup with a simulated fallback.
//!
//! One cache slot per instrument, each behind its own async mutex, so a
//! refresh for one instrument never blocks reads of another. The upstream
//! fetch is timeout-bounded; any failure is masked by the random-walk
//! fallback, so callers always get a positive price.

use crate::domain::errors::{FeedError, OrderError};
use crate::domain::market::instrument::InstrumentCatalog;
use crate::domain::market::quote::{Quote, QuoteSource};
use crate::domain::market::tick::random_walk;
use crate::domain::ports::PriceFeed;
use anyhow::Result;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, warn};

struct Slot {
    last: Option<Quote>,
}

pub struct QuoteService {
    feed: Arc<dyn PriceFeed>,
    catalog: InstrumentCatalog,
    quote_ttl: chrono::Duration,
    feed_timeout: Duration,
    fallback_price: Decimal,
    min_tick: Decimal,
    // Short-held map lock handing out per-instrument slots; the slot
    // mutex alone is held across a refresh.
    slots: RwLock<HashMap<String, Arc<tokio::sync::Mutex<Slot>>>>,
}

impl QuoteService {
    pub fn new(
        feed: Arc<dyn PriceFeed>,
        catalog: InstrumentCatalog,
        quote_ttl: Duration,
        feed_timeout: Duration,
        fallback_price: Decimal,
        min_tick: Decimal,
    ) -> Self {
        Self {
            feed,
            catalog,
            quote_ttl: chrono::Duration::from_std(quote_ttl)
                .unwrap_or_else(|_| chrono::Duration::seconds(2)),
            feed_timeout,
            fallback_price,
            min_tick,
            slots: RwLock::new(HashMap::new()),
        }
    }

    pub fn catalog(&self) -> &InstrumentCatalog {
        &self.catalog
    }

    /// Current quote for one instrument. Serves the cached price within
    /// the staleness window, refreshes past it. Fails only for codes the
    /// catalog does not list; upstream trouble never surfaces here.
    pub async fn quote(&self, code: &str) -> Result<Quote> {
        if !self.catalog.contains(code) {
            return Err(OrderError::UnknownInstrument {
                code: code.to_string(),
            }
            .into());
        }

        let slot = self.slot(code);
        let mut slot = slot.lock().await;

        if let Some(last) = &slot.last
            && Utc::now() - last.fetched_at < self.quote_ttl
        {
            return Ok(last.clone());
        }

        let quote = self.refresh(code, slot.last.as_ref()).await;
        slot.last = Some(quote.clone());
        Ok(quote)
    }

    /// Quotes for a batch of codes, resolved concurrently. Unknown codes
    /// are silently skipped.
    pub async fn quotes(&self, codes: &[String]) -> Vec<Quote> {
        let known: Vec<&String> = codes.iter().filter(|c| self.catalog.contains(c)).collect();
        let fetched = futures::future::join_all(known.iter().map(|c| self.quote(c))).await;
        fetched.into_iter().filter_map(Result::ok).collect()
    }

    fn slot(&self, code: &str) -> Arc<tokio::sync::Mutex<Slot>> {
        if let Some(slot) = self.slots.read().expect("slot map lock poisoned").get(code) {
            return slot.clone();
        }
        self.slots
            .write()
            .expect("slot map lock poisoned")
            .entry(code.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(Slot { last: None })))
            .clone()
    }

    /// One refresh cycle: bounded upstream fetch, walk fallback on any
    /// failure. Always yields a positive price.
    async fn refresh(&self, code: &str, last: Option<&Quote>) -> Quote {
        let now = Utc::now();

        let fetched = match tokio::time::timeout(self.feed_timeout, self.feed.fetch(code)).await {
            Ok(Ok(price)) if price > Decimal::ZERO => Ok(price),
            Ok(Ok(price)) => Err(FeedError::NonPositivePrice { price }),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(FeedError::Timeout {
                timeout_ms: self.feed_timeout.as_millis() as u64,
            }),
        };

        match fetched {
            Ok(price) => {
                debug!(code, price = %price, "quote refreshed from upstream");
                Quote {
                    code: code.to_string(),
                    price,
                    fetched_at: now,
                    source: QuoteSource::Live,
                }
            }
            Err(err) => {
                let (base, source) = match last {
                    Some(last) => (last.price, QuoteSource::Simulated),
                    None => (self.fallback_price, QuoteSource::Fallback),
                };
                let price = random_walk(base, self.min_tick);
                warn!(code, %err, base = %base, price = %price, "upstream fetch failed, using simulated price");
                Quote {
                    code: code.to_string(),
                    price,
                    fetched_at: now,
                    source,
                }
            }
        }
    }
}
