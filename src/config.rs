use crate::domain::market::instrument::Instrument;
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Quote refreshes hit the polling upstream; failures fall back to the walk.
    Live,
    /// No upstream at all; every refresh takes the simulated path.
    Sim,
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "live" => Ok(Mode::Live),
            "sim" => Ok(Mode::Sim),
            _ => anyhow::bail!("Invalid MODE: {}. Must be 'live' or 'sim'", s),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,
    pub feed_base_url: String,
    pub feed_timeout_ms: u64,
    pub quote_ttl_ms: u64,
    pub initial_cash: Decimal,
    pub fallback_price: Decimal,
    pub min_tick: Decimal,
    /// `None` runs on the in-memory repositories (nothing survives restart).
    pub database_url: Option<String>,
    /// Overrides the built-in catalog when set.
    pub instruments: Option<Vec<Instrument>>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let mode_str = env::var("MODE").unwrap_or_else(|_| "sim".to_string());
        let mode = Mode::from_str(&mode_str)?;

        let feed_base_url = env::var("FEED_BASE_URL")
            .unwrap_or_else(|_| "https://polling.finance.naver.com/api/realtime".to_string());

        let feed_timeout_ms = env::var("FEED_TIMEOUT_MS")
            .unwrap_or_else(|_| "4000".to_string())
            .parse::<u64>()
            .context("Failed to parse FEED_TIMEOUT_MS")?;

        let quote_ttl_ms = env::var("QUOTE_TTL_MS")
            .unwrap_or_else(|_| "2000".to_string())
            .parse::<u64>()
            .context("Failed to parse QUOTE_TTL_MS")?;

        let initial_cash = env::var("INITIAL_CASH")
            .unwrap_or_else(|_| "1000000".to_string())
            .parse::<Decimal>()
            .context("Failed to parse INITIAL_CASH")?;

        let fallback_price = env::var("FALLBACK_PRICE")
            .unwrap_or_else(|_| "1000".to_string())
            .parse::<Decimal>()
            .context("Failed to parse FALLBACK_PRICE")?;

        let min_tick = env::var("MIN_TICK")
            .unwrap_or_else(|_| "1".to_string())
            .parse::<Decimal>()
            .context("Failed to parse MIN_TICK")?;

        if initial_cash < Decimal::ZERO {
            anyhow::bail!("INITIAL_CASH must not be negative, got {}", initial_cash);
        }
        if fallback_price <= Decimal::ZERO {
            anyhow::bail!("FALLBACK_PRICE must be positive, got {}", fallback_price);
        }
        if min_tick <= Decimal::ZERO {
            anyhow::bail!("MIN_TICK must be positive, got {}", min_tick);
        }

        let database_url = env::var("DATABASE_URL").ok().filter(|s| !s.is_empty());

        let instruments = match env::var("INSTRUMENTS") {
            Ok(raw) if !raw.trim().is_empty() => Some(parse_instruments(&raw)?),
            _ => None,
        };

        Ok(Self {
            mode,
            feed_base_url,
            feed_timeout_ms,
            quote_ttl_ms,
            initial_cash,
            fallback_price,
            min_tick,
            database_url,
            instruments,
        })
    }
}

/// Parses the `INSTRUMENTS` override: comma-separated `code:name` pairs,
/// e.g. `005930:Samsung Electronics,000660:SK hynix`.
pub fn parse_instruments(raw: &str) -> Result<Vec<Instrument>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|entry| {
            let (code, name) = entry
                .split_once(':')
                .with_context(|| format!("Invalid INSTRUMENTS entry '{}': expected code:name", entry))?;
            if code.trim().is_empty() || name.trim().is_empty() {
                anyhow::bail!("Invalid INSTRUMENTS entry '{}': empty code or name", entry);
            }
            Ok(Instrument {
                code: code.trim().to_string(),
                name: name.trim().to_string(),
            })
        })
        .collect()
}
