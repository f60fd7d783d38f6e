// Order execution
pub mod executor;

// Per-actor account registry
pub mod ledger;

// Staleness-cached price source
pub mod quotes;

// Engine assembly and the four public operations
pub mod system;

// Portfolio valuation
pub mod valuator;
