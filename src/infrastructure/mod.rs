// Upstream price feed implementations
pub mod feed;

// SQLite-backed storage
pub mod persistence;

// In-memory storage for tests and storage-free runs
pub mod repositories;
