// Scriptable feed for tests
pub mod mock;

// Always-unavailable feed for storage-free, network-free runs
pub mod offline;

// HTTP polling quote client
pub mod polling;
