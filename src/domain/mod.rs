// Market data domain: instruments, quotes, price grid
pub mod market;

// Port interfaces
pub mod ports;

// Repository traits
pub mod repositories;

// Core trading domain: accounts, orders
pub mod trading;

// Domain-specific error types
pub mod errors;
