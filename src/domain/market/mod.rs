// Market data domain
pub mod instrument;
pub mod quote;
pub mod tick;
