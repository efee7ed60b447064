//! Core types and primitives shared by the oracle and the CLI

pub mod cache;
pub mod config;
pub mod currency;
pub mod events;
pub mod interval;
pub mod log;
pub mod price;

// Re-export main types for cleaner imports
pub use currency::{Currency, FALLBACK_CURRENCIES};
pub use events::{EventBus, InMemoryEventBus, OracleEvent, Topic};
pub use interval::AsyncInterval;
pub use price::PriceOracle;
