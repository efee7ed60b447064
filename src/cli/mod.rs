//! Command implementations for the `wallet-oracle` binary

pub mod currencies;
pub mod price;
pub mod setup;
pub mod ui;
pub mod watch;
