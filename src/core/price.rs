//! Price lookup abstraction consumed by the CLI

use crate::core::currency::Currency;
use async_trait::async_trait;

/// A source of currency rates that never fails outward.
///
/// Every async operation resolves to a best-effort value: fresh data when the
/// backing service answers, cached or zero data when it does not.
#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// Cached rate for `code`, or 0 when it was never fetched.
    fn get_cached_price(&self, code: &str) -> f64;

    fn get_cached_currencies(&self) -> Vec<Currency>;

    async fn get_price(&self, code: &str) -> f64;

    async fn get_currencies(&self) -> Vec<Currency>;

    /// Resolves once the currency list is available or the source gave up.
    async fn load(&self);
}
