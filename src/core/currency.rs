//! Currency records served by the price oracle

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};

/// Codes seeded at a zero rate whenever the oracle gives up on the network.
pub const FALLBACK_CURRENCIES: [&str; 4] = ["usd", "eur", "gbp", "btc"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    pub currency: String,
    pub value: f64,
    /// Unix seconds. Fractional timestamps are truncated.
    #[serde(deserialize_with = "whole_seconds")]
    pub last_updated: i64,
}

fn whole_seconds<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let seconds = f64::deserialize(deserializer)?;
    Ok(seconds.trunc() as i64)
}

impl Currency {
    pub fn new(currency: &str, value: f64, last_updated: i64) -> Self {
        Self {
            currency: currency.to_string(),
            value,
            last_updated,
        }
    }

    /// A zero-valued placeholder stamped with the current time.
    pub fn fallback(currency: &str) -> Self {
        Self::new(currency, 0.0, Utc::now().timestamp())
    }

    /// Cache key for this record: its own code, lowercased.
    pub fn key(&self) -> String {
        normalize_code(&self.currency)
    }
}

pub fn normalize_code(code: &str) -> String {
    code.trim().to_lowercase()
}
