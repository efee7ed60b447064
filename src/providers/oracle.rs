use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use futures::future::join_all;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::core::cache::Cache;
use crate::core::config::OracleConfig;
use crate::core::currency::{Currency, FALLBACK_CURRENCIES, normalize_code};
use crate::core::events::{EventBus, OracleEvent};
use crate::core::interval::AsyncInterval;
use crate::core::price::PriceOracle;

#[derive(Debug, Default)]
struct OracleState {
    loaded_currencies: bool,
    failure_count: u32,
    disabled: bool,
}

enum Fetched<T> {
    Data(T),
    /// The service answered 404, which means it is not deployed at all.
    NotDeployed,
}

/// Caching client for the wallet's price oracle service.
///
/// Network failures never reach the caller: every lookup degrades to the
/// cache. After `retry_limit` consecutive failures, or a single 404, the
/// oracle disables itself for good and serves cached plus fallback rates.
pub struct Oracle {
    base_url: Url,
    retry_limit: u32,
    load_retry_delay: Duration,
    client: reqwest::Client,
    cache: Cache<String, Currency>,
    state: Mutex<OracleState>,
    events: Arc<dyn EventBus>,
}

impl Oracle {
    pub fn new(config: &OracleConfig, events: Arc<dyn EventBus>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("wallet-oracle/0.1")
            .build()
            .context("Failed to build HTTP client")?;

        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid oracle base URL: {}", config.base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Oracle base URL cannot carry a path: {}", config.base_url);
        }

        let oracle = Oracle {
            base_url,
            retry_limit: config.retry_limit,
            load_retry_delay: config.load_retry_delay(),
            client,
            cache: Cache::new(),
            state: Mutex::new(OracleState::default()),
            events,
        };

        if !config.enabled {
            oracle.disable("disabled by configuration");
        }
        Ok(oracle)
    }

    pub fn is_disabled(&self) -> bool {
        self.state().disabled
    }

    pub fn is_loaded(&self) -> bool {
        self.state().loaded_currencies
    }

    pub fn failure_count(&self) -> u32 {
        self.state().failure_count
    }

    /// Polls `codes` every `period` and announces a `price-update` after each
    /// round. The returned interval is the only handle for stopping it.
    pub fn spawn_refresh(
        self: &Arc<Self>,
        codes: Vec<String>,
        period: Duration,
    ) -> AsyncInterval {
        let oracle = Arc::clone(self);
        let codes = Arc::new(codes);
        info!(?codes, ?period, "Starting price refresh");

        AsyncInterval::new(
            move || {
                let oracle = Arc::clone(&oracle);
                let codes = Arc::clone(&codes);
                async move {
                    let prices = join_all(codes.iter().map(|code| oracle.get_price(code))).await;
                    debug!(?prices, "Refreshed prices");
                    oracle.events.emit(OracleEvent::PriceUpdate);
                    Ok(())
                }
            },
            period,
        )
    }

    fn state(&self) -> MutexGuard<'_, OracleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `segments` to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("Oracle base URL cannot carry a path: {}", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn request<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<Fetched<T>> {
        let url = self.endpoint(segments)?;
        debug!("Requesting oracle data from {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} URL: {}", e, url))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(Fetched::NotDeployed);
        }
        if !status.is_success() {
            return Err(anyhow!("HTTP error: {} URL: {}", status, url));
        }

        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {url}"))?;
        let data = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse oracle response from {url}"))?;
        Ok(Fetched::Data(data))
    }

    fn record_success(&self) {
        self.state().failure_count = 0;
    }

    fn record_failure(&self, reason: &str) {
        let failures = {
            let mut state = self.state();
            state.failure_count += 1;
            state.failure_count
        };
        warn!(
            failures,
            limit = self.retry_limit,
            %reason,
            "Price oracle request failed"
        );

        if failures >= self.retry_limit {
            self.disable(&format!(
                "failure limit reached ({failures}/{})",
                self.retry_limit
            ));
        }
    }

    /// Switches off network access for the rest of the oracle's life.
    ///
    /// Seeds the fallback codes without touching rates already cached and
    /// marks the currency list as loaded. Returns false if already disabled.
    fn disable(&self, reason: &str) -> bool {
        let mut state = self.state();
        if state.disabled {
            return false;
        }
        state.disabled = true;

        for code in FALLBACK_CURRENCIES {
            self.cache.put_if_absent(code.to_string(), Currency::fallback(code));
        }
        state.loaded_currencies = true;

        warn!(%reason, "Price oracle disabled, serving cached and fallback rates");
        true
    }
}

#[async_trait]
impl PriceOracle for Oracle {
    fn get_cached_price(&self, code: &str) -> f64 {
        self.cache
            .get(&normalize_code(code))
            .map_or(0.0, |currency| currency.value)
    }

    fn get_cached_currencies(&self) -> Vec<Currency> {
        let mut currencies: Vec<Currency> = self.cache.snapshot().into_values().collect();
        currencies.sort_by(|a, b| a.currency.cmp(&b.currency));
        currencies
    }

    #[instrument(name = "OraclePriceFetch", skip(self), fields(code = %code))]
    async fn get_price(&self, code: &str) -> f64 {
        if self.is_disabled() {
            return self.get_cached_price(code);
        }

        match self.request::<Currency>(&["price", code]).await {
            Ok(Fetched::Data(currency)) => {
                self.record_success();
                let value = currency.value;
                // Keyed by what the service says it returned, not what was asked for
                self.cache.put(currency.key(), currency);
                value
            }
            Ok(Fetched::NotDeployed) => {
                self.disable("price endpoint not found");
                self.get_cached_price(code)
            }
            Err(e) => {
                self.record_failure(&format!("{e:#}"));
                self.get_cached_price(code)
            }
        }
    }

    #[instrument(name = "OracleCurrenciesFetch", skip(self))]
    async fn get_currencies(&self) -> Vec<Currency> {
        if self.is_disabled() {
            return self.get_cached_currencies();
        }

        match self.request::<Vec<Currency>>(&["currencies"]).await {
            Ok(Fetched::Data(currencies)) if !currencies.is_empty() => {
                self.record_success();
                for currency in &currencies {
                    self.cache.put(currency.key(), currency.clone());
                }
                self.state().loaded_currencies = true;
                debug!(count = currencies.len(), "Loaded currencies");
                currencies
            }
            Ok(Fetched::Data(_)) => {
                self.record_failure("currency list was empty");
                self.get_cached_currencies()
            }
            Ok(Fetched::NotDeployed) => {
                self.disable("currencies endpoint not found");
                self.get_cached_currencies()
            }
            Err(e) => {
                self.record_failure(&format!("{e:#}"));
                self.get_cached_currencies()
            }
        }
    }

    async fn load(&self) {
        while !self.is_loaded() {
            self.get_currencies().await;
            if !self.is_loaded() {
                debug!(delay = ?self.load_retry_delay, "Currencies not loaded yet, retrying");
                tokio::time::sleep(self.load_retry_delay).await;
            }
        }

        self.events.emit(OracleEvent::CurrencyLoaded(self.cache.snapshot()));
        self.events.emit(OracleEvent::PriceUpdate);
    }
}
