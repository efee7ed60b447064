use super::ui;
use crate::core::PriceOracle;
use anyhow::Result;
use comfy_table::Cell;
use futures::future::join_all;

pub fn display_prices(prices: &[(String, f64)]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Currency"), ui::header_cell("Rate")]);

    for (code, rate) in prices {
        table.add_row(vec![Cell::new(code.to_uppercase()), ui::rate_cell(*rate)]);
    }
    table.to_string()
}

/// Fetches every code concurrently; codes the oracle cannot price read as 0.
pub async fn fetch_prices(
    oracle: &(dyn PriceOracle + Send + Sync),
    codes: &[String],
) -> Vec<(String, f64)> {
    let futures = codes.iter().map(|code| async move {
        let rate = oracle.get_price(code).await;
        (code.clone(), rate)
    });
    join_all(futures).await
}

pub async fn run(oracle: &(dyn PriceOracle + Send + Sync), codes: &[String]) -> Result<()> {
    let prices = fetch_prices(oracle, codes).await;
    println!("{}", display_prices(&prices));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Currency;
    use async_trait::async_trait;

    struct FixedOracle;

    #[async_trait]
    impl PriceOracle for FixedOracle {
        fn get_cached_price(&self, _code: &str) -> f64 {
            0.0
        }

        fn get_cached_currencies(&self) -> Vec<Currency> {
            Vec::new()
        }

        async fn get_price(&self, code: &str) -> f64 {
            match code {
                "usd" => 1.0,
                "eur" => 0.92,
                _ => 0.0,
            }
        }

        async fn get_currencies(&self) -> Vec<Currency> {
            Vec::new()
        }

        async fn load(&self) {}
    }

    #[tokio::test]
    async fn test_fetch_prices_keeps_order() {
        let codes = vec!["eur".to_string(), "xyz".to_string(), "usd".to_string()];
        let prices = fetch_prices(&FixedOracle, &codes).await;

        assert_eq!(
            prices,
            vec![
                ("eur".to_string(), 0.92),
                ("xyz".to_string(), 0.0),
                ("usd".to_string(), 1.0),
            ]
        );
    }

    #[test]
    fn test_display_prices() {
        let output = display_prices(&[("usd".to_string(), 1.0), ("xyz".to_string(), 0.0)]);
        assert!(output.contains("USD"));
        assert!(output.contains("1.00"));
        assert!(output.contains("N/A"));
    }
}
