use super::ui;
use crate::core::{EventBus, OracleEvent, PriceOracle};
use crate::providers::oracle::Oracle;
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

fn format_line(prices: &[(String, f64)]) -> String {
    prices
        .iter()
        .map(|(code, rate)| {
            let rate = if *rate > 0.0 {
                ui::format_rate(*rate)
            } else {
                "N/A".to_string()
            };
            format!("{}: {rate}", code.to_uppercase())
        })
        .collect::<Vec<_>>()
        .join("  ")
}

/// Prints the cached rates for `codes` after every `price-update` until Ctrl-C.
pub async fn run(
    oracle: Arc<Oracle>,
    events: &dyn EventBus,
    codes: Vec<String>,
    period: Duration,
) -> Result<()> {
    let mut rx = events.subscribe();
    let refresh = oracle.spawn_refresh(codes.clone(), period);
    println!(
        "{}",
        ui::style_text("Watching prices, press Ctrl-C to stop", ui::StyleType::Subtle)
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = rx.recv() => match event {
                Ok(event) if matches!(event.as_ref(), OracleEvent::PriceUpdate) => {
                    let prices: Vec<(String, f64)> = codes
                        .iter()
                        .map(|code| (code.clone(), oracle.get_cached_price(code)))
                        .collect();
                    println!("[{}] {}", Utc::now().format("%H:%M:%S"), format_line(&prices));
                }
                Ok(event) => debug!(topic = %event.topic(), "Ignoring event"),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Missed price updates"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    refresh.clear_interval(Duration::ZERO);
    Ok(())
}
