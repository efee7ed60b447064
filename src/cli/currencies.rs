use super::ui;
use crate::core::{Currency, PriceOracle};
use anyhow::Result;
use comfy_table::Cell;

pub fn display_currencies(currencies: &[Currency]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell("Rate"),
        ui::header_cell("Last Updated"),
    ]);

    for currency in currencies {
        table.add_row(vec![
            Cell::new(currency.currency.to_uppercase()),
            ui::rate_cell(currency.value),
            Cell::new(ui::format_timestamp(currency.last_updated)),
        ]);
    }

    let mut output = format!(
        "{}\n\n",
        ui::style_text("Oracle Currencies", ui::StyleType::Title)
    );
    output.push_str(&table.to_string());

    if currencies.iter().all(|c| c.value == 0.0) {
        output.push_str(&format!(
            "\n\n{}",
            ui::style_text(
                "No live rates available, showing fallback currencies",
                ui::StyleType::Warning
            )
        ));
    }
    output
}

/// Waits for the oracle to load (or give up) and prints every cached rate.
pub async fn run(oracle: &(dyn PriceOracle + Send + Sync)) -> Result<()> {
    let pb = ui::new_spinner("Loading currencies...");
    oracle.load().await;
    pb.finish_and_clear();

    println!("{}", display_currencies(&oracle.get_cached_currencies()));
    Ok(())
}
