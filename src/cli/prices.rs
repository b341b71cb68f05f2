use super::ui;
use crate::core::convert::MITHQAL_TO_GRAM;
use crate::core::{Currency, MetalType, QuoteSource};
use anyhow::Result;
use comfy_table::Cell;
use futures::future::join_all;
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub struct MetalQuote {
    pub metal: MetalType,
    pub usd_per_gram: Option<f64>,
    pub per_mithqal: Option<f64>,
}

/// Current price of every metal, per gram in USD and per mithqal in `currency`.
pub async fn fetch_quotes(
    source: &dyn QuoteSource,
    currency: &Currency,
    custom_rate: f64,
) -> Vec<MetalQuote> {
    let rate = match source.currency_rate(currency, custom_rate).await {
        Ok(rate) => Some(rate),
        Err(e) => {
            warn!(error = %e, currency = %currency, "Exchange rate unavailable");
            None
        }
    };

    let metals = [MetalType::Gold, MetalType::Silver];
    let prices = join_all(metals.iter().map(|metal| source.metal_price_per_gram(*metal))).await;

    metals
        .into_iter()
        .zip(prices)
        .map(|(metal, price)| {
            // A zero price is the neutral fallback, not a quote.
            let usd_per_gram = price.ok().filter(|p| *p > 0.0);
            MetalQuote {
                metal,
                usd_per_gram,
                per_mithqal: usd_per_gram
                    .zip(rate)
                    .map(|(price, rate)| price * MITHQAL_TO_GRAM * rate),
            }
        })
        .collect()
}

pub fn display_quotes(quotes: &[MetalQuote], currency: &Currency) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Metal"),
        ui::header_cell("USD / gram"),
        ui::header_cell(&format!("{currency} / mithqal")),
    ]);
    for quote in quotes {
        table.add_row(vec![
            Cell::new(quote.metal.to_string()),
            ui::amount_cell(quote.usd_per_gram),
            ui::amount_cell(quote.per_mithqal),
        ]);
    }
    format!(
        "{}\n{table}",
        ui::style_text("Spot prices", ui::StyleType::Title)
    )
}

pub async fn run(source: &dyn QuoteSource, currency: &Currency, custom_rate: f64) -> Result<()> {
    let quotes = fetch_quotes(source, currency, custom_rate).await;
    println!("{}", display_quotes(&quotes, currency));
    Ok(())
}
