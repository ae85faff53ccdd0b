//! Crypto price-projection responder
//!
//! Scenario projections expressed as multiples of today's price. Live prices
//! come from the market data service upstream, never from here.

use super::Responder;
use crate::extractor::{EntityExtractor, ENTITY_CRYPTO_ASSET, ENTITY_HORIZON_YEARS};
use crate::models::Response;
use crate::Result;

pub const HANDLER_ID: &str = "crypto_forecast";

const DEFAULT_HORIZON_YEARS: u32 = 5;
const MAX_HORIZON_YEARS: u32 = 30;

/// (scenario, annual growth rate)
const SCENARIOS: &[(&str, f64)] = &[
    ("Bear", -0.10),
    ("Base", 0.08),
    ("Bull", 0.25),
];

/// Static reference notes per asset
const ASSET_NOTES: &[(&str, &str)] = &[
    ("BTC", "Fixed 21M supply; price historically follows halving cycles and macro liquidity."),
    ("ETH", "Value tied to network usage, staking yield and fee burn."),
    ("XRP", "Driven by cross-border payment adoption and regulatory outcomes."),
    ("SOL", "High-throughput chain; sensitive to developer activity and outages."),
    ("DOGE", "Inflationary supply; moves mostly on sentiment."),
    ("ADA", "Research-led roadmap; adoption has lagged delivery timelines."),
    ("LTC", "Mature payments chain with steady but slow adoption."),
];

pub struct CryptoForecastResponder;

impl Responder for CryptoForecastResponder {
    fn id(&self) -> &'static str {
        HANDLER_ID
    }

    fn respond(&self, text: &str) -> Result<Option<Response>> {
        let classification = EntityExtractor::classify(text);

        let Some(asset) = classification.entity(ENTITY_CRYPTO_ASSET) else {
            return Ok(None);
        };

        let years = classification
            .entity(ENTITY_HORIZON_YEARS)
            .and_then(|y| y.parse::<u32>().ok())
            .unwrap_or(DEFAULT_HORIZON_YEARS);

        if years == 0 || years > MAX_HORIZON_YEARS {
            return Ok(None);
        }

        let mut out = format!("### {} outlook over {} years\n\n", asset, years);
        out.push_str("| Scenario | Annual change | Multiple of today's price |\n");
        out.push_str("|---|---|---|\n");

        for (name, rate) in SCENARIOS {
            out.push_str(&format!(
                "| {} | {:+.0}% | {:.2}x |\n",
                name,
                rate * 100.0,
                project_multiple(*rate, years)
            ));
        }

        if let Some((_, note)) = ASSET_NOTES.iter().find(|(symbol, _)| *symbol == asset) {
            out.push_str(&format!("\n{}\n", note));
        }

        out.push_str("\nProjections are illustrative scenarios, not financial advice.");

        Ok(Some(Response::from_handler(HANDLER_ID, out)))
    }
}

fn project_multiple(annual_rate: f64, years: u32) -> f64 {
    (1.0 + annual_rate).powi(years as i32)
}
