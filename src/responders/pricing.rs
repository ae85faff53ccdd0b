//! Pricing and financial-projection responder
//!
//! With a base amount and a growth rate in the text it projects year by year;
//! otherwise it answers with pricing-model guidance.

use super::Responder;
use crate::extractor::{EntityExtractor, ENTITY_HORIZON_YEARS};
use crate::models::Response;
use crate::Result;
use lazy_static::lazy_static;
use regex::Regex;

pub const HANDLER_ID: &str = "pricing_projection";

const DEFAULT_YEARS: u32 = 3;
const MAX_YEARS: u32 = 20;

const PRICING_MODELS: &str = "\
- **Flat subscription**: one price, easiest to sell, leaves money on the table with large customers.\n\
- **Tiered**: good / better / best; anchor on the middle tier.\n\
- **Usage-based**: aligns price with value, harder to forecast revenue.\n\
- **Per seat**: predictable, but discourages wide rollout inside a customer.";

lazy_static! {
    static ref AMOUNT: Regex =
        Regex::new(r"\$\s?(\d{1,3}(?:,\d{3})+|\d+)(?:\.(\d+))?").expect("amount pattern");
    static ref RATE: Regex = Regex::new(r"(\d+(?:\.\d+)?)\s*(?:%|percent)").expect("rate pattern");
}

pub struct PricingProjectionResponder;

impl Responder for PricingProjectionResponder {
    fn id(&self) -> &'static str {
        HANDLER_ID
    }

    fn respond(&self, text: &str) -> Result<Option<Response>> {
        let lowered = text.to_lowercase();

        let projection = match (parse_amount(&lowered), parse_rate(&lowered)) {
            (Some(amount), Some(rate)) => {
                let years = EntityExtractor::classify(text)
                    .entity(ENTITY_HORIZON_YEARS)
                    .and_then(|y| y.parse::<u32>().ok())
                    .unwrap_or(DEFAULT_YEARS)
                    .clamp(1, MAX_YEARS);
                Some(render_projection(amount, rate, years))
            }
            _ => None,
        };

        let out = projection.unwrap_or_else(|| {
            format!("### Pricing models\n\n{}", PRICING_MODELS)
        });

        Ok(Some(Response::from_handler(HANDLER_ID, out)))
    }
}

fn parse_amount(text: &str) -> Option<f64> {
    let caps = AMOUNT.captures(text)?;
    let whole = caps.get(1)?.as_str().replace(',', "");
    let value = match caps.get(2) {
        Some(frac) => format!("{}.{}", whole, frac.as_str()),
        None => whole,
    };
    value.parse().ok()
}

fn parse_rate(text: &str) -> Option<f64> {
    RATE.captures(text)?
        .get(1)?
        .as_str()
        .parse::<f64>()
        .ok()
        .map(|pct| pct / 100.0)
}

fn render_projection(amount: f64, rate: f64, years: u32) -> String {
    let mut out = format!(
        "### Revenue projection ({:.1}% annual growth)\n\n| Year | Revenue |\n|---|---|\n",
        rate * 100.0
    );

    let mut value = amount;
    out.push_str(&format!("| 0 | ${:.2} |\n", value));
    for year in 1..=years {
        value *= 1.0 + rate;
        out.push_str(&format!("| {} | ${:.2} |\n", year, value));
    }

    out
}
