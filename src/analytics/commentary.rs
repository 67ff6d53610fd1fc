//! Market commentary
//!
//! Averages the latest quote values per category and assembles a short
//! narrative. Quotes are ordered by (category, symbol) so the output does
//! not depend on the order the store returned them in.

use crate::db::sqlite::MarketQuote;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const NO_MARKET_DATA: &str = "No market data available...";
pub const INSUFFICIENT_DATA: &str = "Insufficient data.";

const RISK_NOTE: &str =
    "Sticky services inflation and a higher-for-longer rate path remain the main downside risks.";
const OPPORTUNITY_NOTE: &str =
    "Wide dispersion across regions and strategies favours selective private-market commitments.";

/// Number of per-instrument lines in `changes`
const MAX_CHANGES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commentary {
    pub summary: String,
    pub risk: String,
    pub opportunity: String,
    pub changes: Vec<String>,
}

impl Commentary {
    pub fn insufficient() -> Self {
        Self {
            summary: NO_MARKET_DATA.to_string(),
            risk: INSUFFICIENT_DATA.to_string(),
            opportunity: INSUFFICIENT_DATA.to_string(),
            changes: Vec::new(),
        }
    }
}

pub fn generate_commentary(quotes: &[MarketQuote]) -> Commentary {
    if quotes.is_empty() {
        return Commentary::insufficient();
    }

    let mut sorted: Vec<&MarketQuote> = quotes.iter().collect();
    sorted.sort_by(|a, b| (&a.category, &a.symbol).cmp(&(&b.category, &b.symbol)));

    let mut by_category: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for quote in &sorted {
        let entry = by_category.entry(quote.category.as_str()).or_insert((0.0, 0));
        entry.0 += quote.value;
        entry.1 += 1;
    }

    let summary = by_category
        .iter()
        .map(|(category, (total, count))| {
            format!(
                "{} averaged {:.2} across {} instrument{}.",
                capitalize(category),
                total / *count as f64,
                count,
                if *count == 1 { "" } else { "s" }
            )
        })
        .collect::<Vec<_>>()
        .join(" ");

    let changes = sorted
        .iter()
        .take(MAX_CHANGES)
        .map(|q| format!("{}: {:.2}", q.name, q.value))
        .collect();

    Commentary {
        summary,
        risk: RISK_NOTE.to_string(),
        opportunity: OPPORTUNITY_NOTE.to_string(),
        changes,
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(symbol: &str, category: &str, value: f64) -> MarketQuote {
        MarketQuote {
            symbol: symbol.to_string(),
            category: category.to_string(),
            name: format!("{} name", symbol),
            value,
            timestamp: "2024-03-01T00:00:00.000000Z".to_string(),
        }
    }

    #[test]
    fn test_empty_snapshot() {
        let commentary = generate_commentary(&[]);
        assert_eq!(
            commentary,
            Commentary {
                summary: "No market data available...".to_string(),
                risk: "Insufficient data.".to_string(),
                opportunity: "Insufficient data.".to_string(),
                changes: vec![],
            }
        );
    }

    #[test]
    fn test_category_averages() {
        let commentary = generate_commentary(&[
            quote("SPX", "equities", 100.0),
            quote("NDX", "equities", 200.0),
            quote("UST10Y", "rates", 4.25),
        ]);
        assert_eq!(
            commentary.summary,
            "Equities averaged 150.00 across 2 instruments. Rates averaged 4.25 across 1 instrument."
        );
        assert_eq!(commentary.risk, RISK_NOTE);
    }

    #[test]
    fn test_changes_sorted_and_truncated() {
        let commentary = generate_commentary(&[
            quote("USDJPY", "fx", 150.0),
            quote("SPX", "equities", 5000.0),
            quote("GOLD", "commodities", 2000.0),
            quote("EURUSD", "fx", 1.08),
            quote("NDX", "equities", 18000.0),
            quote("UST10Y", "rates", 4.2),
        ]);
        assert_eq!(
            commentary.changes,
            vec![
                "GOLD name: 2000.00",
                "NDX name: 18000.00",
                "SPX name: 5000.00",
                "EURUSD name: 1.08",
                "USDJPY name: 150.00",
            ]
        );
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let a = vec![quote("SPX", "equities", 1.0), quote("UST10Y", "rates", 2.0)];
        let b = vec![quote("UST10Y", "rates", 2.0), quote("SPX", "equities", 1.0)];
        assert_eq!(generate_commentary(&a), generate_commentary(&b));
    }
}
