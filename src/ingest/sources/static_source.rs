//! Bundled illustrative data
//!
//! Used when no external feed is configured or every feed in a chain has
//! failed. Values are representative, not live.

use crate::db::sqlite::{
    classify_bucket, Domain, EconomicRelease, MarketQuote, PeMetric, Position, Record,
};
use crate::error::Result;
use crate::ingest::RecordSource;
use async_trait::async_trait;

/// Source that always yields the same records
pub struct StaticSource {
    id: String,
    domain: Domain,
    records: Vec<Record>,
}

impl StaticSource {
    pub fn new(domain: Domain, records: Vec<Record>) -> Self {
        Self {
            id: format!("static:{}", domain),
            domain,
            records,
        }
    }

    pub fn markets() -> Self {
        let quotes = [
            ("SPX", "equities", "S&P 500", 5137.08),
            ("NDX", "equities", "Nasdaq 100", 18302.91),
            ("SX5E", "equities", "Euro Stoxx 50", 4894.86),
            ("NKY", "equities", "Nikkei 225", 39910.82),
            ("UST2Y", "rates", "US 2Y Treasury", 4.53),
            ("UST10Y", "rates", "US 10Y Treasury", 4.18),
            ("BUND10Y", "rates", "German 10Y Bund", 2.41),
            ("IG_OAS", "credit", "US IG OAS (bp)", 96.0),
            ("HY_OAS", "credit", "US HY OAS (bp)", 312.0),
            ("EURUSD", "fx", "EUR/USD", 1.0838),
            ("USDJPY", "fx", "USD/JPY", 150.08),
            ("BRENT", "commodities", "Brent Crude", 83.55),
            ("GOLD", "commodities", "Gold", 2082.90),
        ];

        let records = quotes
            .into_iter()
            .map(|(symbol, category, name, value)| {
                Record::Market(MarketQuote {
                    symbol: symbol.to_string(),
                    category: category.to_string(),
                    name: name.to_string(),
                    value,
                    timestamp: String::new(),
                })
            })
            .collect();

        Self::new(Domain::Markets, records)
    }

    pub fn economics() -> Self {
        let releases = [
            ("CPI YoY", "US", 3.1, "2024-01-31", "Jan 2024", Some(0.2)),
            ("Core PCE YoY", "US", 2.8, "2024-01-31", "Jan 2024", Some(0.0)),
            ("GDP QoQ SAAR", "US", 3.2, "2023-12-31", "Q4 2023", Some(0.3)),
            ("Unemployment Rate", "US", 3.7, "2024-01-31", "Jan 2024", Some(-0.1)),
            ("ISM Manufacturing", "US", 49.1, "2024-01-31", "Jan 2024", Some(1.9)),
            ("CESI", "US", -20.0, "2024-02-29", "Feb 2024", None),
            ("HICP YoY", "EZ", 2.8, "2024-01-31", "Jan 2024", Some(0.1)),
            ("GDP QoQ", "EZ", 0.0, "2023-12-31", "Q4 2023", Some(0.1)),
            ("CESI", "EZ", 8.5, "2024-02-29", "Feb 2024", None),
            ("CPI YoY", "UK", 4.0, "2024-01-31", "Jan 2024", Some(-0.2)),
        ];

        let records = releases
            .into_iter()
            .map(|(indicator, country, value, release_date, period, surprise)| {
                Record::Economic(EconomicRelease {
                    indicator: indicator.to_string(),
                    country: country.to_string(),
                    value,
                    release_date: release_date.to_string(),
                    period: period.to_string(),
                    surprise,
                    timestamp: String::new(),
                })
            })
            .collect();

        Self::new(Domain::Economics, records)
    }

    pub fn pe_metrics() -> Self {
        let metrics = [
            ("Dry Powder ($bn)", "Buyout", Some("North America"), 1120.0, "2023"),
            ("Dry Powder ($bn)", "Buyout", Some("Europe"), 420.0, "2023"),
            ("Dry Powder ($bn)", "Venture", None, 585.0, "2023"),
            ("Fundraising ($bn)", "Buyout", Some("Global"), 448.0, "2023"),
            ("Fundraising ($bn)", "Growth", Some("Global"), 112.0, "2023"),
            ("Median EV/EBITDA", "Buyout", Some("North America"), 11.9, "2023"),
            ("Median EV/EBITDA", "Buyout", Some("Europe"), 10.7, "2023"),
            ("Deal Volume ($bn)", "Growth", None, 203.0, "2023"),
            ("Exit Value ($bn)", "Buyout", Some("Global"), 365.0, "2023"),
            ("Pooled IRR (%)", "Buyout", None, 13.4, "10Y to Q3 2023"),
        ];

        let records = metrics
            .into_iter()
            .map(|(metric, strategy, region, value, period)| {
                Record::PeMetric(PeMetric {
                    metric: metric.to_string(),
                    strategy: strategy.to_string(),
                    region: region.map(str::to_string),
                    value,
                    period: period.to_string(),
                    timestamp: String::new(),
                })
            })
            .collect();

        Self::new(Domain::PeMetrics, records)
    }

    pub fn positions() -> Self {
        // (id, name, asset class, market value $mm, ytd $mm, ytd %, irr, tvpi, nav %, nav target %)
        type Row = (
            &'static str,
            &'static str,
            &'static str,
            f64,
            Option<f64>,
            Option<f64>,
            Option<f64>,
            Option<f64>,
            Option<f64>,
            Option<f64>,
        );
        let positions: [Row; 7] = [
            ("POS-001", "Global Equity Index Fund", "Public Equity", 412.5, Some(21.3), Some(5.4), None, None, Some(34.4), Some(35.0)),
            ("POS-002", "Core Fixed Income Mandate", "Fixed Income", 268.0, Some(-1.9), Some(-0.7), None, None, Some(22.3), Some(25.0)),
            ("POS-003", "Buyout Fund VII", "Private Equity", 185.2, None, None, Some(0.164), Some(1.52), Some(15.4), Some(15.0)),
            ("POS-004", "Venture Partners III", "Venture Capital", 64.8, None, None, Some(0.091), Some(1.18), Some(5.4), Some(5.0)),
            ("POS-005", "Core Real Estate Fund", "Real Estate", 121.0, Some(-3.2), Some(-2.6), Some(0.058), Some(1.21), Some(10.1), Some(10.0)),
            ("POS-006", "Infrastructure Fund II", "Infrastructure", 88.4, Some(2.1), Some(2.4), Some(0.097), Some(1.33), Some(7.4), Some(7.0)),
            ("POS-007", "Cash & Equivalents", "Cash", 60.1, Some(0.8), Some(1.3), None, None, Some(5.0), Some(3.0)),
        ];

        let records = positions
            .into_iter()
            .map(
                |(id, name, asset_class, market_value, ytd_value, ytd_pct, irr, tvpi, nav_pct, nav_target)| {
                    Record::Position(Position {
                        id: id.to_string(),
                        name: name.to_string(),
                        asset_class: asset_class.to_string(),
                        market_value,
                        ytd_value,
                        ytd_pct,
                        irr,
                        tvpi,
                        nav_pct,
                        nav_target,
                        bucket: classify_bucket(asset_class),
                        timestamp: String::new(),
                    })
                },
            )
            .collect();

        Self::new(Domain::Positions, records)
    }
}

#[async_trait]
impl RecordSource for StaticSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn domain(&self) -> Domain {
        self.domain
    }

    async fn fetch(&self) -> Result<Vec<Record>> {
        Ok(self.records.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_sources_are_valid_once_stamped() {
        for source in [
            StaticSource::markets(),
            StaticSource::economics(),
            StaticSource::pe_metrics(),
            StaticSource::positions(),
        ] {
            let records = source.fetch().await.unwrap();
            assert!(!records.is_empty(), "{} is empty", source.id());
            for mut record in records {
                assert_eq!(record.domain(), source.domain());
                record.set_timestamp("2024-03-01T00:00:00Z");
                record.validate().unwrap();
            }
        }
    }

    #[tokio::test]
    async fn test_static_positions_are_bucketed() {
        let records = StaticSource::positions().fetch().await.unwrap();
        let buckets: Vec<String> = records
            .into_iter()
            .filter_map(|r| match r {
                Record::Position(p) => Some(p.bucket),
                _ => None,
            })
            .collect();
        assert!(buckets.contains(&"Illiquid – Private Equity".to_string()));
        assert!(buckets.contains(&"Liquid – Public Equity".to_string()));
    }
}
