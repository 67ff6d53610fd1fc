//! Observation store models
//!
//! One struct per data domain. Every record carries its key attributes, a
//! domain-specific payload and the ingestion `timestamp` (RFC 3339, UTC).

use crate::error::{AppError, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Data domain, one table each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Markets,
    Economics,
    PeMetrics,
    Positions,
    RiskMeasures,
}

impl Domain {
    pub const ALL: [Domain; 5] = [
        Domain::Markets,
        Domain::Economics,
        Domain::PeMetrics,
        Domain::Positions,
        Domain::RiskMeasures,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Markets => "markets",
            Domain::Economics => "economics",
            Domain::PeMetrics => "pe_metrics",
            Domain::Positions => "positions",
            Domain::RiskMeasures => "risk_measures",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = AppError;

    /// Accepts the canonical names plus the URL aliases used by the dashboard
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "markets" | "market" => Ok(Domain::Markets),
            "economics" | "economic" => Ok(Domain::Economics),
            "pe_metrics" | "pe-metrics" | "pe" => Ok(Domain::PeMetrics),
            "positions" | "portfolio" => Ok(Domain::Positions),
            "risk_measures" | "risk-measures" | "risk" => Ok(Domain::RiskMeasures),
            other => Err(AppError::NotFound(format!("Unknown domain '{}'", other))),
        }
    }
}

/// Latest quote for a market instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote {
    pub symbol: String,
    pub category: String,
    pub name: String,
    pub value: f64,
    #[serde(default)]
    pub timestamp: String,
}

/// Economic indicator release
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconomicRelease {
    pub indicator: String,
    pub country: String,
    pub value: f64,
    /// Economic period the value describes, independent of ingestion time
    pub release_date: String,
    pub period: String,
    /// Actual minus consensus; absent when no consensus exists
    #[serde(default)]
    pub surprise: Option<f64>,
    #[serde(default)]
    pub timestamp: String,
}

/// Private-equity market metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeMetric {
    pub metric: String,
    pub strategy: String,
    #[serde(default)]
    pub region: Option<String>,
    pub value: f64,
    pub period: String,
    #[serde(default)]
    pub timestamp: String,
}

/// Portfolio position, upserted by id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: String,
    pub name: String,
    pub asset_class: String,
    pub market_value: f64,
    #[serde(default)]
    pub ytd_value: Option<f64>,
    #[serde(default)]
    pub ytd_pct: Option<f64>,
    #[serde(default)]
    pub irr: Option<f64>,
    #[serde(default)]
    pub tvpi: Option<f64>,
    #[serde(default)]
    pub nav_pct: Option<f64>,
    #[serde(default)]
    pub nav_target: Option<f64>,
    /// Liquidity bucket; derived from the asset class when left empty
    #[serde(default)]
    pub bucket: String,
    #[serde(default)]
    pub timestamp: String,
}

/// Asset classes whose positions cannot be sold within the VaR horizon
const ILLIQUID_ASSET_CLASSES: &[&str] = &[
    "private equity",
    "venture capital",
    "real estate",
    "infrastructure",
    "private credit",
    "hedge fund",
];

/// Map an asset class to its liquidity bucket label
pub fn classify_bucket(asset_class: &str) -> String {
    let normalized = asset_class.trim().to_ascii_lowercase();
    if ILLIQUID_ASSET_CLASSES.contains(&normalized.as_str()) {
        format!("Illiquid – {}", asset_class.trim())
    } else {
        format!("Liquid – {}", asset_class.trim())
    }
}

/// Risk figures for one liquidity bucket on one date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskMeasure {
    pub as_of_date: String,
    pub bucket: String,
    pub var_99: f64,
    pub stress_pl: f64,
    pub scenario: String,
    #[serde(default)]
    pub timestamp: String,
}

/// A record of any domain
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Record {
    Market(MarketQuote),
    Economic(EconomicRelease),
    PeMetric(PeMetric),
    Position(Position),
    Risk(RiskMeasure),
}

impl Record {
    pub fn domain(&self) -> Domain {
        match self {
            Record::Market(_) => Domain::Markets,
            Record::Economic(_) => Domain::Economics,
            Record::PeMetric(_) => Domain::PeMetrics,
            Record::Position(_) => Domain::Positions,
            Record::Risk(_) => Domain::RiskMeasures,
        }
    }

    pub fn timestamp(&self) -> &str {
        match self {
            Record::Market(r) => &r.timestamp,
            Record::Economic(r) => &r.timestamp,
            Record::PeMetric(r) => &r.timestamp,
            Record::Position(r) => &r.timestamp,
            Record::Risk(r) => &r.timestamp,
        }
    }

    pub fn set_timestamp(&mut self, timestamp: &str) {
        let slot = match self {
            Record::Market(r) => &mut r.timestamp,
            Record::Economic(r) => &mut r.timestamp,
            Record::PeMetric(r) => &mut r.timestamp,
            Record::Position(r) => &mut r.timestamp,
            Record::Risk(r) => &mut r.timestamp,
        };
        *slot = timestamp.to_string();
    }

    /// Decode an untyped JSON record for `domain`.
    ///
    /// Missing or mistyped fields are reported as validation errors. The
    /// timestamp may be absent; the ingestor stamps it.
    pub fn from_value(domain: Domain, value: serde_json::Value) -> Result<Self> {
        fn decode<T: DeserializeOwned>(domain: Domain, value: serde_json::Value) -> Result<T> {
            serde_json::from_value(value)
                .map_err(|e| AppError::Validation(format!("Invalid {} record: {}", domain, e)))
        }

        Ok(match domain {
            Domain::Markets => Record::Market(decode(domain, value)?),
            Domain::Economics => Record::Economic(decode(domain, value)?),
            Domain::PeMetrics => Record::PeMetric(decode(domain, value)?),
            Domain::Positions => {
                let mut position: Position = decode(domain, value)?;
                if position.bucket.trim().is_empty() {
                    position.bucket = classify_bucket(&position.asset_class);
                }
                Record::Position(position)
            }
            Domain::RiskMeasures => Record::Risk(decode(domain, value)?),
        })
    }

    /// Check required fields and normalise the timestamp.
    ///
    /// Runs before any write; a failure rejects the record untouched.
    pub fn validate(&mut self) -> Result<()> {
        let domain = self.domain();
        match self {
            Record::Market(r) => {
                require_text(domain, "symbol", &r.symbol)?;
                require_text(domain, "category", &r.category)?;
                require_text(domain, "name", &r.name)?;
                require_finite(domain, "value", r.value)?;
            }
            Record::Economic(r) => {
                require_text(domain, "indicator", &r.indicator)?;
                require_text(domain, "country", &r.country)?;
                require_finite(domain, "value", r.value)?;
                require_date(domain, "release_date", &r.release_date)?;
                require_text(domain, "period", &r.period)?;
                if let Some(surprise) = r.surprise {
                    require_finite(domain, "surprise", surprise)?;
                }
            }
            Record::PeMetric(r) => {
                require_text(domain, "metric", &r.metric)?;
                require_text(domain, "strategy", &r.strategy)?;
                if let Some(region) = &r.region {
                    require_text(domain, "region", region)?;
                }
                require_finite(domain, "value", r.value)?;
                require_text(domain, "period", &r.period)?;
            }
            Record::Position(r) => {
                require_text(domain, "id", &r.id)?;
                require_text(domain, "name", &r.name)?;
                require_text(domain, "asset_class", &r.asset_class)?;
                require_finite(domain, "market_value", r.market_value)?;
                for (field, value) in [
                    ("ytd_value", r.ytd_value),
                    ("ytd_pct", r.ytd_pct),
                    ("irr", r.irr),
                    ("tvpi", r.tvpi),
                    ("nav_pct", r.nav_pct),
                    ("nav_target", r.nav_target),
                ] {
                    if let Some(v) = value {
                        require_finite(domain, field, v)?;
                    }
                }
                require_text(domain, "bucket", &r.bucket)?;
            }
            Record::Risk(r) => {
                require_date(domain, "as_of_date", &r.as_of_date)?;
                require_text(domain, "bucket", &r.bucket)?;
                require_finite(domain, "var_99", r.var_99)?;
                require_finite(domain, "stress_pl", r.stress_pl)?;
                require_text(domain, "scenario", &r.scenario)?;
            }
        }

        let normalized = normalize_timestamp(self.timestamp())
            .map_err(|e| AppError::Validation(format!("{} record: {}", domain, e)))?;
        self.set_timestamp(&normalized);
        Ok(())
    }
}

fn require_text(domain: Domain, field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!(
            "{} record is missing required field '{}'",
            domain, field
        )));
    }
    Ok(())
}

fn require_finite(domain: Domain, field: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(AppError::Validation(format!(
            "{} record field '{}' must be a finite number",
            domain, field
        )));
    }
    Ok(())
}

fn require_date(domain: Domain, field: &str, value: &str) -> Result<()> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        AppError::Validation(format!(
            "{} record field '{}' must be a YYYY-MM-DD date, got '{}'",
            domain, field, value
        ))
    })?;
    Ok(())
}

/// Format a UTC instant the way timestamps are stored
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse an RFC 3339 timestamp and re-emit it in the fixed-width stored form,
/// so that lexical order in SQL equals chronological order.
pub fn normalize_timestamp(raw: &str) -> Result<String> {
    if raw.trim().is_empty() {
        return Err(AppError::Validation("missing required field 'timestamp'".to_string()));
    }
    let parsed = DateTime::parse_from_rfc3339(raw.trim()).map_err(|e| {
        AppError::Validation(format!("timestamp '{}' is not RFC 3339: {}", raw, e))
    })?;
    Ok(format_timestamp(parsed.with_timezone(&Utc)))
}

/// Parse a calendar date and re-emit it as zero-padded `YYYY-MM-DD`
pub fn normalize_date(raw: &str) -> Result<String> {
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        AppError::Validation(format!("'{}' is not a YYYY-MM-DD date", raw))
    })?;
    Ok(date.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_domain_aliases() {
        assert_eq!("portfolio".parse::<Domain>().unwrap(), Domain::Positions);
        assert_eq!("pe-metrics".parse::<Domain>().unwrap(), Domain::PeMetrics);
        assert_eq!("Markets".parse::<Domain>().unwrap(), Domain::Markets);
        assert!("crypto".parse::<Domain>().is_err());
    }

    #[test]
    fn test_domain_serializes_as_table_name() {
        for domain in Domain::ALL {
            assert_eq!(serde_json::to_value(domain).unwrap(), json!(domain.as_str()));
        }
    }

    #[test]
    fn test_classify_bucket() {
        assert_eq!(classify_bucket("Private Equity"), "Illiquid – Private Equity");
        assert_eq!(classify_bucket("Public Equity"), "Liquid – Public Equity");
        assert_eq!(classify_bucket(" Real Estate "), "Illiquid – Real Estate");
    }

    #[test]
    fn test_normalize_timestamp() {
        assert_eq!(
            normalize_timestamp("2024-03-01T10:00:00+02:00").unwrap(),
            "2024-03-01T08:00:00.000000Z"
        );
        assert!(normalize_timestamp("").is_err());
        assert!(normalize_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_from_value_missing_field() {
        let err = Record::from_value(Domain::Markets, json!({"symbol": "SPX", "value": 1.0}))
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_from_value_wrong_type() {
        let err = Record::from_value(
            Domain::Markets,
            json!({"symbol": "SPX", "category": "equities", "name": "S&P 500", "value": "high"}),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_from_value_derives_bucket() {
        let record = Record::from_value(
            Domain::Positions,
            json!({"id": "p1", "name": "Fund IV", "asset_class": "Private Equity", "market_value": 10.0}),
        )
        .unwrap();
        match record {
            Record::Position(p) => assert_eq!(p.bucket, "Illiquid – Private Equity"),
            other => panic!("unexpected record {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_blank_key() {
        let mut record = Record::Market(MarketQuote {
            symbol: " ".into(),
            category: "equities".into(),
            name: "S&P 500".into(),
            value: 1.0,
            timestamp: "2024-01-01T00:00:00Z".into(),
        });
        assert!(matches!(record.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_validate_keeps_absent_surprise() {
        let mut record = Record::from_value(
            Domain::Economics,
            json!({
                "indicator": "CESI", "country": "US", "value": -20.0,
                "release_date": "2024-02-29", "period": "Feb 2024",
                "timestamp": "2024-03-01T00:00:00Z"
            }),
        )
        .unwrap();
        record.validate().unwrap();
        match record {
            Record::Economic(r) => {
                assert_eq!(r.surprise, None);
                assert_eq!(r.timestamp, "2024-03-01T00:00:00.000000Z");
            }
            other => panic!("unexpected record {:?}", other),
        }
    }
}
