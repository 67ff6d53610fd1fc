//! Bucket-level Value at Risk
//!
//! `ParametricVar` is a placeholder model: one-day 99% VaR from a fixed
//! z-score and an assumed volatility per liquidity bucket, plus a flat
//! mark-down stress. Other models plug in through [`RiskModel`].

use crate::db::sqlite::{Position, RiskMeasure};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One-sided 99% quantile of the standard normal
pub const Z_99: f64 = 2.3263;

/// Risk figures for one bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketRisk {
    pub bucket: String,
    pub market_value: f64,
    pub var_99: f64,
    pub stress_pl: f64,
    pub scenario: String,
}

/// Outcome of a risk run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RiskAssessment {
    /// No positions to assess
    InsufficientData { reason: String },
    Computed { buckets: Vec<BucketRisk> },
}

impl RiskAssessment {
    /// Rows to persist for `as_of_date`, all stamped with `timestamp`
    pub fn to_measures(&self, as_of_date: &str, timestamp: &str) -> Vec<RiskMeasure> {
        match self {
            RiskAssessment::InsufficientData { .. } => Vec::new(),
            RiskAssessment::Computed { buckets } => buckets
                .iter()
                .map(|b| RiskMeasure {
                    as_of_date: as_of_date.to_string(),
                    bucket: b.bucket.clone(),
                    var_99: b.var_99,
                    stress_pl: b.stress_pl,
                    scenario: b.scenario.clone(),
                    timestamp: timestamp.to_string(),
                })
                .collect(),
        }
    }
}

/// Turns a position snapshot into bucket risk
pub trait RiskModel: Send + Sync {
    fn id(&self) -> &'static str;

    fn assess(&self, positions: &[Position]) -> RiskAssessment;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParametricVar {
    pub z_score: f64,
    pub liquid_volatility: f64,
    pub illiquid_volatility: f64,
    /// Fractional shock applied to bucket value, negative for a loss
    pub stress_shock: f64,
}

impl Default for ParametricVar {
    fn default() -> Self {
        Self {
            z_score: Z_99,
            liquid_volatility: 0.10,
            illiquid_volatility: 0.15,
            stress_shock: -0.05,
        }
    }
}

impl ParametricVar {
    fn volatility_for(&self, bucket: &str) -> f64 {
        if bucket.to_lowercase().contains("illiquid") {
            self.illiquid_volatility
        } else {
            self.liquid_volatility
        }
    }

    fn scenario(&self) -> String {
        format!("Flat {:.0}% mark-down", self.stress_shock.abs() * 100.0)
    }
}

impl RiskModel for ParametricVar {
    fn id(&self) -> &'static str {
        "parametric_var"
    }

    fn assess(&self, positions: &[Position]) -> RiskAssessment {
        if positions.is_empty() {
            return RiskAssessment::InsufficientData {
                reason: "No positions available".to_string(),
            };
        }

        let mut by_bucket: BTreeMap<&str, f64> = BTreeMap::new();
        for position in positions {
            *by_bucket.entry(position.bucket.as_str()).or_insert(0.0) += position.market_value;
        }

        let buckets = by_bucket
            .into_iter()
            .map(|(bucket, value)| BucketRisk {
                bucket: bucket.to_string(),
                market_value: value,
                var_99: value * self.z_score * self.volatility_for(bucket),
                stress_pl: value * self.stress_shock,
                scenario: self.scenario(),
            })
            .collect();

        RiskAssessment::Computed { buckets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::classify_bucket;

    fn position(id: &str, asset_class: &str, market_value: f64) -> Position {
        Position {
            id: id.to_string(),
            name: id.to_string(),
            asset_class: asset_class.to_string(),
            market_value,
            ytd_value: None,
            ytd_pct: None,
            irr: None,
            tvpi: None,
            nav_pct: None,
            nav_target: None,
            bucket: classify_bucket(asset_class),
            timestamp: "2024-03-01T00:00:00.000000Z".to_string(),
        }
    }

    fn computed(assessment: RiskAssessment) -> Vec<BucketRisk> {
        match assessment {
            RiskAssessment::Computed { buckets } => buckets,
            other => panic!("expected computed risk, got {:?}", other),
        }
    }

    #[test]
    fn test_illiquid_bucket_var() {
        let buckets = computed(ParametricVar::default().assess(&[position("p1", "Private Equity", 100.0)]));
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].bucket, "Illiquid – Private Equity");
        assert!((buckets[0].var_99 - 34.8945).abs() < 1e-9);
        assert!((buckets[0].stress_pl - -5.0).abs() < 1e-12);
    }

    #[test]
    fn test_liquid_bucket_uses_lower_volatility() {
        let buckets = computed(ParametricVar::default().assess(&[position("p1", "Public Equity", 100.0)]));
        assert!((buckets[0].var_99 - 23.263).abs() < 1e-9);
    }

    #[test]
    fn test_positions_summed_per_bucket() {
        let buckets = computed(ParametricVar::default().assess(&[
            position("p1", "Private Equity", 60.0),
            position("p2", "Private Equity", 40.0),
            position("p3", "Cash", 10.0),
        ]));
        assert_eq!(buckets.len(), 2);
        let pe = buckets.iter().find(|b| b.bucket.contains("Private Equity")).unwrap();
        assert_eq!(pe.market_value, 100.0);
    }

    #[test]
    fn test_empty_positions_are_insufficient() {
        assert!(matches!(
            ParametricVar::default().assess(&[]),
            RiskAssessment::InsufficientData { .. }
        ));
    }

    #[test]
    fn test_to_measures() {
        let assessment = ParametricVar::default().assess(&[position("p1", "Cash", 10.0)]);
        let measures = assessment.to_measures("2024-03-01", "2024-03-01T00:00:00.000000Z");
        assert_eq!(measures.len(), 1);
        assert_eq!(measures[0].as_of_date, "2024-03-01");
        assert_eq!(measures[0].scenario, "Flat 5% mark-down");
    }
}
