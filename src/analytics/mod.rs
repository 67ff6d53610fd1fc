//! Derived metrics
//!
//! Pure functions over snapshot results: bucket-level risk and the market
//! commentary shown on the dashboard.

pub mod commentary;
pub mod risk;

pub use commentary::{generate_commentary, Commentary};
pub use risk::{BucketRisk, ParametricVar, RiskAssessment, RiskModel};
