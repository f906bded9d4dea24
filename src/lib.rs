//! Daily clinical trend aggregation and rule-based alerting.
//!
//! The pipeline reads patient-level observations, collapses them into a
//! [`DailyTrend`], runs the alert rules and merges their output into a
//! numbered, date-ordered alert log.

pub mod config;
pub mod error;
pub mod extract;
pub mod load;
pub mod models;
pub mod report;
pub mod rules;
pub mod transform;
pub mod trends;

pub use config::{RuleConfig, TransformConfig};
pub use error::{Error, Result};
pub use models::{AlertEntry, Observation, RuleName, Severity, TrendRow};
pub use rules::{AlertCombiner, AlertRule};
pub use trends::{aggregate, DailyTrend};

/// Aggregates observations and evaluates the built-in rules against them.
pub fn evaluate(
    observations: &[Observation],
    config: &RuleConfig,
) -> Result<(DailyTrend, Vec<AlertEntry>)> {
    config.validate()?;
    let trend = aggregate(observations);
    let alerts = AlertCombiner::from_config(config).combine(&trend);
    tracing::info!(days = trend.len(), alerts = alerts.len(), "alert evaluation complete");
    Ok((trend, alerts))
}
