//! Alert rules and the combiner that merges their output into one log.
//!
//! Every rule reads the same [`DailyTrend`] and emits candidates
//! independently. The combiner runs rules in registration order, then
//! stable-sorts by date so same-day alerts keep that order.

use crate::config::RuleConfig;
use crate::models::{AlertCandidate, AlertEntry, RuleName, Severity, TrendRow};
use crate::trends::{trailing_means, DailyTrend};

/// A detection rule evaluated against the daily trend table.
pub trait AlertRule {
    fn name(&self) -> RuleName;

    fn severity(&self) -> Severity;

    fn evaluate(&self, trend: &DailyTrend) -> Vec<AlertCandidate>;
}

fn candidate(rule: &dyn AlertRule, row: &TrendRow, message: String) -> AlertCandidate {
    AlertCandidate {
        date: row.date,
        rule_name: rule.name(),
        severity: rule.severity(),
        message,
    }
}

// ── High glucose rate ───────────────────────────────────────────────

/// Fires when the share of high-glucose patients exceeds `threshold`.
#[derive(Debug, Clone)]
pub struct HighGlucoseRate {
    pub threshold: f64,
}

impl Default for HighGlucoseRate {
    fn default() -> Self {
        Self { threshold: 0.30 }
    }
}

impl AlertRule for HighGlucoseRate {
    fn name(&self) -> RuleName {
        RuleName::HighGlucoseRate
    }

    fn severity(&self) -> Severity {
        Severity::High
    }

    fn evaluate(&self, trend: &DailyTrend) -> Vec<AlertCandidate> {
        trend
            .rows()
            .iter()
            .filter(|row| row.high_glucose_rate > self.threshold)
            .map(|row| {
                let message = format!(
                    "High glucose rate exceeded threshold ({}); current={:.3}",
                    percent(self.threshold),
                    row.high_glucose_rate
                );
                candidate(self, row, message)
            })
            .collect()
    }
}

// ── Risk score spike ────────────────────────────────────────────────

/// Fires when a day's average risk score sits more than `delta` above the
/// trailing mean of the last `window` trend rows (the current row included).
///
/// The window counts rows, not calendar days, so gaps in the trend table
/// stretch it over a longer real interval.
#[derive(Debug, Clone)]
pub struct RiskScoreSpike {
    pub window: usize,
    pub delta: f64,
}

impl Default for RiskScoreSpike {
    fn default() -> Self {
        Self {
            window: 7,
            delta: 8.0,
        }
    }
}

impl AlertRule for RiskScoreSpike {
    fn name(&self) -> RuleName {
        RuleName::RiskScoreSpike
    }

    fn severity(&self) -> Severity {
        Severity::Medium
    }

    fn evaluate(&self, trend: &DailyTrend) -> Vec<AlertCandidate> {
        let scores: Vec<Option<f64>> = trend.rows().iter().map(|r| r.avg_risk_score).collect();
        let means = trailing_means(&scores, self.window);

        trend
            .rows()
            .iter()
            .zip(means)
            .filter(|(row, mean)| match (row.avg_risk_score, mean) {
                (Some(score), Some(mean)) => score - mean > self.delta,
                _ => false,
            })
            .map(|(row, _)| {
                let message = format!(
                    "Average risk score spiked more than {:?} above {}-day moving average.",
                    self.delta, self.window
                );
                candidate(self, row, message)
            })
            .collect()
    }
}

// ── Diabetes rate ───────────────────────────────────────────────────

/// Fires when the share of diabetic outcomes exceeds `threshold`.
#[derive(Debug, Clone)]
pub struct DiabetesRateHigh {
    pub threshold: f64,
}

impl Default for DiabetesRateHigh {
    fn default() -> Self {
        Self { threshold: 0.45 }
    }
}

impl AlertRule for DiabetesRateHigh {
    fn name(&self) -> RuleName {
        RuleName::DiabetesRateHigh
    }

    fn severity(&self) -> Severity {
        Severity::Medium
    }

    fn evaluate(&self, trend: &DailyTrend) -> Vec<AlertCandidate> {
        trend
            .rows()
            .iter()
            .filter(|row| row.diabetes_rate > self.threshold)
            .map(|row| {
                let message = format!(
                    "Daily diabetes rate exceeded threshold ({}).",
                    percent(self.threshold)
                );
                candidate(self, row, message)
            })
            .collect()
    }
}

fn percent(fraction: f64) -> String {
    format!("{:.0}%", fraction * 100.0)
}

// ── Combiner ────────────────────────────────────────────────────────

/// Runs a fixed list of rules and merges their candidates into one log.
pub struct AlertCombiner {
    rules: Vec<Box<dyn AlertRule>>,
}

impl Default for AlertCombiner {
    fn default() -> Self {
        Self::from_config(&RuleConfig::default())
    }
}

impl AlertCombiner {
    pub fn new(rules: Vec<Box<dyn AlertRule>>) -> Self {
        Self { rules }
    }

    /// Registers the built-in rules: high glucose, risk spike, diabetes rate.
    pub fn from_config(config: &RuleConfig) -> Self {
        Self::new(vec![
            Box::new(HighGlucoseRate {
                threshold: config.high_glucose_threshold,
            }),
            Box::new(RiskScoreSpike {
                window: config.risk_window,
                delta: config.risk_delta,
            }),
            Box::new(DiabetesRateHigh {
                threshold: config.diabetes_threshold,
            }),
        ])
    }

    pub fn combine(&self, trend: &DailyTrend) -> Vec<AlertEntry> {
        let mut candidates = Vec::new();
        for rule in &self.rules {
            let found = rule.evaluate(trend);
            tracing::debug!(rule = %rule.name(), alerts = found.len(), "rule evaluated");
            candidates.extend(found);
        }

        // Vec::sort_by_key is stable, so same-day alerts keep rule order.
        candidates.sort_by_key(|c| c.date);

        candidates
            .into_iter()
            .zip(1u64..)
            .map(|(c, alert_id)| AlertEntry {
                alert_id,
                date: c.date,
                rule_name: c.rule_name,
                severity: c.severity,
                message: c.message,
            })
            .collect()
    }
}

/// Combines alerts from the built-in rules with default thresholds.
pub fn combine(trend: &DailyTrend) -> Vec<AlertEntry> {
    AlertCombiner::default().combine(trend)
}
