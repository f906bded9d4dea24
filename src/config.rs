//! Tunable parameters for the transform step and the alert rules.

use chrono::NaiveDate;

use crate::error::{Error, Result};

/// Thresholds used by the built-in alert rules.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleConfig {
    /// Fraction of high-glucose patients above which a day alerts.
    pub high_glucose_threshold: f64,
    /// Number of trend rows in the risk score moving average.
    pub risk_window: usize,
    /// Points above the moving average that count as a spike.
    pub risk_delta: f64,
    /// Fraction of diabetic outcomes above which a day alerts.
    pub diabetes_threshold: f64,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            high_glucose_threshold: 0.30,
            risk_window: 7,
            risk_delta: 8.0,
            diabetes_threshold: 0.45,
        }
    }
}

impl RuleConfig {
    pub fn validate(&self) -> Result<()> {
        check_rate("high_glucose_threshold", self.high_glucose_threshold)?;
        check_rate("diabetes_threshold", self.diabetes_threshold)?;
        if self.risk_window == 0 {
            return Err(Error::InvalidConfig("risk_window must be at least 1".into()));
        }
        if !self.risk_delta.is_finite() {
            return Err(Error::InvalidConfig("risk_delta must be finite".into()));
        }
        Ok(())
    }
}

/// Parameters for deriving observations from raw records.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformConfig {
    /// Date assigned to the first raw record; later records follow daily.
    pub start_date: NaiveDate,
    /// Glucose strictly above this sets `high_glucose_flag`.
    pub high_glucose_limit: f64,
    /// BMI at or above this sets `obese_flag`.
    pub obese_bmi: f64,
    /// Risk score quantile that a record must exceed to be flagged high risk.
    pub high_risk_quantile: f64,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::from_ymd_opt(2018, 1, 1).unwrap_or_default(),
            high_glucose_limit: 180.0,
            obese_bmi: 30.0,
            high_risk_quantile: 0.75,
        }
    }
}

impl TransformConfig {
    pub fn validate(&self) -> Result<()> {
        check_rate("high_risk_quantile", self.high_risk_quantile)?;
        if !self.high_glucose_limit.is_finite() || !self.obese_bmi.is_finite() {
            return Err(Error::InvalidConfig("clinical limits must be finite".into()));
        }
        Ok(())
    }
}

fn check_rate(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!(
            "{name} must lie in [0, 1], got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(RuleConfig::default().validate().is_ok());
        assert!(TransformConfig::default().validate().is_ok());
        assert_eq!(
            TransformConfig::default().start_date,
            NaiveDate::from_ymd_opt(2018, 1, 1).unwrap()
        );
    }

    #[test]
    fn rejects_zero_window() {
        let config = RuleConfig {
            risk_window: 0,
            ..RuleConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn rejects_rate_outside_unit_interval() {
        let config = RuleConfig {
            diabetes_threshold: 1.5,
            ..RuleConfig::default()
        };
        assert!(config.validate().is_err());

        let config = TransformConfig {
            high_risk_quantile: -0.1,
            ..TransformConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
