use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// One row of the raw clinical dataset, before cleaning.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Pregnancies")]
    pub pregnancies: Option<f64>,
    #[serde(rename = "Glucose")]
    pub glucose: Option<f64>,
    #[serde(rename = "BloodPressure")]
    pub blood_pressure: Option<f64>,
    #[serde(rename = "SkinThickness")]
    pub skin_thickness: Option<f64>,
    #[serde(rename = "Insulin")]
    pub insulin: Option<f64>,
    #[serde(rename = "BMI")]
    pub bmi: Option<f64>,
    #[serde(rename = "DiabetesPedigreeFunction")]
    pub pedigree: Option<f64>,
    #[serde(rename = "Age")]
    pub age: f64,
    #[serde(rename = "Outcome", deserialize_with = "flag::deserialize")]
    pub outcome: bool,
}

/// A cleaned record with its synthetic date, risk score and derived flags.
///
/// Field order is the column order of the processed CSV.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedRecord {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Pregnancies")]
    pub pregnancies: Option<f64>,
    #[serde(rename = "Glucose")]
    pub glucose: Option<f64>,
    #[serde(rename = "BloodPressure")]
    pub blood_pressure: Option<f64>,
    #[serde(rename = "SkinThickness")]
    pub skin_thickness: Option<f64>,
    #[serde(rename = "Insulin")]
    pub insulin: Option<f64>,
    #[serde(rename = "BMI")]
    pub bmi: Option<f64>,
    #[serde(rename = "DiabetesPedigreeFunction")]
    pub pedigree: Option<f64>,
    #[serde(rename = "Age")]
    pub age: f64,
    #[serde(rename = "Outcome", serialize_with = "flag::serialize")]
    pub outcome: bool,
    pub date: NaiveDate,
    pub risk_score: Option<f64>,
    #[serde(serialize_with = "flag::serialize")]
    pub high_glucose_flag: bool,
    #[serde(serialize_with = "flag::serialize")]
    pub obese_flag: bool,
    #[serde(serialize_with = "flag::serialize")]
    pub high_risk_flag: bool,
}

/// The per-patient measurement consumed by the trend aggregator.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub id: String,
    pub date: NaiveDate,
    pub glucose: Option<f64>,
    pub bmi: Option<f64>,
    pub risk_score: Option<f64>,
    pub outcome: bool,
    pub high_glucose_flag: bool,
    pub high_risk_flag: bool,
    pub obese_flag: bool,
}

impl From<&ProcessedRecord> for Observation {
    fn from(record: &ProcessedRecord) -> Self {
        Self {
            id: record.id.clone(),
            date: record.date,
            glucose: record.glucose,
            bmi: record.bmi,
            risk_score: record.risk_score,
            outcome: record.outcome,
            high_glucose_flag: record.high_glucose_flag,
            high_risk_flag: record.high_risk_flag,
            obese_flag: record.obese_flag,
        }
    }
}

/// Aggregate indicators for a single calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendRow {
    pub date: NaiveDate,
    pub avg_glucose: Option<f64>,
    pub avg_bmi: Option<f64>,
    pub avg_risk_score: Option<f64>,
    pub diabetes_rate: f64,
    pub high_glucose_rate: f64,
    pub high_risk_rate: f64,
    pub obese_rate: f64,
    pub patient_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    High,
    Medium,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleName {
    HighGlucoseRate,
    RiskScoreSpike,
    DiabetesRateHigh,
}

impl RuleName {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleName::HighGlucoseRate => "HIGH_GLUCOSE_RATE",
            RuleName::RiskScoreSpike => "RISK_SCORE_SPIKE",
            RuleName::DiabetesRateHigh => "DIABETES_RATE_HIGH",
        }
    }
}

impl fmt::Display for RuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An alert emitted by one rule, before merging and numbering.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertCandidate {
    pub date: NaiveDate,
    pub rule_name: RuleName,
    pub severity: Severity,
    pub message: String,
}

/// A numbered entry of the final alert log.
///
/// Field order is the column order of the persisted log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEntry {
    pub alert_id: u64,
    pub date: NaiveDate,
    pub rule_name: RuleName,
    pub severity: Severity,
    pub message: String,
}

/// Parses a calendar date, truncating any time-of-day component.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();
    let day = trimmed
        .split(|c: char| c == 'T' || c == ' ')
        .next()
        .unwrap_or(trimmed);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|_| Error::InvalidDate {
        value: value.to_string(),
    })
}

pub fn parse_flag(value: &str) -> Result<bool> {
    match value.trim() {
        "1" | "1.0" | "true" | "True" | "TRUE" => Ok(true),
        "0" | "0.0" | "false" | "False" | "FALSE" => Ok(false),
        other => Err(Error::InvalidFlag {
            value: other.to_string(),
        }),
    }
}

/// Serde adapters for 0/1 boolean columns.
pub(crate) mod flag {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_flag(&raw).map_err(serde::de::Error::custom)
    }

    pub fn serialize<S>(value: &bool, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(u8::from(*value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_timestamped_dates() {
        let expected = NaiveDate::from_ymd_opt(2018, 3, 4).unwrap();
        assert_eq!(parse_date("2018-03-04").unwrap(), expected);
        assert_eq!(parse_date("2018-03-04 17:45:00").unwrap(), expected);
        assert_eq!(parse_date("2018-03-04T08:00:00").unwrap(), expected);
        assert!(matches!(
            parse_date("04/03/2018"),
            Err(Error::InvalidDate { .. })
        ));
    }

    #[test]
    fn parses_flag_spellings() {
        assert!(parse_flag("1").unwrap());
        assert!(parse_flag("1.0").unwrap());
        assert!(parse_flag("True").unwrap());
        assert!(!parse_flag(" 0 ").unwrap());
        assert!(!parse_flag("false").unwrap());
        assert!(parse_flag("2").is_err());
    }

    #[test]
    fn enum_labels_match_log_values() {
        assert_eq!(RuleName::RiskScoreSpike.to_string(), "RISK_SCORE_SPIKE");
        assert_eq!(Severity::High.to_string(), "HIGH");
    }
}
