//! Writing tables to flat CSV files.

use std::path::Path;

use serde::Serialize;

use crate::error::Result;

/// Writes `rows` to `path`, creating parent directories as needed.
///
/// Column order follows the field order of `T`. A header line is written
/// even when there are no rows.
pub fn write_csv<T: Serialize>(rows: &[T], headers: &[&str], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    writer.write_record(headers)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    tracing::info!(path = %path.display(), rows = rows.len(), "wrote table");
    Ok(())
}

pub const PROCESSED_HEADERS: &[&str] = &[
    "Id",
    "Pregnancies",
    "Glucose",
    "BloodPressure",
    "SkinThickness",
    "Insulin",
    "BMI",
    "DiabetesPedigreeFunction",
    "Age",
    "Outcome",
    "date",
    "risk_score",
    "high_glucose_flag",
    "obese_flag",
    "high_risk_flag",
];

pub const TREND_HEADERS: &[&str] = &[
    "date",
    "avg_glucose",
    "avg_bmi",
    "avg_risk_score",
    "diabetes_rate",
    "high_glucose_rate",
    "high_risk_rate",
    "obese_rate",
    "patient_count",
];

pub const ALERT_HEADERS: &[&str] = &["alert_id", "date", "rule_name", "severity", "message"];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlertEntry, RuleName, Severity};
    use chrono::NaiveDate;

    #[test]
    fn writes_alert_log_with_header_and_nested_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed").join("alerts_log.csv");
        let alerts = vec![AlertEntry {
            alert_id: 1,
            date: NaiveDate::from_ymd_opt(2018, 2, 1).unwrap(),
            rule_name: RuleName::DiabetesRateHigh,
            severity: Severity::Medium,
            message: "Daily diabetes rate exceeded threshold (45%).".into(),
        }];

        write_csv(&alerts, ALERT_HEADERS, &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "alert_id,date,rule_name,severity,message\n\
             1,2018-02-01,DIABETES_RATE_HIGH,MEDIUM,Daily diabetes rate exceeded threshold (45%).\n"
        );
    }

    #[test]
    fn empty_table_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alerts_log.csv");
        write_csv::<AlertEntry>(&[], ALERT_HEADERS, &path).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "alert_id,date,rule_name,severity,message\n"
        );
    }
}
