//! Reading raw and processed CSV tables.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{parse_date, Observation, RawRecord};

const RAW_REQUIRED: &[&str] = &["Id", "Glucose", "BMI", "Age", "Outcome"];

const OBSERVATION_REQUIRED: &[&str] = &[
    "Id",
    "date",
    "Glucose",
    "BMI",
    "risk_score",
    "Outcome",
    "high_glucose_flag",
    "high_risk_flag",
    "obese_flag",
];

fn open(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    if !path.exists() {
        let resolved = std::fs::canonicalize(path.parent().unwrap_or(Path::new(".")))
            .map(|dir| dir.join(path.file_name().unwrap_or_default()))
            .unwrap_or_else(|_| path.to_path_buf());
        return Err(Error::NotFound(resolved));
    }
    Ok(csv::Reader::from_path(path)?)
}

fn require_columns(
    reader: &mut csv::Reader<std::fs::File>,
    required: &[&str],
    path: &Path,
) -> Result<()> {
    let headers = reader.headers()?;
    for column in required {
        if !headers.iter().any(|h| h == *column) {
            return Err(Error::MissingColumn {
                column: (*column).to_string(),
                path: path.to_path_buf(),
            });
        }
    }
    Ok(())
}

pub fn read_raw(path: &Path) -> Result<Vec<RawRecord>> {
    let mut reader = open(path)?;
    require_columns(&mut reader, RAW_REQUIRED, path)?;

    let mut records = Vec::new();
    for result in reader.deserialize::<RawRecord>() {
        records.push(result?);
    }
    tracing::info!(path = %path.display(), rows = records.len(), "loaded raw records");
    Ok(records)
}

#[derive(Deserialize)]
struct ObservationRow {
    #[serde(rename = "Id")]
    id: String,
    date: Option<String>,
    #[serde(rename = "Glucose")]
    glucose: Option<f64>,
    #[serde(rename = "BMI")]
    bmi: Option<f64>,
    risk_score: Option<f64>,
    #[serde(rename = "Outcome", deserialize_with = "crate::models::flag::deserialize")]
    outcome: bool,
    #[serde(deserialize_with = "crate::models::flag::deserialize")]
    high_glucose_flag: bool,
    #[serde(deserialize_with = "crate::models::flag::deserialize")]
    high_risk_flag: bool,
    #[serde(deserialize_with = "crate::models::flag::deserialize")]
    obese_flag: bool,
}

/// Reads a processed table into observations.
///
/// Headers are checked before any row is parsed. Rows without a date
/// cannot be placed on the calendar and are skipped.
pub fn read_observations(path: &Path) -> Result<Vec<Observation>> {
    let mut reader = open(path)?;
    require_columns(&mut reader, OBSERVATION_REQUIRED, path)?;

    let mut observations = Vec::new();
    let mut undated = 0usize;
    for result in reader.deserialize::<ObservationRow>() {
        let row = result?;
        let Some(date) = row.date.as_deref().filter(|d| !d.trim().is_empty()) else {
            undated += 1;
            continue;
        };
        observations.push(Observation {
            id: row.id,
            date: parse_date(date)?,
            glucose: row.glucose,
            bmi: row.bmi,
            risk_score: row.risk_score,
            outcome: row.outcome,
            high_glucose_flag: row.high_glucose_flag,
            high_risk_flag: row.high_risk_flag,
            obese_flag: row.obese_flag,
        });
    }

    if undated > 0 {
        tracing::warn!(path = %path.display(), skipped = undated, "skipped rows without a date");
    }
    tracing::info!(
        path = %path.display(),
        rows = observations.len(),
        "loaded observations"
    );
    Ok(observations)
}

/// Structural overview of a CSV file.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub columns: Vec<String>,
    pub missing: BTreeMap<String, usize>,
    /// Zeros often stand in for unmeasured clinical values.
    pub zeros: BTreeMap<String, usize>,
    pub outcome_counts: Option<BTreeMap<String, usize>>,
}

pub fn inspect(path: &Path) -> Result<DatasetSummary> {
    let mut reader = open(path)?;
    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let outcome_idx = columns.iter().position(|c| c == "Outcome");

    let mut missing = vec![0usize; columns.len()];
    let mut zeros = vec![0usize; columns.len()];
    let mut outcomes: BTreeMap<String, usize> = BTreeMap::new();
    let mut rows = 0usize;

    for result in reader.records() {
        let record = result?;
        rows += 1;
        for (i, field) in record.iter().enumerate().take(columns.len()) {
            let field = field.trim();
            if field.is_empty() || field.eq_ignore_ascii_case("nan") {
                missing[i] += 1;
            } else if field.parse::<f64>().is_ok_and(|v| v == 0.0) {
                zeros[i] += 1;
            }
        }
        if let Some(value) = outcome_idx.and_then(|i| record.get(i)) {
            *outcomes.entry(value.trim().to_string()).or_insert(0) += 1;
        }
    }

    Ok(DatasetSummary {
        rows,
        missing: columns.iter().cloned().zip(missing).collect(),
        zeros: columns.iter().cloned().zip(zeros).collect(),
        outcome_counts: outcome_idx.map(|_| outcomes),
        columns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    const RAW: &str = "\
Id,Pregnancies,Glucose,BloodPressure,SkinThickness,Insulin,BMI,DiabetesPedigreeFunction,Age,Outcome
1,6,148,72,35,0,33.6,0.627,50,1
2,1,0,66,29,0,0,0.351,31,0
3,8,183,64,0,0,23.3,0.672,32,1
";

    #[test]
    fn reads_raw_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "raw.csv", RAW);
        let records = read_raw(&path).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].glucose, Some(148.0));
        assert!(records[0].outcome);
        assert_eq!(records[1].bmi, Some(0.0));
    }

    #[test]
    fn missing_raw_column_is_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "raw.csv", "Id,Glucose,Age,Outcome\n1,100,30,0\n");
        match read_raw(&path) {
            Err(Error::MissingColumn { column, .. }) => assert_eq!(column, "BMI"),
            other => panic!("expected missing column, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_raw(&dir.path().join("absent.csv"));
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn reads_observations_and_skips_undated_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "processed.csv",
            "Id,Glucose,BMI,Age,Outcome,date,risk_score,high_glucose_flag,obese_flag,high_risk_flag\n\
             1,148.0,33.6,50,1,2018-01-01,84.3,0,1,1\n\
             2,,,31,0,2018-01-02 00:00:00,50.1,0,0,0\n\
             3,183.0,23.3,32,1,,89.8,1,0,1\n",
        );
        let observations = read_observations(&path).unwrap();
        assert_eq!(observations.len(), 2);
        assert_eq!(observations[0].risk_score, Some(84.3));
        assert!(observations[0].obese_flag);
        assert_eq!(observations[1].glucose, None);
        assert_eq!(observations[1].date.to_string(), "2018-01-02");
    }

    #[test]
    fn observation_schema_checked_before_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "processed.csv",
            "Id,date,Glucose,BMI,Outcome,high_glucose_flag,high_risk_flag,obese_flag\n",
        );
        match read_observations(&path) {
            Err(Error::MissingColumn { column, .. }) => assert_eq!(column, "risk_score"),
            other => panic!("expected missing column, got {other:?}"),
        }
    }

    #[test]
    fn inspect_counts_missing_and_zero_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "raw.csv", RAW);
        let summary = inspect(&path).unwrap();
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.columns.len(), 10);
        assert_eq!(summary.zeros["Insulin"], 3);
        assert_eq!(summary.zeros["Glucose"], 1);
        assert_eq!(summary.missing["BMI"], 0);
        let outcomes = summary.outcome_counts.unwrap();
        assert_eq!(outcomes["1"], 2);
        assert_eq!(outcomes["0"], 1);
    }
}
