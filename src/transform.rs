//! Derives observations from raw records: cleans impossible zeros, assigns
//! synthetic dates, computes a risk score and sets threshold flags.

use chrono::Duration;

use crate::config::TransformConfig;
use crate::models::{ProcessedRecord, RawRecord};

const GLUCOSE_WEIGHT: f64 = 0.4;
const BMI_WEIGHT: f64 = 0.3;
const AGE_WEIGHT: f64 = 0.3;

pub fn transform(raw: &[RawRecord], config: &TransformConfig) -> Vec<ProcessedRecord> {
    let cleaned = clean_zero_values(raw);
    let mut records = add_dates(&cleaned, config);
    add_risk_scores(&mut records);
    add_flags(&mut records, config);
    tracing::info!(rows = records.len(), "transformed raw records");
    records
}

/// Zero is not a plausible reading for these measurements; treat it as missing.
pub fn clean_zero_values(raw: &[RawRecord]) -> Vec<RawRecord> {
    fn non_zero(value: Option<f64>) -> Option<f64> {
        value.filter(|v| *v != 0.0 && v.is_finite())
    }

    raw.iter()
        .map(|r| RawRecord {
            glucose: non_zero(r.glucose),
            blood_pressure: non_zero(r.blood_pressure),
            skin_thickness: non_zero(r.skin_thickness),
            insulin: non_zero(r.insulin),
            bmi: non_zero(r.bmi),
            ..r.clone()
        })
        .collect()
}

/// Assigns consecutive days starting at `start_date`, in input order.
pub fn add_dates(raw: &[RawRecord], config: &TransformConfig) -> Vec<ProcessedRecord> {
    raw.iter()
        .zip(0i64..)
        .map(|(r, offset)| ProcessedRecord {
            id: r.id.clone(),
            pregnancies: r.pregnancies,
            glucose: r.glucose,
            blood_pressure: r.blood_pressure,
            skin_thickness: r.skin_thickness,
            insulin: r.insulin,
            bmi: r.bmi,
            pedigree: r.pedigree,
            age: r.age,
            outcome: r.outcome,
            date: config.start_date + Duration::days(offset),
            risk_score: None,
            high_glucose_flag: false,
            obese_flag: false,
            high_risk_flag: false,
        })
        .collect()
}

/// Weighted sum of glucose, BMI and age. Missing glucose or BMI is filled
/// with the column median.
pub fn add_risk_scores(records: &mut [ProcessedRecord]) {
    let glucose_median = median(records.iter().filter_map(|r| r.glucose).collect());
    let bmi_median = median(records.iter().filter_map(|r| r.bmi).collect());

    for record in records.iter_mut() {
        record.risk_score = match (record.glucose.or(glucose_median), record.bmi.or(bmi_median)) {
            (Some(glucose), Some(bmi)) => {
                Some(glucose * GLUCOSE_WEIGHT + bmi * BMI_WEIGHT + record.age * AGE_WEIGHT)
            }
            _ => None,
        };
    }
}

pub fn add_flags(records: &mut [ProcessedRecord], config: &TransformConfig) {
    let cutoff = quantile(
        records.iter().filter_map(|r| r.risk_score).collect(),
        config.high_risk_quantile,
    );

    for record in records.iter_mut() {
        record.high_glucose_flag = record
            .glucose
            .is_some_and(|g| g > config.high_glucose_limit);
        record.obese_flag = record.bmi.is_some_and(|b| b >= config.obese_bmi);
        record.high_risk_flag = match (record.risk_score, cutoff) {
            (Some(score), Some(cutoff)) => score > cutoff,
            _ => false,
        };
    }
}

fn median(values: Vec<f64>) -> Option<f64> {
    quantile(values, 0.5)
}

/// Quantile with linear interpolation between closest ranks.
fn quantile(mut values: Vec<f64>, q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let rank = q.clamp(0.0, 1.0) * (values.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    Some(values[lower] + (values[upper] - values[lower]) * weight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn raw(id: &str, glucose: f64, bmi: f64, age: f64) -> RawRecord {
        RawRecord {
            id: id.to_string(),
            pregnancies: Some(1.0),
            glucose: Some(glucose),
            blood_pressure: Some(70.0),
            skin_thickness: Some(0.0),
            insulin: Some(0.0),
            bmi: Some(bmi),
            pedigree: Some(0.5),
            age,
            outcome: false,
        }
    }

    #[test]
    fn zeros_become_missing() {
        let cleaned = clean_zero_values(&[raw("1", 0.0, 0.0, 40.0)]);
        assert_eq!(cleaned[0].glucose, None);
        assert_eq!(cleaned[0].bmi, None);
        assert_eq!(cleaned[0].insulin, None);
        assert_eq!(cleaned[0].blood_pressure, Some(70.0));
        assert_eq!(cleaned[0].pregnancies, Some(1.0));
    }

    #[test]
    fn dates_follow_input_order() {
        let records = add_dates(
            &[raw("1", 90.0, 20.0, 30.0), raw("2", 90.0, 20.0, 30.0)],
            &TransformConfig::default(),
        );
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2018, 1, 1).unwrap());
        assert_eq!(records[1].date, NaiveDate::from_ymd_opt(2018, 1, 2).unwrap());
    }

    #[test]
    fn risk_score_fills_missing_with_median() {
        let config = TransformConfig::default();
        let input = vec![
            raw("1", 100.0, 20.0, 10.0),
            raw("2", 200.0, 40.0, 10.0),
            raw("3", 0.0, 30.0, 10.0),
        ];
        let records = transform(&input, &config);
        // median glucose of [100, 200] is 150
        let expected = 150.0 * 0.4 + 30.0 * 0.3 + 10.0 * 0.3;
        assert!((records[2].risk_score.unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn flags_use_clinical_limits_and_upper_quartile() {
        let input = vec![
            raw("1", 190.0, 30.0, 20.0),
            raw("2", 100.0, 29.9, 20.0),
            raw("3", 120.0, 25.0, 20.0),
            raw("4", 0.0, 0.0, 20.0),
        ];
        let records = transform(&input, &TransformConfig::default());

        assert!(records[0].high_glucose_flag);
        assert!(records[0].obese_flag);
        assert!(!records[1].obese_flag);
        assert!(!records[3].high_glucose_flag);
        assert!(!records[3].obese_flag);
        let high_risk: Vec<bool> = records.iter().map(|r| r.high_risk_flag).collect();
        assert_eq!(high_risk, vec![true, false, false, false]);
    }

    #[test]
    fn quantile_interpolates() {
        assert_eq!(quantile(vec![4.0, 1.0, 3.0, 2.0], 0.75), Some(3.25));
        assert_eq!(median(vec![5.0, 1.0, 3.0]), Some(3.0));
        assert_eq!(quantile(Vec::new(), 0.5), None);
    }
}
