//! Daily trend aggregation.
//!
//! Observations are grouped by calendar day into [`TrendRow`]s. Only days
//! that occur in the input are emitted, and a day is kept only when it has
//! a glucose or a risk score average.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::models::{Observation, TrendRow};

/// Date-ordered table of daily aggregates. Dates are unique and ascending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyTrend {
    rows: Vec<TrendRow>,
}

impl DailyTrend {
    /// Builds a trend table from rows that are already in date order.
    pub fn from_rows(rows: Vec<TrendRow>) -> Result<Self> {
        for pair in rows.windows(2) {
            if pair[0].date >= pair[1].date {
                return Err(Error::UnorderedTrend {
                    previous: pair[0].date,
                    next: pair[1].date,
                });
            }
        }
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[TrendRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Default)]
struct DayAccumulator {
    glucose: Mean,
    bmi: Mean,
    risk_score: Mean,
    outcomes: usize,
    high_glucose: usize,
    high_risk: usize,
    obese: usize,
    count: usize,
}

#[derive(Default)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value.filter(|v| v.is_finite()) {
            self.sum += v;
            self.count += 1;
        }
    }

    fn value(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

/// Collapses observations into one row per calendar day.
pub fn aggregate(observations: &[Observation]) -> DailyTrend {
    let mut days: BTreeMap<chrono::NaiveDate, DayAccumulator> = BTreeMap::new();

    for obs in observations {
        let day = days.entry(obs.date).or_default();
        day.glucose.push(obs.glucose);
        day.bmi.push(obs.bmi);
        day.risk_score.push(obs.risk_score);
        day.outcomes += usize::from(obs.outcome);
        day.high_glucose += usize::from(obs.high_glucose_flag);
        day.high_risk += usize::from(obs.high_risk_flag);
        day.obese += usize::from(obs.obese_flag);
        day.count += 1;
    }

    let total_days = days.len();
    let rows: Vec<TrendRow> = days
        .into_iter()
        .filter_map(|(date, day)| {
            let avg_glucose = day.glucose.value();
            let avg_risk_score = day.risk_score.value();
            if avg_glucose.is_none() && avg_risk_score.is_none() {
                return None;
            }
            let n = day.count as f64;
            Some(TrendRow {
                date,
                avg_glucose,
                avg_bmi: day.bmi.value(),
                avg_risk_score,
                diabetes_rate: day.outcomes as f64 / n,
                high_glucose_rate: day.high_glucose as f64 / n,
                high_risk_rate: day.high_risk as f64 / n,
                obese_rate: day.obese as f64 / n,
                patient_count: day.count,
            })
        })
        .collect();

    tracing::debug!(
        observations = observations.len(),
        days = total_days,
        kept = rows.len(),
        "aggregated daily trend"
    );

    DailyTrend { rows }
}

/// Trailing mean over the last `window` values ending at each position.
///
/// A position yields `None` until `window` values are available, or when any
/// value inside its window is missing.
pub fn trailing_means(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            let slice = &values[i + 1 - window..=i];
            let sum = slice.iter().try_fold(0.0, |acc, v| v.map(|v| acc + v))?;
            Some(sum / window as f64)
        })
        .collect()
}
