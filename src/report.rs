use std::collections::BTreeMap;
use std::fmt::Write;

use crate::extract::DatasetSummary;
use crate::models::{AlertEntry, RuleName, Severity};
use crate::trends::DailyTrend;

#[derive(Debug, Clone, PartialEq)]
pub struct RuleSummary {
    pub rule_name: RuleName,
    pub severity: Severity,
    pub count: usize,
}

pub fn summarize_by_rule(alerts: &[AlertEntry]) -> Vec<RuleSummary> {
    let mut map: BTreeMap<RuleName, (Severity, usize)> = BTreeMap::new();

    for alert in alerts {
        let entry = map.entry(alert.rule_name).or_insert((alert.severity, 0));
        entry.1 += 1;
    }

    let mut summaries: Vec<RuleSummary> = map
        .into_iter()
        .map(|(rule_name, (severity, count))| RuleSummary {
            rule_name,
            severity,
            count,
        })
        .collect();

    summaries.sort_by(|a, b| b.count.cmp(&a.count));
    summaries
}

pub fn format_dataset_summary(summary: &DatasetSummary) -> String {
    let mut output = String::new();

    let _ = writeln!(
        output,
        "Shape (rows, columns): ({}, {})",
        summary.rows,
        summary.columns.len()
    );
    let _ = writeln!(output, "Columns: {}", summary.columns.join(", "));
    let _ = writeln!(output);
    let _ = writeln!(output, "Missing values per column:");
    for column in &summary.columns {
        let _ = writeln!(output, "  {column}: {}", summary.missing[column]);
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "Zero values per column (may indicate missing clinical fields):");
    for column in &summary.columns {
        let _ = writeln!(output, "  {column}: {}", summary.zeros[column]);
    }

    if let Some(outcomes) = &summary.outcome_counts {
        let _ = writeln!(output);
        let _ = writeln!(output, "Outcome value counts:");
        for (value, count) in outcomes {
            let _ = writeln!(output, "  {value}: {count}");
        }
    }

    output
}

pub fn preview_alerts(alerts: &[AlertEntry], limit: usize) -> String {
    let mut output = String::new();
    if alerts.is_empty() {
        let _ = writeln!(output, "No alerts raised.");
        return output;
    }
    for alert in alerts.iter().take(limit) {
        let _ = writeln!(
            output,
            "#{} {} [{}] {}: {}",
            alert.alert_id, alert.date, alert.severity, alert.rule_name, alert.message
        );
    }
    if alerts.len() > limit {
        let _ = writeln!(output, "... and {} more", alerts.len() - limit);
    }
    output
}

pub fn build_report(trend: &DailyTrend, alerts: &[AlertEntry]) -> String {
    let summaries = summarize_by_rule(alerts);

    let mut output = String::new();
    let _ = writeln!(output, "# Clinical Trend Alert Report");

    match (trend.rows().first(), trend.rows().last()) {
        (Some(first), Some(last)) => {
            let _ = writeln!(
                output,
                "Trend covers {} days from {} to {}",
                trend.len(),
                first.date,
                last.date
            );
        }
        _ => {
            let _ = writeln!(output, "No trend days available.");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Alerts by Rule");

    if summaries.is_empty() {
        let _ = writeln!(output, "No alerts raised for this run.");
    } else {
        for summary in summaries.iter() {
            let _ = writeln!(
                output,
                "- {} ({}): {} alerts",
                summary.rule_name, summary.severity, summary.count
            );
        }
    }

    let high = alerts.iter().filter(|a| a.severity == Severity::High).count();
    let _ = writeln!(output);
    let _ = writeln!(output, "## Severity");
    let _ = writeln!(output, "- HIGH: {high}");
    let _ = writeln!(output, "- MEDIUM: {}", alerts.len() - high);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Alert Log");

    if alerts.is_empty() {
        let _ = writeln!(output, "No alerts raised for this run.");
    } else {
        for alert in alerts {
            let _ = writeln!(
                output,
                "- #{} {} {} ({}): {}",
                alert.alert_id, alert.date, alert.rule_name, alert.severity, alert.message
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn alert(alert_id: u64, day: u32, rule_name: RuleName, severity: Severity) -> AlertEntry {
        AlertEntry {
            alert_id,
            date: NaiveDate::from_ymd_opt(2018, 1, day).unwrap(),
            rule_name,
            severity,
            message: "msg".to_string(),
        }
    }

    #[test]
    fn rules_sorted_by_count() {
        let alerts = vec![
            alert(1, 1, RuleName::HighGlucoseRate, Severity::High),
            alert(2, 2, RuleName::DiabetesRateHigh, Severity::Medium),
            alert(3, 3, RuleName::DiabetesRateHigh, Severity::Medium),
        ];
        let summaries = summarize_by_rule(&alerts);
        assert_eq!(summaries[0].rule_name, RuleName::DiabetesRateHigh);
        assert_eq!(summaries[0].count, 2);
        assert_eq!(summaries[1].count, 1);
    }

    #[test]
    fn empty_report_mentions_no_alerts() {
        let report = build_report(&DailyTrend::default(), &[]);
        assert!(report.contains("No trend days available."));
        assert!(report.contains("No alerts raised for this run."));
        assert!(report.contains("- MEDIUM: 0"));
    }

    #[test]
    fn preview_truncates() {
        let alerts: Vec<_> = (1..=4)
            .map(|i| alert(i, i as u32, RuleName::HighGlucoseRate, Severity::High))
            .collect();
        let preview = preview_alerts(&alerts, 2);
        assert_eq!(preview.lines().count(), 3);
        assert!(preview.ends_with("... and 2 more\n"));
    }
}
