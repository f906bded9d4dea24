use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use clinical_trend_alerts::models::{Observation, ProcessedRecord};
use clinical_trend_alerts::{
    evaluate, extract, load, report, transform, AlertEntry, DailyTrend, RuleConfig,
    TransformConfig,
};

const PREVIEW_LIMIT: usize = 5;

#[derive(Parser)]
#[command(name = "clinical-trend-alerts")]
#[command(about = "Daily clinical trend aggregation and threshold alerting", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a structural summary of the raw dataset
    Inspect {
        #[arg(long, default_value = "data/raw/diabetes_raw.csv")]
        raw: PathBuf,
        /// Emit the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Clean raw records and derive dates, risk scores and flags
    Transform {
        #[arg(long, default_value = "data/raw/diabetes_raw.csv")]
        raw: PathBuf,
        #[arg(long, default_value = "data/processed/diabetes_processed.csv")]
        out: PathBuf,
        #[command(flatten)]
        transform: TransformArgs,
    },
    /// Build the daily trend and write the alert log from processed data
    Alerts {
        #[arg(long, default_value = "data/processed/diabetes_processed.csv")]
        processed: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        rules: RuleArgs,
    },
    /// Run transform and alerting end to end
    Run {
        #[arg(long, default_value = "data/raw/diabetes_raw.csv")]
        raw: PathBuf,
        #[arg(long, default_value = "data/processed/diabetes_processed.csv")]
        processed_out: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        transform: TransformArgs,
        #[command(flatten)]
        rules: RuleArgs,
    },
}

#[derive(Args)]
struct OutputArgs {
    /// Alert log destination
    #[arg(long, default_value = "data/processed/alerts_log.csv")]
    out: PathBuf,
    /// Also write the daily trend table
    #[arg(long)]
    trend_out: Option<PathBuf>,
    /// Also write a markdown report
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Args)]
struct RuleArgs {
    #[arg(long, env = "ALERT_HIGH_GLUCOSE_THRESHOLD", default_value_t = 0.30)]
    high_glucose_threshold: f64,
    #[arg(long, env = "ALERT_RISK_WINDOW", default_value_t = 7)]
    risk_window: usize,
    #[arg(long, env = "ALERT_RISK_DELTA", default_value_t = 8.0)]
    risk_delta: f64,
    #[arg(long, env = "ALERT_DIABETES_THRESHOLD", default_value_t = 0.45)]
    diabetes_threshold: f64,
}

impl From<RuleArgs> for RuleConfig {
    fn from(args: RuleArgs) -> Self {
        Self {
            high_glucose_threshold: args.high_glucose_threshold,
            risk_window: args.risk_window,
            risk_delta: args.risk_delta,
            diabetes_threshold: args.diabetes_threshold,
        }
    }
}

#[derive(Args)]
struct TransformArgs {
    /// Date assigned to the first raw record
    #[arg(long, env = "TRANSFORM_START_DATE", default_value = "2018-01-01")]
    start_date: NaiveDate,
    #[arg(long, env = "TRANSFORM_HIGH_GLUCOSE_LIMIT", default_value_t = 180.0)]
    high_glucose_limit: f64,
    #[arg(long, env = "TRANSFORM_OBESE_BMI", default_value_t = 30.0)]
    obese_bmi: f64,
    #[arg(long, env = "TRANSFORM_HIGH_RISK_QUANTILE", default_value_t = 0.75)]
    high_risk_quantile: f64,
}

impl From<TransformArgs> for TransformConfig {
    fn from(args: TransformArgs) -> Self {
        Self {
            start_date: args.start_date,
            high_glucose_limit: args.high_glucose_limit,
            obese_bmi: args.obese_bmi,
            high_risk_quantile: args.high_risk_quantile,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { raw, json } => {
            let summary = extract::inspect(&raw)
                .with_context(|| format!("failed to inspect {}", raw.display()))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print!("{}", report::format_dataset_summary(&summary));
            }
        }
        Commands::Transform {
            raw,
            out,
            transform: settings,
        } => {
            let written = run_transform(&raw, &out, &settings.into())?;
            println!("Wrote {} processed records to {}.", written.len(), out.display());
        }
        Commands::Alerts {
            processed,
            output,
            rules,
        } => {
            let observations = extract::read_observations(&processed)
                .with_context(|| format!("failed to read {}", processed.display()))?;
            run_alerts(&observations, &output, &rules.into())?;
        }
        Commands::Run {
            raw,
            processed_out,
            output,
            transform: settings,
            rules,
        } => {
            let records = run_transform(&raw, &processed_out, &settings.into())?;
            let observations: Vec<Observation> = records.iter().map(Observation::from).collect();
            run_alerts(&observations, &output, &rules.into())?;
        }
    }

    Ok(())
}

fn run_transform(
    raw: &Path,
    out: &Path,
    config: &TransformConfig,
) -> anyhow::Result<Vec<ProcessedRecord>> {
    config.validate()?;
    let records = extract::read_raw(raw)
        .with_context(|| format!("failed to read {}", raw.display()))?;
    let processed = transform::transform(&records, config);
    load::write_csv(&processed, load::PROCESSED_HEADERS, out)
        .with_context(|| format!("failed to write {}", out.display()))?;
    Ok(processed)
}

fn run_alerts(
    observations: &[Observation],
    output: &OutputArgs,
    config: &RuleConfig,
) -> anyhow::Result<()> {
    let (trend, alerts) = evaluate(observations, config)?;

    load::write_csv(&alerts, load::ALERT_HEADERS, &output.out)
        .with_context(|| format!("failed to write {}", output.out.display()))?;
    println!("Alert log saved to {}.", output.out.display());

    if let Some(path) = &output.trend_out {
        load::write_csv(trend.rows(), load::TREND_HEADERS, path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Daily trend saved to {}.", path.display());
    }

    if let Some(path) = &output.report {
        write_report(&trend, &alerts, path)?;
        println!("Report written to {}.", path.display());
    }

    println!();
    println!("Sample alerts:");
    print!("{}", report::preview_alerts(&alerts, PREVIEW_LIMIT));
    Ok(())
}

fn write_report(trend: &DailyTrend, alerts: &[AlertEntry], path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, report::build_report(trend, alerts))?;
    Ok(())
}
