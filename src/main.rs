use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use lead_ops_metrics::config::EngineConfig;
use lead_ops_metrics::dashboard::{build_dashboard, metric_trend};
use lead_ops_metrics::filter::{available_months, YearMonth};
use lead_ops_metrics::models::{AggregationSpec, ClassifiedRecord, Metric};
use lead_ops_metrics::{aggregate, classify_all, evaluate, normalize, report, source};

#[derive(Parser)]
#[command(name = "lead-ops-metrics")]
#[command(about = "Lead outcome, cost and trend metrics from sheet exports", long_about = None)]
struct Cli {
    /// JSON engine configuration
    #[arg(long, global = true, env = "LEAD_OPS_CONFIG")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the months present in the export
    Months {
        #[arg(long)]
        input: PathBuf,
    },
    /// Daily leads per outcome
    Leads {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        month: Option<YearMonth>,
    },
    /// Smoothed mean of one metric, segmented and overall
    Trend {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        metric: String,
        #[arg(long, value_delimiter = ',')]
        by: Vec<String>,
        #[arg(long)]
        window: Option<usize>,
        #[arg(long)]
        month: Option<YearMonth>,
    },
    /// Threshold checks per dimension value
    Alerts {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        dimension: Option<String>,
        #[arg(long)]
        ctr_target: Option<f64>,
        #[arg(long)]
        month: Option<YearMonth>,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        month: Option<YearMonth>,
        #[arg(long)]
        ctr_target: Option<f64>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn load_records(input: &Path) -> anyhow::Result<Vec<ClassifiedRecord>> {
    let rows = source::load_path(input)?;
    let records = normalize(&rows)
        .with_context(|| format!("failed to normalize {}", input.display()))?;
    Ok(classify_all(records))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lead_ops_metrics=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Months { input } => {
            let records = load_records(&input)?;
            let months = available_months(&records);

            if months.is_empty() {
                println!("No records found.");
                return Ok(());
            }
            for month in months {
                println!("{month}");
            }
        }
        Commands::Leads { input, month } => {
            config.filter.month = month.or(config.filter.month);
            let plan = config.resolve()?;
            let records = plan.filter.apply(&load_records(&input)?);
            let table = aggregate(&records, &AggregationSpec::leads_by_outcome(plan.bucket));
            print_json(&table)?;
        }
        Commands::Trend {
            input,
            metric,
            by,
            window,
            month,
        } => {
            let metric: Metric = metric.parse()?;
            if !by.is_empty() {
                config.segment_dimensions = by;
            }
            if let Some(window) = window {
                config.window = window;
            }
            config.filter.month = month.or(config.filter.month);
            let plan = config.resolve()?;
            let records = plan.filter.apply(&load_records(&input)?);
            print_json(&metric_trend(&records, &plan, metric)?)?;
        }
        Commands::Alerts {
            input,
            dimension,
            ctr_target,
            month,
        } => {
            if let Some(dimension) = dimension {
                config.alert_dimension = dimension;
            }
            if let Some(target) = ctr_target {
                config.set_ctr_target(target);
            }
            config.filter.month = month.or(config.filter.month);
            let plan = config.resolve()?;
            let records = plan.filter.apply(&load_records(&input)?);
            let alerts = evaluate(&records, plan.alert_dimension, &plan.thresholds);
            print_json(&alerts)?;
        }
        Commands::Report {
            input,
            month,
            ctr_target,
            out,
        } => {
            if let Some(target) = ctr_target {
                config.set_ctr_target(target);
            }
            config.filter.month = month.or(config.filter.month);
            let plan = config.resolve()?;
            if plan.filter.month.is_none() {
                warn!("no month selected, reporting over the whole export");
            }
            let records = load_records(&input)?;
            let dashboard = build_dashboard(&records, &plan)?;
            let scope = plan.filter.month.map(|m| m.to_string());
            let report = report::build_report(scope.as_deref(), &dashboard);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            info!(path = %out.display(), "report written");
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
