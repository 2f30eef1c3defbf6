//! Credit portfolio CLI
//!
//! # Commands
//!
//! - `credit-portfolio metrics --accounts <csv>` - risk metrics per account and portfolio headline figures
//! - `credit-portfolio segments --accounts <csv> --group-by region,risk_segment` - segment summaries
//! - `credit-portfolio alerts --accounts <csv>` - high-risk customers for review
//! - `credit-portfolio roll-rate --snapshots <csv>` - transition matrix and trend projection
//! - `credit-portfolio simulate --accounts <csv>` - lending strategy grid search

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use credit_portfolio::account::{load_accounts, Account, DataQualityReport};
use credit_portfolio::assumptions::{with_pd_coefficients, ModelConfig};
use credit_portfolio::output::{
    transition_rows, write_csv_path, AccountMetricsRow, SegmentRow, StrategyRow,
};
use credit_portfolio::risk::InvalidRecordPolicy;
use credit_portfolio::rollrate::{estimate_matrix, load_snapshots};
use credit_portfolio::segment::{GroupBy, HighRiskFilter};
use credit_portfolio::strategy::{parse_income_bands, SimulationSettings, StrategyGrid};
use credit_portfolio::AnalysisRunner;
use log::info;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "credit-portfolio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Model configuration (JSON); defaults apply to absent fields
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// PD scorecard coefficients (CSV: term,coefficient)
    #[arg(long, global = true)]
    pd_coefficients: Option<PathBuf>,

    /// Abort on the first invalid account instead of skipping it
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute risk metrics for every account
    Metrics {
        #[arg(short, long)]
        accounts: PathBuf,

        /// Output CSV of per-account metrics
        #[arg(short, long, default_value = "account_metrics.csv")]
        output: PathBuf,
    },

    /// Summarize accounts by segment
    Segments {
        #[arg(short, long)]
        accounts: PathBuf,

        /// Comma-separated keys: region, income_band, risk_segment, score_band, delinquency_status
        #[arg(short, long, default_value = "risk_segment")]
        group_by: String,

        #[arg(short, long, default_value = "segments.csv")]
        output: PathBuf,
    },

    /// List approved accounts matching high-risk thresholds
    Alerts {
        #[arg(short, long)]
        accounts: PathBuf,

        #[arg(long, default_value_t = 1000.0)]
        min_balance: f64,

        #[arg(long, default_value_t = 650.0)]
        max_score: f64,

        /// Percent
        #[arg(long, default_value_t = 50.0)]
        min_utilization: f64,

        #[arg(short, long, default_value = "high_risk_accounts.csv")]
        output: PathBuf,
    },

    /// Estimate a transition matrix and optionally project the book forward
    RollRate {
        /// Snapshot history (CSV: as_of,customer_id,days_past_due[,written_off])
        #[arg(short, long)]
        snapshots: PathBuf,

        /// Current extract to project
        #[arg(short, long)]
        accounts: Option<PathBuf>,

        #[arg(short, long, default_value_t = 12)]
        periods: usize,

        #[arg(short, long, default_value = "transition_matrix.csv")]
        output: PathBuf,

        #[arg(long, default_value = "portfolio_trend.csv")]
        trend_output: PathBuf,
    },

    /// Search a grid of lending strategies
    Simulate {
        #[arg(short, long)]
        accounts: PathBuf,

        #[arg(long, value_delimiter = ',', default_value = "600,650,700,750")]
        min_scores: Vec<u16>,

        #[arg(long, value_delimiter = ',', default_value = "0.8,1.0,1.2,1.5")]
        multipliers: Vec<f64>,

        /// Eligible income band set, '+'-separated; repeat for more sets
        #[arg(long = "bands", default_value = "Low+Medium+High")]
        band_sets: Vec<String>,

        /// Worker threads (default: available cores)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Strategies to print
        #[arg(long, default_value_t = 10)]
        top: usize,

        #[arg(short, long, default_value = "strategy_results.csv")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let runner = build_runner(&cli)?;

    match cli.command {
        Commands::Metrics { accounts, output } => run_metrics(&runner, &accounts, &output),
        Commands::Segments {
            accounts,
            group_by,
            output,
        } => run_segments(&runner, &accounts, &group_by, &output),
        Commands::Alerts {
            accounts,
            min_balance,
            max_score,
            min_utilization,
            output,
        } => {
            let filter = HighRiskFilter {
                min_balance,
                max_score,
                min_utilization,
            };
            run_alerts(&runner, &accounts, filter, &output)
        }
        Commands::RollRate {
            snapshots,
            accounts,
            periods,
            output,
            trend_output,
        } => run_roll_rate(&runner, &snapshots, accounts.as_deref(), periods, &output, &trend_output),
        Commands::Simulate {
            accounts,
            min_scores,
            multipliers,
            band_sets,
            workers,
            top,
            output,
        } => {
            let bands = band_sets
                .iter()
                .map(|set| parse_income_bands(set.split('+')))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            let grid = StrategyGrid::new(min_scores, multipliers, bands)?;
            let settings = match workers {
                Some(workers) => SimulationSettings { workers },
                None => SimulationSettings::default(),
            };
            run_simulate(&runner, &accounts, &grid, settings, top, &output)
        }
    }
}

fn build_runner(cli: &Cli) -> Result<AnalysisRunner> {
    let mut config = match &cli.config {
        Some(path) => ModelConfig::from_json_path(path)
            .with_context(|| format!("loading model configuration {}", path.display()))?,
        None => ModelConfig::default(),
    };
    if let Some(path) = &cli.pd_coefficients {
        config = with_pd_coefficients(config, path)
            .with_context(|| format!("loading PD coefficients {}", path.display()))?;
    }
    let policy = if cli.strict {
        InvalidRecordPolicy::Abort
    } else {
        InvalidRecordPolicy::Skip
    };
    Ok(AnalysisRunner::with_config(config)?.with_policy(policy))
}

fn read_accounts(runner: &AnalysisRunner, path: &Path) -> Result<Vec<Account>> {
    let report = load_accounts(path).with_context(|| format!("reading accounts {}", path.display()))?;
    let quality = DataQualityReport::assess(
        &report.accounts,
        runner.calculator().config().excess_utilization_tolerance,
    );

    println!("Loaded {} of {} rows", report.accounts.len(), report.total_rows());
    if !quality.is_clean() {
        println!(
            "  Data quality: {} duplicate ids, {} excess-utilization accounts",
            quality.duplicate_customers.len(),
            quality.excess_utilization_count
        );
    }

    if runner.policy() == InvalidRecordPolicy::Abort {
        Ok(report.into_strict()?)
    } else {
        Ok(report.accounts)
    }
}

fn run_metrics(runner: &AnalysisRunner, accounts: &Path, output: &Path) -> Result<()> {
    let accounts = read_accounts(runner, accounts)?;
    let batch = runner.enrich(&accounts)?;
    let m = runner.portfolio_metrics(&batch);

    println!("\nPortfolio");
    println!("  Customers:          {}", m.total_customers);
    println!("  Approved:           {} ({:.1}%)", m.approved_customers, m.approval_rate * 100.0);
    println!("  Balance:            £{:.2}", m.portfolio_balance);
    println!("  Limits:             £{:.2}", m.total_limits);
    println!("  Avg utilization:    {:.1}%", m.avg_utilization);
    println!("  Avg score:          {:.0}", m.avg_score);
    println!("  Delinquency rate:   {:.2}%", m.delinquency_rate * 100.0);
    println!("  High risk accounts: {}", m.high_risk_customers);
    println!("  Expected loss:      £{:.2}", m.expected_loss);

    let rows: Vec<AccountMetricsRow> = batch.enriched.iter().map(AccountMetricsRow::from).collect();
    write_csv_path(output, &rows).with_context(|| format!("writing {}", output.display()))?;
    info!("wrote {} account rows to {}", rows.len(), output.display());
    Ok(())
}

fn run_segments(runner: &AnalysisRunner, accounts: &Path, group_by: &str, output: &Path) -> Result<()> {
    let group_by = GroupBy::parse(group_by)?;
    let accounts = read_accounts(runner, accounts)?;
    let batch = runner.enrich(&accounts)?;
    let segments = runner.segments(&batch, &group_by);

    println!("\n{:<40} {:>8} {:>14} {:>10} {:>10}", "Segment", "Accounts", "Balance", "W. PD", "Loss rate");
    println!("{}", "-".repeat(86));
    for (key, s) in &segments {
        println!(
            "{:<40} {:>8} {:>14.2} {:>9.2}% {:>9.2}%",
            key.to_string(),
            s.account_count,
            s.total_balance,
            s.weighted_pd * 100.0,
            s.loss_rate * 100.0
        );
    }

    let rows: Vec<SegmentRow> = segments.iter().map(|(k, s)| SegmentRow::new(k, s)).collect();
    write_csv_path(output, &rows).with_context(|| format!("writing {}", output.display()))?;
    Ok(())
}

fn run_alerts(runner: &AnalysisRunner, accounts: &Path, filter: HighRiskFilter, output: &Path) -> Result<()> {
    let accounts = read_accounts(runner, accounts)?;
    let batch = runner.enrich(&accounts)?;
    let alert = filter.apply(&batch.enriched);

    println!("\n{} high-risk customers identified (exposure £{:.2})", alert.len(), alert.exposure());
    println!("  Delinquent:            {}", alert.delinquent_count);
    println!("  Utilization above 80%: {}", alert.high_utilization_count);

    let rows: Vec<AccountMetricsRow> = alert.accounts.iter().map(|e| AccountMetricsRow::from(*e)).collect();
    write_csv_path(output, &rows).with_context(|| format!("writing {}", output.display()))?;
    Ok(())
}

fn run_roll_rate(
    runner: &AnalysisRunner,
    snapshots: &Path,
    accounts: Option<&Path>,
    periods: usize,
    output: &Path,
    trend_output: &Path,
) -> Result<()> {
    let history = load_snapshots(snapshots).with_context(|| format!("reading snapshots {}", snapshots.display()))?;
    let matrix = estimate_matrix(&history)?;

    println!("\nTransition matrix ({} snapshots)", history.len());
    for row in transition_rows(&matrix).chunks(5) {
        let cells: Vec<String> = row.iter().map(|c| format!("{:>8.4}", c.probability)).collect();
        println!("  {:<10} {}", row[0].from_state, cells.join(" "));
    }
    write_csv_path(output, &transition_rows(&matrix)).with_context(|| format!("writing {}", output.display()))?;

    if let Some(path) = accounts {
        let accounts = read_accounts(runner, path)?;
        let batch = runner.enrich(&accounts)?;
        let trend = runner.trend(&batch, &matrix, periods)?;
        if let Some(last) = trend.last() {
            println!(
                "\nAfter {} periods: delinquent {:.2}%, written off {:.2}%, cumulative loss £{:.2}",
                last.period,
                last.delinquent_share * 100.0,
                last.written_off_share * 100.0,
                last.cumulative_expected_loss
            );
        }
        write_csv_path(trend_output, &trend).with_context(|| format!("writing {}", trend_output.display()))?;
    }
    Ok(())
}

fn run_simulate(
    runner: &AnalysisRunner,
    accounts: &Path,
    grid: &StrategyGrid,
    settings: SimulationSettings,
    top: usize,
    output: &Path,
) -> Result<()> {
    let accounts = read_accounts(runner, accounts)?;
    let run = runner.strategies(&accounts, grid, settings, None)?;

    println!(
        "\nBaseline: {} approved, balance £{:.2}, ROA {:.4}%",
        run.baseline.approved_count,
        run.baseline.portfolio_balance,
        run.baseline.roa * 100.0
    );
    println!("\n{:>4} {:<44} {:>8} {:>14} {:>9} {:>10}", "Rank", "Strategy", "Approved", "Balance", "ROA", "Balance Δ");
    for (i, (r, cmp)) in run.report.ranked.iter().zip(&run.comparisons).take(top).enumerate() {
        println!(
            "{:>4} {:<44} {:>8} {:>14.2} {:>8.4}% {:>+9.1}%",
            i + 1,
            r.config.name,
            r.approved_count,
            r.portfolio_balance,
            r.roa * 100.0,
            cmp.balance_change_pct
        );
    }
    for failure in &run.report.failures {
        println!("FAILED {}: {}", failure.config.name, failure.error);
    }

    let rows: Vec<StrategyRow> = run
        .report
        .ranked
        .iter()
        .zip(&run.comparisons)
        .enumerate()
        .map(|(i, (r, cmp))| StrategyRow::new(i + 1, r, cmp))
        .collect();
    write_csv_path(output, &rows).with_context(|| format!("writing {}", output.display()))?;
    Ok(())
}
