use std::collections::HashSet;
use std::path::PathBuf;

use clap::Parser;

use trade_surveil::aggregates;
use trade_surveil::circular;
use trade_surveil::deviation;
use trade_surveil::error::SurveilError;
use trade_surveil::frequency;
use trade_surveil::generator::BatchGenerator;
use trade_surveil::loader;
use trade_surveil::report;
use trade_surveil::sensitivity::{self, Sweep};
use trade_surveil::types::TransactionRecord;
use trade_surveil::views::{self, Partition};

#[derive(Parser)]
#[command(name = "trade-surveil", about = "Batch surveillance over trade order records")]
struct Cli {
    /// CSV file with the order batch; a synthetic batch is generated when omitted
    #[arg(long)]
    input: Option<PathBuf>,

    /// Synthetic batch size (only without --input)
    #[arg(long, default_value = "500")]
    synthetic: usize,

    /// Suspicious-scenario injection rate for the synthetic batch (0.0-1.0)
    #[arg(long, default_value = "0.05")]
    fraud_rate: f64,

    /// Seed for the synthetic batch
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Deviation factor for order-value outliers
    #[arg(long, default_value = "3.0")]
    amount_k: f64,

    /// Deviation factor for downtime outliers
    #[arg(long, default_value = "0.845")]
    downtime_k: f64,

    /// Absolute downtime threshold in minutes
    #[arg(long, default_value = "180.0")]
    hf_threshold: f64,

    /// Absolute order-value threshold
    #[arg(long, default_value = "9500.0")]
    max_amount: f64,

    /// Also analyze this single user's order values
    #[arg(long)]
    user: Option<String>,

    /// Compute the deviation-factor sensitivity sweeps
    #[arg(long)]
    sweep: bool,

    /// Emit detector results as JSON instead of text tables
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), SurveilError> {
    env_logger::init();
    let cli = Cli::parse();

    let batch = match &cli.input {
        Some(path) => loader::load_csv(path)?,
        None => {
            log::info!(
                "no input file, generating {} synthetic records (seed {})",
                cli.synthetic,
                cli.seed
            );
            BatchGenerator::new(cli.fraud_rate, cli.seed).generate(cli.synthetic)
        }
    };

    run_report(&cli, &batch)
}

fn run_report(cli: &Cli, batch: &[TransactionRecord]) -> Result<(), SurveilError> {
    let views = views::augment(batch);
    let downtime = views::with_downtime(batch, Partition::PerUser);

    // ── Overview ──
    println!("=== Overview ===");
    println!("  orders:        {}", batch.len());
    let users: HashSet<&str> = batch.iter().map(|r| r.user_id.as_str()).collect();
    println!("  unique users:  {}", users.len());
    if !views.is_empty() {
        let avg = views.iter().map(|v| v.order_amount).sum::<f64>() / views.len() as f64;
        println!("  avg amount:    {avg:.2}");
    }

    let now = chrono::Local::now().naive_local();
    let future = loader::future_dated(batch, now);
    if future.is_empty() {
        println!("  no future-dated records");
    } else {
        log::warn!("{} record(s) stamped in the future", future.len());
        println!("  {} future-dated record(s):", future.len());
        for r in &future {
            println!("    {}  {}  {}", r.created_at, r.user_id, r.order_id);
        }
    }

    report::print_daily_totals(&aggregates::totals_by_day(&views));
    report::print_entity_totals("Turnover and balance per user", &aggregates::totals_by_user(&views));
    report::print_entity_totals(
        "Turnover and balance per instrument",
        &aggregates::totals_by_instrument(&views),
    );

    // ── Threshold rules ──
    report::print_outcome(
        &format!("Order value over {:.0}", cli.max_amount),
        &deviation::amount_over_threshold(&views, cli.max_amount)?,
        cli.json,
    );
    report::print_outcome(
        &format!("High-frequency pairs (downtime < {:.0} min)", cli.hf_threshold),
        &frequency::rapid_pairs(&downtime, cli.hf_threshold)?,
        cli.json,
    );

    // ── Deviation rules ──
    report::print_band(
        "Order value acceptance band (k = 1)",
        deviation::amount_band(&views, 1.0)?,
    );
    report::print_outcome(
        &format!("Order value outliers (k = {})", cli.amount_k),
        &deviation::order_amount_outliers(&views, cli.amount_k)?,
        cli.json,
    );
    report::print_outcome(
        &format!("Per-user order value outliers (k = {})", cli.amount_k),
        &deviation::per_user_order_amount_outliers(&views, cli.amount_k)?,
        cli.json,
    );
    if let Some(user) = &cli.user {
        report::print_outcome(
            &format!("Order value outliers for {user} (k = 2)"),
            &deviation::user_order_amount_outliers(&views, user, 2.0)?,
            cli.json,
        );
    }

    report::print_outcome(
        &format!("Rapid activity increase (k = {})", cli.downtime_k),
        &frequency::downtime_outliers(&downtime, cli.downtime_k)?,
        cli.json,
    );
    report::print_outcome(
        &format!("Per-user rapid activity increase (k = {})", cli.downtime_k),
        &frequency::per_user_downtime_outliers(&downtime, cli.downtime_k)?,
        cli.json,
    );

    // ── Circular trading ──
    report::print_outcome("Circular trading", &circular::circular_trades(&views), cli.json);

    // ── Calibration sweeps ──
    if cli.sweep {
        report::print_sweep(
            "Downtime sensitivity (low direction, factor 0-1)",
            &sensitivity::downtime_sweep(&downtime, &Sweep::DOWNTIME)?,
            cli.json,
        );
        report::print_sweep(
            "Order value sensitivity (high direction, factor 0-4)",
            &sensitivity::amount_sweep(&views, &Sweep::ORDER_VALUE)?,
            cli.json,
        );
    }

    Ok(())
}
