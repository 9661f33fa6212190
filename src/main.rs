//! Parking facility operator console
//!
//! Reads commands from a script file or stdin, one per line, and prints the
//! results on stdout. Logs go to stderr.
//!
//! Module structure:
//! - `domain/` - Core types (tickets, sizes, ids)
//! - `billing/` - Fee engine (rate schedule, single and continuous pricing)
//! - `services/` - Facility orchestrator, slot allocator, ticket store
//! - `io/` - Command parser, formatter, console, receipt egress
//! - `infra/` - Config and metrics

use anyhow::Context;
use clap::Parser;
use parking_facility::infra::{Config, Metrics};
use parking_facility::io::{Console, Egress, Step};
use parking_facility::services::Facility;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Parking facility - slot allocation and parking fees
#[derive(Parser, Debug)]
#[command(
    name = "parking-facility",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")"),
    about
)]
struct Args {
    /// Path to TOML configuration file (falls back to CONFIG_FILE, then config/dev.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Read commands from this file instead of stdin
    #[arg(short, long)]
    script: Option<String>,

    /// Override the receipt egress file from config ("" disables)
    #[arg(long)]
    receipts: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(json: bool) {
    // Default: INFO, use RUST_LOG=debug for audit detail
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .with_writer(io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    info!(version = %env!("CARGO_PKG_VERSION"), git = %env!("GIT_HASH"), "parking_facility_starting");

    let config_path = args.config.clone().unwrap_or_else(|| Config::resolve_config_path(&[]));
    let config = Config::load_from_path(&config_path);

    let schedule = config.rate_schedule();
    info!(
        config_file = %config.config_file(),
        site = %config.site_id(),
        slots = %config.slots().len(),
        base_fee = %schedule.base_fee(),
        base_window_hours = %schedule.base_window_hours(),
        daily_fee = %schedule.daily_fee(),
        continuous_gap_max_hours = %schedule.continuous_gap_max_hours(),
        hourly = ?schedule.hourly(),
        egress_file = %config.egress_file(),
        "config_loaded"
    );

    let metrics = Arc::new(Metrics::new());
    let facility = Facility::from_config(&config)
        .with_context(|| format!("Invalid [layout] in {}", config.config_file()))?
        .with_metrics(metrics.clone());

    let egress_file = args.receipts.as_deref().unwrap_or(config.egress_file());
    let egress = Egress::from_config(egress_file, config.site_id());
    let mut console = Console::new(facility, egress);

    let reader: Box<dyn BufRead> = match &args.script {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open script {path}"))?,
        )),
        None => Box::new(io::stdin().lock()),
    };

    let mut out = io::stdout().lock();
    for line in reader.lines() {
        let line = line.context("Failed to read command")?;
        match console.run_line(&line) {
            Step::Output(text) => writeln!(out, "{text}")?,
            Step::Skip => {}
            Step::Quit => break,
        }
    }
    out.flush()?;

    if config.metrics_log_on_exit() {
        let facility = console.facility();
        metrics.report(facility.active_tickets(), facility.free_slots()).log();
    }

    info!("parking_facility_stopped");
    Ok(())
}
