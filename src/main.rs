//! scrollback - windowed conversation-history reconciliation engine
//!
//! This is the headless driver binary. All engine logic lives in the
//! workspace crates; this entry point seeds a scripted conversation and
//! streams NDJSON events for each applied transition.

use clap::Parser;
use std::path::PathBuf;

mod sim;

/// scrollback - windowed history reconciliation engine, headless driver
#[derive(Parser, Debug)]
#[command(name = "scrollback")]
#[command(about = "Run the reconciliation engine over a scripted conversation", long_about = None)]
struct Args {
    /// Number of records to seed the log with
    #[arg(long, default_value_t = 250)]
    records: u64,

    /// How many of the newest incoming records start unread
    #[arg(long, default_value_t = 8)]
    unread: u64,

    /// Path to an engine tuning file (TOML)
    #[arg(long, value_name = "PATH")]
    tuning: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    scrollback_core::logging::init()?;

    let tuning = match &args.tuning {
        Some(path) => scrollback_engine::load_tuning(path),
        None => scrollback_engine::load_tuning(&scrollback_engine::default_config_path()),
    };

    tracing::info!(
        records = args.records,
        unread = args.unread,
        "starting headless simulation"
    );

    sim::run(args.records, args.unread, tuning).await?;
    Ok(())
}
