use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::browser::webdriver::Browser;
use crate::controller::PageMode;

#[derive(Parser)]
#[command(name = "idsweep")]
#[command(about = "Look up checksum-valid 8-digit IDs on the dashboard and record the names found")]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to ~/.config/idsweep/config.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug-level logging
    #[arg(long, short = 'v', global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Query every valid ID in an inclusive range and record names found
    Scan(ScanArgs),

    /// List stored records
    Report(ReportArgs),

    /// Check IDs against the checksum without querying anything
    Check(CheckArgs),
}

#[derive(Parser)]
pub struct ScanArgs {
    /// First ID of the range
    pub low: u64,

    /// Last ID of the range (inclusive)
    pub high: u64,

    /// Output the summary as JSON instead of a table
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Database file (defaults to the platform data directory)
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// WebDriver endpoint, e.g. http://localhost:4444
    #[arg(long)]
    pub webdriver: Option<String>,

    /// firefox or chrome
    #[arg(long)]
    pub browser: Option<Browser>,

    /// reload (fresh page per ID) or reuse (resubmit on the loaded page)
    #[arg(long)]
    pub page_mode: Option<PageMode>,

    /// Seconds to wait for results to render
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Show the browser window
    #[arg(long, default_value_t = false)]
    pub no_headless: bool,

    /// Match placeholder text case-sensitively
    #[arg(long, default_value_t = false)]
    pub case_sensitive: bool,
}

#[derive(Parser)]
pub struct ReportArgs {
    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Only show records whose stored name is placeholder text
    #[arg(long, default_value_t = false)]
    pub placeholders: bool,

    /// Database file (defaults to the platform data directory)
    #[arg(long)]
    pub db: Option<PathBuf>,
}

#[derive(Parser)]
pub struct CheckArgs {
    /// IDs to validate
    #[arg(conflicts_with = "range")]
    pub ids: Vec<u64>,

    /// Count the valid IDs in an inclusive range instead
    #[arg(long, num_args = 2, value_names = ["LOW", "HIGH"])]
    pub range: Option<Vec<u64>>,
}
