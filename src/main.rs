use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use idsweep::browser::WebDriverSession;
use idsweep::checksum;
use idsweep::cli::{CheckArgs, Cli, Command, ReportArgs, ScanArgs};
use idsweep::config::Config;
use idsweep::controller::PageController;
use idsweep::report;
use idsweep::scan;
use idsweep::store::RecordStore;

fn init_logging(verbose: bool) {
    let default = if verbose { "idsweep=debug" } else { "idsweep=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_scan(cli: &Cli, args: &ScanArgs) -> anyhow::Result<()> {
    if args.low > args.high {
        bail!("invalid range: {} is greater than {}", args.low, args.high);
    }

    let mut config = Config::from_scan_args(args, cli.config.as_deref()).context("loading config")?;
    config.verbose = cli.verbose;

    let db_path = config.db_path()?;
    let mut store = RecordStore::open(&db_path, config.denylist())
        .with_context(|| format!("opening {}", db_path.display()))?;
    tracing::info!(db = %db_path.display(), records = store.count()?, "store ready");

    // SIGINT and SIGTERM only raise the flag; the loop stops between ids so the
    // remote session is still deleted on the way out
    let stop = Arc::new(AtomicBool::new(false));
    let stop_handler = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        stop_handler.store(true, Ordering::SeqCst);
        tracing::warn!("interrupt received, stopping after the current lookup");
    })
    .context("failed to set ctrl-c handler")?;

    let session = WebDriverSession::start(&config.webdriver)?;
    let mut controller = PageController::new(
        session,
        config.target.clone(),
        config.page_mode,
        config.wait(),
    )
    .with_stale_wait(config.stale_wait());

    match scan::run_and_close(args.low..=args.high, &mut controller, &mut store, &stop) {
        Ok(summary) => {
            report::print_summary(&summary, &config);
            Ok(())
        }
        Err(e) => {
            if let Some(partial) = e.partial() {
                report::print_summary(partial, &config);
            }
            Err(e.into())
        }
    }
}

fn run_report(cli: &Cli, args: &ReportArgs) -> anyhow::Result<()> {
    let config = Config::from_report_args(args, cli.config.as_deref()).context("loading config")?;
    let db_path = config.db_path()?;
    let store = RecordStore::open(&db_path, config.denylist())
        .with_context(|| format!("opening {}", db_path.display()))?;

    let records = if args.placeholders {
        store.placeholders()?
    } else {
        store.list()?
    };

    report::print_records(&records, config.json_output);
    Ok(())
}

fn run_check(args: &CheckArgs) -> anyhow::Result<()> {
    if let Some(bounds) = &args.range {
        let &[low, high] = bounds.as_slice() else {
            bail!("--range takes exactly two values");
        };
        if low > high {
            bail!("invalid range: {low} is greater than {high}");
        }
        let valid = checksum::valid_in(low..=high).count();
        println!("{valid} valid IDs in {low}..={high} ({} candidates)", high - low + 1);
        return Ok(());
    }

    if args.ids.is_empty() {
        bail!("nothing to check: pass IDs or --range LOW HIGH");
    }

    for id in &args.ids {
        let verdict = if checksum::is_valid(*id) { "valid" } else { "invalid" };
        println!("{id}: {verdict}");
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Command::Scan(args) => run_scan(&cli, args),
        Command::Report(args) => run_report(&cli, args),
        Command::Check(args) => run_check(args),
    }
}
