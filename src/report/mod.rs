pub mod table;
pub mod json;

use crate::config::Config;
use crate::scan::ScanSummary;
use crate::store::Record;

pub fn print_summary(summary: &ScanSummary, config: &Config) {
    if config.json_output {
        println!("{}", json::render_summary(summary));
    } else {
        print!("{}", table::render_summary(summary));
        print_failed_ids(summary, config.verbose);
    }
}

pub fn print_records(records: &[Record], json_output: bool) {
    if json_output {
        println!("{}", json::render_records(records));
    } else {
        print!("{}", table::render_records(records));
    }
}

fn print_failed_ids(summary: &ScanSummary, verbose: bool) {
    if summary.failed_ids.is_empty() {
        return;
    }

    println!();
    if verbose {
        println!("Failed IDs:");
        println!("{}", "-".repeat(40));
        for id in &summary.failed_ids {
            println!("  {id}");
        }
    } else {
        println!(
            "{} lookups failed; rerun with -v to list them",
            summary.failed_ids.len()
        );
    }
}
