//! Plain-text tables for scan summaries and stored records.

use crate::scan::ScanSummary;
use crate::store::Record;

pub fn render_summary(summary: &ScanSummary) -> String {
    let started = chrono::DateTime::from_timestamp(summary.started_at, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let mut output = String::new();
    output.push_str(&format!("\nScan {}..={} (started {started})\n", summary.low, summary.high));
    output.push_str(&"-".repeat(40));
    output.push('\n');

    let rows = [
        ("queried", summary.checked),
        ("found", summary.inserted),
        ("repaired", summary.repaired),
        ("already recorded", summary.skipped),
        ("no data", summary.no_data),
        ("empty", summary.empty),
        ("timed out", summary.timeouts),
        ("failed", summary.failures),
    ];
    for (label, count) in rows {
        output.push_str(&format!("  {label:30} {count:>7}\n"));
    }

    if let Some(next) = summary.resume_from {
        output.push_str(&format!(
            "\nstopped before {next}; resume with `idsweep scan {next} {}`\n",
            summary.high
        ));
    }

    if let Some(duration_ms) = summary.duration_ms {
        output.push_str(&format!("\ncompleted in {:.2}s\n", duration_ms as f64 / 1000.0));
    }

    output
}

pub fn render_records(records: &[Record]) -> String {
    if records.is_empty() {
        return String::from("No records stored.\n");
    }

    let mut output = String::new();
    output.push_str(&format!("{:<10} {}\n", "ID", "NAME"));
    output.push_str(&"-".repeat(50));
    output.push('\n');

    for record in records {
        output.push_str(&format!("{:<10} {}\n", record.id, truncate(&record.name, 48)));
    }

    output.push_str(&format!("\n{} records\n", records.len()));
    output
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{truncated}...")
    }
}
