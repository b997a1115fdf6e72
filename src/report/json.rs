//! JSON output for scan summaries and stored records.

use crate::scan::ScanSummary;
use crate::store::Record;

pub fn render_summary(summary: &ScanSummary) -> String {
    serde_json::to_string_pretty(summary).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
}

pub fn render_records(records: &[Record]) -> String {
    serde_json::to_string_pretty(records).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
}
