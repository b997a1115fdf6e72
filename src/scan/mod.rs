//! The scan loop.
//!
//! Walks an inclusive ID range in ascending order. IDs that fail the
//! checksum are skipped without touching the browser; every other ID gets
//! exactly one lookup, its outcome is classified, and found names go to the
//! store. A failure while looking up one ID is logged and the scan moves on;
//! only losing the browser session or the database ends the run early.
//! A raised stop flag is honoured between IDs, never mid-lookup.

use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;

use crate::browser::{BrowserError, Session};
use crate::checksum;
use crate::classify::{classify, Outcome};
use crate::controller::PageController;
use crate::store::{RecordStore, StoreError, Upsert};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("invalid range: {low} is greater than {high}")]
    InvalidRange { low: u64, high: u64 },

    #[error("browser session lost at id {id}: {source}")]
    Session {
        id: u64,
        source: BrowserError,
        partial: Box<ScanSummary>,
    },

    #[error("store failed at id {id}: {source}")]
    Store {
        id: u64,
        source: StoreError,
        partial: Box<ScanSummary>,
    },
}

impl ScanError {
    /// Counts gathered before the run ended, if it got that far.
    pub fn partial(&self) -> Option<&ScanSummary> {
        match self {
            ScanError::InvalidRange { .. } => None,
            ScanError::Session { partial, .. } | ScanError::Store { partial, .. } => Some(&**partial),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanSummary {
    pub low: u64,
    pub high: u64,
    /// unix seconds
    pub started_at: i64,
    /// checksum-valid ids that were looked up
    pub checked: u64,
    pub inserted: u64,
    pub repaired: u64,
    pub skipped: u64,
    pub no_data: u64,
    pub empty: u64,
    pub timeouts: u64,
    pub failures: u64,
    pub failed_ids: Vec<u64>,
    /// First id not looked up when the run stopped early.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_from: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u128>,
}

impl ScanSummary {
    fn new(range: &RangeInclusive<u64>) -> Self {
        let started_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        ScanSummary {
            low: *range.start(),
            high: *range.end(),
            started_at,
            ..ScanSummary::default()
        }
    }

    /// Ids a later run may want to revisit with a fresh range.
    pub fn inconclusive(&self) -> u64 {
        self.empty + self.timeouts + self.failures
    }

    pub fn stopped_early(&self) -> bool {
        self.resume_from.is_some()
    }

    fn finish(&mut self, start: Instant, resume_from: Option<u64>) {
        self.resume_from = resume_from;
        self.duration_ms = Some(start.elapsed().as_millis());
    }
}

pub fn run<S: Session>(
    range: RangeInclusive<u64>,
    controller: &mut PageController<S>,
    store: &mut RecordStore,
    stop: &AtomicBool,
) -> Result<ScanSummary, ScanError> {
    let (low, high) = (*range.start(), *range.end());
    if low > high {
        return Err(ScanError::InvalidRange { low, high });
    }

    let start = Instant::now();
    let mut summary = ScanSummary::new(&range);
    let denylist = store.denylist().clone();
    tracing::info!(low, high, case = ?denylist.case(), "scan starting");

    for id in checksum::valid_in(range) {
        if stop.load(Ordering::SeqCst) {
            tracing::info!(id, "stop requested, ending scan");
            summary.finish(start, Some(id));
            return Ok(summary);
        }

        summary.checked += 1;
        tracing::debug!(id, "querying");

        let outcome = match controller.query(id) {
            Ok(reply) => classify(&reply.fragments, id, reply.timed_out, &denylist),
            Err(e) if e.is_fatal() => {
                summary.finish(start, Some(id));
                return Err(ScanError::Session { id, source: e, partial: Box::new(summary) });
            }
            Err(e) => {
                controller.reset();
                Outcome::Error(e.to_string())
            }
        };
        tracing::debug!(id, outcome = outcome.label(), "classified");

        match outcome {
            Outcome::Found(name) => match store.upsert_found(id, &name) {
                Ok(Upsert::Inserted) => {
                    summary.inserted += 1;
                    tracing::info!(id, name = %name, "found");
                }
                Ok(Upsert::Repaired { previous }) => {
                    summary.repaired += 1;
                    tracing::info!(id, name = %name, previous = %previous, "repaired placeholder");
                }
                Ok(Upsert::Skipped { existing }) => {
                    summary.skipped += 1;
                    tracing::debug!(id, existing = %existing, "already recorded");
                }
                Err(e @ StoreError::InvalidName { .. }) => {
                    summary.failures += 1;
                    summary.failed_ids.push(id);
                    tracing::warn!(id, "{e}");
                }
                Err(e) => {
                        summary.finish(start, Some(id));
                    return Err(ScanError::Store { id, source: e, partial: Box::new(summary) });
                }
            },
            Outcome::NoData => {
                summary.no_data += 1;
                tracing::debug!(id, "no data");
            }
            Outcome::Empty => {
                summary.empty += 1;
                tracing::warn!(id, "results rendered but none usable");
            }
            Outcome::Timeout => {
                summary.timeouts += 1;
                tracing::warn!(id, "timed out waiting for results");
            }
            Outcome::Error(detail) => {
                summary.failures += 1;
                summary.failed_ids.push(id);
                tracing::warn!(id, error = %detail, "lookup failed");
            }
        }
    }

    summary.finish(start, None);
    Ok(summary)
}

/// [`run`], then tear the browser session down whatever the result.
pub fn run_and_close<S: Session>(
    range: RangeInclusive<u64>,
    controller: &mut PageController<S>,
    store: &mut RecordStore,
    stop: &AtomicBool,
) -> Result<ScanSummary, ScanError> {
    let result = run(range, controller, store, stop);
    if let Err(e) = controller.close() {
        tracing::warn!("failed to close browser session: {e}");
    }
    result
}
