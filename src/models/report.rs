//! Per-run report types.
//!
//! Failures are isolated to the smallest affected unit and aggregated
//! here instead of aborting the batch; the report is the invocation's
//! observable outcome next to the exit code.

use serde::Serialize;

/// Why a record was dropped from the current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Detail page could not be fetched
    DetailFetchFailed,

    /// Detail page fetched but a mandatory field was missing
    ParseFailed,
}

/// A record dropped from this run, with its reason.
#[derive(Debug, Clone, Serialize)]
pub struct DroppedRecord {
    pub vote_id: String,
    pub reason: DropReason,
    pub message: String,
}

/// Summary of a pipeline run.
#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    /// Vote ids seen in the listing
    pub discovered: usize,

    /// Detail pages parsed into records this run
    pub parsed: usize,

    /// Records dropped this run
    pub dropped: Vec<DroppedRecord>,

    /// Brochure language variants attempted
    pub brochures_attempted: usize,

    /// Brochure language variants successfully extracted
    pub brochures_extracted: usize,

    /// Brochure language variants that failed extraction
    pub extraction_failures: usize,

    /// Records present only in the previous artifact, carried forward
    pub carried_forward: usize,

    /// Non-blocking validation warnings
    pub warning_count: usize,

    /// Records in the published artifact
    pub record_count: usize,

    /// Whether the artifact was written
    pub published: bool,
}

impl RunReport {
    /// One-line summary for the run log.
    pub fn summary(&self) -> String {
        format!(
            "{} discovered, {} parsed, {} dropped, {}/{} brochures extracted, \
             {} carried forward, {} warnings, {} records {}",
            self.discovered,
            self.parsed,
            self.dropped.len(),
            self.brochures_extracted,
            self.brochures_attempted,
            self.carried_forward,
            self.warning_count,
            self.record_count,
            if self.published {
                "published"
            } else {
                "not published"
            }
        )
    }
}
