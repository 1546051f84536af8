//! Records persisted by the storage layer.

use serde::Serialize;

/// TXT values of one successfully resolved domain.
///
/// # Database Schema
///
/// One row in `domain_records` plus one `domain_txt_records` row per value,
/// keyed by `(record_id, position)` so resolver order survives a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRecord {
    /// Domain the values were resolved for
    pub domain: String,
    /// Non-empty TXT strings in resolver order
    pub txt_records: Vec<String>,
    /// Batch that produced the record
    pub batch_id: String,
}

impl ResolvedRecord {
    /// Builds a record from raw lookup output, dropping empty strings.
    ///
    /// Returns `None` when nothing is left to store.
    pub fn from_lookup(domain: &str, batch_id: &str, txt_records: Vec<String>) -> Option<Self> {
        let txt_records: Vec<String> = txt_records
            .into_iter()
            .filter(|value| !value.is_empty())
            .collect();
        if txt_records.is_empty() {
            return None;
        }
        Some(Self {
            domain: domain.to_string(),
            txt_records,
            batch_id: batch_id.to_string(),
        })
    }
}

/// Lifecycle state of a batch in the `batches` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    /// Tasks are still being processed
    Running,
    /// Every task reached an outcome
    Completed,
    /// Stopped by the caller before finishing
    Cancelled,
    /// Stopped by a batch-level error
    Failed,
}

impl BatchStatus {
    /// Value stored in the `status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Running => "running",
            BatchStatus::Completed => "completed",
            BatchStatus::Cancelled => "cancelled",
            BatchStatus::Failed => "failed",
        }
    }

    /// Parses a `status` column value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "running" => Some(BatchStatus::Running),
            "completed" => Some(BatchStatus::Completed),
            "cancelled" => Some(BatchStatus::Cancelled),
            "failed" => Some(BatchStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Batch metadata recorded when a batch starts.
pub struct BatchStart<'a> {
    pub batch_id: &'a str,
    pub source_name: &'a str,
    pub started_at_ms: i64,
    pub total_domains: usize,
}

/// Batch counters recorded when a batch ends.
pub struct BatchFinish<'a> {
    pub batch_id: &'a str,
    pub completed_domains: usize,
    pub stored_records: usize,
    pub elapsed_seconds: f64,
    pub status: BatchStatus,
}

/// A row of the `batches` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub batch_id: String,
    pub source_name: String,
    pub started_at_ms: i64,
    pub finished_at_ms: Option<i64>,
    pub total_domains: i64,
    pub completed_domains: i64,
    pub stored_records: i64,
    pub elapsed_seconds: Option<f64>,
    pub status: BatchStatus,
}
