//! CSV export functionality.

use anyhow::{Context, Result};
use csv::Writer;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::storage::ResolvedRecord;

/// File name used for a results file created at `unix_secs`.
pub fn results_file_name(unix_secs: i64) -> String {
    format!("results_{unix_secs}.csv")
}

/// Writes one `(domain, batch_id)` row per record to `output`.
///
/// Returns the number of rows written.
pub fn write_records<W: Write>(output: W, records: &[ResolvedRecord]) -> Result<usize> {
    let mut writer = Writer::from_writer(output);
    for record in records {
        writer
            .write_record([record.domain.as_str(), record.batch_id.as_str()])
            .with_context(|| format!("Failed to write CSV row for {}", record.domain))?;
    }
    writer.flush().context("Failed to flush CSV output")?;
    Ok(records.len())
}

/// Writes `records` to `<dir>/results_<unix seconds>.csv`, creating `dir` if
/// needed, and returns the file's path.
pub fn write_search_results(dir: &Path, records: &[ResolvedRecord]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create results directory {}", dir.display()))?;

    let path = dir.join(results_file_name(chrono::Utc::now().timestamp()));
    let file = std::fs::File::create(&path)
        .with_context(|| format!("Failed to create results file {}", path.display()))?;
    let rows = write_records(file, records)?;

    log::info!("Wrote {} search results to {}", rows, path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(domain: &str, batch: &str) -> ResolvedRecord {
        ResolvedRecord {
            domain: domain.to_string(),
            txt_records: vec!["v=spf1 -all".to_string()],
            batch_id: batch.to_string(),
        }
    }

    #[test]
    fn test_rows_have_no_header() {
        let mut out = Vec::new();
        let rows = write_records(
            &mut out,
            &[record("a.example", "list.txt_1"), record("b.example", "list.txt_2")],
        )
        .expect("write");
        assert_eq!(rows, 2);
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "a.example,list.txt_1\nb.example,list.txt_2\n"
        );
    }

    #[test]
    fn test_fields_are_quoted_when_needed() {
        let mut out = Vec::new();
        write_records(&mut out, &[record("a.example", "my,list.csv_1")]).expect("write");
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "a.example,\"my,list.csv_1\"\n"
        );
    }

    #[test]
    fn test_write_search_results_creates_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let results_dir = dir.path().join("results");

        let path = write_search_results(&results_dir, &[record("a.example", "b")])
            .expect("export");

        assert!(path.starts_with(&results_dir));
        let name = path.file_name().and_then(|n| n.to_str()).expect("file name");
        assert!(name.starts_with("results_") && name.ends_with(".csv"));
        let content = std::fs::read_to_string(&path).expect("read back");
        assert_eq!(content, "a.example,b\n");
    }

    #[test]
    fn test_results_file_name() {
        assert_eq!(results_file_name(1_700_000_000), "results_1700000000.csv");
    }
}
