//! End-of-batch statistics.

use log::info;
use strum::IntoEnumIterator;

use crate::error_handling::{ErrorType, InfoType, ProcessingStats};
use crate::harvest::BatchReport;

/// Prints failure and info counters to the log.
pub fn print_error_statistics(error_stats: &ProcessingStats) {
    let total_errors = error_stats.total_errors();
    let total_info = error_stats.total_info();

    if total_errors > 0 {
        info!("Failure Counts ({} total):", total_errors);
        for error_type in ErrorType::iter() {
            let count = error_stats.get_error_count(error_type);
            if count > 0 {
                info!("   {}: {}", error_type.as_str(), count);
            }
        }
    }

    if total_info > 0 {
        info!("Info Counts ({} total):", total_info);
        for info_type in InfoType::iter() {
            let count = error_stats.get_info_count(info_type);
            if count > 0 {
                info!("   {}: {}", info_type.as_str(), count);
            }
        }
    }
}

/// Logs a one-line summary of a finished batch.
pub fn print_batch_summary(report: &BatchReport) {
    info!("{}", summary_line(report));
}

/// One-line summary of a finished batch, as printed by the CLI.
pub fn summary_line(report: &BatchReport) -> String {
    let failed = report.permanent_failures
        + report.transient_failures
        + report.storage_failures
        + report.panicked;
    let verb = if report.cancelled {
        "Cancelled after"
    } else {
        "✅ Processed"
    };
    format!(
        "{} {} domain{} of {} ({} stored, {} empty, {} failed) in {:.1}s",
        verb,
        report.completed,
        if report.completed == 1 { "" } else { "s" },
        report.total,
        report.stored,
        report.empty_results,
        failed,
        report.elapsed().as_secs_f64()
    )
}
