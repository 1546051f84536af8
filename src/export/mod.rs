//! Export of search results.
//!
//! Search hits are written as headerless `(domain, batch_id)` CSV rows, either
//! to a timestamped file under the results directory or to any writer.

mod csv;

pub use csv::{results_file_name, write_records, write_search_results};
