//! Batch input parsing.
//!
//! Turns a newline-delimited domain list into the ordered domains of one batch,
//! and domains into [`DomainTask`]s. Lines are trimmed; blank lines and `#`
//! comments produce no task. For CSV uploads only the first column is used.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::error_handling::InputError;

/// One domain to harvest, tagged with the batch it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainTask {
    /// Domain name as it appeared in the input (trimmed)
    pub domain: String,
    /// Identifier of the owning batch
    pub batch_id: String,
}

/// Extracts the domain from one input line, or `None` if the line yields no task.
pub fn parse_domain_line(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let domain = trimmed.split(',').next().unwrap_or(trimmed).trim();
    if domain.is_empty() {
        None
    } else {
        Some(domain)
    }
}

/// Parses an in-memory domain list.
///
/// # Errors
///
/// Returns `InputError::Empty` if no line yields a domain.
pub fn parse_domains(input: &str) -> Result<Vec<String>, InputError> {
    let domains: Vec<String> = input
        .lines()
        .filter_map(parse_domain_line)
        .map(str::to_string)
        .collect();

    if domains.is_empty() {
        return Err(InputError::Empty);
    }
    Ok(domains)
}

/// Reads a domain list from an async reader (file, stdin, upload body).
///
/// The whole input is enumerated before returning, so the batch total is known
/// before any lookup starts.
///
/// # Errors
///
/// Returns `InputError::Read` if the reader fails and `InputError::Empty` if no
/// line yields a domain.
pub async fn read_domains<R>(reader: R) -> Result<Vec<String>, InputError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut domains = Vec::new();
    while let Some(line) = lines.next_line().await? {
        if let Some(domain) = parse_domain_line(&line) {
            domains.push(domain.to_string());
        }
    }

    if domains.is_empty() {
        return Err(InputError::Empty);
    }
    log::info!("Total domains in input: {}", domains.len());
    Ok(domains)
}

/// Tags each domain with `batch_id`, trimming and dropping blank entries.
///
/// # Errors
///
/// Returns `InputError::Empty` if nothing is left.
pub fn into_tasks<I, S>(batch_id: &str, domains: I) -> Result<Vec<DomainTask>, InputError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let tasks: Vec<DomainTask> = domains
        .into_iter()
        .filter_map(|domain| {
            let domain = domain.as_ref().trim();
            (!domain.is_empty()).then(|| DomainTask {
                domain: domain.to_string(),
                batch_id: batch_id.to_string(),
            })
        })
        .collect();

    if tasks.is_empty() {
        return Err(InputError::Empty);
    }
    Ok(tasks)
}
