//! SQLite-backed [`StorageSink`] and batch bookkeeping.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::error_handling::{DatabaseError, StorageError};

use super::models::{BatchFinish, BatchStart, BatchStatus, BatchSummary, ResolvedRecord};
use super::sink::StorageSink;

const RECORDS_WITH_VALUES: &str = "SELECT r.id, r.domain, r.batch_id, t.value
     FROM domain_records r
     JOIN domain_txt_records t ON t.record_id = r.id";

/// Stores resolved records in the `domain_records` / `domain_txt_records` tables.
#[derive(Clone)]
pub struct SqliteSink {
    pool: Arc<SqlitePool>,
}

impl SqliteSink {
    /// Wraps a pool whose migrations have already run.
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Inserts or replaces the `batches` row for a starting batch.
    pub async fn record_batch_start(&self, start: &BatchStart<'_>) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO batches (batch_id, source_name, started_at_ms, total_domains, status)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(batch_id) DO UPDATE SET
                 source_name=excluded.source_name,
                 started_at_ms=excluded.started_at_ms,
                 total_domains=excluded.total_domains,
                 completed_domains=0,
                 stored_records=0,
                 finished_at_ms=NULL,
                 elapsed_seconds=NULL,
                 status=excluded.status",
        )
        .bind(start.batch_id)
        .bind(start.source_name)
        .bind(start.started_at_ms)
        .bind(start.total_domains as i64)
        .bind(BatchStatus::Running.as_str())
        .execute(self.pool.as_ref())
        .await
        .map_err(DatabaseError::SqlError)?;

        Ok(())
    }

    /// Stores the final counters and status of a batch.
    pub async fn record_batch_finish(&self, finish: &BatchFinish<'_>) -> Result<(), DatabaseError> {
        let finished_at_ms = chrono::Utc::now().timestamp_millis();

        sqlx::query(
            "UPDATE batches
             SET finished_at_ms = ?, completed_domains = ?, stored_records = ?,
                 elapsed_seconds = ?, status = ?
             WHERE batch_id = ?",
        )
        .bind(finished_at_ms)
        .bind(finish.completed_domains as i64)
        .bind(finish.stored_records as i64)
        .bind(finish.elapsed_seconds)
        .bind(finish.status.as_str())
        .bind(finish.batch_id)
        .execute(self.pool.as_ref())
        .await
        .map_err(DatabaseError::SqlError)?;

        Ok(())
    }

    /// Most recent batches first.
    pub async fn recent_batches(&self, limit: u32) -> Result<Vec<BatchSummary>, DatabaseError> {
        let rows = sqlx::query(
            "SELECT batch_id, source_name, started_at_ms, finished_at_ms, total_domains,
                    completed_domains, stored_records, elapsed_seconds, status
             FROM batches
             ORDER BY started_at_ms DESC, batch_id
             LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(self.pool.as_ref())
        .await
        .map_err(DatabaseError::SqlError)?;

        rows.iter()
            .map(batch_from_row)
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(DatabaseError::SqlError)
    }
}

#[async_trait]
impl StorageSink for SqliteSink {
    async fn insert(&self, record: &ResolvedRecord) -> Result<(), StorageError> {
        let observed_at_ms = chrono::Utc::now().timestamp_millis();
        let mut tx = self.pool.begin().await?;

        let record_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO domain_records (domain, batch_id, observed_at_ms)
             VALUES (?, ?, ?)
             RETURNING id",
        )
        .bind(&record.domain)
        .bind(&record.batch_id)
        .bind(observed_at_ms)
        .fetch_one(&mut *tx)
        .await?;

        for (position, value) in record.txt_records.iter().enumerate() {
            sqlx::query(
                "INSERT INTO domain_txt_records (record_id, position, value) VALUES (?, ?, ?)",
            )
            .bind(record_id)
            .bind(position as i64)
            .bind(value)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        log::debug!(
            "Stored {} TXT values for {} (record {record_id})",
            record.txt_records.len(),
            record.domain
        );
        Ok(())
    }

    async fn find_by_keyword(&self, keyword: &str) -> Result<Vec<ResolvedRecord>, StorageError> {
        let pattern = format!("%{}%", escape_like(keyword));
        let rows = sqlx::query(&format!(
            "{RECORDS_WITH_VALUES}
             WHERE r.id IN (
                 SELECT record_id FROM domain_txt_records WHERE value LIKE ? ESCAPE '\\'
             )
             ORDER BY r.id, t.position"
        ))
        .bind(pattern)
        .fetch_all(self.pool.as_ref())
        .await?;

        group_rows(rows)
    }

    async fn list_all(&self) -> Result<Vec<ResolvedRecord>, StorageError> {
        let rows = sqlx::query(&format!("{RECORDS_WITH_VALUES} ORDER BY r.id, t.position"))
            .fetch_all(self.pool.as_ref())
            .await?;

        group_rows(rows)
    }
}

fn batch_from_row(row: &SqliteRow) -> Result<BatchSummary, sqlx::Error> {
    let status: String = row.try_get("status")?;
    Ok(BatchSummary {
        batch_id: row.try_get("batch_id")?,
        source_name: row.try_get("source_name")?,
        started_at_ms: row.try_get("started_at_ms")?,
        finished_at_ms: row.try_get("finished_at_ms")?,
        total_domains: row.try_get("total_domains")?,
        completed_domains: row.try_get("completed_domains")?,
        stored_records: row.try_get("stored_records")?,
        elapsed_seconds: row.try_get("elapsed_seconds")?,
        // The CHECK constraint keeps unknown values out
        status: BatchStatus::parse(&status).unwrap_or(BatchStatus::Failed),
    })
}

/// Escapes `LIKE` wildcards so the keyword matches literally.
fn escape_like(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len());
    for c in keyword.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Folds `(id, domain, batch_id, value)` rows, ordered by id then position,
/// into one record per id.
fn group_rows(rows: Vec<SqliteRow>) -> Result<Vec<ResolvedRecord>, StorageError> {
    let mut records: Vec<ResolvedRecord> = Vec::new();
    let mut current_id: Option<i64> = None;

    for row in rows {
        let id: i64 = row.try_get("id")?;
        let value: String = row.try_get("value")?;
        if current_id == Some(id) {
            if let Some(record) = records.last_mut() {
                record.txt_records.push(value);
                continue;
            }
        }

        let domain: String = row.try_get("domain")?;
        if domain.is_empty() {
            return Err(StorageError::Corrupt {
                id,
                reason: "empty domain".to_string(),
            });
        }
        records.push(ResolvedRecord {
            domain,
            txt_records: vec![value],
            batch_id: row.try_get("batch_id")?,
        });
        current_id = Some(id);
    }

    Ok(records)
}
