//! Schema migrations.

use sqlx::SqlitePool;

use crate::error_handling::DatabaseError;

/// Runs the SQL migrations in the crate's `migrations/` directory.
///
/// Safe to call on every startup; applied migrations are skipped.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DatabaseError> {
    let migrations_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations");
    let migrator = sqlx::migrate::Migrator::new(migrations_dir.as_path()).await?;
    migrator.run(pool).await?;
    Ok(())
}
