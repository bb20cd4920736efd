//! Schema migrations.
//!
//! The schema version lives in SQLite's `user_version` pragma. Each pending
//! migration runs in its own transaction together with the version bump, so a
//! failed batch leaves the store at the previous version.

use tokio_rusqlite::Connection;

use super::Error;

/// Ordered SQL batches; migration `n` (1-based) brings the store to version `n`.
const MIGRATIONS: &[&str] = &[
    include_str!("../../migrations/001_generations.sql"),
    include_str!("../../migrations/002_entries.sql"),
];

/// Version this build writes.
pub const SCHEMA_VERSION: i64 = MIGRATIONS.len() as i64;

/// Bring the store up to [`SCHEMA_VERSION`]. Returns the resulting version.
///
/// # Errors
///
/// Fails if a batch does not apply, or if the store was written by a newer
/// build.
pub async fn run(conn: &Connection) -> Result<i64, Error> {
    conn.call(|conn| -> Result<i64, Error> {
        let current: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
        if current > SCHEMA_VERSION {
            return Err(Error::MigrationFailed(format!(
                "store is at schema v{current}, this build supports up to v{SCHEMA_VERSION}"
            )));
        }

        for (idx, sql) in MIGRATIONS.iter().enumerate().skip(current as usize) {
            let version = idx as i64 + 1;
            let tx = conn.transaction()?;
            tx.execute_batch(sql)
                .map_err(|e| Error::MigrationFailed(format!("v{version}: {e}")))?;
            tx.pragma_update(None, "user_version", version)?;
            tx.commit()?;
            tracing::debug!(version, "applied schema migration");
        }

        Ok(SCHEMA_VERSION)
    })
    .await
    .map_err(Error::from)
}
