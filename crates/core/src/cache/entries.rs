//! Cache entry operations.
//!
//! Entries are keyed by `(generation, key_hash)`. Writes recreate the
//! generation row when it is missing so a purged store comes back on the next
//! write, the same way opening a named cache does.

use super::connection::CacheDb;
use super::hash::RequestKey;
use crate::response::{ResponseSnapshot, ResponseSource};
use crate::Error;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

impl CacheDb {
    /// Insert or overwrite the entry for `key` in `generation`.
    pub async fn put_entry(&self, generation: &str, key: &RequestKey, response: &ResponseSnapshot) -> Result<(), Error> {
        let generation = generation.to_string();
        let key = key.clone();
        let status = response.status;
        let body = response.body.clone();
        let headers_json =
            serde_json::to_string(&response.headers).map_err(|e| Error::CorruptEntry(e.to_string()))?;
        let now = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO generations (name, created_at) VALUES (?1, ?2)",
                    params![&generation, &now],
                )?;
                conn.execute(
                    "INSERT INTO entries (generation, key_hash, method, url, status, headers_json, body, stored_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    ON CONFLICT(generation, key_hash) DO UPDATE SET
                        method = excluded.method,
                        url = excluded.url,
                        status = excluded.status,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![&generation, &key.hash, &key.method, &key.url, status, &headers_json, &body, &now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get the entry for `key` in `generation`.
    ///
    /// Returns None if the generation or the entry doesn't exist.
    pub async fn get_entry(&self, generation: &str, key: &RequestKey) -> Result<Option<ResponseSnapshot>, Error> {
        let generation = generation.to_string();
        let key_hash = key.hash.clone();
        self.conn
            .call(move |conn| -> Result<Option<ResponseSnapshot>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT url, status, headers_json, body FROM entries
                     WHERE generation = ?1 AND key_hash = ?2",
                )?;

                let result = stmt.query_row(params![generation, key_hash], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, u16>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Vec<u8>>(3)?,
                    ))
                });

                match result {
                    Ok((url, status, headers_json, body)) => {
                        let headers: Vec<(String, String)> =
                            serde_json::from_str(&headers_json).map_err(|e| Error::CorruptEntry(e.to_string()))?;
                        Ok(Some(
                            ResponseSnapshot::new(url, status, headers, body).with_source(ResponseSource::Cache),
                        ))
                    }
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries stored in `generation`.
    pub async fn entry_count(&self, generation: &str) -> Result<u64, Error> {
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE generation = ?1", params![generation], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
