//! SQLite backend for the infohash archive
//!
//! Each sub-batch becomes one multi-row `INSERT OR REPLACE` inside a
//! transaction, keyed on `infohash`.

use super::record::{InfohashRow, ROW_COLUMNS};
use super::writer_backend::{InfohashSink, SinkError};
use crate::sqlite_pragma::apply_optimized_pragmas;
use async_trait::async_trait;
use rusqlite::{params_from_iter, Connection, ToSql};
use std::path::Path;

pub const TABLE_NAME: &str = "infohashes";

pub struct SqliteInfohashWriter {
    conn: Connection,
    rows_written: u64,
}

impl SqliteInfohashWriter {
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, SinkError> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path.as_ref())?;
        apply_optimized_pragmas(&conn)?;

        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    infohash TEXT PRIMARY KEY NOT NULL,
                    name TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    total_length INTEGER NOT NULL,
                    source TEXT NOT NULL,
                    occurrences INTEGER NOT NULL,
                    files_count INTEGER NOT NULL
                )",
                TABLE_NAME
            ),
            [],
        )?;

        log::info!(
            "✅ SQLite infohash archive initialized: {}",
            db_path.as_ref().display()
        );

        Ok(Self {
            conn,
            rows_written: 0,
        })
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    fn insert_sql(row_count: usize) -> String {
        let placeholders = format!("({})", vec!["?"; ROW_COLUMNS.len()].join(", "));
        format!(
            "INSERT OR REPLACE INTO {} ({}) VALUES {}",
            TABLE_NAME,
            ROW_COLUMNS.join(", "),
            vec![placeholders.as_str(); row_count].join(", ")
        )
    }

    fn write_rows(&mut self, rows: &[InfohashRow]) -> Result<(), SinkError> {
        if rows.is_empty() {
            return Ok(());
        }

        let sql = Self::insert_sql(rows.len());
        let values = rows.iter().flat_map(|row| {
            let columns: [&dyn ToSql; 7] = [
                &row.infohash,
                &row.name,
                &row.updated_at,
                &row.total_length,
                &row.source,
                &row.occurrences,
                &row.files_count,
            ];
            columns
        });

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(&sql)?;
            stmt.execute(params_from_iter(values))?;
        }
        tx.commit()?;

        self.rows_written += rows.len() as u64;
        log::debug!("✅ Upserted {} rows into {}", rows.len(), TABLE_NAME);

        Ok(())
    }
}

#[async_trait]
impl InfohashSink for SqliteInfohashWriter {
    async fn upsert_batch(&mut self, rows: &[InfohashRow]) -> Result<(), SinkError> {
        self.write_rows(rows)
    }

    fn backend_type(&self) -> &'static str {
        "SQLite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::params;
    use tempfile::tempdir;

    fn create_test_row(infohash: &str, name: &str, occurrences: u64) -> InfohashRow {
        InfohashRow {
            infohash: infohash.to_string(),
            name: name.to_string(),
            updated_at: "2024-01-01T00:00:00+00:00".to_string(),
            total_length: 1024,
            source: "dht_crawler".to_string(),
            occurrences,
            files_count: 1,
        }
    }

    #[test]
    fn test_insert_sql_shape() {
        let sql = SqliteInfohashWriter::insert_sql(2);
        assert!(sql.starts_with("INSERT OR REPLACE INTO infohashes (infohash, name,"));
        assert_eq!(sql.matches('?').count(), 14);
    }

    #[tokio::test]
    async fn test_sqlite_basic_write() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let mut writer = SqliteInfohashWriter::new(&db_path).unwrap();

        writer
            .upsert_batch(&[create_test_row("aaaa", "first", 2), create_test_row("bbbb", "second", 1)])
            .await
            .unwrap();

        let conn = Connection::open(&db_path).unwrap();
        let (name, occurrences, total_length): (String, i64, i64) = conn
            .query_row(
                "SELECT name, occurrences, total_length FROM infohashes WHERE infohash = ?1",
                params!["aaaa"],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();

        assert_eq!(name, "first");
        assert_eq!(occurrences, 2);
        assert_eq!(total_length, 1024);
        assert_eq!(writer.rows_written(), 2);
    }

    #[tokio::test]
    async fn test_replace_on_conflict() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let mut writer = SqliteInfohashWriter::new(&db_path).unwrap();

        writer.upsert_batch(&[create_test_row("dup", "old", 7)]).await.unwrap();
        writer.upsert_batch(&[create_test_row("dup", "new", 1)]).await.unwrap();

        let conn = Connection::open(&db_path).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM infohashes", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);

        // no merge of counts: the second write wins outright
        let (name, occurrences): (String, i64) = conn
            .query_row(
                "SELECT name, occurrences FROM infohashes WHERE infohash = 'dup'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(name, "new");
        assert_eq!(occurrences, 1);
    }

    #[tokio::test]
    async fn test_full_sub_batch_within_variable_limit() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let mut writer = SqliteInfohashWriter::new(&db_path).unwrap();

        // 142 rows * 7 columns = 994 bound values
        let rows: Vec<InfohashRow> = (0..142)
            .map(|i| create_test_row(&format!("hash_{}", i), "n", 1))
            .collect();
        writer.upsert_batch(&rows).await.unwrap();

        let conn = Connection::open(&db_path).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM infohashes", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 142);
    }

    #[tokio::test]
    async fn test_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("data").join("db").join("Infohashes.sqlite");
        let _writer = SqliteInfohashWriter::new(&db_path).unwrap();
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        let dir = tempdir().unwrap();
        let mut writer = SqliteInfohashWriter::new(dir.path().join("test.db")).unwrap();
        writer.upsert_batch(&[]).await.unwrap();
        assert_eq!(writer.rows_written(), 0);
    }
}
