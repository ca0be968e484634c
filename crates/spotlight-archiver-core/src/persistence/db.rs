use chrono::Local;
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};

use super::error::{PersistenceError, PersistenceResult};
use super::models::ImageRecord;
use crate::config::DB_FILENAME;

/// Durable url -> (fingerprint, filename, timestamp) mapping backed by SQLite
pub struct RecordStore {
    conn: Connection,
    db_path: PathBuf,
}

impl RecordStore {
    /// Create (if needed) and open the store under `<save_dir>/.cache`
    ///
    /// Idempotent: the directory, file and table are only created when missing.
    pub fn initialize(save_dir: &Path) -> PersistenceResult<Self> {
        let cache_dir = save_dir.join(".cache");
        std::fs::create_dir_all(&cache_dir)
            .map_err(|e| PersistenceError::Path(cache_dir.clone(), e))?;

        Self::open(cache_dir.join(DB_FILENAME))
    }

    /// Open the store at an explicit database file
    pub fn open(db_path: impl Into<PathBuf>) -> PersistenceResult<Self> {
        let db_path = db_path.into();
        let conn = Connection::open(&db_path)?;

        conn.execute_batch(
            "PRAGMA busy_timeout = 10000;

            CREATE TABLE IF NOT EXISTS downloaded_images (
                url TEXT PRIMARY KEY,
                phash TEXT,
                filename TEXT,
                downloaded_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_downloaded_images_filename
                ON downloaded_images(filename);",
        )?;

        info!("Record store initialized at {}", db_path.display());

        Ok(Self { conn, db_path })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Retrieve the record for `url`
    pub fn lookup_by_url(&self, url: &str) -> PersistenceResult<Option<ImageRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT url, phash, filename, downloaded_at
                 FROM downloaded_images
                 WHERE url = ?1",
                params![url],
                row_to_record,
            )
            .optional()?;

        Ok(record)
    }

    /// Insert or replace the record for `url`, stamped with the current time
    pub fn upsert(
        &self,
        url: &str,
        fingerprint: Option<&str>,
        filename: &str,
    ) -> PersistenceResult<()> {
        let now = Local::now().naive_local();
        self.conn.execute(
            "INSERT OR REPLACE INTO downloaded_images (url, phash, filename, downloaded_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![url, fingerprint, filename, now],
        )?;

        debug!("Recorded {} as {}", url, filename);
        Ok(())
    }

    /// True iff a record references `filename` and `image_dir/filename` exists
    pub fn is_filename_valid(&self, filename: &str, image_dir: &Path) -> PersistenceResult<bool> {
        let record = self
            .conn
            .query_row(
                "SELECT url, phash, filename, downloaded_at
                 FROM downloaded_images
                 WHERE filename = ?1
                 LIMIT 1",
                params![filename],
                row_to_record,
            )
            .optional()?;

        Ok(record.map_or(false, |r| r.file_exists(image_dir)))
    }

    /// Every record, in insertion order
    pub fn all_records(&self) -> PersistenceResult<Vec<ImageRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT url, phash, filename, downloaded_at
             FROM downloaded_images
             ORDER BY rowid",
        )?;

        let records = stmt
            .query_map([], row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Number of stored records
    pub fn count(&self) -> PersistenceResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM downloaded_images", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<ImageRecord> {
    Ok(ImageRecord {
        url: row.get(0)?,
        fingerprint: row.get(1)?,
        filename: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        downloaded_at: row.get(3)?,
    })
}
