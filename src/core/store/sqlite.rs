//! SQLite entry store for persistent libraries.

use super::{EntryIter, EntryStore};
use crate::core::model::{normalize_title, titles_resemble, Entry};
use crate::error::StoreError;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// SQLite-backed entry store.
///
/// Lookup columns (hash, identifiers, normalized title, year) are indexed;
/// the full entry is kept as a JSON payload. WAL mode lets staging readers
/// proceed while the committer writes.
pub struct SqliteEntryStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteEntryStore {
    /// Open or create a library database at the given path
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::OpenFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        }

        let conn = Connection::open(path).map_err(|e| StoreError::OpenFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::init(conn, path.to_path_buf())
    }

    /// Private in-memory database, mostly for tests
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::OpenFailed {
            path: PathBuf::from(":memory:"),
            reason: e.to_string(),
        })?;
        Self::init(conn, PathBuf::from(":memory:"))
    }

    fn init(conn: Connection, db_path: PathBuf) -> Result<Self, StoreError> {
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             CREATE TABLE IF NOT EXISTS entries (
                id TEXT PRIMARY KEY,
                main_file_hash TEXT NOT NULL,
                doi TEXT,
                pmid TEXT,
                title_norm TEXT NOT NULL,
                year INTEGER,
                data TEXT NOT NULL
             );
             CREATE INDEX IF NOT EXISTS idx_entries_hash ON entries(main_file_hash);
             CREATE INDEX IF NOT EXISTS idx_entries_doi ON entries(doi);
             CREATE INDEX IF NOT EXISTS idx_entries_pmid ON entries(pmid);
             CREATE INDEX IF NOT EXISTS idx_entries_title ON entries(title_norm);
             CREATE INDEX IF NOT EXISTS idx_entries_year ON entries(year);",
        )
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Corrupted {
            path: self.db_path.clone(),
        })
    }

    fn decode(data: &str) -> Result<Entry, StoreError> {
        serde_json::from_str(data).map_err(|e| StoreError::SerializationFailed(e.to_string()))
    }

    fn query_one(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Option<Entry>, StoreError> {
        let conn = self.lock()?;
        let data: Option<String> = conn
            .query_row(sql, params, |row| row.get(0))
            .optional()
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
        data.as_deref().map(Self::decode).transpose()
    }

    fn query_many(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<Entry>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        let rows: Vec<String> = stmt
            .query_map(params, |row| row.get(0))
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?
            .collect::<Result<_, _>>()
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        rows.iter().map(|data| Self::decode(data)).collect()
    }
}

impl EntryStore for SqliteEntryStore {
    fn find_by_id(&self, id: &str) -> Result<Option<Entry>, StoreError> {
        self.query_one("SELECT data FROM entries WHERE id = ?", [id])
    }

    fn find_by_hash(&self, hash: &str) -> Result<Option<Entry>, StoreError> {
        self.query_one(
            "SELECT data FROM entries WHERE main_file_hash = ? ORDER BY rowid LIMIT 1",
            [hash],
        )
    }

    fn find_by_identifiers(
        &self,
        doi: Option<&str>,
        pmid: Option<&str>,
    ) -> Result<Option<Entry>, StoreError> {
        if doi.is_none() && pmid.is_none() {
            return Ok(None);
        }
        self.query_one(
            "SELECT data FROM entries
             WHERE (?1 IS NOT NULL AND doi = ?1) OR (?2 IS NOT NULL AND pmid = ?2)
             ORDER BY rowid LIMIT 1",
            params![doi, pmid],
        )
    }

    fn find_similar_by_name_year(
        &self,
        title: &str,
        year: Option<i32>,
    ) -> Result<Vec<Entry>, StoreError> {
        let needle = normalize_title(title);
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        // Equality or containment either way; byte lengths match the Rust check
        let candidates = self.query_many(
            "SELECT data FROM entries
             WHERE (?1 IS NULL OR year IS NULL OR year = ?1)
               AND title_norm != ''
               AND (title_norm = ?2
                    OR (length(CAST(?2 AS BLOB)) >= 8 AND instr(title_norm, ?2) > 0)
                    OR (length(CAST(title_norm AS BLOB)) >= 8 AND instr(?2, title_norm) > 0))
             ORDER BY rowid",
            params![year, needle],
        )?;
        Ok(candidates
            .into_iter()
            .filter(|e| titles_resemble(title, year, &e.title, e.year))
            .collect())
    }

    fn enumerate_all(&self) -> Result<EntryIter<'_>, StoreError> {
        let entries = self.query_many("SELECT data FROM entries ORDER BY rowid", [])?;
        Ok(Box::new(entries.into_iter()))
    }

    fn save(&self, entry: &mut Entry) -> Result<String, StoreError> {
        let id = entry
            .id
            .get_or_insert_with(|| Uuid::new_v4().to_string())
            .clone();
        let data = serde_json::to_string(&*entry)
            .map_err(|e| StoreError::SerializationFailed(e.to_string()))?;

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO entries (id, main_file_hash, doi, pmid, title_norm, year, data)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
                main_file_hash = excluded.main_file_hash,
                doi = excluded.doi,
                pmid = excluded.pmid,
                title_norm = excluded.title_norm,
                year = excluded.year,
                data = excluded.data",
            params![
                id,
                entry.main_file_hash_sha256,
                entry.doi,
                entry.pmid,
                normalize_title(&entry.title),
                entry.year,
                data,
            ],
        )
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        Ok(id)
    }

    fn count(&self) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        conn.query_row("SELECT COUNT(*) FROM entries", [], |row| {
            row.get::<_, i64>(0).map(|v| v as usize)
        })
        .map_err(|e| StoreError::QueryFailed(e.to_string()))
    }
}
