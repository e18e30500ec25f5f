//! SQLite change log of committed items.

use super::{ChangeLogAction, ChangeLogEvent, CommitHook, HookContext};
use crate::error::HookError;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Persists one [`ChangeLogEvent`] per committed item
pub struct ChangeLogRepository {
    conn: Mutex<Connection>,
}

impl ChangeLogRepository {
    /// Open or create the change log database
    pub fn open(path: &Path) -> Result<Self, HookError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| HookError::Failed(e.to_string()))?;
        }
        let conn = Connection::open(path).map_err(Self::failed)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;").map_err(Self::failed)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, HookError> {
        Self::init(Connection::open_in_memory().map_err(Self::failed)?)
    }

    fn init(conn: Connection) -> Result<Self, HookError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS change_log (
                id TEXT PRIMARY KEY,
                entry_id TEXT NOT NULL,
                action TEXT NOT NULL,
                path TEXT NOT NULL,
                content_hash TEXT NOT NULL,
                recorded_at TEXT NOT NULL
            )",
            [],
        )
        .map_err(Self::failed)?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_change_log_time ON change_log(recorded_at DESC)",
            [],
        )
        .map_err(Self::failed)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn failed(e: rusqlite::Error) -> HookError {
        HookError::Failed(e.to_string())
    }

    /// Record one event
    pub fn record(&self, event: &ChangeLogEvent) -> Result<(), HookError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| HookError::Failed(e.to_string()))?;

        conn.execute(
            "INSERT OR REPLACE INTO change_log
             (id, entry_id, action, path, content_hash, recorded_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                event.id,
                event.entry_id,
                event.action.as_str(),
                event.path.to_string_lossy(),
                event.content_hash,
                event.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
            ],
        )
        .map_err(Self::failed)?;

        Ok(())
    }

    /// Most recent events first
    pub fn recent(&self, limit: usize) -> Result<Vec<ChangeLogEvent>, HookError> {
        self.query(
            "SELECT id, entry_id, action, path, content_hash, recorded_at
             FROM change_log
             ORDER BY recorded_at DESC, rowid DESC
             LIMIT ?",
            params![limit.min(i64::MAX as usize) as i64],
        )
    }

    /// Every event recorded for one entry, oldest first
    pub fn for_entry(&self, entry_id: &str) -> Result<Vec<ChangeLogEvent>, HookError> {
        self.query(
            "SELECT id, entry_id, action, path, content_hash, recorded_at
             FROM change_log
             WHERE entry_id = ?
             ORDER BY recorded_at ASC, rowid ASC",
            params![entry_id],
        )
    }

    fn query(
        &self,
        sql: &str,
        args: impl rusqlite::Params,
    ) -> Result<Vec<ChangeLogEvent>, HookError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| HookError::Failed(e.to_string()))?;
        let mut stmt = conn.prepare(sql).map_err(Self::failed)?;

        let events = stmt
            .query_map(args, |row| {
                let id: String = row.get(0)?;
                let entry_id: String = row.get(1)?;
                let action: String = row.get(2)?;
                let path: String = row.get(3)?;
                let content_hash: String = row.get(4)?;
                let recorded_at: String = row.get(5)?;
                Ok((id, entry_id, action, path, content_hash, recorded_at))
            })
            .map_err(Self::failed)?
            .filter_map(|r| r.ok())
            .filter_map(|(id, entry_id, action, path, content_hash, recorded_at)| {
                Some(ChangeLogEvent {
                    id,
                    entry_id,
                    action: ChangeLogAction::parse(&action)?,
                    path: PathBuf::from(path),
                    content_hash,
                    timestamp: DateTime::parse_from_rfc3339(&recorded_at)
                        .ok()?
                        .with_timezone(&Utc),
                })
            })
            .collect();

        Ok(events)
    }
}

impl CommitHook for ChangeLogRepository {
    fn on_commit(&self, context: &HookContext) -> Result<(), HookError> {
        self.record(&context.changelog)
    }
}
