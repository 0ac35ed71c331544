use crate::error::{EnrichError, Result};
use crate::row::LeadRow;
use rusqlite::{Connection, OptionalExtension, params};
use std::fs;
use std::path::Path;

/// SQLite-backed record of enrichment runs and the rows they produced.
pub struct LeadStore {
    conn: Connection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }

    fn from_db(value: &str) -> Self {
        match value {
            "completed" => RunStatus::Completed,
            "failed" => RunStatus::Failed,
            _ => RunStatus::Running,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub id: String,
    pub start_time: i64,
    pub end_time: Option<i64>,
    pub status: RunStatus,
    /// JSON array of the websites the run was started with.
    pub seeds: String,
    pub row_count: i64,
}

fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

fn decode_row(json: &str) -> Result<LeadRow> {
    serde_json::from_str(json).map_err(|e| EnrichError::Parse(format!("stored row: {}", e)))
}

impl LeadStore {
    pub fn drop(path: &Path) -> Result<()> {
        fs::remove_file(path)?;
        Ok(())
    }

    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            PRAGMA foreign_keys = ON;
            ",
        )?;

        let store = LeadStore { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
CREATE TABLE IF NOT EXISTS runs (
    id TEXT PRIMARY KEY,
    start_time INTEGER NOT NULL,
    end_time INTEGER,
    status TEXT NOT NULL CHECK(status IN ('running', 'completed', 'failed')),
    seeds TEXT NOT NULL       -- JSON array
);

CREATE TABLE IF NOT EXISTS lead_rows (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id TEXT NOT NULL,
    row_id TEXT NOT NULL,
    domain TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    data TEXT NOT NULL,       -- LeadRow as JSON
    FOREIGN KEY(run_id) REFERENCES runs(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_lead_rows_run ON lead_rows(run_id);
CREATE INDEX IF NOT EXISTS idx_lead_rows_domain ON lead_rows(domain);
            ",
        )?;
        Ok(())
    }

    // Run operations
    pub fn create_run(&self, seeds: &str) -> Result<String> {
        let run_id = uuid::Uuid::new_v4().to_string();

        self.conn.execute(
            "INSERT INTO runs (id, start_time, status, seeds) VALUES (?1, ?2, ?3, ?4)",
            params![&run_id, current_timestamp(), RunStatus::Running.as_str(), seeds],
        )?;

        Ok(run_id)
    }

    pub fn complete_run(&self, run_id: &str) -> Result<()> {
        self.finish_run(run_id, RunStatus::Completed)
    }

    pub fn fail_run(&self, run_id: &str) -> Result<()> {
        self.finish_run(run_id, RunStatus::Failed)
    }

    fn finish_run(&self, run_id: &str, status: RunStatus) -> Result<()> {
        self.conn.execute(
            "UPDATE runs SET status = ?1, end_time = ?2 WHERE id = ?3",
            params![status.as_str(), current_timestamp(), run_id],
        )?;
        Ok(())
    }

    pub fn get_run(&self, run_id: &str) -> Result<Option<RunSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT r.id, r.start_time, r.end_time, r.status, r.seeds, COUNT(l.id)
             FROM runs r LEFT JOIN lead_rows l ON l.run_id = r.id
             WHERE r.id = ?1
             GROUP BY r.id",
        )?;

        let run = stmt.query_row(params![run_id], map_run).optional()?;
        Ok(run)
    }

    pub fn list_runs(&self) -> Result<Vec<RunSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT r.id, r.start_time, r.end_time, r.status, r.seeds, COUNT(l.id)
             FROM runs r LEFT JOIN lead_rows l ON l.run_id = r.id
             GROUP BY r.id
             ORDER BY r.start_time DESC, r.rowid DESC",
        )?;

        let runs = stmt
            .query_map([], map_run)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(runs)
    }

    pub fn latest_run(&self) -> Result<Option<RunSummary>> {
        Ok(self.list_runs()?.into_iter().next())
    }

    // Row operations
    pub fn append_row(&self, run_id: &str, row: &LeadRow) -> Result<i64> {
        let data = serde_json::to_string(row).map_err(|e| EnrichError::Parse(e.to_string()))?;

        self.conn.execute(
            "INSERT INTO lead_rows (run_id, row_id, domain, created_at, data)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![run_id, &row.id, &row.domain, current_timestamp(), data],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    pub fn rows_for_run(&self, run_id: &str) -> Result<Vec<LeadRow>> {
        let mut stmt = self
            .conn
            .prepare("SELECT data FROM lead_rows WHERE run_id = ?1 ORDER BY id")?;

        let raw = stmt
            .query_map(params![run_id], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        raw.iter().map(|json| decode_row(json)).collect()
    }

    pub fn all_rows(&self) -> Result<Vec<LeadRow>> {
        let mut stmt = self.conn.prepare("SELECT data FROM lead_rows ORDER BY id")?;

        let raw = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        raw.iter().map(|json| decode_row(json)).collect()
    }

    pub fn get_connection(&self) -> &Connection {
        &self.conn
    }
}

fn map_run(row: &rusqlite::Row<'_>) -> rusqlite::Result<RunSummary> {
    let status: String = row.get(3)?;
    Ok(RunSummary {
        id: row.get(0)?,
        start_time: row.get(1)?,
        end_time: row.get(2)?,
        status: RunStatus::from_db(&status),
        seeds: row.get(4)?,
        row_count: row.get(5)?,
    })
}
