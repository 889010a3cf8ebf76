//! SQLite backend.
//!
//! One database file with a `students` table and a `recitation_log` table.
//! `save` replaces the contents of both inside a single transaction, so a
//! failed save leaves the previous contents intact.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::{LogRow, StoreSnapshot, StudentRow, StudentStore};
use crate::error::{HafalanError, Result};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS students (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    external_id TEXT,
    class TEXT NOT NULL,
    ledger_json TEXT NOT NULL,
    total_passed INTEGER NOT NULL DEFAULT 0,
    last_modified TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS recitation_log (
    id TEXT PRIMARY KEY,
    student_id TEXT NOT NULL,
    recorded_at TEXT NOT NULL,
    chapter TEXT NOT NULL,
    verse_from INTEGER NOT NULL,
    verse_to INTEGER NOT NULL,
    status TEXT NOT NULL,
    recorder TEXT,
    note TEXT
);
CREATE INDEX IF NOT EXISTS idx_recitation_log_student ON recitation_log(student_id);
"#;

/// Student and log tables in one SQLite file.
#[derive(Debug)]
pub struct SqliteStore {
    path: PathBuf,
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns `HafalanError::Storage` if the file cannot be opened or the
    /// schema cannot be created.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                HafalanError::Storage(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
        let conn = Connection::open(path)?;
        Self::with_connection(path.to_path_buf(), conn)
    }

    /// A private in-memory database, for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(PathBuf::from(":memory:"), conn)
    }

    fn with_connection(path: PathBuf, conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| HafalanError::Storage("SQLite connection poisoned".to_string()))
    }
}

fn to_count(value: i64, what: &str) -> Result<usize> {
    usize::try_from(value)
        .map_err(|_| HafalanError::Storage(format!("Invalid {} value: {}", what, value)))
}

fn read_students(conn: &Connection) -> Result<Vec<StudentRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, external_id, class, ledger_json, total_passed, last_modified
         FROM students ORDER BY rowid",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, i64>(5)?,
            row.get::<_, String>(6)?,
        ))
    })?;

    let mut students = Vec::new();
    for row in rows {
        let (id, name, external_id, class, ledger, total_passed, last_modified) = row?;
        students.push(StudentRow {
            id,
            name,
            external_id,
            class,
            ledger,
            total_passed: Some(to_count(total_passed, "total_passed")?),
            last_modified,
        });
    }
    Ok(students)
}

fn read_log(conn: &Connection) -> Result<Vec<LogRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, student_id, recorded_at, chapter, verse_from, verse_to, status, recorder, note
         FROM recitation_log ORDER BY rowid",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, i64>(4)?,
            row.get::<_, i64>(5)?,
            row.get::<_, String>(6)?,
            row.get::<_, Option<String>>(7)?,
            row.get::<_, Option<String>>(8)?,
        ))
    })?;

    let mut log = Vec::new();
    for row in rows {
        let (id, student_id, recorded_at, chapter, verse_from, verse_to, status, recorder, note) =
            row?;
        log.push(LogRow {
            id,
            student_id,
            recorded_at,
            chapter,
            verse_from: Some(to_count(verse_from, "verse_from")?),
            verse_to: Some(to_count(verse_to, "verse_to")?),
            status,
            recorder,
            note,
        });
    }
    Ok(log)
}

impl StudentStore for SqliteStore {
    fn load(&self) -> Result<StoreSnapshot> {
        let conn = self.lock_conn()?;
        Ok(StoreSnapshot {
            students: read_students(&conn)?,
            log: read_log(&conn)?,
        })
    }

    fn save(&self, snapshot: &StoreSnapshot) -> Result<()> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM recitation_log", [])?;
        tx.execute("DELETE FROM students", [])?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO students (id, name, external_id, class, ledger_json, total_passed, last_modified)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for row in &snapshot.students {
                insert.execute(params![
                    row.id,
                    row.name,
                    row.external_id,
                    row.class,
                    row.ledger,
                    row.total_passed.unwrap_or_default() as i64,
                    row.last_modified,
                ])?;
            }

            let mut insert = tx.prepare(
                "INSERT INTO recitation_log (id, student_id, recorded_at, chapter, verse_from, verse_to, status, recorder, note)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for row in &snapshot.log {
                insert.execute(params![
                    row.id,
                    row.student_id,
                    row.recorded_at,
                    row.chapter,
                    row.verse_from.unwrap_or_default() as i64,
                    row.verse_to.unwrap_or_default() as i64,
                    row.status,
                    row.recorder,
                    row.note,
                ])?;
            }
        }
        tx.execute(
            "INSERT INTO meta (key, value) VALUES ('last_saved', ?1)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;

        tracing::info!(
            store = %self.path.display(),
            students = snapshot.students.len(),
            log_entries = snapshot.log.len(),
            "sqlite store saved"
        );
        Ok(())
    }

    fn exists(&self) -> bool {
        let Ok(conn) = self.lock_conn() else {
            return false;
        };
        let saved = conn
            .query_row(
                "SELECT value FROM meta WHERE key = 'last_saved'",
                [],
                |row| row.get::<_, String>(0),
            )
            .optional();
        matches!(saved, Ok(Some(_)))
    }

    fn describe(&self) -> String {
        format!("sqlite:{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn row(id: &str) -> StudentRow {
        StudentRow {
            id: id.to_string(),
            name: format!("Student {}", id),
            external_id: Some(format!("NIS-{}", id)),
            class: "8B".to_string(),
            ledger: r#"{"An-Nas":[1,1,0,0,0,0]}"#.to_string(),
            total_passed: Some(2),
            last_modified: "2024-03-01T08:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn test_fresh_database_is_empty() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.load().unwrap(), StoreSnapshot::default());
        assert!(!store.exists());
    }

    #[test]
    fn test_save_replaces_everything() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .save(&StoreSnapshot {
                students: vec![row("1001"), row("1002")],
                log: Vec::new(),
            })
            .unwrap();
        let second = StoreSnapshot {
            students: vec![row("1003")],
            log: Vec::new(),
        };
        store.save(&second).unwrap();

        assert_eq!(store.load().unwrap(), second);
        assert!(store.exists());
    }

    #[test]
    fn test_reopen_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("hafalan.sqlite3");
        let snapshot = StoreSnapshot {
            students: vec![row("1001")],
            log: Vec::new(),
        };
        SqliteStore::open(&path).unwrap().save(&snapshot).unwrap();

        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(reopened.load().unwrap(), snapshot);
    }

    #[test]
    fn test_duplicate_ids_roll_back() {
        let store = SqliteStore::open_in_memory().unwrap();
        let good = StoreSnapshot {
            students: vec![row("1001")],
            log: Vec::new(),
        };
        store.save(&good).unwrap();

        let bad = StoreSnapshot {
            students: vec![row("2001"), row("2001")],
            log: Vec::new(),
        };
        assert!(matches!(store.save(&bad), Err(HafalanError::Storage(_))));
        assert_eq!(store.load().unwrap(), good);
    }
}
