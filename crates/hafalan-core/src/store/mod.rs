//! Student table persistence.
//!
//! A store holds one flat row per student, with the ledger embedded as one
//! JSON text cell, plus the recitation log. The contract is whole-table
//! read-modify-write: `load` returns everything, `save` overwrites
//! everything. There is no partial update and no concurrency check, so two
//! handles that load, change different rows and save will lose the earlier
//! save.

pub mod csv;
pub mod memory;
pub mod sqlite;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{HafalanError, Result};
use crate::log::LogEntry;
use crate::status::VerseStatus;
use crate::student::{Student, StudentId};

pub use self::csv::CsvStore;
pub use self::memory::MemoryStore;
pub use self::sqlite::SqliteStore;

/// Flat student row as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentRow {
    pub id: String,
    pub name: String,
    pub external_id: Option<String>,
    pub class: String,

    /// Serialized ledger cell
    pub ledger: String,

    /// Derived total as last written; may be stale. `None` when the stored
    /// cell could not be read.
    pub total_passed: Option<usize>,

    /// Timestamp text (RFC 3339, or the legacy `YYYY-MM-DD HH:MM:SS`)
    pub last_modified: String,
}

impl From<&Student> for StudentRow {
    fn from(student: &Student) -> Self {
        Self {
            id: student.id.to_string(),
            name: student.name.clone(),
            external_id: student.external_id.clone(),
            class: student.class.clone(),
            ledger: student.ledger().encode(),
            total_passed: Some(student.total_passed),
            last_modified: student.last_modified.to_rfc3339(),
        }
    }
}

/// Flat log row as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRow {
    pub id: String,
    pub recorded_at: String,
    pub student_id: String,
    pub chapter: String,

    /// Range bounds; `None` when the stored cell could not be read
    pub verse_from: Option<usize>,
    pub verse_to: Option<usize>,

    pub status: String,
    pub recorder: Option<String>,
    pub note: Option<String>,
}

impl From<&LogEntry> for LogRow {
    fn from(entry: &LogEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            recorded_at: entry.recorded_at.to_rfc3339(),
            student_id: entry.student_id.to_string(),
            chapter: entry.chapter.clone(),
            verse_from: Some(entry.verse_from),
            verse_to: Some(entry.verse_to),
            status: entry.status.code().to_string(),
            recorder: entry.recorder.clone(),
            note: entry.note.clone(),
        }
    }
}

impl TryFrom<LogRow> for LogEntry {
    type Error = HafalanError;

    fn try_from(row: LogRow) -> Result<Self> {
        let id = Uuid::parse_str(row.id.trim())
            .map_err(|e| HafalanError::Storage(format!("Invalid log entry UUID: {}", e)))?;
        let recorded_at = parse_timestamp(&row.recorded_at)?;
        let status = row.status.parse::<VerseStatus>()?;
        let (verse_from, verse_to) = match (row.verse_from, row.verse_to) {
            (Some(from), Some(to)) if from >= 1 && from <= to => (from, to),
            (from, to) => {
                return Err(HafalanError::Storage(format!(
                    "Invalid log verse range {:?}-{:?}",
                    from, to
                )))
            }
        };
        Ok(LogEntry {
            id,
            recorded_at,
            student_id: StudentId::new(row.student_id.trim()),
            chapter: row.chapter,
            verse_from,
            verse_to,
            status,
            recorder: row.recorder.filter(|r| !r.trim().is_empty()),
            note: row.note.filter(|n| !n.trim().is_empty()),
        })
    }
}

/// Everything a store holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSnapshot {
    pub students: Vec<StudentRow>,
    pub log: Vec<LogRow>,
}

/// Whole-table persistence for the roster.
pub trait StudentStore: Send + Sync {
    /// Read every student row and log row.
    ///
    /// # Errors
    ///
    /// Returns `HafalanError::Storage` if the backing store cannot be read.
    /// A store that has never been written loads as empty.
    fn load(&self) -> Result<StoreSnapshot>;

    /// Overwrite the whole store with `snapshot`.
    ///
    /// # Errors
    ///
    /// Returns `HafalanError::Storage` if the write fails. The previous
    /// contents are left in place when the failure happens before the
    /// final replace.
    fn save(&self, snapshot: &StoreSnapshot) -> Result<()>;

    /// Whether anything has been written yet.
    fn exists(&self) -> bool;

    /// Human-readable location for messages.
    fn describe(&self) -> String;
}

/// Available persistent backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Csv,
    Sqlite,
}

impl StoreBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            StoreBackend::Csv => "csv",
            StoreBackend::Sqlite => "sqlite",
        }
    }

    /// Conventional location under a data directory.
    pub fn default_path(self, data_dir: &Path) -> PathBuf {
        match self {
            StoreBackend::Csv => data_dir.join("store"),
            StoreBackend::Sqlite => data_dir.join("hafalan.sqlite3"),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreBackend {
    type Err = HafalanError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(StoreBackend::Csv),
            "sqlite" | "sqlite3" => Ok(StoreBackend::Sqlite),
            other => Err(HafalanError::Validation(format!(
                "Unknown store backend: {} (use csv or sqlite)",
                other
            ))),
        }
    }
}

/// Open a store of the given kind at `path`.
pub fn open_store(backend: StoreBackend, path: &Path) -> Result<Box<dyn StudentStore>> {
    Ok(match backend {
        StoreBackend::Csv => Box::new(CsvStore::new(path)),
        StoreBackend::Sqlite => Box::new(SqliteStore::open(path)?),
    })
}

/// Parse a stored timestamp: RFC 3339, or `YYYY-MM-DD HH:MM:SS` read as UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| HafalanError::Storage(format!("Invalid timestamp {:?}: {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-01T08:30:00+00:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-03-01 08:30:00").unwrap(), expected);
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_log_row_status_accepts_labels() {
        let row = LogRow {
            id: Uuid::new_v4().to_string(),
            recorded_at: "2024-03-01 08:30:00".to_string(),
            student_id: "1001".to_string(),
            chapter: "Al-Ikhlas".to_string(),
            verse_from: Some(1),
            verse_to: Some(4),
            status: "Lulus".to_string(),
            recorder: Some(" ".to_string()),
            note: None,
        };
        let entry = LogEntry::try_from(row).unwrap();
        assert_eq!(entry.status, VerseStatus::Passed);
        assert_eq!(entry.recorder, None);
    }

    #[test]
    fn test_log_row_rejects_unreadable_or_reversed_range() {
        let row = |from: Option<usize>, to: Option<usize>| LogRow {
            id: Uuid::new_v4().to_string(),
            recorded_at: "2024-03-01 08:30:00".to_string(),
            student_id: "1001".to_string(),
            chapter: "Al-Ikhlas".to_string(),
            verse_from: from,
            verse_to: to,
            status: "1".to_string(),
            recorder: None,
            note: None,
        };
        assert!(LogEntry::try_from(row(None, Some(4))).is_err());
        assert!(LogEntry::try_from(row(Some(0), Some(4))).is_err());
        assert!(LogEntry::try_from(row(Some(4), Some(2))).is_err());
        assert!(LogEntry::try_from(row(Some(2), Some(4))).is_ok());
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!("SQLite".parse::<StoreBackend>().unwrap(), StoreBackend::Sqlite);
        assert!("postgres".parse::<StoreBackend>().is_err());
    }
}
