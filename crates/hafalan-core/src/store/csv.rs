//! CSV directory backend.
//!
//! Layout:
//!
//! ```text
//! <dir>/students.csv   one row per student, ledger JSON in Status_Hafalan
//! <dir>/log.csv        one row per recorded recitation
//! ```
//!
//! Column names follow the spreadsheets teachers already keep, so existing
//! files load unchanged. Columns are looked up by header name; unknown
//! columns are ignored.

use std::fs;
use std::path::{Path, PathBuf};

use super::{LogRow, StoreSnapshot, StudentRow, StudentStore};
use crate::delimited;
use crate::error::{HafalanError, Result};
use crate::fs::write_atomic;

const STUDENTS_FILE: &str = "students.csv";
const LOG_FILE: &str = "log.csv";

const STUDENT_COLUMNS: [&str; 7] = [
    "ID_Murid",
    "Nama_Murid",
    "NIS",
    "Kelas",
    "Status_Hafalan",
    "Total_Ayat_Lulus",
    "Update_Terakhir",
];

const LOG_COLUMNS: [&str; 9] = [
    "ID_HAFALAN",
    "ID_MURID",
    "Tanggal",
    "Surah",
    "Ayat_Awal",
    "Ayat_Akhir",
    "Status",
    "Pencatat",
    "Catatan",
];

/// Student and log tables as two CSV files in one directory.
#[derive(Debug, Clone)]
pub struct CsvStore {
    dir: PathBuf,
}

impl CsvStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn students_path(&self) -> PathBuf {
        self.dir.join(STUDENTS_FILE)
    }

    pub fn log_path(&self) -> PathBuf {
        self.dir.join(LOG_FILE)
    }
}

/// Header-indexed view of one parsed table.
struct Table {
    columns: Vec<String>,
    records: Vec<Vec<String>>,
}

impl Table {
    fn read(path: &Path) -> Result<Option<Self>> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(HafalanError::Storage(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    err
                )))
            }
        };
        let mut records = delimited::parse_records(&text, ',').into_iter();
        let Some(columns) = records.next() else {
            return Ok(None);
        };
        Ok(Some(Self {
            columns: columns.into_iter().map(|c| c.trim().to_string()).collect(),
            records: records.collect(),
        }))
    }

    fn index(&self, column: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))
    }

    fn require(&self, column: &str, path: &Path) -> Result<usize> {
        self.index(column).ok_or_else(|| {
            HafalanError::Storage(format!("{} has no {} column", path.display(), column))
        })
    }
}

fn cell(record: &[String], col: Option<usize>) -> String {
    col.and_then(|i| record.get(i))
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

fn optional(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Count cell, `None` when it cannot be read. Empty reads as 0.
fn parse_count(value: &str, what: &str, path: &Path) -> Option<usize> {
    if value.is_empty() {
        return Some(0);
    }
    // Spreadsheet exports sometimes write integers as floats ("12.0").
    let parsed = value
        .parse::<usize>()
        .ok()
        .or_else(|| value.parse::<f64>().ok().map(|f| f.max(0.0) as usize));
    if parsed.is_none() {
        tracing::warn!(path = %path.display(), column = what, value, "unreadable count cell");
    }
    parsed
}

fn read_students(path: &Path) -> Result<Vec<StudentRow>> {
    let Some(table) = Table::read(path)? else {
        return Ok(Vec::new());
    };
    let id_col = table.require("ID_Murid", path)?;
    let cols: Vec<Option<usize>> = STUDENT_COLUMNS.iter().map(|c| table.index(c)).collect();

    let mut rows = Vec::with_capacity(table.records.len());
    for record in &table.records {
        let id = cell(record, Some(id_col));
        if id.is_empty() {
            tracing::warn!(path = %path.display(), "skipping student row without an id");
            continue;
        }
        rows.push(StudentRow {
            id,
            name: cell(record, cols[1]),
            external_id: optional(cell(record, cols[2])),
            class: cell(record, cols[3]),
            ledger: cell(record, cols[4]),
            total_passed: parse_count(&cell(record, cols[5]), "Total_Ayat_Lulus", path),
            last_modified: cell(record, cols[6]),
        });
    }
    Ok(rows)
}

fn read_log(path: &Path) -> Result<Vec<LogRow>> {
    let Some(table) = Table::read(path)? else {
        return Ok(Vec::new());
    };
    let cols: Vec<Option<usize>> = LOG_COLUMNS.iter().map(|c| table.index(c)).collect();

    let mut rows = Vec::with_capacity(table.records.len());
    for record in &table.records {
        rows.push(LogRow {
            id: cell(record, cols[0]),
            student_id: cell(record, cols[1]),
            recorded_at: cell(record, cols[2]),
            chapter: cell(record, cols[3]),
            verse_from: parse_count(&cell(record, cols[4]), "Ayat_Awal", path),
            verse_to: parse_count(&cell(record, cols[5]), "Ayat_Akhir", path),
            status: cell(record, cols[6]),
            recorder: optional(cell(record, cols[7])),
            note: optional(cell(record, cols[8])),
        });
    }
    Ok(rows)
}

fn render_students(rows: &[StudentRow]) -> String {
    let mut out = delimited::write_record(&STUDENT_COLUMNS[..], ',');
    out.push('\n');
    for row in rows {
        let total = row.total_passed.map(|t| t.to_string()).unwrap_or_default();
        let fields = [
            row.id.as_str(),
            row.name.as_str(),
            row.external_id.as_deref().unwrap_or(""),
            row.class.as_str(),
            row.ledger.as_str(),
            total.as_str(),
            row.last_modified.as_str(),
        ];
        out.push_str(&delimited::write_record(&fields[..], ','));
        out.push('\n');
    }
    out
}

fn render_log(rows: &[LogRow]) -> String {
    let mut out = delimited::write_record(&LOG_COLUMNS[..], ',');
    out.push('\n');
    for row in rows {
        let from = row.verse_from.map(|v| v.to_string()).unwrap_or_default();
        let to = row.verse_to.map(|v| v.to_string()).unwrap_or_default();
        let fields = [
            row.id.as_str(),
            row.student_id.as_str(),
            row.recorded_at.as_str(),
            row.chapter.as_str(),
            from.as_str(),
            to.as_str(),
            row.status.as_str(),
            row.recorder.as_deref().unwrap_or(""),
            row.note.as_deref().unwrap_or(""),
        ];
        out.push_str(&delimited::write_record(&fields[..], ','));
        out.push('\n');
    }
    out
}

impl StudentStore for CsvStore {
    fn load(&self) -> Result<StoreSnapshot> {
        Ok(StoreSnapshot {
            students: read_students(&self.students_path())?,
            log: read_log(&self.log_path())?,
        })
    }

    fn save(&self, snapshot: &StoreSnapshot) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            HafalanError::Storage(format!("Failed to create {}: {}", self.dir.display(), e))
        })?;
        write_atomic(
            &self.students_path(),
            render_students(&snapshot.students).as_bytes(),
        )?;
        write_atomic(&self.log_path(), render_log(&snapshot.log).as_bytes())?;
        tracing::info!(
            store = %self.dir.display(),
            students = snapshot.students.len(),
            log_entries = snapshot.log.len(),
            "csv store saved"
        );
        Ok(())
    }

    fn exists(&self) -> bool {
        self.students_path().exists()
    }

    fn describe(&self) -> String {
        format!("csv:{}", self.dir.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn row(id: &str, name: &str) -> StudentRow {
        StudentRow {
            id: id.to_string(),
            name: name.to_string(),
            external_id: None,
            class: "7A".to_string(),
            ledger: r#"{"Al-Kausar":[1,0,2]}"#.to_string(),
            total_passed: Some(1),
            last_modified: "2024-03-01T08:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn test_missing_directory_loads_empty() {
        let dir = tempdir().unwrap();
        let store = CsvStore::new(dir.path().join("nothing-here"));
        assert_eq!(store.load().unwrap(), StoreSnapshot::default());
        assert!(!store.exists());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let store = CsvStore::new(dir.path().join("store"));
        let snapshot = StoreSnapshot {
            students: vec![row("1001", "Ahmad, Fauzi"), row("1002", "Siti \"Ica\"")],
            log: vec![LogRow {
                id: "3f0e1b6c-3d53-4d5c-9f7e-1a3c2d4b5e6f".to_string(),
                recorded_at: "2024-03-01T08:00:00+00:00".to_string(),
                student_id: "1001".to_string(),
                chapter: "Al-Kausar".to_string(),
                verse_from: Some(1),
                verse_to: Some(3),
                status: "1".to_string(),
                recorder: Some("Ustadz Hasan".to_string()),
                note: Some("lancar,\nlanjut An-Nasr".to_string()),
            }],
        };

        store.save(&snapshot).unwrap();
        assert!(store.exists());
        assert_eq!(store.load().unwrap(), snapshot);
    }

    #[test]
    fn test_reads_legacy_file_with_extra_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(STUDENTS_FILE);
        fs::write(
            &path,
            "ID_Murid,Nama_Murid,Kelas,Status_Hafalan,Total_Ayat_Lulus,Update_Terakhir,Extra\n\
             1001,Ahmad,7A,\"{\"\"Al-Kausar\"\": [1, 1, 1]}\",3.0,2024-03-01 08:00:00,x\n",
        )
        .unwrap();

        let snapshot = CsvStore::new(dir.path()).load().unwrap();
        let student = &snapshot.students[0];
        assert_eq!(student.external_id, None);
        assert_eq!(student.total_passed, Some(3));
        assert_eq!(student.ledger, r#"{"Al-Kausar": [1, 1, 1]}"#);
        assert!(snapshot.log.is_empty());
    }

    #[test]
    fn test_unreadable_count_cells_do_not_fail_the_load() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(STUDENTS_FILE),
            "ID_Murid,Nama_Murid,Kelas,Status_Hafalan,Total_Ayat_Lulus\n1001,Ahmad,7A,{},banyak\n",
        )
        .unwrap();
        fs::write(
            dir.path().join(LOG_FILE),
            "ID_HAFALAN,ID_MURID,Tanggal,Surah,Ayat_Awal,Ayat_Akhir,Status\n\
             3f0e1b6c-3d53-4d5c-9f7e-1a3c2d4b5e6f,1001,2024-03-01 08:00:00,An-Nas,satu,6,1\n",
        )
        .unwrap();

        let snapshot = CsvStore::new(dir.path()).load().unwrap();
        assert_eq!(snapshot.students[0].total_passed, None);
        assert_eq!(snapshot.log[0].verse_from, None);
        assert_eq!(snapshot.log[0].verse_to, Some(6));
    }

    #[test]
    fn test_file_without_id_column_is_rejected() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(STUDENTS_FILE), "Nama_Murid,Kelas\nAhmad,7A\n").unwrap();
        let err = CsvStore::new(dir.path()).load().unwrap_err();
        assert!(matches!(err, HafalanError::Storage(_)));
    }
}
