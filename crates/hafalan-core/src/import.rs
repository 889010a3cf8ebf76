//! Bulk roster import from delimited text.
//!
//! Accepts the spreadsheet exports teachers already have: a header line with
//! name, class and (optionally) external id columns, separated by `;` or `,`.

use serde::Serialize;

use crate::delimited;
use crate::error::{HafalanError, Result};

const NAME_HEADERS: &[&str] = &["name", "nama_murid", "nama"];
const CLASS_HEADERS: &[&str] = &["class", "kelas"];
const EXTERNAL_ID_HEADERS: &[&str] = &["external_id", "nis"];

/// One usable row of an import file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportRow {
    /// 1-based line number in the source file
    pub line: usize,
    pub name: String,
    pub class: String,
    pub external_id: Option<String>,
}

/// A row that could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRow {
    pub line: usize,
    pub reason: String,
}

/// Parsed import file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportBatch {
    pub rows: Vec<ImportRow>,
    pub invalid: Vec<RejectedRow>,
}

impl ImportBatch {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Pick `;` when the header line contains one, else `,`.
pub fn detect_delimiter(text: &str) -> char {
    let header = text.lines().find(|line| !line.trim().is_empty()).unwrap_or("");
    if header.contains(';') {
        ';'
    } else {
        ','
    }
}

fn normalize_header(value: &str) -> String {
    value
        .trim()
        .to_ascii_lowercase()
        .replace([' ', '-'], "_")
}

fn find_column(headers: &[String], aliases: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| aliases.iter().any(|alias| h == alias))
}

/// Parse an import file.
///
/// # Errors
///
/// Returns `HafalanError::Validation` if the file has no header line or the
/// header lacks a name or class column. Bad data rows do not fail the parse;
/// they are collected in `invalid`.
pub fn parse_roster(text: &str) -> Result<ImportBatch> {
    let delimiter = detect_delimiter(text);
    let mut records = delimited::parse_records(text, delimiter).into_iter();

    let header = records
        .next()
        .ok_or_else(|| HafalanError::Validation("Import file is empty".to_string()))?;
    let headers: Vec<String> = header.iter().map(|h| normalize_header(h)).collect();

    let name_col = find_column(&headers, NAME_HEADERS).ok_or_else(|| {
        HafalanError::Validation("Import file has no name column (Nama_Murid)".to_string())
    })?;
    let class_col = find_column(&headers, CLASS_HEADERS).ok_or_else(|| {
        HafalanError::Validation("Import file has no class column (Kelas)".to_string())
    })?;
    let external_col = find_column(&headers, EXTERNAL_ID_HEADERS);

    let mut batch = ImportBatch::default();
    // Records do not carry their source line, and quoted fields may span
    // lines, so this is the record number counting the header as line 1.
    for (offset, record) in records.enumerate() {
        let line = offset + 2;
        let field = |col: usize| record.get(col).map(|v| v.trim()).unwrap_or("");

        let name = field(name_col);
        let class = field(class_col);
        if name.is_empty() || class.is_empty() {
            batch.invalid.push(RejectedRow {
                line,
                reason: "missing name or class".to_string(),
            });
            continue;
        }
        let external_id = external_col
            .map(field)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        batch.rows.push(ImportRow {
            line,
            name: name.to_string(),
            class: class.to_string(),
            external_id,
        });
    }

    tracing::debug!(
        rows = batch.rows.len(),
        invalid = batch.invalid.len(),
        %delimiter,
        "import file parsed"
    );
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semicolon_export_with_nis() {
        let text = "Nama_Murid;Kelas;NIS\nAhmad Fauzi;7A;99812\nSiti;7B;\n";
        let batch = parse_roster(text).unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.rows[0].name, "Ahmad Fauzi");
        assert_eq!(batch.rows[0].external_id.as_deref(), Some("99812"));
        assert_eq!(batch.rows[1].external_id, None);
        assert!(batch.invalid.is_empty());
    }

    #[test]
    fn test_comma_file_with_english_headers_and_quotes() {
        let text = "name,class\n\"Fauzi, Ahmad\",8C\n";
        let batch = parse_roster(text).unwrap();
        assert_eq!(detect_delimiter(text), ',');
        assert_eq!(batch.rows[0].name, "Fauzi, Ahmad");
        assert_eq!(batch.rows[0].class, "8C");
    }

    #[test]
    fn test_rows_missing_fields_are_counted() {
        let text = "Nama_Murid;Kelas\nAhmad;7A\n;7A\nUmar;\n";
        let batch = parse_roster(text).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(
            batch.invalid.iter().map(|r| r.line).collect::<Vec<_>>(),
            vec![3, 4]
        );
    }

    #[test]
    fn test_missing_columns_rejected() {
        assert!(matches!(
            parse_roster("Nama_Murid;NIS\nAhmad;1\n"),
            Err(HafalanError::Validation(_))
        ));
        assert!(matches!(parse_roster(""), Err(HafalanError::Validation(_))));
    }
}
