//! Error types for Hafalan core operations.
//!
//! Every ledger and roster failure is a local validation error reported to
//! the caller immediately; none are retried. The CLI layer maps these to
//! user-facing messages and exit codes.

use thiserror::Error;

/// Result type alias for Hafalan operations.
pub type Result<T> = std::result::Result<T, HafalanError>;

/// Core error type for Hafalan operations.
#[derive(Debug, Error)]
pub enum HafalanError {
    /// Chapter is not part of the curriculum
    #[error("Invalid chapter: {0}")]
    InvalidChapter(String),

    /// Verse range outside `1 <= from <= to <= verse_count`
    #[error("Invalid range: {chapter} has verses 1-{verse_count}, got {from}-{to}")]
    InvalidRange {
        chapter: String,
        from: usize,
        to: usize,
        verse_count: usize,
    },

    /// Status code or label outside the status enumeration
    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    /// Stored ledger text or shape cannot be trusted
    #[error("Corrupt ledger: {0}")]
    CorruptLedger(String),

    /// No student with this id
    #[error("Student not found: {0}")]
    StudentNotFound(String),

    /// Identifier already taken by another student
    #[error("Duplicate identifier: {0}")]
    DuplicateIdentifier(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(String),
}

impl HafalanError {
    /// Whether the error is one of the ledger contract violations
    /// (chapter, range or status).
    pub fn is_ledger_contract(&self) -> bool {
        matches!(
            self,
            HafalanError::InvalidChapter(_)
                | HafalanError::InvalidRange { .. }
                | HafalanError::InvalidStatus(_)
        )
    }
}

impl From<std::io::Error> for HafalanError {
    fn from(err: std::io::Error) -> Self {
        HafalanError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for HafalanError {
    fn from(err: serde_json::Error) -> Self {
        HafalanError::CorruptLedger(err.to_string())
    }
}

impl From<rusqlite::Error> for HafalanError {
    fn from(err: rusqlite::Error) -> Self {
        HafalanError::Storage(format!("SQLite error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_message_names_bounds() {
        let err = HafalanError::InvalidRange {
            chapter: "An-Nas".to_string(),
            from: 1,
            to: 7,
            verse_count: 6,
        };
        assert_eq!(
            err.to_string(),
            "Invalid range: An-Nas has verses 1-6, got 1-7"
        );
        assert!(err.is_ledger_contract());
    }

    #[test]
    fn test_json_error_maps_to_corrupt_ledger() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: HafalanError = parse_err.into();
        assert!(matches!(err, HafalanError::CorruptLedger(_)));
        assert!(!err.is_ledger_contract());
    }
}
