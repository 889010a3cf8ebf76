//! The student entity.
//!
//! A student owns exactly one verse ledger. The derived `total_passed`
//! counter and `last_modified` timestamp are only ever changed together with
//! the ledger, through [`Student::record`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::curriculum::Curriculum;
use crate::error::Result;
use crate::ledger::{OverwritePolicy, VerseLedger};
use crate::status::VerseStatus;

/// Unique student key (sequence number, external id or UUID).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(String);

impl StudentId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StudentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for StudentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A student and their memorization ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Student {
    /// Unique key
    pub id: StudentId,

    /// Display name
    pub name: String,

    /// Class label (e.g., "7A")
    pub class: String,

    /// Optional external identifier (NIS)
    pub external_id: Option<String>,

    /// Per-verse status for every chapter
    pub(crate) ledger: VerseLedger,

    /// Derived count of passed verses
    pub total_passed: usize,

    /// When the ledger or profile last changed
    pub last_modified: DateTime<Utc>,
}

impl Student {
    /// Create a student with a fresh all-`NotDone` ledger.
    pub fn new(
        id: StudentId,
        name: impl Into<String>,
        class: impl Into<String>,
        external_id: Option<String>,
        curriculum: &Curriculum,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            class: class.into(),
            external_id,
            ledger: VerseLedger::initialize(curriculum),
            total_passed: 0,
            last_modified: now,
        }
    }

    /// Rebuild a student from stored parts. The derived counter is
    /// recomputed from the ledger against `curriculum`.
    pub fn from_parts(
        id: StudentId,
        name: String,
        class: String,
        external_id: Option<String>,
        ledger: VerseLedger,
        curriculum: &Curriculum,
        last_modified: DateTime<Utc>,
    ) -> Self {
        let mut student = Self {
            id,
            name,
            class,
            external_id,
            ledger,
            total_passed: 0,
            last_modified,
        };
        student.refresh_total(curriculum);
        student
    }

    pub fn ledger(&self) -> &VerseLedger {
        &self.ledger
    }

    /// Apply a range update and refresh the counter and timestamp.
    ///
    /// On error neither the ledger nor the derived fields change. Returns the
    /// number of verses whose status changed.
    #[allow(clippy::too_many_arguments)]
    pub fn record(
        &mut self,
        curriculum: &Curriculum,
        chapter: &str,
        from: usize,
        to: usize,
        status: VerseStatus,
        policy: OverwritePolicy,
        now: DateTime<Utc>,
    ) -> Result<usize> {
        let changed =
            self.ledger
                .update_range_with_policy(curriculum, chapter, from, to, status, policy)?;
        self.refresh_total(curriculum);
        self.last_modified = now;
        Ok(changed)
    }

    /// Recompute `total_passed` from the ledger. Returns whether it changed.
    pub fn refresh_total(&mut self, curriculum: &Curriculum) -> bool {
        let total = self.ledger.count_passed(curriculum);
        let stale = total != self.total_passed;
        self.total_passed = total;
        stale
    }

    /// Share of the curriculum passed, 0.0 to 100.0.
    pub fn progress_percent(&self, curriculum: &Curriculum) -> f64 {
        match curriculum.total_verses() {
            0 => 0.0,
            total => self.total_passed as f64 / total as f64 * 100.0,
        }
    }

    /// Replace the ledger wholesale (used by repair paths).
    pub(crate) fn replace_ledger(&mut self, ledger: VerseLedger, curriculum: &Curriculum) {
        self.ledger = ledger;
        self.refresh_total(curriculum);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::Chapter;
    use crate::error::HafalanError;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_new_student_is_empty() {
        let curriculum = Curriculum::juz_amma();
        let student = Student::new(
            StudentId::new("1001"),
            "Aisyah",
            "7A",
            None,
            &curriculum,
            at(8),
        );
        assert_eq!(student.total_passed, 0);
        assert_eq!(student.ledger().count_passed(&curriculum), 0);
        assert_eq!(student.last_modified, at(8));
    }

    #[test]
    fn test_record_refreshes_total_and_timestamp() {
        let curriculum = Curriculum::juz_amma();
        let mut student =
            Student::new("1001".into(), "Aisyah", "7A", None, &curriculum, at(8));

        let changed = student
            .record(
                &curriculum,
                "Al-Ikhlas",
                1,
                4,
                VerseStatus::Passed,
                OverwritePolicy::LastWriteWins,
                at(9),
            )
            .unwrap();

        assert_eq!(changed, 4);
        assert_eq!(student.total_passed, 4);
        assert_eq!(student.last_modified, at(9));
    }

    #[test]
    fn test_failed_record_changes_nothing() {
        let curriculum = Curriculum::juz_amma();
        let mut student =
            Student::new("1001".into(), "Aisyah", "7A", None, &curriculum, at(8));
        let before = student.clone();

        let err = student
            .record(
                &curriculum,
                "An-Nas",
                1,
                7,
                VerseStatus::Passed,
                OverwritePolicy::LastWriteWins,
                at(9),
            )
            .unwrap_err();

        assert!(matches!(err, HafalanError::InvalidRange { .. }));
        assert_eq!(student, before);
    }

    #[test]
    fn test_progress_percent() {
        let curriculum = Curriculum::new(vec![
            Chapter::new(108, "Al-Kausar", 3),
            Chapter::new(110, "An-Nasr", 3),
        ])
        .unwrap();
        let mut student = Student::new("1".into(), "Umar", "8B", None, &curriculum, at(8));
        let policy = OverwritePolicy::default();
        student
            .record(&curriculum, "Al-Kausar", 1, 3, VerseStatus::Passed, policy, at(9))
            .unwrap();
        student
            .record(&curriculum, "An-Nasr", 1, 1, VerseStatus::Passed, policy, at(9))
            .unwrap();

        assert_eq!(student.total_passed, 4);
        assert_eq!(format!("{:.1}", student.progress_percent(&curriculum)), "66.7");
    }

    #[test]
    fn test_from_parts_recomputes_stale_total() {
        let curriculum = Curriculum::juz_amma();
        let mut ledger = VerseLedger::initialize(&curriculum);
        ledger
            .update_range(&curriculum, "Al-Falaq", 1, 5, VerseStatus::Passed)
            .unwrap();

        let student = Student::from_parts(
            "1002".into(),
            "Bilal".to_string(),
            "7B".to_string(),
            Some("99812".to_string()),
            ledger,
            &curriculum,
            at(10),
        );
        assert_eq!(student.total_passed, 5);
    }

    #[test]
    fn test_from_parts_ignores_malformed_chapters() {
        let curriculum = Curriculum::juz_amma();
        let mut value: serde_json::Value =
            serde_json::from_str(&VerseLedger::initialize(&curriculum).encode()).unwrap();
        value["Al-Fil"] = serde_json::json!([1, 1, 1]);
        value["Bogus"] = serde_json::json!([1, 1]);
        let ledger = VerseLedger::decode(&value.to_string()).unwrap();

        let mut student = Student::from_parts(
            "1003".into(),
            "Hafsah".to_string(),
            "7C".to_string(),
            None,
            ledger,
            &curriculum,
            at(10),
        );
        assert_eq!(student.total_passed, 0);
        assert!(!student.refresh_total(&curriculum));
    }
}
