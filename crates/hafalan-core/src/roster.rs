//! The roster: every student, their ledgers and the recitation log.
//!
//! The roster is loaded whole from a [`StudentStore`], mutated in memory and
//! saved whole. Loading applies the ledger recovery policy to every row and
//! reports what it had to regenerate. A failed save leaves the in-memory
//! roster untouched so the caller can retry.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::curriculum::Curriculum;
use crate::error::{HafalanError, Result};
use crate::identity::IdAllocator;
use crate::import::{ImportBatch, RejectedRow};
use crate::ledger::{LedgerAudit, OverwritePolicy, Recovery, VerseLedger};
use crate::log::{LogEntry, LogFilter, RecitationLog};
use crate::status::VerseStatus;
use crate::store::{parse_timestamp, LogRow, StoreSnapshot, StudentRow, StudentStore};
use crate::student::{Student, StudentId};

/// Input for creating a student.
#[derive(Debug, Clone, Default)]
pub struct NewStudent {
    pub name: String,
    pub class: String,
    pub external_id: Option<String>,
}

impl NewStudent {
    pub fn new(name: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class: class.into(),
            external_id: None,
        }
    }

    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }
}

/// Administrative profile edit. `None` leaves a field alone;
/// `external_id: Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct StudentEdit {
    pub name: Option<String>,
    pub class: Option<String>,
    pub external_id: Option<Option<String>>,
}

impl StudentEdit {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.class.is_none() && self.external_id.is_none()
    }
}

/// One recitation result to apply.
#[derive(Debug, Clone)]
pub struct Recitation {
    pub student_id: StudentId,
    pub chapter: String,
    pub verse_from: usize,
    pub verse_to: usize,
    pub status: VerseStatus,
    pub recorder: Option<String>,
    pub note: Option<String>,
}

/// What a successful [`Roster::record`] did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordOutcome {
    pub student_id: StudentId,
    pub log_entry_id: Uuid,

    /// Verses whose status actually changed
    pub changed: usize,

    pub previous_total: usize,
    pub total_passed: usize,
}

/// Result of a bulk import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub added: Vec<StudentId>,

    /// Rows whose external id was already taken
    pub duplicates: Vec<RejectedRow>,

    /// Rows missing required data, from parsing or allocation
    pub invalid: Vec<RejectedRow>,
}

/// Everything [`Roster::load`] had to fix or drop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Students whose stored ledger was repaired or regenerated
    pub recovered: Vec<(StudentId, Recovery)>,

    /// Students whose stored total disagreed with their ledger
    pub stale_totals: Vec<StudentId>,

    /// Students whose stored timestamp could not be parsed
    pub bad_timestamps: Vec<StudentId>,

    /// Rows dropped because their id was already loaded
    pub duplicate_rows: Vec<StudentId>,

    /// Log rows that could not be parsed and were dropped
    pub dropped_log_rows: usize,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.recovered.is_empty()
            && self.stale_totals.is_empty()
            && self.bad_timestamps.is_empty()
            && self.duplicate_rows.is_empty()
            && self.dropped_log_rows == 0
    }
}

fn clean_text(value: &str) -> String {
    value.trim().to_string()
}

fn clean_optional(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

fn require_text(value: &str, field: &str) -> Result<String> {
    let value = clean_text(value);
    if value.is_empty() {
        return Err(HafalanError::Validation(format!("{} cannot be empty", field)));
    }
    Ok(value)
}

/// In-memory roster of students plus the recitation log.
#[derive(Debug, Clone)]
pub struct Roster {
    curriculum: Curriculum,
    students: Vec<Student>,
    log: RecitationLog,
}

impl Roster {
    /// An empty roster.
    pub fn new(curriculum: Curriculum) -> Self {
        Self {
            curriculum,
            students: Vec::new(),
            log: RecitationLog::default(),
        }
    }

    /// Read the whole store and rebuild every student.
    ///
    /// # Errors
    ///
    /// Returns `HafalanError::Storage` if the store cannot be read. Bad ledger
    /// cells, timestamps and log rows do not fail the load; they are
    /// recovered and listed in the [`LoadReport`].
    pub fn load(store: &dyn StudentStore, curriculum: Curriculum) -> Result<(Self, LoadReport)> {
        let snapshot = store.load()?;
        let (roster, report) = Self::from_snapshot(snapshot, curriculum);
        tracing::info!(
            store = %store.describe(),
            students = roster.students.len(),
            log_entries = roster.log.len(),
            clean = report.is_clean(),
            "roster loaded"
        );
        Ok((roster, report))
    }

    /// Rebuild a roster from stored rows, applying ledger recovery.
    pub fn from_snapshot(snapshot: StoreSnapshot, curriculum: Curriculum) -> (Self, LoadReport) {
        let mut report = LoadReport::default();
        let mut seen = HashSet::new();
        let mut students = Vec::with_capacity(snapshot.students.len());
        let load_time = Utc::now();

        for row in snapshot.students {
            let id = StudentId::new(row.id.trim());
            if !seen.insert(id.clone()) {
                tracing::warn!(student = %id, "duplicate student row dropped");
                report.duplicate_rows.push(id);
                continue;
            }

            let (ledger, recovery) = VerseLedger::decode_or_initialize(&row.ledger, &curriculum);
            if !recovery.is_clean() {
                tracing::warn!(student = %id, ?recovery, "student ledger recovered");
                report.recovered.push((id.clone(), recovery));
            }

            let last_modified = match parse_timestamp(&row.last_modified) {
                Ok(at) => at,
                Err(_) => {
                    report.bad_timestamps.push(id.clone());
                    load_time
                }
            };

            let student = Student::from_parts(
                id.clone(),
                clean_text(&row.name),
                clean_text(&row.class),
                clean_optional(row.external_id.as_deref()),
                ledger,
                &curriculum,
                last_modified,
            );
            if row.total_passed != Some(student.total_passed) {
                report.stale_totals.push(id);
            }
            students.push(student);
        }

        let mut entries = Vec::with_capacity(snapshot.log.len());
        for row in snapshot.log {
            match LogEntry::try_from(row) {
                Ok(entry) => entries.push(entry),
                Err(err) => {
                    tracing::warn!(error = %err, "unreadable log row dropped");
                    report.dropped_log_rows += 1;
                }
            }
        }

        let roster = Self {
            curriculum,
            students,
            log: RecitationLog::from_entries(entries),
        };
        (roster, report)
    }

    /// Flatten to store rows.
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            students: self.students.iter().map(StudentRow::from).collect(),
            log: self.log.entries().iter().map(LogRow::from).collect(),
        }
    }

    /// Write the whole roster and log to `store`.
    pub fn save(&self, store: &dyn StudentStore) -> Result<()> {
        store.save(&self.snapshot())
    }

    pub fn curriculum(&self) -> &Curriculum {
        &self.curriculum
    }

    /// Students in insertion order.
    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    pub fn get(&self, id: &StudentId) -> Option<&Student> {
        self.students.iter().find(|s| &s.id == id)
    }

    fn get_mut(&mut self, id: &StudentId) -> Result<&mut Student> {
        self.students
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or_else(|| HafalanError::StudentNotFound(id.to_string()))
    }

    /// Look a student up by id, then by external id.
    pub fn find(&self, query: &str) -> Result<&Student> {
        let query = query.trim();
        self.students
            .iter()
            .find(|s| s.id.as_str() == query)
            .or_else(|| {
                self.students
                    .iter()
                    .find(|s| s.external_id.as_deref() == Some(query))
            })
            .ok_or_else(|| HafalanError::StudentNotFound(query.to_string()))
    }

    pub fn ids(&self) -> HashSet<StudentId> {
        self.students.iter().map(|s| s.id.clone()).collect()
    }

    /// Distinct class labels, sorted.
    pub fn classes(&self) -> Vec<String> {
        self.students
            .iter()
            .map(|s| s.class.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn in_class(&self, class: &str) -> Vec<&Student> {
        self.students.iter().filter(|s| s.class == class).collect()
    }

    pub fn log(&self) -> &RecitationLog {
        &self.log
    }

    /// Log entries for students of `class`, newest first.
    pub fn log_for_class(&self, class: &str, limit: Option<usize>) -> Vec<&LogEntry> {
        let members: HashSet<&StudentId> = self.in_class(class).into_iter().map(|s| &s.id).collect();
        let mut entries: Vec<&LogEntry> = self
            .log
            .query(&LogFilter::new())
            .into_iter()
            .filter(|e| members.contains(&e.student_id))
            .collect();
        if let Some(limit) = limit {
            entries.truncate(limit);
        }
        entries
    }

    fn external_id_taken(&self, external_id: &str, except: Option<&StudentId>) -> bool {
        self.students
            .iter()
            .filter(|s| Some(&s.id) != except)
            .any(|s| s.external_id.as_deref() == Some(external_id))
    }

    /// Create a student with a fresh ledger.
    ///
    /// # Errors
    ///
    /// - `HafalanError::Validation` if the name or class is empty, or the
    ///   allocator needs an external id that was not given
    /// - `HafalanError::DuplicateIdentifier` if the external id or the
    ///   allocated id is already taken
    pub fn add_student(
        &mut self,
        new: NewStudent,
        allocator: &dyn IdAllocator,
        now: DateTime<Utc>,
    ) -> Result<StudentId> {
        let name = require_text(&new.name, "Student name")?;
        let class = require_text(&new.class, "Class")?;
        let external_id = clean_optional(new.external_id.as_deref());

        if let Some(external) = external_id.as_deref() {
            if self.external_id_taken(external, None) {
                return Err(HafalanError::DuplicateIdentifier(external.to_string()));
            }
        }

        let existing = self.ids();
        let id = allocator.allocate_id(&existing, external_id.as_deref())?;
        if existing.contains(&id) {
            return Err(HafalanError::DuplicateIdentifier(id.to_string()));
        }

        let student = Student::new(id.clone(), name, class, external_id, &self.curriculum, now);
        tracing::info!(student = %id, strategy = allocator.name(), "student added");
        self.students.push(student);
        Ok(id)
    }

    /// Add every row of `batch`, skipping duplicates instead of failing.
    pub fn import(
        &mut self,
        batch: &ImportBatch,
        allocator: &dyn IdAllocator,
        now: DateTime<Utc>,
    ) -> ImportSummary {
        let mut summary = ImportSummary {
            invalid: batch.invalid.clone(),
            ..ImportSummary::default()
        };

        for row in &batch.rows {
            let new = NewStudent {
                name: row.name.clone(),
                class: row.class.clone(),
                external_id: row.external_id.clone(),
            };
            match self.add_student(new, allocator, now) {
                Ok(id) => summary.added.push(id),
                Err(HafalanError::DuplicateIdentifier(value)) => {
                    summary.duplicates.push(RejectedRow {
                        line: row.line,
                        reason: format!("duplicate identifier {}", value),
                    })
                }
                Err(err) => summary.invalid.push(RejectedRow {
                    line: row.line,
                    reason: err.to_string(),
                }),
            }
        }

        tracing::info!(
            added = summary.added.len(),
            duplicates = summary.duplicates.len(),
            invalid = summary.invalid.len(),
            "roster import finished"
        );
        summary
    }

    /// Change a student's name, class or external id.
    ///
    /// # Errors
    ///
    /// - `HafalanError::StudentNotFound` for an unknown id
    /// - `HafalanError::Validation` for an empty name or class
    /// - `HafalanError::DuplicateIdentifier` if another student has the
    ///   external id
    pub fn edit_student(
        &mut self,
        id: &StudentId,
        edit: StudentEdit,
        now: DateTime<Utc>,
    ) -> Result<&Student> {
        let name = edit.name.as_deref().map(|n| require_text(n, "Student name")).transpose()?;
        let class = edit.class.as_deref().map(|c| require_text(c, "Class")).transpose()?;
        let external_id = edit.external_id.map(|e| clean_optional(e.as_deref()));

        if self.get(id).is_none() {
            return Err(HafalanError::StudentNotFound(id.to_string()));
        }
        if let Some(Some(external)) = external_id.as_ref() {
            if self.external_id_taken(external, Some(id)) {
                return Err(HafalanError::DuplicateIdentifier(external.clone()));
            }
        }

        let student = self.get_mut(id)?;
        if let Some(name) = name {
            student.name = name;
        }
        if let Some(class) = class {
            student.class = class;
        }
        if let Some(external_id) = external_id {
            student.external_id = external_id;
        }
        student.last_modified = now;
        tracing::info!(student = %id, "student edited");
        Ok(&*student)
    }

    /// Apply a recitation: update the ledger, refresh the derived counter and
    /// timestamp, and append a log entry. Nothing changes on error.
    pub fn record(
        &mut self,
        recitation: Recitation,
        policy: OverwritePolicy,
        now: DateTime<Utc>,
    ) -> Result<RecordOutcome> {
        let curriculum = &self.curriculum;
        let student = self
            .students
            .iter_mut()
            .find(|s| s.id == recitation.student_id)
            .ok_or_else(|| HafalanError::StudentNotFound(recitation.student_id.to_string()))?;

        let previous_total = student.total_passed;
        let changed = student.record(
            curriculum,
            &recitation.chapter,
            recitation.verse_from,
            recitation.verse_to,
            recitation.status,
            policy,
            now,
        )?;
        let total_passed = student.total_passed;

        let entry = LogEntry {
            id: Uuid::new_v4(),
            recorded_at: now,
            student_id: recitation.student_id.clone(),
            chapter: recitation.chapter,
            verse_from: recitation.verse_from,
            verse_to: recitation.verse_to,
            status: recitation.status,
            recorder: clean_optional(recitation.recorder.as_deref()),
            note: clean_optional(recitation.note.as_deref()),
        };
        let log_entry_id = entry.id;
        self.log.append(entry);

        Ok(RecordOutcome {
            student_id: recitation.student_id,
            log_entry_id,
            changed,
            previous_total,
            total_passed,
        })
    }

    /// Remove a student and every log entry that references them.
    pub fn delete_student(&mut self, id: &StudentId) -> Result<Student> {
        let position = self
            .students
            .iter()
            .position(|s| &s.id == id)
            .ok_or_else(|| HafalanError::StudentNotFound(id.to_string()))?;
        let student = self.students.remove(position);
        let removed = self.log.remove_student(id);
        tracing::info!(student = %id, log_entries = removed, "student deleted");
        Ok(student)
    }

    /// Audit every ledger without changing anything.
    pub fn audit_all(&self) -> Vec<(StudentId, LedgerAudit)> {
        self.students
            .iter()
            .map(|s| (s.id.clone(), s.ledger().audit(&self.curriculum)))
            .filter(|(_, audit)| !audit.is_clean())
            .collect()
    }

    /// Repair every ledger in place. Returns the students that needed it.
    pub fn repair_all(&mut self) -> Vec<(StudentId, Recovery)> {
        let curriculum = &self.curriculum;
        let mut repaired = Vec::new();
        for student in &mut self.students {
            let mut ledger = student.ledger().clone();
            let audit = ledger.repair(curriculum);
            if !audit.is_clean() {
                student.replace_ledger(ledger, curriculum);
                repaired.push((student.id.clone(), Recovery::Repaired(audit)));
            }
        }
        if !repaired.is_empty() {
            tracing::warn!(students = repaired.len(), "ledgers repaired");
        }
        repaired
    }
}
