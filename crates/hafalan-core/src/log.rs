//! Append-only recitation log.
//!
//! One entry per successful ledger update. Entries are never mutated; the
//! only removal is when their student is deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::status::VerseStatus;
use crate::student::StudentId;

/// A single recorded recitation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Unique identifier for this entry
    pub id: Uuid,

    /// When the recitation was recorded
    pub recorded_at: DateTime<Utc>,

    /// Student the update applied to
    pub student_id: StudentId,

    /// Chapter name
    pub chapter: String,

    /// First verse of the range (1-based)
    pub verse_from: usize,

    /// Last verse of the range (inclusive)
    pub verse_to: usize,

    /// Status written to the range
    pub status: VerseStatus,

    /// Who recorded it (free text, not validated)
    pub recorder: Option<String>,

    /// Teacher's note
    pub note: Option<String>,
}

impl LogEntry {
    /// Verse range as `from-to`, or a single number.
    pub fn range_label(&self) -> String {
        if self.verse_from == self.verse_to {
            self.verse_from.to_string()
        } else {
            format!("{}-{}", self.verse_from, self.verse_to)
        }
    }
}

/// Filter for querying the log.
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub student_id: Option<StudentId>,
    pub chapter: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

impl LogFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn student(mut self, id: StudentId) -> Self {
        self.student_id = Some(id);
        self
    }

    pub fn chapter(mut self, chapter: impl Into<String>) -> Self {
        self.chapter = Some(chapter.into());
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `entry` passes the student, chapter and since conditions. The
    /// limit is not applied here.
    pub fn matches(&self, entry: &LogEntry) -> bool {
        self.student_id
            .as_ref()
            .map_or(true, |id| &entry.student_id == id)
            && self
                .chapter
                .as_ref()
                .map_or(true, |chapter| &entry.chapter == chapter)
            && self.since.map_or(true, |since| entry.recorded_at >= since)
    }
}

/// The log as stored: entries in append order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecitationLog {
    entries: Vec<LogEntry>,
}

impl RecitationLog {
    pub fn from_entries(entries: Vec<LogEntry>) -> Self {
        Self { entries }
    }

    pub fn append(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    /// Entries in append order.
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Matching entries, newest first.
    pub fn query(&self, filter: &LogFilter) -> Vec<&LogEntry> {
        let mut matched: Vec<&LogEntry> = self.entries.iter().filter(|e| filter.matches(e)).collect();
        matched.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        if let Some(limit) = filter.limit {
            matched.truncate(limit);
        }
        matched
    }

    /// Most recent non-empty note for a student.
    pub fn latest_note(&self, student_id: &StudentId) -> Option<&str> {
        self.entries
            .iter()
            .filter(|e| &e.student_id == student_id)
            .filter_map(|e| {
                e.note
                    .as_deref()
                    .filter(|n| !n.trim().is_empty())
                    .map(|n| (e.recorded_at, n))
            })
            .max_by_key(|(at, _)| *at)
            .map(|(_, note)| note)
    }

    /// Drop every entry for `student_id`. Returns how many were removed.
    pub fn remove_student(&mut self, student_id: &StudentId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| &e.student_id != student_id);
        before - self.entries.len()
    }

    pub fn into_entries(self) -> Vec<LogEntry> {
        self.entries
    }
}
