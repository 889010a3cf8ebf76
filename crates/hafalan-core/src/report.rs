//! Read-only views over a roster: leaderboards, per-chapter breakdowns and
//! class reports.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::curriculum::Curriculum;
use crate::delimited;
use crate::ledger::ChapterProgress;
use crate::roster::Roster;
use crate::student::{Student, StudentId};

/// One leaderboard line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardRow {
    /// 1-based position
    pub rank: usize,
    pub student_id: StudentId,
    pub name: String,
    pub class: String,
    pub external_id: Option<String>,
    pub total_passed: usize,
    pub percent: f64,
    pub last_modified: DateTime<Utc>,
}

/// One line of a class report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub student_id: StudentId,
    pub name: String,
    pub class: String,
    pub external_id: Option<String>,

    /// Chapters with at least one passed or repeating verse
    pub chapters_started: usize,

    /// Chapters with every verse passed
    pub chapters_completed: usize,

    pub chapter_count: usize,
    pub total_passed: usize,
    pub percent: f64,

    /// Most recent log note, `-` when there is none
    pub latest_note: String,
}

fn by_progress(a: &Student, b: &Student) -> Ordering {
    b.total_passed
        .cmp(&a.total_passed)
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.id.cmp(&b.id))
}

fn ranked<'a>(roster: &'a Roster, class: Option<&str>) -> Vec<&'a Student> {
    let mut students: Vec<&Student> = roster
        .students()
        .iter()
        .filter(|s| class.map_or(true, |c| s.class == c))
        .collect();
    students.sort_by(|a, b| by_progress(a, b));
    students
}

/// Students ordered by passed verses (descending), then name.
pub fn leaderboard(roster: &Roster, class: Option<&str>) -> Vec<LeaderboardRow> {
    let curriculum = roster.curriculum();
    ranked(roster, class)
        .into_iter()
        .enumerate()
        .map(|(index, student)| LeaderboardRow {
            rank: index + 1,
            student_id: student.id.clone(),
            name: student.name.clone(),
            class: student.class.clone(),
            external_id: student.external_id.clone(),
            total_passed: student.total_passed,
            percent: student.progress_percent(curriculum),
            last_modified: student.last_modified,
        })
        .collect()
}

/// Per-chapter counts in curriculum order. A chapter absent from the ledger
/// reports every verse as not done.
pub fn chapter_breakdown(student: &Student, curriculum: &Curriculum) -> Vec<ChapterProgress> {
    curriculum
        .chapters()
        .iter()
        .map(|chapter| {
            student
                .ledger()
                .chapter_summary(&chapter.name)
                .filter(|summary| summary.total == chapter.verse_count)
                .unwrap_or_else(|| ChapterProgress {
                    chapter: chapter.name.clone(),
                    total: chapter.verse_count,
                    passed: 0,
                    repeating: 0,
                    not_done: chapter.verse_count,
                })
        })
        .collect()
}

fn report_row(roster: &Roster, student: &Student) -> ReportRow {
    let curriculum = roster.curriculum();
    let breakdown = chapter_breakdown(student, curriculum);
    ReportRow {
        student_id: student.id.clone(),
        name: student.name.clone(),
        class: student.class.clone(),
        external_id: student.external_id.clone(),
        chapters_started: breakdown.iter().filter(|c| c.is_started()).count(),
        chapters_completed: breakdown.iter().filter(|c| c.is_complete()).count(),
        chapter_count: curriculum.len(),
        total_passed: student.total_passed,
        percent: student.progress_percent(curriculum),
        latest_note: roster
            .log()
            .latest_note(&student.id)
            .unwrap_or("-")
            .to_string(),
    }
}

/// Report rows for one class, or every class when `class` is `None`,
/// in leaderboard order.
pub fn class_report(roster: &Roster, class: Option<&str>) -> Vec<ReportRow> {
    ranked(roster, class)
        .into_iter()
        .map(|student| report_row(roster, student))
        .collect()
}

/// Percentage with one decimal and a `%` sign.
pub fn format_percent(percent: f64) -> String {
    format!("{:.1}%", percent)
}

/// CSV export of report rows, header included.
pub fn report_csv(rows: &[ReportRow]) -> String {
    let header = [
        "student_id",
        "name",
        "class",
        "external_id",
        "chapters_started",
        "chapters_completed",
        "total_passed",
        "percent",
        "latest_note",
    ];
    let mut out = delimited::write_record(&header[..], ',');
    out.push('\n');
    for row in rows {
        let fields = [
            row.student_id.to_string(),
            row.name.clone(),
            row.class.clone(),
            row.external_id.clone().unwrap_or_default(),
            row.chapters_started.to_string(),
            row.chapters_completed.to_string(),
            row.total_passed.to_string(),
            format!("{:.1}", row.percent),
            row.latest_note.clone(),
        ];
        out.push_str(&delimited::write_record(&fields[..], ','));
        out.push('\n');
    }
    out
}
