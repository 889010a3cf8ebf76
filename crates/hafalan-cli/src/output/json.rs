//! JSON output for students and log entries.

use hafalan_core::log::LogEntry;
use hafalan_core::report::chapter_breakdown;
use hafalan_core::{Curriculum, Student};

/// One decimal place, the way progress is shown everywhere else.
fn round_percent(percent: f64) -> f64 {
    (percent * 10.0).round() / 10.0
}

/// Summary fields for a student, without the ledger.
fn student_summary(student: &Student, curriculum: &Curriculum) -> serde_json::Value {
    serde_json::json!({
        "id": student.id,
        "name": student.name,
        "class": student.class,
        "external_id": student.external_id,
        "total_passed": student.total_passed,
        "percent": round_percent(student.progress_percent(curriculum)),
        "last_modified": student.last_modified,
    })
}

/// A student with the full ledger and per-chapter counts.
pub fn student_json(student: &Student, curriculum: &Curriculum) -> serde_json::Value {
    let mut value = student_summary(student, curriculum);
    value["ledger"] = serde_json::json!(student.ledger());
    value["chapters"] = serde_json::json!(chapter_breakdown(student, curriculum));
    value
}

pub fn students_json(students: &[&Student], curriculum: &Curriculum) -> Vec<serde_json::Value> {
    students
        .iter()
        .map(|student| student_summary(student, curriculum))
        .collect()
}

fn log_entry_json(entry: &LogEntry) -> serde_json::Value {
    serde_json::json!({
        "id": entry.id,
        "recorded_at": entry.recorded_at,
        "student_id": entry.student_id,
        "chapter": entry.chapter,
        "verse_from": entry.verse_from,
        "verse_to": entry.verse_to,
        "status": entry.status.as_str(),
        "recorder": entry.recorder,
        "note": entry.note,
    })
}

pub fn log_entries_json(entries: &[&LogEntry]) -> Vec<serde_json::Value> {
    entries.iter().map(|entry| log_entry_json(entry)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use hafalan_core::{StudentId, VerseStatus};
    use uuid::Uuid;

    #[test]
    fn test_log_entry_uses_status_label() {
        let entry = LogEntry {
            id: Uuid::nil(),
            recorded_at: Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
            student_id: StudentId::new("1001"),
            chapter: "An-Nas".to_string(),
            verse_from: 1,
            verse_to: 6,
            status: VerseStatus::Repeating,
            recorder: None,
            note: Some("ulang ayat 4".to_string()),
        };
        let value = log_entry_json(&entry);
        assert_eq!(value["status"], "repeating");
        assert_eq!(value["student_id"], "1001");
        assert_eq!(value["note"], "ulang ayat 4");
    }

    #[test]
    fn test_round_percent() {
        assert_eq!(round_percent(66.666), 66.7);
        assert_eq!(round_percent(0.0), 0.0);
    }
}
