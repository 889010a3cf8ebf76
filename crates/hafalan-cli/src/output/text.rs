//! Text and table output for students and the recitation log.

use hafalan_core::log::LogEntry;
use hafalan_core::report::{chapter_breakdown, format_percent};
use hafalan_core::{Curriculum, Roster, Student, VerseStatus};

use crate::ui::theme::{status_style, status_symbol, styled};
use crate::ui::{
    blank_line, format_datetime, header, kv, print, progress_bar, single_line, status_label,
    table, truncate, Column, UiContext,
};

const NOTE_MAX: usize = 40;
const MAP_MAX: usize = 40;

/// One symbol per verse, colored by status.
pub fn verse_map(ui: &UiContext, statuses: &[VerseStatus]) -> String {
    statuses
        .iter()
        .map(|status| {
            styled(
                status_symbol(*status).get(ui.unicode),
                status_style(*status),
                ui.color,
            )
        })
        .collect()
}

pub fn print_student_list(ui: &UiContext, students: &[&Student], curriculum: &Curriculum) {
    print(ui, &header(ui, "students", Some(&students.len().to_string())));
    if students.is_empty() {
        if ui.mode.is_pretty() {
            println!("No students.");
        }
        return;
    }

    let columns = [
        Column::new("ID"),
        Column::new("Name"),
        Column::new("Class"),
        Column::new("NIS"),
        Column::numeric("Passed"),
        Column::numeric("Progress"),
        Column::new("Updated"),
    ];
    let rows: Vec<Vec<String>> = students
        .iter()
        .map(|s| {
            vec![
                s.id.to_string(),
                s.name.clone(),
                s.class.clone(),
                s.external_id.clone().unwrap_or_else(|| "-".to_string()),
                s.total_passed.to_string(),
                format_percent(s.progress_percent(curriculum)),
                format_datetime(&s.last_modified, ui.timezone, ui.mode.is_pretty()),
            ]
        })
        .collect();
    println!("{}", table(ui, &columns, &rows));
}

/// Profile, progress and the per-chapter breakdown. Chapters with nothing
/// recorded are skipped unless `show_all`.
pub fn print_student(ui: &UiContext, student: &Student, curriculum: &Curriculum, show_all: bool) {
    let percent = student.progress_percent(curriculum);
    print(ui, &header(ui, "show", Some(&student.name)));
    let mut lines = vec![
        kv(ui, "ID", student.id.as_str()),
        kv(ui, "Name", &student.name),
        kv(ui, "Class", &student.class),
        kv(ui, "NIS", student.external_id.as_deref().unwrap_or("-")),
        kv(
            ui,
            "Passed",
            &format!("{} / {}", student.total_passed, curriculum.total_verses()),
        ),
    ];
    if ui.mode.is_pretty() {
        lines.push(kv(
            ui,
            "Progress",
            &format!("{} {}", progress_bar(ui, percent, 20), format_percent(percent)),
        ));
    } else {
        lines.push(kv(ui, "Progress", &format!("{:.1}", percent)));
    }
    lines.push(kv(
        ui,
        "Updated",
        &format_datetime(&student.last_modified, ui.timezone, ui.mode.is_pretty()),
    ));
    println!("{}", lines.join("\n"));

    let breakdown: Vec<_> = chapter_breakdown(student, curriculum)
        .into_iter()
        .filter(|c| show_all || c.is_started())
        .collect();
    blank_line(ui);
    if breakdown.is_empty() {
        if ui.mode.is_pretty() {
            println!("Nothing recorded yet.");
        }
        return;
    }

    let columns = [
        Column::new("Chapter"),
        Column::numeric("Verses"),
        Column::numeric("Passed"),
        Column::numeric("Repeating"),
        Column::numeric("Not done"),
        Column::new("Map"),
    ];
    let rows: Vec<Vec<String>> = breakdown
        .iter()
        .map(|c| {
            let statuses = student
                .ledger()
                .chapter_statuses(&c.chapter)
                .filter(|s| s.len() == c.total)
                .map(|s| s.to_vec())
                .unwrap_or_else(|| vec![VerseStatus::NotDone; c.total]);
            let map = if statuses.len() > MAP_MAX {
                format!(
                    "{}{}",
                    verse_map(ui, &statuses[..MAP_MAX]),
                    if ui.unicode { "\u{2026}" } else { "..." }
                )
            } else {
                verse_map(ui, &statuses)
            };
            vec![
                c.chapter.clone(),
                c.total.to_string(),
                c.passed.to_string(),
                c.repeating.to_string(),
                c.not_done.to_string(),
                map,
            ]
        })
        .collect();
    println!("{}", table(ui, &columns, &rows));
}

/// Log entries, newest first, with student names looked up in `roster`.
pub fn print_log(ui: &UiContext, entries: &[&LogEntry], roster: &Roster) {
    print(ui, &header(ui, "log", Some(&entries.len().to_string())));
    if entries.is_empty() {
        if ui.mode.is_pretty() {
            println!("No recitations recorded.");
        }
        return;
    }

    let columns = [
        Column::new("When"),
        Column::new("Student"),
        Column::new("Chapter"),
        Column::new("Verses"),
        Column::new("Status"),
        Column::new("Recorder"),
        Column::new("Note"),
    ];
    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|e| {
            let student = roster
                .get(&e.student_id)
                .map(|s| s.name.clone())
                .unwrap_or_else(|| e.student_id.to_string());
            let note = e.note.as_deref().map(single_line).unwrap_or_default();
            vec![
                format_datetime(&e.recorded_at, ui.timezone, ui.mode.is_pretty()),
                if ui.mode.is_pretty() {
                    student
                } else {
                    e.student_id.to_string()
                },
                e.chapter.clone(),
                e.range_label(),
                status_label(ui, e.status),
                e.recorder.clone().unwrap_or_else(|| "-".to_string()),
                if ui.mode.is_pretty() {
                    truncate(&note, NOTE_MAX)
                } else {
                    note
                },
            ]
        })
        .collect();
    println!("{}", table(ui, &columns, &rows));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::OutputMode;

    #[test]
    fn test_verse_map_ascii() {
        let ui = UiContext {
            is_tty: false,
            can_prompt: false,
            color: false,
            unicode: false,
            width: 80,
            mode: OutputMode::Plain,
            timezone: None,
        };
        let map = verse_map(
            &ui,
            &[
                VerseStatus::Passed,
                VerseStatus::Repeating,
                VerseStatus::NotDone,
                VerseStatus::Passed,
            ],
        );
        assert_eq!(map, "+~.+");
    }
}
