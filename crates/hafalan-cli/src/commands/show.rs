use hafalan_core::report::format_percent;
use hafalan_core::VerseStatus;

use crate::app::AppContext;
use crate::cli::ShowArgs;
use crate::errors::CliError;
use crate::helpers::{pick_student, resolve_chapter, resolve_student};
use crate::output::{print_student, student_json, verse_map};
use crate::ui::{header, kv, print, status_label, table, Column};

pub fn handle_show(ctx: &AppContext, args: &ShowArgs) -> anyhow::Result<()> {
    let ui = ctx.ui(&args.output)?;
    let session = ctx.open_session()?;
    let roster = &session.roster;

    let id = match args.student.as_deref() {
        Some(query) => resolve_student(roster, query)?,
        None if ui.is_interactive() && !ui.mode.is_json() => pick_student(roster)?,
        None => {
            return Err(CliError::invalid_input("No student given")
                .with_hint("Run `hafalan show STUDENT` with an id or external id.")
                .into())
        }
    };
    let student = roster.find(id.as_str())?;
    let curriculum = roster.curriculum();

    let Some(chapter_query) = args.chapter.as_deref() else {
        if ui.mode.is_json() {
            let value = student_json(student, curriculum);
            println!("{}", serde_json::to_string_pretty(&value)?);
        } else {
            print_student(&ui, student, curriculum, args.all);
        }
        return Ok(());
    };

    let chapter = resolve_chapter(curriculum, chapter_query)?;
    let verse_count = curriculum.verse_count(&chapter).unwrap_or_default();
    let statuses: Vec<VerseStatus> = student
        .ledger()
        .chapter_statuses(&chapter)
        .filter(|s| s.len() == verse_count)
        .map(|s| s.to_vec())
        .unwrap_or_else(|| vec![VerseStatus::NotDone; verse_count]);
    let segments = student.ledger().segments(&chapter);

    if ui.mode.is_json() {
        let verses: Vec<_> = statuses
            .iter()
            .enumerate()
            .map(|(i, status)| serde_json::json!({ "verse": i + 1, "status": status.as_str() }))
            .collect();
        let runs: Vec<_> = segments
            .iter()
            .map(|seg| {
                serde_json::json!({ "from": seg.from, "to": seg.to, "status": seg.status.as_str() })
            })
            .collect();
        let value = serde_json::json!({
            "student_id": student.id,
            "chapter": chapter,
            "verses": verses,
            "segments": runs,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let passed = statuses.iter().filter(|s| s.is_passed()).count();
    print(&ui, &header(&ui, "show", Some(&format!("{} \u{00B7} {}", student.name, chapter))));
    print(
        &ui,
        &kv(
            &ui,
            "Passed",
            &format!(
                "{} / {} ({})",
                passed,
                verse_count,
                format_percent(passed as f64 / verse_count.max(1) as f64 * 100.0)
            ),
        ),
    );
    print(&ui, &kv(&ui, "Map", &verse_map(&ui, &statuses)));

    let columns = [
        Column::new("Verses"),
        Column::new("Status"),
        Column::numeric("Count"),
    ];
    let rows: Vec<Vec<String>> = segments
        .iter()
        .map(|segment| {
            let range = if segment.from == segment.to {
                segment.from.to_string()
            } else {
                format!("{}-{}", segment.from, segment.to)
            };
            vec![
                range,
                status_label(&ui, segment.status),
                (segment.to - segment.from + 1).to_string(),
            ]
        })
        .collect();
    println!("{}", table(&ui, &columns, &rows));
    Ok(())
}
