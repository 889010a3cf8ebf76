use hafalan_core::{Recitation, VerseStatus};

use crate::app::AppContext;
use crate::cli::RecordArgs;
use crate::helpers::{parse_verse_range, resolve_chapter, resolve_student};
use crate::ui::{hint, print, receipt, status_label};

pub fn handle_record(ctx: &AppContext, args: &RecordArgs) -> anyhow::Result<()> {
    let ui = ctx.ui(&args.output)?;
    let policy = ctx.overwrite_policy(args.overwrite.as_deref())?;
    let status: VerseStatus = args.status.parse()?;
    let (verse_from, verse_to) = parse_verse_range(&args.verses)?;

    let mut session = ctx.open_session()?;
    let student_id = resolve_student(&session.roster, &args.student)?;
    let chapter = resolve_chapter(session.roster.curriculum(), &args.chapter)?;
    let recorder = match args.recorder.clone() {
        Some(recorder) => Some(recorder),
        None => ctx.default_recorder()?,
    };

    let outcome = session.roster.record(
        Recitation {
            student_id,
            chapter: chapter.clone(),
            verse_from,
            verse_to,
            status,
            recorder,
            note: args.note.clone(),
        },
        policy,
        ctx.now(),
    )?;
    session.save()?;

    if ui.mode.is_json() {
        let mut value = serde_json::to_value(&outcome)?;
        value["chapter"] = serde_json::json!(chapter);
        value["verse_from"] = serde_json::json!(verse_from);
        value["verse_to"] = serde_json::json!(verse_to);
        value["status"] = serde_json::json!(status.as_str());
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }
    if ctx.quiet() {
        return Ok(());
    }

    let verses = if verse_from == verse_to {
        verse_from.to_string()
    } else {
        format!("{}-{}", verse_from, verse_to)
    };
    print(
        &ui,
        &receipt(
            &ui,
            "Recitation recorded",
            &[
                ("Student", outcome.student_id.to_string()),
                ("Chapter", chapter),
                ("Verses", verses),
                ("Status", status_label(&ui, status)),
                ("Changed", outcome.changed.to_string()),
                ("Total passed", outcome.total_passed.to_string()),
            ],
        ),
    );
    if outcome.changed == 0 {
        print(
            &ui,
            &hint(&ui, "No verse changed; the range already had this status or was kept."),
        );
    }
    Ok(())
}
