use hafalan_core::import::parse_roster;
use hafalan_core::log::LogFilter;
use hafalan_core::{NewStudent, Student, StudentEdit};

use crate::app::AppContext;
use crate::cli::{
    StudentAddArgs, StudentDeleteArgs, StudentEditArgs, StudentImportArgs, StudentListArgs,
};
use crate::errors::CliError;
use crate::helpers::{confirm, resolve_student};
use crate::output::{print_student_list, students_json};
use crate::ui::{badge, print, receipt, Badge};

pub fn handle_student_add(ctx: &AppContext, args: &StudentAddArgs) -> anyhow::Result<()> {
    let ui = ctx.ui(&args.output)?;
    let mut session = ctx.open_session()?;
    let allocator = ctx.allocator()?;

    let mut new = NewStudent::new(&args.name, &args.class);
    if let Some(external_id) = args.external_id.as_deref() {
        new = new.with_external_id(external_id);
    }
    let id = session
        .roster
        .add_student(new, allocator.as_ref(), ctx.now())?;
    session.save()?;

    if ui.mode.is_json() {
        let student = session.roster.get(&id);
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "id": id,
                "name": student.map(|s| s.name.as_str()),
                "class": student.map(|s| s.class.as_str()),
                "external_id": student.and_then(|s| s.external_id.as_deref()),
            }))?
        );
    } else if !ctx.quiet() {
        print(
            &ui,
            &receipt(
                &ui,
                "Student added",
                &[
                    ("ID", id.to_string()),
                    ("Name", args.name.trim().to_string()),
                    ("Class", args.class.trim().to_string()),
                ],
            ),
        );
    }
    Ok(())
}

pub fn handle_student_list(ctx: &AppContext, args: &StudentListArgs) -> anyhow::Result<()> {
    let ui = ctx.ui(&args.output)?;
    let session = ctx.open_session()?;
    let roster = &session.roster;

    let students: Vec<&Student> = match args.class.as_deref() {
        Some(class) => roster.in_class(class.trim()),
        None => roster.students().iter().collect(),
    };

    if ui.mode.is_json() {
        let value = students_json(&students, roster.curriculum());
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print_student_list(&ui, &students, roster.curriculum());
    }
    Ok(())
}

pub fn handle_student_edit(ctx: &AppContext, args: &StudentEditArgs) -> anyhow::Result<()> {
    let edit = StudentEdit {
        name: args.name.clone(),
        class: args.class.clone(),
        external_id: if args.clear_external_id {
            Some(None)
        } else {
            args.external_id.clone().map(Some)
        },
    };
    if edit.is_empty() {
        return Err(CliError::invalid_input("Nothing to change")
            .with_hint("Pass --name, --class, --external-id or --clear-external-id.")
            .into());
    }

    let ui = ctx.ui_with_format(false, None)?;
    let mut session = ctx.open_session()?;
    let id = resolve_student(&session.roster, &args.student)?;
    let student = session.roster.edit_student(&id, edit, ctx.now())?;
    let items = [
        ("ID", student.id.to_string()),
        ("Name", student.name.clone()),
        ("Class", student.class.clone()),
        (
            "NIS",
            student.external_id.clone().unwrap_or_else(|| "-".to_string()),
        ),
    ];
    session.save()?;

    if !ctx.quiet() {
        print(&ui, &receipt(&ui, "Student updated", &items));
    }
    Ok(())
}

pub fn handle_student_delete(ctx: &AppContext, args: &StudentDeleteArgs) -> anyhow::Result<()> {
    let ui = ctx.ui_with_format(false, None)?;
    let mut session = ctx.open_session()?;
    let id = resolve_student(&session.roster, &args.student)?;
    let log_entries = session
        .roster
        .log()
        .query(&LogFilter::new().student(id.clone()))
        .len();

    if !args.yes {
        if !ui.is_interactive() {
            return Err(
                CliError::invalid_input("Refusing to delete without confirmation")
                    .with_hint("Pass --yes to delete non-interactively.")
                    .into(),
            );
        }
        let name = session
            .roster
            .get(&id)
            .map(|s| s.name.clone())
            .unwrap_or_default();
        let prompt = format!(
            "Delete {} ({}) and {} log entries?",
            name, id, log_entries
        );
        if !confirm(&prompt)? {
            print(&ui, "Cancelled.");
            return Ok(());
        }
    }

    let removed = session.roster.delete_student(&id)?;
    session.save()?;

    if !ctx.quiet() {
        print(
            &ui,
            &receipt(
                &ui,
                "Student deleted",
                &[
                    ("ID", removed.id.to_string()),
                    ("Name", removed.name),
                    ("Log entries", log_entries.to_string()),
                ],
            ),
        );
    }
    Ok(())
}

pub fn handle_student_import(ctx: &AppContext, args: &StudentImportArgs) -> anyhow::Result<()> {
    let ui = ctx.ui(&args.output)?;
    let text = std::fs::read_to_string(&args.file)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", args.file, e))?;
    let batch = parse_roster(&text)?;

    let mut session = ctx.open_session()?;
    let allocator = ctx.allocator()?;
    let summary = session
        .roster
        .import(&batch, allocator.as_ref(), ctx.now());
    if !args.dry_run && !summary.added.is_empty() {
        session.save()?;
    }

    if ui.mode.is_json() {
        let mut value = serde_json::to_value(&summary)?;
        value["dry_run"] = serde_json::json!(args.dry_run);
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }
    if ctx.quiet() {
        return Ok(());
    }

    let title = if args.dry_run {
        "Import checked (dry run, nothing saved)"
    } else {
        "Import finished"
    };
    print(
        &ui,
        &receipt(
            &ui,
            title,
            &[
                ("Added", summary.added.len().to_string()),
                ("Duplicates", summary.duplicates.len().to_string()),
                ("Invalid", summary.invalid.len().to_string()),
            ],
        ),
    );
    for row in summary.duplicates.iter().chain(summary.invalid.iter()) {
        let message = format!("line {}: {}", row.line, row.reason);
        if ui.mode.is_pretty() {
            eprintln!("{}", badge(&ui, Badge::Warn, &message));
        } else {
            eprintln!("skipped={}", message);
        }
    }
    Ok(())
}
