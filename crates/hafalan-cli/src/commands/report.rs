use std::path::Path;

use hafalan_core::fs::write_atomic;
use hafalan_core::report::{class_report, format_percent, report_csv, ReportRow};

use crate::app::{parse_format, AppContext};
use crate::cli::ReportArgs;
use crate::ui::{header, kv, print, receipt, single_line, table, truncate, Column, UiContext};

const NOTE_MAX: usize = 36;

fn average_percent(rows: &[ReportRow]) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    rows.iter().map(|r| r.percent).sum::<f64>() / rows.len() as f64
}

fn print_table(ui: &UiContext, rows: &[ReportRow]) {
    let columns = [
        Column::new("ID"),
        Column::new("Name"),
        Column::new("Class"),
        Column::new("NIS"),
        Column::numeric("Chapters"),
        Column::numeric("Completed"),
        Column::numeric("Passed"),
        Column::numeric("Progress"),
        Column::new("Latest note"),
    ];
    let table_rows: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            let note = single_line(&r.latest_note);
            vec![
                r.student_id.to_string(),
                r.name.clone(),
                r.class.clone(),
                r.external_id.clone().unwrap_or_else(|| "-".to_string()),
                format!("{}/{}", r.chapters_started, r.chapter_count),
                r.chapters_completed.to_string(),
                r.total_passed.to_string(),
                format_percent(r.percent),
                if ui.mode.is_pretty() {
                    truncate(&note, NOTE_MAX)
                } else {
                    note
                },
            ]
        })
        .collect();
    println!("{}", table(ui, &columns, &table_rows));
}

pub fn handle_report(ctx: &AppContext, args: &ReportArgs) -> anyhow::Result<()> {
    let format = parse_format(args.format.as_deref())?;
    let ui = ctx.ui_with_format(args.json, format)?;
    let session = ctx.open_session()?;
    let class = args.class.as_deref().map(str::trim);
    let rows = class_report(&session.roster, class);

    if let Some(path) = args.output.as_deref() {
        write_atomic(Path::new(path), report_csv(&rows).as_bytes())?;
        tracing::info!(path, rows = rows.len(), "report written");
        if !ctx.quiet() && !ui.mode.is_json() && !ui.mode.is_csv() {
            print(
                &ui,
                &receipt(
                    &ui,
                    "Report written",
                    &[("File", path.to_string()), ("Students", rows.len().to_string())],
                ),
            );
        }
        return Ok(());
    }

    if ui.mode.is_json() {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    if ui.mode.is_csv() {
        print!("{}", report_csv(&rows));
        return Ok(());
    }

    print(&ui, &header(&ui, "report", class));
    if rows.is_empty() {
        if ui.mode.is_pretty() {
            println!("No students.");
        }
        return Ok(());
    }
    print_table(&ui, &rows);
    if ui.mode.is_pretty() {
        println!(
            "{}",
            kv(&ui, "Class average", &format_percent(average_percent(&rows)))
        );
    }
    Ok(())
}
