use hafalan_core::report::{format_percent, leaderboard};

use crate::app::AppContext;
use crate::cli::LeaderboardArgs;
use crate::ui::{header, print, progress_bar, table, truncate, Column};

const NAME_MAX: usize = 32;

pub fn handle_leaderboard(ctx: &AppContext, args: &LeaderboardArgs) -> anyhow::Result<()> {
    let ui = ctx.ui(&args.output)?;
    let session = ctx.open_session()?;
    let class = args.class.as_deref().map(str::trim);

    let mut rows = leaderboard(&session.roster, class);
    if let Some(limit) = args.limit {
        rows.truncate(limit);
    }

    if ui.mode.is_json() {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    print(&ui, &header(&ui, "leaderboard", class));
    if rows.is_empty() {
        if ui.mode.is_pretty() {
            println!("No students.");
        }
        return Ok(());
    }

    let mut columns = vec![
        Column::numeric("#"),
        Column::new("ID"),
        Column::new("Name"),
        Column::new("Class"),
        Column::numeric("Passed"),
        Column::numeric("Progress"),
    ];
    if ui.mode.is_pretty() {
        columns.push(Column::new(""));
    }
    let table_rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            let mut cells = vec![
                row.rank.to_string(),
                row.student_id.to_string(),
                if ui.mode.is_pretty() {
                    truncate(&row.name, NAME_MAX)
                } else {
                    row.name.clone()
                },
                row.class.clone(),
                row.total_passed.to_string(),
                format_percent(row.percent),
            ];
            if ui.mode.is_pretty() {
                cells.push(progress_bar(&ui, row.percent, 12));
            }
            cells
        })
        .collect();
    println!("{}", table(&ui, &columns, &table_rows));
    Ok(())
}
