use hafalan_core::report::format_percent;

use crate::app::AppContext;
use crate::cli::ChaptersArgs;
use crate::ui::{header, kv, print, table, Column};

pub fn handle_chapters(ctx: &AppContext, args: &ChaptersArgs) -> anyhow::Result<()> {
    let curriculum = ctx.curriculum()?;
    let ui = ctx.ui(&args.output)?;

    if ui.mode.is_json() {
        println!("{}", serde_json::to_string_pretty(curriculum.chapters())?);
        return Ok(());
    }

    print(&ui, &header(&ui, "chapters", Some(&curriculum.len().to_string())));
    let total = curriculum.total_verses();
    let columns = [
        Column::numeric("No."),
        Column::new("Chapter"),
        Column::numeric("Verses"),
        Column::numeric("Share"),
    ];
    let rows: Vec<Vec<String>> = curriculum
        .chapters()
        .iter()
        .map(|c| {
            vec![
                c.number.to_string(),
                c.name.clone(),
                c.verse_count.to_string(),
                format_percent(c.verse_count as f64 / total as f64 * 100.0),
            ]
        })
        .collect();
    println!("{}", table(&ui, &columns, &rows));
    if ui.mode.is_pretty() {
        println!("{}", kv(&ui, "Total verses", &total.to_string()));
    }
    Ok(())
}
