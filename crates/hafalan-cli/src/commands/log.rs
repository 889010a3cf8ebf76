use hafalan_core::log::{LogEntry, LogFilter};

use crate::app::AppContext;
use crate::cli::LogArgs;
use crate::constants::DEFAULT_LOG_LIMIT;
use crate::helpers::{resolve_chapter, resolve_student};
use crate::output::{log_entries_json, print_log};
use crate::ui::format::parse_datetime;

pub fn handle_log(ctx: &AppContext, args: &LogArgs) -> anyhow::Result<()> {
    let ui = ctx.ui(&args.output)?;
    let session = ctx.open_session()?;
    let roster = &session.roster;

    let mut filter = LogFilter::new();
    if let Some(query) = args.student.as_deref() {
        filter = filter.student(resolve_student(roster, query)?);
    }
    if let Some(query) = args.chapter.as_deref() {
        filter = filter.chapter(resolve_chapter(roster.curriculum(), query)?);
    }
    if let Some(value) = args.since.as_deref() {
        filter = filter.since(parse_datetime(value, ui.timezone)?);
    }
    let limit = match args.limit {
        Some(limit) => Some(limit),
        None if args.since.is_none() => Some(DEFAULT_LOG_LIMIT),
        None => None,
    };

    let entries: Vec<&LogEntry> = match args.class.as_deref() {
        Some(class) => {
            let mut entries: Vec<&LogEntry> = roster
                .log_for_class(class.trim(), None)
                .into_iter()
                .filter(|e| filter.matches(e))
                .collect();
            if let Some(limit) = limit {
                entries.truncate(limit);
            }
            entries
        }
        None => {
            if let Some(limit) = limit {
                filter = filter.limit(limit);
            }
            roster.log().query(&filter)
        }
    };

    if ui.mode.is_json() {
        println!("{}", serde_json::to_string_pretty(&log_entries_json(&entries))?);
    } else {
        print_log(&ui, &entries, roster);
    }
    Ok(())
}
