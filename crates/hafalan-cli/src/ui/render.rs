//! Rendering primitives for CLI output.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{CellAlignment, ContentArrangement, Table as ComfyTable};

use hafalan_core::VerseStatus;

use super::context::UiContext;
use super::mode::OutputMode;
use super::theme::{status_style, styled, styles, Badge};

/// Render a header line for a command.
///
/// Pretty mode: "Hafalan · command (context)"
/// Plain mode: "hafalan command"
pub fn header(ctx: &UiContext, command: &str, context: Option<&str>) -> String {
    match ctx.mode {
        OutputMode::Pretty => {
            let title = styled("Hafalan", styles::bold(), ctx.color);
            match context {
                Some(c) => format!("{} \u{00B7} {} ({})", title, command, c),
                None => format!("{} \u{00B7} {}", title, command),
            }
        }
        OutputMode::Plain => format!("hafalan {}", command),
        OutputMode::Json | OutputMode::Csv => String::new(),
    }
}

/// Render a badge with optional message.
pub fn badge(ctx: &UiContext, kind: Badge, message: &str) -> String {
    let colored_badge = styled(kind.display(ctx.unicode), kind.style(), ctx.color);
    if message.is_empty() {
        colored_badge
    } else {
        format!("{} {}", colored_badge, message)
    }
}

/// Render a key-value pair.
///
/// Pretty mode: "Key: value" with dim key
/// Plain mode: "key=value"
pub fn kv(ctx: &UiContext, key: &str, value: &str) -> String {
    if ctx.mode.is_pretty() {
        let styled_key = styled(&format!("{}:", key), styles::dim(), ctx.color);
        format!("{} {}", styled_key, value)
    } else {
        format!("{}={}", key.to_lowercase().replace(' ', "_"), value)
    }
}

/// Render a hint line.
pub fn hint(ctx: &UiContext, text: &str) -> String {
    if ctx.mode.is_pretty() {
        let label = styled("Hint:", styles::dim(), ctx.color);
        format!("{} {}", label, text)
    } else {
        format!("hint={}", text)
    }
}

/// Render a receipt (summary block after an action).
///
/// Pretty mode: Badge + indented key-value pairs
/// Plain mode: status=ok + key=value lines
pub fn receipt(ctx: &UiContext, title: &str, items: &[(&str, String)]) -> String {
    let mut lines = Vec::new();

    if ctx.mode.is_pretty() {
        lines.push(badge(ctx, Badge::Ok, title));
        for (key, value) in items {
            lines.push(format!("  {}", kv(ctx, key, value)));
        }
    } else {
        lines.push("status=ok".to_string());
        for (key, value) in items {
            lines.push(kv(ctx, key, value));
        }
    }

    lines.join("\n")
}

/// Status word, colored in pretty mode.
pub fn status_label(ctx: &UiContext, status: VerseStatus) -> String {
    if ctx.mode.is_pretty() {
        styled(status.as_str(), status_style(status), ctx.color)
    } else {
        status.as_str().to_string()
    }
}

/// Fixed-width bar for a percentage, e.g. `[####------]`.
pub fn progress_bar(ctx: &UiContext, percent: f64, width: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    let (on, off) = if ctx.unicode {
        ("\u{2588}", "\u{2591}")
    } else {
        ("#", "-")
    };
    let bar = format!("{}{}", on.repeat(filled), off.repeat(width - filled));
    styled(&bar, styles::green(), ctx.color)
}

/// Column definition for table rendering.
#[derive(Debug, Clone)]
pub struct Column {
    pub header: &'static str,
    pub numeric: bool,
}

impl Column {
    pub const fn new(header: &'static str) -> Self {
        Self {
            header,
            numeric: false,
        }
    }

    /// Right-aligned column.
    pub const fn numeric(header: &'static str) -> Self {
        Self {
            header,
            numeric: true,
        }
    }
}

/// Render a table using comfy-table for pretty mode.
///
/// Pretty mode: bordered table sized to the terminal
/// Plain mode: tab-separated values (no header)
pub fn table(ctx: &UiContext, columns: &[Column], rows: &[Vec<String>]) -> String {
    if ctx.mode.is_pretty() {
        let mut table = ComfyTable::new();

        if ctx.unicode {
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS);
        } else {
            table.load_preset(comfy_table::presets::ASCII_MARKDOWN);
        }
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_width(ctx.width.min(u16::MAX as usize) as u16);

        let headers: Vec<&str> = columns.iter().map(|c| c.header).collect();
        table.set_header(headers);

        for row in rows {
            table.add_row(row);
        }

        for (i, col) in columns.iter().enumerate() {
            if col.numeric {
                if let Some(column) = table.column_mut(i) {
                    column.set_cell_alignment(CellAlignment::Right);
                }
            }
        }

        table.to_string()
    } else {
        rows.iter()
            .map(|row| row.join("\t"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Print a message to stdout unless in JSON mode.
pub fn print(ctx: &UiContext, message: &str) {
    if !ctx.mode.is_json() && !message.is_empty() {
        println!("{}", message);
    }
}

/// Print an empty line (only in pretty mode).
pub fn blank_line(ctx: &UiContext) {
    if ctx.mode.is_pretty() {
        println!();
    }
}

/// Format an error message with optional hint.
///
/// Pretty mode: "[ERR] message" with optional "Hint: ..." on next line
/// Plain mode: "error=message" with optional "hint=suggestion"
pub fn error_message(ctx: &UiContext, message: &str, error_hint: Option<&str>) -> String {
    let mut lines = Vec::new();

    if ctx.mode.is_pretty() {
        lines.push(badge(ctx, Badge::Err, message));
        if let Some(h) = error_hint {
            lines.push(hint(ctx, h));
        }
    } else {
        lines.push(format!("error={}", message));
        if let Some(h) = error_hint {
            lines.push(format!("hint={}", h));
        }
    }

    lines.join("\n")
}

/// Print an error message to stderr with optional hint.
pub fn print_error(ctx: &UiContext, message: &str, error_hint: Option<&str>) {
    eprintln!("{}", error_message(ctx, message, error_hint));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_ctx() -> UiContext {
        UiContext {
            is_tty: false,
            can_prompt: false,
            color: false,
            unicode: false,
            width: 80,
            mode: OutputMode::Plain,
            timezone: None,
        }
    }

    fn pretty_ctx() -> UiContext {
        UiContext {
            is_tty: true,
            can_prompt: true,
            color: false,
            unicode: true,
            width: 80,
            mode: OutputMode::Pretty,
            timezone: None,
        }
    }

    #[test]
    fn test_header_modes() {
        let h = header(&pretty_ctx(), "leaderboard", Some("7A"));
        assert!(h.contains("Hafalan"));
        assert!(h.contains("(7A)"));
        assert_eq!(header(&plain_ctx(), "leaderboard", None), "hafalan leaderboard");
    }

    #[test]
    fn test_kv_plain_snake_cases_key() {
        assert_eq!(kv(&plain_ctx(), "Total Passed", "12"), "total_passed=12");
        assert_eq!(kv(&pretty_ctx(), "Class", "7A"), "Class: 7A");
    }

    #[test]
    fn test_receipt_plain() {
        let out = receipt(
            &plain_ctx(),
            "Recorded",
            &[("Student", "1001".to_string()), ("Changed", "4".to_string())],
        );
        assert_eq!(out, "status=ok\nstudent=1001\nchanged=4");
    }

    #[test]
    fn test_table_plain_is_tab_separated() {
        let columns = [Column::new("Name"), Column::numeric("Passed")];
        let rows = vec![
            vec!["Aisyah".to_string(), "12".to_string()],
            vec!["Bilal".to_string(), "3".to_string()],
        ];
        assert_eq!(table(&plain_ctx(), &columns, &rows), "Aisyah\t12\nBilal\t3");
    }

    #[test]
    fn test_table_pretty_has_headers() {
        let columns = [Column::new("Name"), Column::numeric("Passed")];
        let rows = vec![vec!["Aisyah".to_string(), "12".to_string()]];
        let out = table(&pretty_ctx(), &columns, &rows);
        assert!(out.contains("Name"));
        assert!(out.contains("Aisyah"));
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(&plain_ctx(), 50.0, 10), "#####-----");
        assert_eq!(progress_bar(&plain_ctx(), 140.0, 4), "####");
    }

    #[test]
    fn test_error_message_plain() {
        let out = error_message(&plain_ctx(), "Student not found: 9", Some("hafalan student list"));
        assert_eq!(out, "error=Student not found: 9\nhint=hafalan student list");
    }
}
