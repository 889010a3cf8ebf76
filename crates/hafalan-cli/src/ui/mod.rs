//! UI primitives for the Hafalan CLI.
//!
//! This module provides:
//! - **Context**: Environment detection (TTY, width, color, unicode)
//! - **Mode**: Output mode resolution (json, plain, pretty, csv)
//! - **Theme**: Badges, status colors and symbols
//! - **Render**: Tables, headers, receipts, hints, progress bars
//! - **Format**: String and timestamp utilities
//!
//! # Usage
//!
//! ```ignore
//! use crate::ui::{UiContext, Column};
//! use crate::ui::render::{header, table};
//!
//! let ui = ctx.ui(&args.output)?;
//! if ui.mode.is_json() {
//!     // Handle JSON output separately
//!     return Ok(());
//! }
//!
//! println!("{}", header(&ui, "leaderboard", Some("7A")));
//! println!("{}", table(&ui, &columns, &rows));
//! ```

mod context;
pub mod format;
mod mode;
pub mod render;
pub mod theme;

pub use context::UiContext;
pub use mode::{OutputFormat, OutputMode};
pub use theme::Badge;

pub use render::{
    badge, blank_line, header, hint, kv, print, print_error, progress_bar, receipt, status_label,
    table, Column,
};

pub use format::{format_datetime, single_line, truncate};
