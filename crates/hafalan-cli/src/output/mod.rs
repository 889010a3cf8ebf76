//! Output formatting helpers for the CLI.
//!
//! JSON shapes for scripts, and the text/table views of students and the
//! recitation log.

mod json;
mod text;

pub use json::{log_entries_json, student_json, students_json};
pub use text::{print_log, print_student, print_student_list, verse_map};
