//! Command handlers, one module per subcommand group.

mod chapters;
mod check;
mod completions;
mod init;
mod leaderboard;
mod log;
mod record;
mod report;
mod show;
mod students;
mod summary;

pub use chapters::handle_chapters;
pub use check::handle_check;
pub use completions::handle_completions;
pub use init::handle_init;
pub use leaderboard::handle_leaderboard;
pub use log::handle_log;
pub use record::handle_record;
pub use report::handle_report;
pub use show::handle_show;
pub use students::{
    handle_student_add, handle_student_delete, handle_student_edit, handle_student_import,
    handle_student_list,
};
pub use summary::handle_summary;
