//! # Hafalan Core
//!
//! Core library for Hafalan - a record book for Quran memorization progress
//! (verse-by-verse pass/repeat status) across classes of students.
//!
//! This crate provides the domain logic, storage abstractions, and data models
//! independent of the CLI interface.
//!
//! ## Architecture
//!
//! - **curriculum**: Ordered chapter reference data (Juz Amma built in)
//! - **delimited**: Quoted delimited-text reading and writing
//! - **status**: The per-verse status enumeration and its storage codes
//! - **ledger**: The verse-status ledger (range updates, tallies, repair, encoding)
//! - **student**: Student records owning one ledger each
//! - **identity**: Pluggable student id allocation
//! - **import**: Delimited roster parsing for bulk import
//! - **log**: Append-only recitation log
//! - **store**: Full-table storage trait and its CSV, SQLite and memory backends
//! - **roster**: The repository service tying store, students and log together
//! - **report**: Leaderboards, class reports and per-chapter breakdowns

pub mod curriculum;
pub mod delimited;
pub mod error;
pub mod fs;
pub mod identity;
pub mod import;
pub mod ledger;
pub mod log;
pub mod report;
pub mod roster;
pub mod status;
pub mod store;
pub mod student;

pub use curriculum::{Chapter, Curriculum};
pub use error::{HafalanError, Result};
pub use ledger::{OverwritePolicy, Recovery, VerseLedger};
pub use roster::{NewStudent, Recitation, Roster, StudentEdit};
pub use status::VerseStatus;
pub use store::{StoreBackend, StudentStore};
pub use student::{Student, StudentId};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
