//! Constants used throughout the CLI.

/// Exit codes for the CLI.
///
/// These follow common Unix conventions:
/// - 0: Success
/// - 1: General error (used by anyhow for unhandled errors)
/// - 2: Misuse of shell command (reserved by shells)
/// - 3+: Application-specific errors
pub mod exit_codes {
    /// General failure (storage, I/O).
    pub const FAILURE: i32 = 1;

    /// Resource not found (config, store, student, chapter).
    pub const NOT_FOUND: i32 = 3;

    /// Invalid user input or arguments.
    pub const INVALID_INPUT: i32 = 4;

    /// Ledger integrity check failed.
    pub const INTEGRITY_FAILED: i32 = 6;
}

/// Log filter environment variable.
pub const LOG_ENV: &str = "HAFALAN_LOG";

/// Config path override environment variable.
pub const CONFIG_ENV: &str = "HAFALAN_CONFIG";

/// Default number of log entries shown by `hafalan log`.
pub const DEFAULT_LOG_LIMIT: usize = 20;
