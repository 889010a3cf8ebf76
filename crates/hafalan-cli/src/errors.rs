//! CLI error type and exit-code mapping.

use std::fmt;

use hafalan_core::HafalanError;

use crate::constants::exit_codes;

/// An error with a specific exit code and an optional hint for the user.
#[derive(Debug)]
pub struct CliError {
    pub message: String,
    pub hint: Option<String>,
    pub code: i32,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            hint: None,
            code,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn not_found(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::new(exit_codes::NOT_FOUND, message).with_hint(hint)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(exit_codes::INVALID_INPUT, message)
    }

    pub fn integrity_failed(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::new(exit_codes::INTEGRITY_FAILED, message).with_hint(hint)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CliError {}

/// Exit code and hint for an error returned by a command handler.
pub fn classify(err: &anyhow::Error) -> (i32, Option<String>) {
    if let Some(cli) = err.downcast_ref::<CliError>() {
        return (cli.code, cli.hint.clone());
    }
    let Some(core) = err.downcast_ref::<HafalanError>() else {
        return (exit_codes::FAILURE, None);
    };
    match core {
        HafalanError::StudentNotFound(_) => (
            exit_codes::NOT_FOUND,
            Some("Run `hafalan student list` to see student ids.".to_string()),
        ),
        HafalanError::InvalidChapter(_) => (
            exit_codes::INVALID_INPUT,
            Some("Run `hafalan chapters` to see chapter names.".to_string()),
        ),
        HafalanError::InvalidRange { .. }
        | HafalanError::InvalidStatus(_)
        | HafalanError::DuplicateIdentifier(_)
        | HafalanError::Validation(_) => (exit_codes::INVALID_INPUT, None),
        HafalanError::CorruptLedger(_) => (
            exit_codes::INTEGRITY_FAILED,
            Some("Run `hafalan check --repair`.".to_string()),
        ),
        HafalanError::Storage(_) => (exit_codes::FAILURE, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_error_keeps_code_and_hint() {
        let err: anyhow::Error = CliError::not_found("No store", "Run `hafalan init`").into();
        let (code, hint) = classify(&err);
        assert_eq!(code, exit_codes::NOT_FOUND);
        assert_eq!(hint.as_deref(), Some("Run `hafalan init`"));
        assert_eq!(err.to_string(), "No store");
    }

    #[test]
    fn test_core_errors_map_to_exit_codes() {
        let not_found: anyhow::Error = HafalanError::StudentNotFound("1001".into()).into();
        assert_eq!(classify(&not_found).0, exit_codes::NOT_FOUND);

        let range: anyhow::Error = HafalanError::InvalidRange {
            chapter: "An-Nas".into(),
            from: 3,
            to: 9,
            verse_count: 6,
        }
        .into();
        assert_eq!(classify(&range).0, exit_codes::INVALID_INPUT);

        let corrupt: anyhow::Error = HafalanError::CorruptLedger("bad".into()).into();
        assert_eq!(classify(&corrupt).0, exit_codes::INTEGRITY_FAILED);

        let other = anyhow::anyhow!("disk on fire");
        assert_eq!(classify(&other), (exit_codes::FAILURE, None));
    }
}
