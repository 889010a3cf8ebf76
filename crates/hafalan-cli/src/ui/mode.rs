//! Output mode routing logic.

use std::str::FromStr;

/// Format requested with `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Plain,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> anyhow::Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "table" | "pretty" => Ok(Self::Table),
            "plain" => Ok(Self::Plain),
            "csv" => Ok(Self::Csv),
            other => Err(anyhow::anyhow!(
                "Unknown format: {} (use table, plain or csv)",
                other
            )),
        }
    }
}

/// Output mode determines how results are formatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Machine-readable JSON output only
    Json,
    /// Plain text, stable for logs and scripts
    #[default]
    Plain,
    /// Human-friendly with colors and tables
    Pretty,
    /// Comma-separated export with a header row
    Csv,
}

impl OutputMode {
    /// Resolve output mode from flags and environment.
    ///
    /// Routing rules:
    /// 1. `--json` overrides everything (exclusive mode)
    /// 2. `--format csv|plain|table` is taken as asked
    /// 3. `TERM=dumb` forces plain
    /// 4. Pretty only when stdout is TTY
    /// 5. Default to plain for non-TTY
    pub fn resolve(
        json_flag: bool,
        format: Option<OutputFormat>,
        is_tty: bool,
        term_is_dumb: bool,
    ) -> Self {
        if json_flag {
            return Self::Json;
        }

        match format {
            Some(OutputFormat::Csv) => return Self::Csv,
            Some(OutputFormat::Plain) => return Self::Plain,
            Some(OutputFormat::Table) => return Self::Pretty,
            None => {}
        }

        if term_is_dumb {
            return Self::Plain;
        }

        if is_tty {
            Self::Pretty
        } else {
            Self::Plain
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json)
    }

    pub fn is_pretty(&self) -> bool {
        matches!(self, Self::Pretty)
    }

    pub fn is_csv(&self) -> bool {
        matches!(self, Self::Csv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_exclusive() {
        // --json always wins, even with other flags
        let mode = OutputMode::resolve(true, Some(OutputFormat::Plain), true, false);
        assert_eq!(mode, OutputMode::Json);
    }

    #[test]
    fn test_plain_forces() {
        let mode = OutputMode::resolve(false, Some(OutputFormat::Plain), true, false);
        assert_eq!(mode, OutputMode::Plain);
    }

    #[test]
    fn test_term_dumb_forces_plain() {
        let mode = OutputMode::resolve(false, None, true, true);
        assert_eq!(mode, OutputMode::Plain);
    }

    #[test]
    fn test_tty_gets_pretty() {
        assert_eq!(OutputMode::resolve(false, None, true, false), OutputMode::Pretty);
        assert_eq!(OutputMode::resolve(false, None, false, false), OutputMode::Plain);
    }

    #[test]
    fn test_table_requested_off_tty() {
        let mode = OutputMode::resolve(false, Some(OutputFormat::Table), false, false);
        assert_eq!(mode, OutputMode::Pretty);
    }

    #[test]
    fn test_format_names() {
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
