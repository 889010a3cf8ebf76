//! Colors, symbols and badges.

use owo_colors::{OwoColorize, Style};

use hafalan_core::VerseStatus;

/// Symbol pair for ASCII and Unicode variants.
#[derive(Debug, Clone, Copy)]
pub struct SymbolPair {
    pub ascii: &'static str,
    pub unicode: &'static str,
}

impl SymbolPair {
    pub const fn new(ascii: &'static str, unicode: &'static str) -> Self {
        Self { ascii, unicode }
    }

    pub fn get(&self, unicode: bool) -> &'static str {
        if unicode {
            self.unicode
        } else {
            self.ascii
        }
    }
}

/// Badge types for status indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    Ok,
    Warn,
    Err,
    Info,
}

impl Badge {
    pub fn display(&self, unicode: bool) -> &'static str {
        let pair = match self {
            Self::Ok => SymbolPair::new("[OK]", "[\u{2713}]"),
            Self::Warn => SymbolPair::new("[WARN]", "[\u{26A0}]"),
            Self::Err => SymbolPair::new("[ERR]", "[\u{2717}]"),
            Self::Info => SymbolPair::new("[INFO]", "[\u{2139}]"),
        };
        pair.get(unicode)
    }

    pub fn style(&self) -> Style {
        match self {
            Self::Ok => styles::green(),
            Self::Warn => styles::yellow(),
            Self::Err => styles::red(),
            Self::Info => styles::cyan(),
        }
    }
}

/// Per-verse status marker used in verse maps.
pub fn status_symbol(status: VerseStatus) -> SymbolPair {
    match status {
        VerseStatus::Passed => SymbolPair::new("+", "\u{25CF}"),
        VerseStatus::Repeating => SymbolPair::new("~", "\u{25D0}"),
        VerseStatus::NotDone => SymbolPair::new(".", "\u{25CB}"),
    }
}

pub fn status_style(status: VerseStatus) -> Style {
    match status {
        VerseStatus::Passed => styles::green(),
        VerseStatus::Repeating => styles::yellow(),
        VerseStatus::NotDone => styles::dim(),
    }
}

/// Apply `style` when color is enabled.
pub fn styled(text: &str, style: Style, color: bool) -> String {
    if color {
        text.style(style).to_string()
    } else {
        text.to_string()
    }
}

pub mod styles {
    use owo_colors::Style;

    pub fn bold() -> Style {
        Style::new().bold()
    }

    pub fn dim() -> Style {
        Style::new().dimmed()
    }

    pub fn green() -> Style {
        Style::new().green()
    }

    pub fn yellow() -> Style {
        Style::new().yellow()
    }

    pub fn red() -> Style {
        Style::new().red()
    }

    pub fn cyan() -> Style {
        Style::new().cyan()
    }
}
