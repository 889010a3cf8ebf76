//! Input and parsing helper functions for the CLI.

use dialoguer::{Confirm, FuzzySelect};

use hafalan_core::{Curriculum, HafalanError, Roster, StudentId};

use crate::errors::CliError;

/// Parse `N` or `A-B` into an inclusive verse range. Bounds are checked
/// against the chapter later, by the ledger.
pub fn parse_verse_range(value: &str) -> anyhow::Result<(usize, usize)> {
    let value = value.trim();
    let parse = |part: &str| {
        part.trim().parse::<usize>().map_err(|_| {
            CliError::invalid_input(format!(
                "Invalid verse range {:?} (use a number or FROM-TO, e.g. 1-10)",
                value
            ))
        })
    };
    match value.split_once('-') {
        Some((from, to)) => Ok((parse(from)?, parse(to)?)),
        None => {
            let verse = parse(value)?;
            Ok((verse, verse))
        }
    }
}

/// Chapter name for a name, a case-insensitive name or a chapter number.
pub fn resolve_chapter(curriculum: &Curriculum, query: &str) -> anyhow::Result<String> {
    curriculum
        .resolve(query)
        .map(|chapter| chapter.name.clone())
        .ok_or_else(|| HafalanError::InvalidChapter(query.trim().to_string()).into())
}

/// Student id for an id or an external id.
pub fn resolve_student(roster: &Roster, query: &str) -> anyhow::Result<StudentId> {
    Ok(roster.find(query)?.id.clone())
}

/// Ask for a yes/no answer, defaulting to no.
pub fn confirm(prompt: &str) -> anyhow::Result<bool> {
    Ok(Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}

/// Fuzzy-pick a student from the roster.
pub fn pick_student(roster: &Roster) -> anyhow::Result<StudentId> {
    if roster.is_empty() {
        return Err(CliError::not_found(
            "No students registered",
            "Run `hafalan student add NAME --class CLASS`.",
        )
        .into());
    }
    let options: Vec<String> = roster
        .students()
        .iter()
        .map(|s| format!("{}  {} ({})", s.id, s.name, s.class))
        .collect();
    let selection = FuzzySelect::new()
        .with_prompt("Student")
        .items(&options)
        .default(0)
        .interact()?;
    Ok(roster.students()[selection].id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_verse() {
        assert_eq!(parse_verse_range("7").unwrap(), (7, 7));
    }

    #[test]
    fn test_parse_range() {
        assert_eq!(parse_verse_range("1-10").unwrap(), (1, 10));
        assert_eq!(parse_verse_range(" 3 - 5 ").unwrap(), (3, 5));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_verse_range("a-b").is_err());
        assert!(parse_verse_range("1-").is_err());
        assert!(parse_verse_range("").is_err());
    }

    #[test]
    fn test_resolve_chapter_by_number() {
        let curriculum = Curriculum::juz_amma();
        assert_eq!(resolve_chapter(&curriculum, "114").unwrap(), "An-Nas");
        assert_eq!(resolve_chapter(&curriculum, "al-ikhlas").unwrap(), "Al-Ikhlas");
        assert!(resolve_chapter(&curriculum, "Al-Baqarah").is_err());
    }
}
