//! Curriculum reference data.
//!
//! A curriculum is a fixed, ordered list of chapters, each with a positive
//! verse count. It is loaded once at startup and shared read-only by every
//! ledger; the total verse count is computed once at construction.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{HafalanError, Result};

/// One chapter (surah) of the curriculum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    /// Position in the mushaf (e.g., 78 for An-Naba')
    pub number: u16,

    /// Display name, also the ledger key
    pub name: String,

    /// Number of verses
    #[serde(rename = "verses")]
    pub verse_count: usize,
}

impl Chapter {
    pub fn new(number: u16, name: impl Into<String>, verse_count: usize) -> Self {
        Self {
            number,
            name: name.into(),
            verse_count,
        }
    }
}

/// Immutable, ordered chapter list with a name index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Curriculum {
    chapters: Vec<Chapter>,
    index: HashMap<String, usize>,
    total_verses: usize,
}

const JUZ_AMMA: &[(u16, &str, usize)] = &[
    (78, "An-Naba'", 40),
    (79, "An-Nazi'at", 46),
    (80, "'Abasa", 42),
    (81, "At-Takwir", 29),
    (82, "Al-Infitar", 19),
    (83, "Al-Mutaffifin", 36),
    (84, "Al-Insyiqaq", 25),
    (85, "Al-Buruj", 22),
    (86, "At-Tariq", 17),
    (87, "Al-A'la", 19),
    (88, "Al-Gasyiyah", 26),
    (89, "Al-Fajr", 30),
    (90, "Al-Balad", 20),
    (91, "Asy-Syams", 15),
    (92, "Al-Lail", 21),
    (93, "Ad-Duha", 11),
    (94, "Al-Insyirah", 8),
    (95, "At-Tin", 8),
    (96, "Al-'Alaq", 19),
    (97, "Al-Qadr", 5),
    (98, "Al-Bayyinah", 8),
    (99, "Az-Zalzalah", 8),
    (100, "Al-'Adiyat", 11),
    (101, "Al-Qari'ah", 11),
    (102, "At-Takasur", 8),
    (103, "Al-'Asr", 3),
    (104, "Al-Humazah", 9),
    (105, "Al-Fil", 5),
    (106, "Quraisy", 4),
    (107, "Al-Ma'un", 7),
    (108, "Al-Kausar", 3),
    (109, "Al-Kafirun", 6),
    (110, "An-Nasr", 3),
    (111, "Al-Lahab", 5),
    (112, "Al-Ikhlas", 4),
    (113, "Al-Falaq", 5),
    (114, "An-Nas", 6),
];

impl Curriculum {
    /// Build a curriculum from an ordered chapter list.
    ///
    /// # Errors
    ///
    /// Returns `HafalanError::Validation` if:
    /// - The list is empty
    /// - A chapter name is blank or repeated
    /// - A chapter has zero verses
    pub fn new(chapters: Vec<Chapter>) -> Result<Self> {
        if chapters.is_empty() {
            return Err(HafalanError::Validation(
                "Curriculum must contain at least one chapter".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(chapters.len());
        for chapter in &chapters {
            if chapter.name.trim().is_empty() {
                return Err(HafalanError::Validation(format!(
                    "Chapter #{} has an empty name",
                    chapter.number
                )));
            }
            if chapter.verse_count == 0 {
                return Err(HafalanError::Validation(format!(
                    "Chapter {} must have at least one verse",
                    chapter.name
                )));
            }
            if !seen.insert(chapter.name.as_str()) {
                return Err(HafalanError::Validation(format!(
                    "Duplicate chapter name: {}",
                    chapter.name
                )));
            }
        }

        Ok(Self::build(chapters))
    }

    fn build(chapters: Vec<Chapter>) -> Self {
        let index = chapters
            .iter()
            .enumerate()
            .map(|(position, chapter)| (chapter.name.clone(), position))
            .collect();
        let total_verses = chapters.iter().map(|c| c.verse_count).sum();
        Self {
            chapters,
            index,
            total_verses,
        }
    }

    /// The built-in Juz Amma curriculum (surahs 78-114).
    pub fn juz_amma() -> Self {
        let chapters = JUZ_AMMA
            .iter()
            .map(|&(number, name, verses)| Chapter::new(number, name, verses))
            .collect();
        Self::build(chapters)
    }

    pub fn chapter(&self, name: &str) -> Option<&Chapter> {
        self.index.get(name).map(|&position| &self.chapters[position])
    }

    pub fn verse_count(&self, name: &str) -> Option<usize> {
        self.chapter(name).map(|c| c.verse_count)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Chapters in curriculum order.
    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.chapters.iter().map(|c| c.name.as_str())
    }

    /// Sum of all chapter verse counts.
    pub fn total_verses(&self) -> usize {
        self.total_verses
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    /// Find a chapter by exact name, then case-insensitively, then by number.
    pub fn resolve(&self, query: &str) -> Option<&Chapter> {
        let query = query.trim();
        if let Some(chapter) = self.chapter(query) {
            return Some(chapter);
        }
        if let Some(chapter) = self
            .chapters
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(query))
        {
            return Some(chapter);
        }
        query
            .parse::<u16>()
            .ok()
            .and_then(|number| self.chapters.iter().find(|c| c.number == number))
    }
}

impl Default for Curriculum {
    fn default() -> Self {
        Self::juz_amma()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_juz_amma_totals() {
        let curriculum = Curriculum::juz_amma();
        assert_eq!(curriculum.len(), 37);
        assert_eq!(curriculum.total_verses(), 564);
        assert_eq!(curriculum.verse_count("An-Nas"), Some(6));
        assert_eq!(curriculum.verse_count("Al-Fil"), Some(5));
        assert_eq!(curriculum.chapters()[0].name, "An-Naba'");
    }

    #[test]
    fn test_total_is_sum_of_chapters() {
        let curriculum = Curriculum::new(vec![
            Chapter::new(108, "Al-Kausar", 3),
            Chapter::new(110, "An-Nasr", 3),
        ])
        .unwrap();
        assert_eq!(curriculum.total_verses(), 6);
        assert_eq!(curriculum.names().collect::<Vec<_>>(), ["Al-Kausar", "An-Nasr"]);
    }

    #[test]
    fn test_rejects_zero_verses_and_duplicates() {
        let zero = Curriculum::new(vec![Chapter::new(1, "Empty", 0)]);
        assert!(matches!(zero, Err(HafalanError::Validation(_))));

        let duplicate = Curriculum::new(vec![
            Chapter::new(112, "Al-Ikhlas", 4),
            Chapter::new(112, "Al-Ikhlas", 4),
        ]);
        assert!(matches!(duplicate, Err(HafalanError::Validation(_))));

        assert!(Curriculum::new(Vec::new()).is_err());
    }

    #[test]
    fn test_resolve_by_case_and_number() {
        let curriculum = Curriculum::juz_amma();
        assert_eq!(curriculum.resolve("al-ikhlas").unwrap().name, "Al-Ikhlas");
        assert_eq!(curriculum.resolve("114").unwrap().name, "An-Nas");
        assert!(curriculum.resolve("Al-Baqarah").is_none());
    }
}
