//! The verse-status ledger.
//!
//! For every chapter of the curriculum the ledger holds one status per verse,
//! in verse order. The stored sequence length must equal the chapter's verse
//! count at all times; sequences that do not are treated as corrupt and
//! regenerated to all-`NotDone` instead of being trusted.
//!
//! The ledger is stored as a compact JSON object (chapter name to array of
//! status codes) inside a single table cell. Keys are written in sorted
//! order so that the encoding is deterministic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::curriculum::Curriculum;
use crate::error::{HafalanError, Result};
use crate::status::VerseStatus;

/// What to do when a range update touches a verse that is already passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverwritePolicy {
    /// The later write always wins, including downgrades of passed verses.
    #[default]
    LastWriteWins,

    /// Passed verses are only ever overwritten by another `Passed`.
    KeepPassed,
}

impl OverwritePolicy {
    fn allows(self, current: VerseStatus, new_status: VerseStatus) -> bool {
        match self {
            OverwritePolicy::LastWriteWins => true,
            OverwritePolicy::KeepPassed => !current.is_passed() || new_status.is_passed(),
        }
    }
}

/// Per-chapter status counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChapterProgress {
    pub chapter: String,
    pub total: usize,
    pub passed: usize,
    pub repeating: usize,
    pub not_done: usize,
}

impl ChapterProgress {
    /// Every verse of the chapter is passed.
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.passed == self.total
    }

    /// At least one verse has been recited (passed or repeating).
    pub fn is_started(&self) -> bool {
        self.passed + self.repeating > 0
    }
}

/// A run of consecutive verses sharing one status (1-based, inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub from: usize,
    pub to: usize,
    pub status: VerseStatus,
}

/// Stored chapter whose length disagrees with the curriculum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LengthMismatch {
    pub chapter: String,
    pub expected: usize,
    pub actual: usize,
}

/// Result of checking a ledger against a curriculum.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LedgerAudit {
    /// Curriculum chapters with no stored sequence
    pub missing: Vec<String>,

    /// Stored sequences of the wrong length
    pub wrong_length: Vec<LengthMismatch>,

    /// Stored chapters the curriculum does not know
    pub unknown: Vec<String>,
}

impl LedgerAudit {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.wrong_length.is_empty() && self.unknown.is_empty()
    }

    /// Curriculum chapters whose stored sequence must be regenerated.
    pub fn needs_regeneration(&self) -> Vec<String> {
        self.missing
            .iter()
            .cloned()
            .chain(self.wrong_length.iter().map(|m| m.chapter.clone()))
            .collect()
    }
}

/// Aggregate counts over the well-formed chapters of a ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LedgerTally {
    pub passed: usize,
    pub repeating: usize,
    pub not_done: usize,

    /// Chapters that contributed nothing because they are missing or the
    /// wrong length
    pub needs_regeneration: Vec<String>,
}

/// What happened when a stored ledger was loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recovery {
    /// Decoded and matched the curriculum.
    Clean,

    /// Decoded, but some chapters were regenerated or dropped.
    Repaired(LedgerAudit),

    /// Could not be decoded; replaced with a fresh ledger. All history for
    /// the student is lost.
    Regenerated(String),
}

impl Recovery {
    pub fn is_clean(&self) -> bool {
        matches!(self, Recovery::Clean)
    }
}

/// Ordered per-verse status codes for every chapter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerseLedger {
    chapters: BTreeMap<String, Vec<VerseStatus>>,
}

impl VerseLedger {
    /// A ledger with every verse of every chapter `NotDone`.
    pub fn initialize(curriculum: &Curriculum) -> Self {
        let chapters = curriculum
            .chapters()
            .iter()
            .map(|c| (c.name.clone(), vec![VerseStatus::NotDone; c.verse_count]))
            .collect();
        Self { chapters }
    }

    /// Check that `chapter` exists and `1 <= from <= to <= verse_count`.
    ///
    /// Returns the chapter's verse count.
    ///
    /// # Errors
    ///
    /// - `HafalanError::InvalidChapter` if the chapter is not in the curriculum
    /// - `HafalanError::InvalidRange` if the bounds are swapped or out of range
    pub fn validate_range(
        curriculum: &Curriculum,
        chapter: &str,
        from: usize,
        to: usize,
    ) -> Result<usize> {
        let verse_count = curriculum
            .verse_count(chapter)
            .ok_or_else(|| HafalanError::InvalidChapter(chapter.to_string()))?;
        if from < 1 || from > to || to > verse_count {
            return Err(HafalanError::InvalidRange {
                chapter: chapter.to_string(),
                from,
                to,
                verse_count,
            });
        }
        Ok(verse_count)
    }

    /// Set verses `from..=to` (1-based) of `chapter` to `status`,
    /// last write wins.
    ///
    /// Returns how many verses actually changed value.
    pub fn update_range(
        &mut self,
        curriculum: &Curriculum,
        chapter: &str,
        from: usize,
        to: usize,
        status: VerseStatus,
    ) -> Result<usize> {
        self.update_range_with_policy(
            curriculum,
            chapter,
            from,
            to,
            status,
            OverwritePolicy::LastWriteWins,
        )
    }

    /// Set verses `from..=to` (1-based) of `chapter` to `status` under
    /// `policy`.
    ///
    /// The whole request is validated before any cell is written; on error
    /// the ledger is unchanged.
    ///
    /// # Errors
    ///
    /// - `HafalanError::InvalidChapter` / `HafalanError::InvalidRange` as in
    ///   [`VerseLedger::validate_range`]
    /// - `HafalanError::CorruptLedger` if the stored sequence for the chapter
    ///   is missing or has the wrong length
    pub fn update_range_with_policy(
        &mut self,
        curriculum: &Curriculum,
        chapter: &str,
        from: usize,
        to: usize,
        status: VerseStatus,
        policy: OverwritePolicy,
    ) -> Result<usize> {
        let verse_count = Self::validate_range(curriculum, chapter, from, to)?;
        let verses = self.chapters.get_mut(chapter).ok_or_else(|| {
            HafalanError::CorruptLedger(format!("chapter {} is missing from the ledger", chapter))
        })?;
        if verses.len() != verse_count {
            return Err(HafalanError::CorruptLedger(format!(
                "chapter {} has {} entries, expected {}",
                chapter,
                verses.len(),
                verse_count
            )));
        }

        let mut changed = 0;
        for cell in &mut verses[from - 1..to] {
            if *cell != status && policy.allows(*cell, status) {
                *cell = status;
                changed += 1;
            }
        }
        tracing::debug!(chapter, from, to, %status, changed, "ledger range updated");
        Ok(changed)
    }

    /// Number of `Passed` entries over curriculum chapters whose stored
    /// sequence has the right length. Missing, wrong-length and unknown
    /// chapters contribute zero.
    pub fn count_passed(&self, curriculum: &Curriculum) -> usize {
        curriculum
            .chapters()
            .iter()
            .filter_map(|chapter| {
                self.chapters
                    .get(&chapter.name)
                    .filter(|verses| verses.len() == chapter.verse_count)
            })
            .flat_map(|verses| verses.iter())
            .filter(|status| status.is_passed())
            .count()
    }

    /// Status counts over curriculum chapters whose stored sequence is well
    /// formed. Missing and wrong-length chapters contribute zero and are
    /// reported in `needs_regeneration`.
    pub fn tally(&self, curriculum: &Curriculum) -> LedgerTally {
        let mut tally = LedgerTally::default();
        for chapter in curriculum.chapters() {
            match self.chapters.get(&chapter.name) {
                Some(verses) if verses.len() == chapter.verse_count => {
                    for status in verses {
                        match status {
                            VerseStatus::Passed => tally.passed += 1,
                            VerseStatus::Repeating => tally.repeating += 1,
                            VerseStatus::NotDone => tally.not_done += 1,
                        }
                    }
                }
                _ => tally.needs_regeneration.push(chapter.name.clone()),
            }
        }
        if !tally.needs_regeneration.is_empty() {
            tracing::warn!(
                chapters = ?tally.needs_regeneration,
                "ledger chapters need regeneration; counted as zero"
            );
        }
        tally
    }

    /// Compare the stored chapters against the curriculum.
    pub fn audit(&self, curriculum: &Curriculum) -> LedgerAudit {
        let mut audit = LedgerAudit::default();
        for chapter in curriculum.chapters() {
            match self.chapters.get(&chapter.name) {
                None => audit.missing.push(chapter.name.clone()),
                Some(verses) if verses.len() != chapter.verse_count => {
                    audit.wrong_length.push(LengthMismatch {
                        chapter: chapter.name.clone(),
                        expected: chapter.verse_count,
                        actual: verses.len(),
                    })
                }
                Some(_) => {}
            }
        }
        audit.unknown = self
            .chapters
            .keys()
            .filter(|name| !curriculum.contains(name))
            .cloned()
            .collect();
        audit
    }

    pub fn is_well_formed(&self, curriculum: &Curriculum) -> bool {
        self.audit(curriculum).is_clean()
    }

    /// Regenerate missing and wrong-length chapters to all-`NotDone` and drop
    /// chapters outside the curriculum. Well-formed chapters are untouched.
    ///
    /// Returns the audit taken before repairing.
    pub fn repair(&mut self, curriculum: &Curriculum) -> LedgerAudit {
        let audit = self.audit(curriculum);
        for name in audit.needs_regeneration() {
            if let Some(verse_count) = curriculum.verse_count(&name) {
                self.chapters
                    .insert(name, vec![VerseStatus::NotDone; verse_count]);
            }
        }
        for name in &audit.unknown {
            self.chapters.remove(name);
        }
        audit
    }

    /// Serialize to the compact JSON cell format.
    pub fn encode(&self) -> String {
        // A map of strings to integer arrays always serializes.
        serde_json::to_string(&self.chapters).unwrap_or_else(|_| "{}".to_string())
    }

    /// Parse the JSON cell format.
    ///
    /// # Errors
    ///
    /// Returns `HafalanError::CorruptLedger` for malformed or truncated text,
    /// a top level that is not an object, a chapter value that is not an
    /// array, or a cell that is not a status code or boolean.
    pub fn decode(text: &str) -> Result<Self> {
        let chapters: BTreeMap<String, Vec<VerseStatus>> = serde_json::from_str(text.trim())
            .map_err(|e| HafalanError::CorruptLedger(e.to_string()))?;
        Ok(Self { chapters })
    }

    /// Decode and repair, falling back to a fresh ledger when the text cannot
    /// be decoded at all.
    pub fn decode_or_initialize(text: &str, curriculum: &Curriculum) -> (Self, Recovery) {
        match Self::decode(text) {
            Ok(mut ledger) => {
                let audit = ledger.repair(curriculum);
                if audit.is_clean() {
                    (ledger, Recovery::Clean)
                } else {
                    tracing::warn!(
                        regenerated = ?audit.needs_regeneration(),
                        dropped = ?audit.unknown,
                        "stored ledger repaired"
                    );
                    (ledger, Recovery::Repaired(audit))
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "stored ledger unreadable; regenerated");
                (Self::initialize(curriculum), Recovery::Regenerated(err.to_string()))
            }
        }
    }

    pub fn chapter_statuses(&self, chapter: &str) -> Option<&[VerseStatus]> {
        self.chapters.get(chapter).map(Vec::as_slice)
    }

    /// Stored chapter names in key order.
    pub fn chapter_names(&self) -> impl Iterator<Item = &str> {
        self.chapters.keys().map(String::as_str)
    }

    pub fn chapter_summary(&self, chapter: &str) -> Option<ChapterProgress> {
        let verses = self.chapters.get(chapter)?;
        let count = |wanted: VerseStatus| verses.iter().filter(|&&s| s == wanted).count();
        Some(ChapterProgress {
            chapter: chapter.to_string(),
            total: verses.len(),
            passed: count(VerseStatus::Passed),
            repeating: count(VerseStatus::Repeating),
            not_done: count(VerseStatus::NotDone),
        })
    }

    /// Contiguous same-status runs of `chapter`, in verse order.
    pub fn segments(&self, chapter: &str) -> Vec<Segment> {
        let Some(verses) = self.chapters.get(chapter) else {
            return Vec::new();
        };
        let mut segments: Vec<Segment> = Vec::new();
        for (offset, &status) in verses.iter().enumerate() {
            let verse = offset + 1;
            match segments.last_mut() {
                Some(last) if last.status == status => last.to = verse,
                _ => segments.push(Segment {
                    from: verse,
                    to: verse,
                    status,
                }),
            }
        }
        segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::Chapter;

    use VerseStatus::{NotDone, Passed, Repeating};

    fn small() -> Curriculum {
        Curriculum::new(vec![
            Chapter::new(108, "Al-Kausar", 3),
            Chapter::new(110, "An-Nasr", 3),
        ])
        .unwrap()
    }

    #[test]
    fn test_initialize_matches_curriculum() {
        let curriculum = Curriculum::juz_amma();
        let ledger = VerseLedger::initialize(&curriculum);

        assert_eq!(ledger.count_passed(&curriculum), 0);
        for chapter in curriculum.chapters() {
            let verses = ledger.chapter_statuses(&chapter.name).unwrap();
            assert_eq!(verses.len(), chapter.verse_count);
            assert!(verses.iter().all(|&s| s == NotDone));
        }
        assert_eq!(ledger, VerseLedger::initialize(&curriculum));
        assert!(ledger.is_well_formed(&curriculum));
    }

    #[test]
    fn test_update_then_downgrade_one_verse() {
        let curriculum = Curriculum::juz_amma();
        let mut ledger = VerseLedger::initialize(&curriculum);

        ledger
            .update_range(&curriculum, "Al-Ikhlas", 1, 4, Passed)
            .unwrap();
        assert_eq!(ledger.count_passed(&curriculum), 4);

        ledger
            .update_range(&curriculum, "Al-Ikhlas", 2, 2, Repeating)
            .unwrap();
        assert_eq!(ledger.count_passed(&curriculum), 3);
        assert_eq!(
            ledger.chapter_statuses("Al-Ikhlas").unwrap(),
            &[Passed, Repeating, Passed, Passed]
        );
    }

    #[test]
    fn test_update_touches_only_the_range() {
        let curriculum = Curriculum::juz_amma();
        let mut ledger = VerseLedger::initialize(&curriculum);
        ledger
            .update_range(&curriculum, "An-Naba'", 1, 40, Repeating)
            .unwrap();
        let before = ledger.clone();

        ledger
            .update_range(&curriculum, "An-Naba'", 10, 20, Passed)
            .unwrap();

        let after = ledger.chapter_statuses("An-Naba'").unwrap();
        let original = before.chapter_statuses("An-Naba'").unwrap();
        for (offset, status) in after.iter().enumerate() {
            let verse = offset + 1;
            if (10..=20).contains(&verse) {
                assert_eq!(*status, Passed);
            } else {
                assert_eq!(*status, original[offset]);
            }
        }
        assert_eq!(
            ledger.chapter_statuses("Al-Fil"),
            before.chapter_statuses("Al-Fil")
        );
    }

    #[test]
    fn test_same_update_twice_is_idempotent() {
        let curriculum = Curriculum::juz_amma();
        let mut once = VerseLedger::initialize(&curriculum);
        once.update_range(&curriculum, "Al-Falaq", 2, 5, Passed)
            .unwrap();

        let mut twice = once.clone();
        let changed = twice
            .update_range(&curriculum, "Al-Falaq", 2, 5, Passed)
            .unwrap();

        assert_eq!(changed, 0);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_out_of_range_rejected_without_mutation() {
        let curriculum = Curriculum::juz_amma();
        let mut ledger = VerseLedger::initialize(&curriculum);
        let before = ledger.clone();

        let err = ledger
            .update_range(&curriculum, "An-Nas", 1, 7, Passed)
            .unwrap_err();
        assert!(matches!(err, HafalanError::InvalidRange { verse_count: 6, .. }));

        let swapped = ledger
            .update_range(&curriculum, "An-Nas", 4, 2, Passed)
            .unwrap_err();
        assert!(matches!(swapped, HafalanError::InvalidRange { .. }));

        let zero = ledger
            .update_range(&curriculum, "An-Nas", 0, 2, Passed)
            .unwrap_err();
        assert!(matches!(zero, HafalanError::InvalidRange { .. }));

        assert_eq!(ledger, before);
    }

    #[test]
    fn test_unknown_chapter_rejected() {
        let curriculum = Curriculum::juz_amma();
        let mut ledger = VerseLedger::initialize(&curriculum);
        let err = ledger
            .update_range(&curriculum, "Al-Baqarah", 1, 1, Passed)
            .unwrap_err();
        assert!(matches!(err, HafalanError::InvalidChapter(name) if name == "Al-Baqarah"));
    }

    #[test]
    fn test_keep_passed_policy_protects_passes() {
        let curriculum = Curriculum::juz_amma();
        let mut ledger = VerseLedger::initialize(&curriculum);
        ledger
            .update_range(&curriculum, "Al-Ikhlas", 1, 2, Passed)
            .unwrap();

        let changed = ledger
            .update_range_with_policy(
                &curriculum,
                "Al-Ikhlas",
                1,
                4,
                Repeating,
                OverwritePolicy::KeepPassed,
            )
            .unwrap();

        assert_eq!(changed, 2);
        assert_eq!(
            ledger.chapter_statuses("Al-Ikhlas").unwrap(),
            &[Passed, Passed, Repeating, Repeating]
        );
    }

    #[test]
    fn test_aggregate_and_percentage() {
        let curriculum = small();
        let mut ledger = VerseLedger::initialize(&curriculum);
        ledger
            .update_range(&curriculum, "Al-Kausar", 1, 3, Passed)
            .unwrap();
        ledger
            .update_range(&curriculum, "An-Nasr", 1, 1, Passed)
            .unwrap();

        assert_eq!(ledger.count_passed(&curriculum), 4);
        let percent =
            ledger.count_passed(&curriculum) as f64 / curriculum.total_verses() as f64 * 100.0;
        assert_eq!(format!("{:.1}", percent), "66.7");
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let curriculum = Curriculum::juz_amma();
        let mut ledger = VerseLedger::initialize(&curriculum);
        ledger
            .update_range(&curriculum, "Al-Qadr", 2, 4, Repeating)
            .unwrap();
        ledger
            .update_range(&curriculum, "An-Nas", 1, 6, Passed)
            .unwrap();

        let text = ledger.encode();
        assert_eq!(VerseLedger::decode(&text).unwrap(), ledger);
        assert_eq!(text, VerseLedger::decode(&text).unwrap().encode());
    }

    #[test]
    fn test_decode_accepts_spaced_and_boolean_cells() {
        let ledger = VerseLedger::decode(r#"{"Al-Kausar": [1, 0, 2], "An-Nasr": [true, false, false]}"#)
            .unwrap();
        assert_eq!(ledger.chapter_statuses("Al-Kausar").unwrap(), &[Passed, NotDone, Repeating]);
        assert_eq!(ledger.chapter_statuses("An-Nasr").unwrap(), &[Passed, NotDone, NotDone]);
        assert_eq!(ledger.encode(), r#"{"Al-Kausar":[1,0,2],"An-Nasr":[1,0,0]}"#);
    }

    #[test]
    fn test_decode_rejects_malformed_text() {
        for text in [
            "",
            "{\"Al-Kausar\": [1, 0",
            "[1, 2, 3]",
            "{\"Al-Kausar\": 3}",
            "{\"Al-Kausar\": [9]}",
            "not json",
        ] {
            let err = VerseLedger::decode(text).unwrap_err();
            assert!(matches!(err, HafalanError::CorruptLedger(_)), "{text}");
        }
    }

    #[test]
    fn test_wrong_length_chapter_counts_zero() {
        let curriculum = Curriculum::juz_amma();
        let mut ledger = VerseLedger::initialize(&curriculum);
        ledger
            .update_range(&curriculum, "Al-Ikhlas", 1, 4, Passed)
            .unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&ledger.encode()).unwrap();
        value["Al-Fil"] = serde_json::json!([1, 1, 1]);
        let corrupt = VerseLedger::decode(&value.to_string()).unwrap();

        value["Bogus"] = serde_json::json!([1, 1]);
        let corrupt = VerseLedger::decode(&value.to_string()).unwrap();
        assert_eq!(corrupt.count_passed(&curriculum), 4);

        let tally = corrupt.tally(&curriculum);
        assert_eq!(tally.passed, 4);
        assert_eq!(tally.needs_regeneration, vec!["Al-Fil".to_string()]);

        let audit = corrupt.audit(&curriculum);
        assert_eq!(
            audit.wrong_length,
            vec![LengthMismatch {
                chapter: "Al-Fil".to_string(),
                expected: 5,
                actual: 3,
            }]
        );
    }

    #[test]
    fn test_update_on_corrupt_chapter_is_refused() {
        let curriculum = Curriculum::juz_amma();
        let mut ledger = VerseLedger::decode(r#"{"Al-Fil": [0, 0, 0]}"#).unwrap();
        let err = ledger
            .update_range(&curriculum, "Al-Fil", 1, 2, Passed)
            .unwrap_err();
        assert!(matches!(err, HafalanError::CorruptLedger(_)));
        assert_eq!(ledger.chapter_statuses("Al-Fil").unwrap(), &[NotDone; 3]);
    }

    #[test]
    fn test_decode_or_initialize_recovery() {
        let curriculum = small();

        let (ledger, recovery) = VerseLedger::decode_or_initialize("{oops", &curriculum);
        assert!(matches!(recovery, Recovery::Regenerated(_)));
        assert_eq!(ledger, VerseLedger::initialize(&curriculum));

        let (ledger, recovery) = VerseLedger::decode_or_initialize(
            r#"{"Al-Kausar": [1, 1, 1], "An-Nasr": [1], "Al-Fatihah": [1]}"#,
            &curriculum,
        );
        let Recovery::Repaired(audit) = recovery else {
            panic!("expected a repaired ledger");
        };
        assert_eq!(audit.needs_regeneration(), vec!["An-Nasr".to_string()]);
        assert_eq!(audit.unknown, vec!["Al-Fatihah".to_string()]);
        assert_eq!(ledger.chapter_statuses("Al-Kausar").unwrap(), &[Passed; 3]);
        assert_eq!(ledger.chapter_statuses("An-Nasr").unwrap(), &[NotDone; 3]);
        assert!(ledger.is_well_formed(&curriculum));

        let clean = VerseLedger::initialize(&curriculum).encode();
        let (_, recovery) = VerseLedger::decode_or_initialize(&clean, &curriculum);
        assert!(recovery.is_clean());
    }

    #[test]
    fn test_segments_and_summary() {
        let curriculum = Curriculum::juz_amma();
        let mut ledger = VerseLedger::initialize(&curriculum);
        ledger
            .update_range(&curriculum, "Al-Falaq", 1, 2, Passed)
            .unwrap();
        ledger
            .update_range(&curriculum, "Al-Falaq", 3, 3, Repeating)
            .unwrap();

        let segments = ledger.segments("Al-Falaq");
        assert_eq!(
            segments,
            vec![
                Segment { from: 1, to: 2, status: Passed },
                Segment { from: 3, to: 3, status: Repeating },
                Segment { from: 4, to: 5, status: NotDone },
            ]
        );

        let summary = ledger.chapter_summary("Al-Falaq").unwrap();
        assert_eq!((summary.passed, summary.repeating, summary.not_done), (2, 1, 2));
        assert!(summary.is_started());
        assert!(!summary.is_complete());
        assert!(ledger.segments("Unknown").is_empty());
    }
}
