//! Per-verse status enumeration.
//!
//! Three-value model: not done, passed, repeating. Stored as the integer
//! codes 0/1/2 inside the ledger's JSON cell. Ledgers written by the
//! two-value (passed / not passed) variant store booleans; `true` decodes to
//! `Passed` and `false` to `NotDone`.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{HafalanError, Result};

/// Memorization status of a single verse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VerseStatus {
    #[default]
    NotDone,
    Passed,
    Repeating,
}

impl VerseStatus {
    pub const ALL: [VerseStatus; 3] = [
        VerseStatus::NotDone,
        VerseStatus::Passed,
        VerseStatus::Repeating,
    ];

    /// Storage code used in the serialized ledger.
    pub fn code(self) -> u8 {
        match self {
            VerseStatus::NotDone => 0,
            VerseStatus::Passed => 1,
            VerseStatus::Repeating => 2,
        }
    }

    /// Decode a storage code.
    ///
    /// # Errors
    ///
    /// Returns `HafalanError::InvalidStatus` for any code other than 0, 1 or 2.
    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            0 => Ok(VerseStatus::NotDone),
            1 => Ok(VerseStatus::Passed),
            2 => Ok(VerseStatus::Repeating),
            other => Err(HafalanError::InvalidStatus(format!(
                "unknown status code {}",
                other
            ))),
        }
    }

    /// Stable machine label.
    pub fn as_str(self) -> &'static str {
        match self {
            VerseStatus::NotDone => "not-done",
            VerseStatus::Passed => "passed",
            VerseStatus::Repeating => "repeating",
        }
    }

    pub fn is_passed(self) -> bool {
        self == VerseStatus::Passed
    }
}

impl fmt::Display for VerseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerseStatus {
    type Err = HafalanError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "0" | "not-done" | "not_done" | "notdone" | "belum" => Ok(VerseStatus::NotDone),
            "1" | "passed" | "pass" | "lulus" => Ok(VerseStatus::Passed),
            "2" | "repeating" | "repeat" | "mengulang" | "ulang" => Ok(VerseStatus::Repeating),
            _ => Err(HafalanError::InvalidStatus(format!(
                "\"{}\" (use passed, repeating or not-done)",
                value
            ))),
        }
    }
}

impl Serialize for VerseStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

struct VerseStatusVisitor;

impl<'de> Visitor<'de> for VerseStatusVisitor {
    type Value = VerseStatus;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a status code 0, 1 or 2, or a boolean")
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> std::result::Result<VerseStatus, E> {
        Ok(if value {
            VerseStatus::Passed
        } else {
            VerseStatus::NotDone
        })
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> std::result::Result<VerseStatus, E> {
        VerseStatus::from_code(value).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> std::result::Result<VerseStatus, E> {
        let code = i64::try_from(value).map_err(E::custom)?;
        self.visit_i64(code)
    }
}

impl<'de> Deserialize<'de> for VerseStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(VerseStatusVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for status in VerseStatus::ALL {
            assert_eq!(VerseStatus::from_code(status.code() as i64).unwrap(), status);
        }
        assert!(matches!(
            VerseStatus::from_code(3),
            Err(HafalanError::InvalidStatus(_))
        ));
        assert!(VerseStatus::from_code(-1).is_err());
    }

    #[test]
    fn test_parse_labels() {
        assert_eq!("Lulus".parse::<VerseStatus>().unwrap(), VerseStatus::Passed);
        assert_eq!(
            "mengulang".parse::<VerseStatus>().unwrap(),
            VerseStatus::Repeating
        );
        assert_eq!("not-done".parse::<VerseStatus>().unwrap(), VerseStatus::NotDone);
        assert!(matches!(
            "hafal".parse::<VerseStatus>(),
            Err(HafalanError::InvalidStatus(_))
        ));
    }

    #[test]
    fn test_json_cells() {
        let cells: Vec<VerseStatus> = serde_json::from_str("[0, 1, 2, true, false]").unwrap();
        assert_eq!(
            cells,
            vec![
                VerseStatus::NotDone,
                VerseStatus::Passed,
                VerseStatus::Repeating,
                VerseStatus::Passed,
                VerseStatus::NotDone,
            ]
        );
        assert_eq!(serde_json::to_string(&cells[..3]).unwrap(), "[0,1,2]");

        assert!(serde_json::from_str::<Vec<VerseStatus>>("[5]").is_err());
        assert!(serde_json::from_str::<Vec<VerseStatus>>("[\"Lulus\"]").is_err());
    }
}
