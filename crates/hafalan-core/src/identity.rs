//! Student identity allocation.
//!
//! Allocation is a pluggable strategy behind [`IdAllocator`]. Allocators
//! only decide the key; the collision policy (reject on single add, skip on
//! bulk import) belongs to the roster.

use std::collections::HashSet;

use uuid::Uuid;

use crate::error::{HafalanError, Result};
use crate::student::StudentId;

/// Assigns a unique key to a new student.
pub trait IdAllocator {
    /// Pick an id not present in `existing`.
    ///
    /// `external_hint` is the student's external identifier, if one was
    /// supplied. Strategies that ignore it still receive it.
    fn allocate_id(
        &self,
        existing: &HashSet<StudentId>,
        external_hint: Option<&str>,
    ) -> Result<StudentId>;

    /// Strategy name for logs and config.
    fn name(&self) -> &'static str;
}

/// Numeric sequence: highest numeric id plus one.
#[derive(Debug, Clone, Copy)]
pub struct SequenceAllocator {
    pub first: u64,
}

impl Default for SequenceAllocator {
    fn default() -> Self {
        Self { first: 1001 }
    }
}

impl IdAllocator for SequenceAllocator {
    fn allocate_id(
        &self,
        existing: &HashSet<StudentId>,
        _external_hint: Option<&str>,
    ) -> Result<StudentId> {
        let next = existing
            .iter()
            .filter_map(|id| id.as_str().parse::<u64>().ok())
            .max()
            .map_or(self.first, |max| max.saturating_add(1).max(self.first));
        Ok(StudentId::new(next.to_string()))
    }

    fn name(&self) -> &'static str {
        "sequence"
    }
}

/// Uses the supplied external identifier (NIS) as the key.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExternalIdAllocator;

impl IdAllocator for ExternalIdAllocator {
    fn allocate_id(
        &self,
        existing: &HashSet<StudentId>,
        external_hint: Option<&str>,
    ) -> Result<StudentId> {
        let hint = external_hint.map(str::trim).unwrap_or_default();
        if hint.is_empty() {
            return Err(HafalanError::Validation(
                "An external id is required for this identity strategy".to_string(),
            ));
        }
        let id = StudentId::new(hint);
        if existing.contains(&id) {
            return Err(HafalanError::DuplicateIdentifier(hint.to_string()));
        }
        Ok(id)
    }

    fn name(&self) -> &'static str {
        "external"
    }
}

/// Random v4 UUID.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidAllocator;

impl IdAllocator for UuidAllocator {
    fn allocate_id(
        &self,
        existing: &HashSet<StudentId>,
        _external_hint: Option<&str>,
    ) -> Result<StudentId> {
        loop {
            let id = StudentId::new(Uuid::new_v4().to_string());
            if !existing.contains(&id) {
                return Ok(id);
            }
        }
    }

    fn name(&self) -> &'static str {
        "uuid"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> HashSet<StudentId> {
        values.iter().map(|v| StudentId::new(*v)).collect()
    }

    #[test]
    fn test_sequence_starts_at_first() {
        let allocator = SequenceAllocator::default();
        let id = allocator.allocate_id(&HashSet::new(), None).unwrap();
        assert_eq!(id.as_str(), "1001");
    }

    #[test]
    fn test_sequence_uses_max_plus_one() {
        let allocator = SequenceAllocator::default();
        let existing = ids(&["1001", "1005", "1003", "not-a-number"]);
        assert_eq!(allocator.allocate_id(&existing, None).unwrap().as_str(), "1006");
    }

    #[test]
    fn test_sequence_never_goes_below_first() {
        let allocator = SequenceAllocator::default();
        let existing = ids(&["7"]);
        assert_eq!(allocator.allocate_id(&existing, Some("x")).unwrap().as_str(), "1001");
    }

    #[test]
    fn test_external_id_rules() {
        let allocator = ExternalIdAllocator;
        let existing = ids(&["99812"]);

        assert_eq!(
            allocator.allocate_id(&existing, Some(" 99813 ")).unwrap().as_str(),
            "99813"
        );
        assert!(matches!(
            allocator.allocate_id(&existing, Some("99812")),
            Err(HafalanError::DuplicateIdentifier(_))
        ));
        assert!(matches!(
            allocator.allocate_id(&existing, Some("  ")),
            Err(HafalanError::Validation(_))
        ));
        assert!(allocator.allocate_id(&existing, None).is_err());
    }

    #[test]
    fn test_uuid_ids_parse() {
        let id = UuidAllocator.allocate_id(&HashSet::new(), None).unwrap();
        assert!(Uuid::parse_str(id.as_str()).is_ok());
    }
}
