//! Category kinds and hierarchy rules for the 3-level APBD category tree.
//!
//! Categories form a strict 3-level tree per kind: level 1 roots, level 2
//! groups, level 3 leaves. Only level 3 accepts manual transaction entry;
//! levels 1 and 2 hold derived rollup totals.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shallowest category level (roots).
pub const MIN_LEVEL: i16 = 1;
/// Deepest category level (manually editable leaves).
pub const MAX_LEVEL: i16 = 3;
/// The only level that accepts manual transaction writes.
pub const MANUAL_LEVEL: i16 = 3;

/// Category type ("jenis"): the three top-level APBD groupings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    /// Income side of the budget.
    Revenue,
    /// Spending side of the budget.
    Expenditure,
    /// Financing receipts and disbursements.
    Financing,
}

impl CategoryKind {
    /// All kinds, in canonical order.
    pub const ALL: [Self; 3] = [Self::Revenue, Self::Expenditure, Self::Financing];

    /// Returns the wire representation of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Revenue => "revenue",
            Self::Expenditure => "expenditure",
            Self::Financing => "financing",
        }
    }

    /// Parses a kind from its wire representation (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "revenue" => Some(Self::Revenue),
            "expenditure" => Some(Self::Expenditure),
            "financing" => Some(Self::Financing),
            _ => None,
        }
    }
}

impl std::fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Violations of the category hierarchy rules.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HierarchyError {
    /// Level outside the 1..=3 range.
    #[error("category level must be between {MIN_LEVEL} and {MAX_LEVEL}, got {0}")]
    InvalidLevel(i16),

    /// Level 1 categories are roots and cannot have a parent.
    #[error("level 1 categories cannot have a parent")]
    RootWithParent,

    /// Levels 2 and 3 require a parent.
    #[error("level {0} categories require a parent category")]
    MissingParent(i16),

    /// Parent must be exactly one level shallower.
    #[error("parent of a level {child} category must be level {expected}, got level {parent}")]
    ParentLevelMismatch {
        /// Child level.
        child: i16,
        /// Expected parent level.
        expected: i16,
        /// Actual parent level.
        parent: i16,
    },

    /// Parent and child must share the same kind.
    #[error("parent kind {parent} does not match category kind {child}")]
    KindMismatch {
        /// Child kind.
        child: CategoryKind,
        /// Parent kind.
        parent: CategoryKind,
    },
}

/// Validates the placement of a category within the hierarchy.
///
/// `parent` is the `(level, kind)` of the referenced parent category,
/// if any.
///
/// # Errors
///
/// Returns a [`HierarchyError`] describing the first violated rule.
pub fn validate_placement(
    level: i16,
    kind: CategoryKind,
    parent: Option<(i16, CategoryKind)>,
) -> Result<(), HierarchyError> {
    if !(MIN_LEVEL..=MAX_LEVEL).contains(&level) {
        return Err(HierarchyError::InvalidLevel(level));
    }

    match parent {
        None if level > MIN_LEVEL => Err(HierarchyError::MissingParent(level)),
        None => Ok(()),
        Some(_) if level == MIN_LEVEL => Err(HierarchyError::RootWithParent),
        Some((parent_level, _)) if parent_level != level - 1 => {
            Err(HierarchyError::ParentLevelMismatch {
                child: level,
                expected: level - 1,
                parent: parent_level,
            })
        }
        Some((_, parent_kind)) if parent_kind != kind => Err(HierarchyError::KindMismatch {
            child: kind,
            parent: parent_kind,
        }),
        Some(_) => Ok(()),
    }
}

/// Case-insensitive name equality, used for sibling uniqueness checks.
#[must_use]
pub fn names_collide(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_kind_roundtrip() {
        for kind in CategoryKind::ALL {
            assert_eq!(CategoryKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(CategoryKind::parse("REVENUE"), Some(CategoryKind::Revenue));
        assert_eq!(CategoryKind::parse("bogus"), None);
    }

    #[rstest]
    #[case(1, None, Ok(()))]
    #[case(2, Some((1, CategoryKind::Revenue)), Ok(()))]
    #[case(3, Some((2, CategoryKind::Revenue)), Ok(()))]
    #[case(0, None, Err(HierarchyError::InvalidLevel(0)))]
    #[case(4, None, Err(HierarchyError::InvalidLevel(4)))]
    #[case(2, None, Err(HierarchyError::MissingParent(2)))]
    #[case(3, None, Err(HierarchyError::MissingParent(3)))]
    #[case(1, Some((1, CategoryKind::Revenue)), Err(HierarchyError::RootWithParent))]
    #[case(3, Some((1, CategoryKind::Revenue)), Err(HierarchyError::ParentLevelMismatch { child: 3, expected: 2, parent: 1 }))]
    fn test_placement_rules(
        #[case] level: i16,
        #[case] parent: Option<(i16, CategoryKind)>,
        #[case] expected: Result<(), HierarchyError>,
    ) {
        assert_eq!(
            validate_placement(level, CategoryKind::Revenue, parent),
            expected
        );
    }

    #[test]
    fn test_placement_rejects_kind_mismatch() {
        let result = validate_placement(
            2,
            CategoryKind::Expenditure,
            Some((1, CategoryKind::Revenue)),
        );
        assert_eq!(
            result,
            Err(HierarchyError::KindMismatch {
                child: CategoryKind::Expenditure,
                parent: CategoryKind::Revenue,
            })
        );
    }

    #[test]
    fn test_names_collide_is_case_insensitive() {
        assert!(names_collide("Pajak Daerah", "pajak daerah"));
        assert!(names_collide("  Pajak Daerah ", "PAJAK DAERAH"));
        assert!(!names_collide("Pajak Daerah", "Retribusi Daerah"));
    }
}
