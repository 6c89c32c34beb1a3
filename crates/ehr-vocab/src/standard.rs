//! Built-in coding standards and their hierarchy schemes.
//!
//! Each standard knows how to canonicalize a raw code so that table keys
//! and lookups agree, and how its hierarchy is laid out:
//!
//! | Standard   | Hierarchy                               |
//! |------------|-----------------------------------------|
//! | `ICD9CM`   | parent column (`401.9` -> `401` -> ...) |
//! | `ICD9PROC` | parent column                           |
//! | `CCSCM`    | parent column                           |
//! | `CCSPROC`  | parent column                           |
//! | `ATC`      | fixed widths `1,2,1,1,2` (`C08CA01`)    |
//! | `NDC`      | flat                                    |

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::error::VocabError;

/// ATC level widths: anatomical group, therapeutic subgroup,
/// pharmacological subgroup, chemical subgroup, substance.
const ATC_SEGMENT_WIDTHS: &[usize] = &[1, 2, 1, 1, 2];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CodingStandard {
    Icd9Cm,
    Icd9Proc,
    Ndc,
    Atc,
    CcsCm,
    CcsProc,
}

/// How codes of a standard nest into coarser ancestors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyScheme {
    /// Each level appends a fixed number of characters.
    FixedWidth(&'static [usize]),
    /// The vocabulary table names each code's parent.
    ParentColumn,
    /// No hierarchy; truncation is not supported.
    Flat,
}

impl HierarchyScheme {
    /// Number of levels when known up front.
    pub fn max_depth(self) -> Option<usize> {
        match self {
            HierarchyScheme::FixedWidth(widths) => Some(widths.len()),
            HierarchyScheme::ParentColumn | HierarchyScheme::Flat => None,
        }
    }

    pub fn describe(self) -> String {
        match self {
            HierarchyScheme::FixedWidth(widths) => {
                let widths: Vec<String> = widths.iter().map(ToString::to_string).collect();
                format!("fixed widths {}", widths.join(","))
            }
            HierarchyScheme::ParentColumn => "parent column".to_string(),
            HierarchyScheme::Flat => "flat".to_string(),
        }
    }
}

impl CodingStandard {
    pub const ALL: [CodingStandard; 6] = [
        CodingStandard::Icd9Cm,
        CodingStandard::Icd9Proc,
        CodingStandard::Ndc,
        CodingStandard::Atc,
        CodingStandard::CcsCm,
        CodingStandard::CcsProc,
    ];

    /// Canonical name, also the vocabulary file stem.
    pub fn name(self) -> &'static str {
        match self {
            CodingStandard::Icd9Cm => "ICD9CM",
            CodingStandard::Icd9Proc => "ICD9PROC",
            CodingStandard::Ndc => "NDC",
            CodingStandard::Atc => "ATC",
            CodingStandard::CcsCm => "CCSCM",
            CodingStandard::CcsProc => "CCSPROC",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            CodingStandard::Icd9Cm => "ICD-9-CM diagnosis codes",
            CodingStandard::Icd9Proc => "ICD-9-CM procedure codes",
            CodingStandard::Ndc => "National Drug Code",
            CodingStandard::Atc => "Anatomical Therapeutic Chemical classification",
            CodingStandard::CcsCm => "Clinical Classifications Software (diagnoses)",
            CodingStandard::CcsProc => "Clinical Classifications Software (procedures)",
        }
    }

    pub fn hierarchy(self) -> HierarchyScheme {
        match self {
            CodingStandard::Atc => HierarchyScheme::FixedWidth(ATC_SEGMENT_WIDTHS),
            CodingStandard::Ndc => HierarchyScheme::Flat,
            CodingStandard::Icd9Cm
            | CodingStandard::Icd9Proc
            | CodingStandard::CcsCm
            | CodingStandard::CcsProc => HierarchyScheme::ParentColumn,
        }
    }

    /// Normalize a raw code for table keys and lookups.
    ///
    /// ICD-9 codes are stored without the decimal point, so `401.9` and
    /// `4019` are the same code. NDC dashes are dropped and ATC codes are
    /// upper-cased.
    pub fn canonical_code(self, raw: &str) -> Cow<'_, str> {
        let trimmed = raw.trim();
        match self {
            CodingStandard::Icd9Cm | CodingStandard::Icd9Proc if trimmed.contains('.') => {
                Cow::Owned(trimmed.replace('.', ""))
            }
            CodingStandard::Ndc if trimmed.contains('-') => Cow::Owned(trimmed.replace('-', "")),
            CodingStandard::Atc if trimmed.chars().any(|ch| ch.is_ascii_lowercase()) => {
                Cow::Owned(trimmed.to_ascii_uppercase())
            }
            _ => Cow::Borrowed(trimmed),
        }
    }
}

impl fmt::Display for CodingStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CodingStandard {
    type Err = VocabError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let key: String = value
            .trim()
            .chars()
            .filter(|ch| !matches!(ch, '-' | '_' | ' '))
            .map(|ch| ch.to_ascii_uppercase())
            .collect();
        CodingStandard::ALL
            .into_iter()
            .find(|standard| standard.name() == key)
            .ok_or_else(|| VocabError::UnknownStandard(value.to_string()))
    }
}
