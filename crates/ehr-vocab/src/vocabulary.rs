//! Read-only code-to-term maps.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;

use crate::error::UnmappedCode;
use crate::standard::{CodingStandard, HierarchyScheme};

/// One vocabulary entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Concept {
    /// Human-readable term (e.g. "Unspecified essential hypertension").
    pub name: String,
    /// Canonical code of the parent concept, if the table names one.
    pub parent: Option<String>,
}

/// An immutable mapping from canonical code to term for one standard.
///
/// Built once by the loader (or [`VocabularyMap::from_entries`]); there is
/// no mutating API afterwards.
#[derive(Debug, Clone)]
pub struct VocabularyMap {
    standard: CodingStandard,
    /// Key: canonical code.
    concepts: BTreeMap<String, Concept>,
}

impl VocabularyMap {
    pub(crate) fn from_concepts(
        standard: CodingStandard,
        concepts: BTreeMap<String, Concept>,
    ) -> Self {
        Self {
            standard,
            concepts,
        }
    }

    /// Build a flat map from `(code, term)` pairs. The first entry for a
    /// code wins.
    pub fn from_entries<I, C, T>(standard: CodingStandard, entries: I) -> Self
    where
        I: IntoIterator<Item = (C, T)>,
        C: AsRef<str>,
        T: Into<String>,
    {
        let mut concepts = BTreeMap::new();
        for (code, name) in entries {
            let key = standard.canonical_code(code.as_ref()).into_owned();
            concepts.entry(key).or_insert_with(|| Concept {
                name: name.into(),
                parent: None,
            });
        }
        Self::from_concepts(standard, concepts)
    }

    /// Build a map from `(code, term, parent)` triples.
    pub fn from_hierarchy<I, C, T, P>(standard: CodingStandard, entries: I) -> Self
    where
        I: IntoIterator<Item = (C, T, Option<P>)>,
        C: AsRef<str>,
        T: Into<String>,
        P: AsRef<str>,
    {
        let mut concepts = BTreeMap::new();
        for (code, name, parent) in entries {
            let key = standard.canonical_code(code.as_ref()).into_owned();
            let parent = parent
                .map(|p| standard.canonical_code(p.as_ref()).into_owned())
                .filter(|p| !p.is_empty());
            concepts.entry(key).or_insert_with(|| Concept {
                name: name.into(),
                parent,
            });
        }
        Self::from_concepts(standard, concepts)
    }

    pub fn standard(&self) -> CodingStandard {
        self.standard
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.concepts
            .contains_key(&*self.standard.canonical_code(code))
    }

    pub fn concept(&self, code: &str) -> Option<&Concept> {
        self.concepts.get(&*self.standard.canonical_code(code))
    }

    /// Resolve a code to its term.
    pub fn lookup(&self, code: &str) -> Result<&str, UnmappedCode> {
        self.concept(code)
            .map(|concept| concept.name.as_str())
            .ok_or_else(|| UnmappedCode::new(self.standard, code))
    }

    /// Shorten a code to its first `depth` hierarchy levels.
    ///
    /// Codes already at or above the requested level are returned in
    /// canonical form. For parent-column standards the depth counts from
    /// the root (level 1) and unknown codes are returned unchanged.
    pub fn truncate(&self, code: &str, depth: NonZeroUsize) -> String {
        let canonical = self.standard.canonical_code(code);
        match self.standard.hierarchy() {
            HierarchyScheme::FixedWidth(widths) => {
                let width: usize = widths.iter().take(depth.get()).sum();
                let end = canonical.char_indices().nth(width).map(|(idx, _)| idx);
                match end {
                    Some(end) => canonical[..end].to_string(),
                    None => canonical.into_owned(),
                }
            }
            HierarchyScheme::ParentColumn => {
                let lineage = self.lineage(&canonical);
                match lineage.get(depth.get() - 1) {
                    Some(ancestor) if lineage.len() > depth.get() => (*ancestor).to_string(),
                    _ => canonical.into_owned(),
                }
            }
            HierarchyScheme::Flat => canonical.into_owned(),
        }
    }

    /// Ancestors of `code` from the root down to (and including) `code`.
    ///
    /// Returns an empty list when the code is unknown.
    pub fn lineage<'a>(&'a self, code: &str) -> Vec<&'a str> {
        let mut chain = Vec::new();
        let Some((key, _)) = self
            .concepts
            .get_key_value(&*self.standard.canonical_code(code))
        else {
            return chain;
        };
        let mut current: Option<&'a str> = Some(key.as_str());
        while let Some(node) = current {
            // Parent cycles in a malformed table must not loop forever.
            if chain.len() > self.concepts.len() || chain.contains(&node) {
                break;
            }
            chain.push(node);
            current = self
                .concepts
                .get(node)
                .and_then(|concept| concept.parent.as_deref());
        }
        chain.reverse();
        chain
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Concept)> {
        self.concepts
            .iter()
            .map(|(code, concept)| (code.as_str(), concept))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn depth(value: usize) -> NonZeroUsize {
        NonZeroUsize::new(value).unwrap()
    }

    fn atc() -> VocabularyMap {
        VocabularyMap::from_entries(
            CodingStandard::Atc,
            [
                ("C", "Cardiovascular system"),
                ("C08", "Calcium channel blockers"),
                ("C08C", "Dihydropyridine derivatives"),
                ("C08CA01", "amlodipine"),
            ],
        )
    }

    #[test]
    fn lookup_resolves_and_reports_unmapped() {
        let map = atc();
        assert_eq!(map.lookup("C08C"), Ok("Dihydropyridine derivatives"));
        assert_eq!(map.lookup("c08c"), Ok("Dihydropyridine derivatives"));
        let miss = map.lookup("Z99").unwrap_err();
        assert_eq!(miss.code, "Z99");
        assert_eq!(miss.standard, CodingStandard::Atc);
    }

    #[test]
    fn fixed_width_truncation_keeps_level_prefix() {
        let map = atc();
        assert_eq!(map.truncate("C08CA01", depth(1)), "C");
        assert_eq!(map.truncate("C08CA01", depth(2)), "C08");
        assert_eq!(map.truncate("C08CA01", depth(3)), "C08C");
        assert_eq!(map.truncate("C08CA01", depth(5)), "C08CA01");
        assert_eq!(map.truncate("C08", depth(3)), "C08");
    }

    #[test]
    fn parent_column_truncation_walks_lineage() {
        let map = VocabularyMap::from_hierarchy(
            CodingStandard::Icd9Cm,
            [
                ("390-459", "Diseases of the circulatory system", None),
                ("401-405", "Hypertensive disease", Some("390-459")),
                ("401", "Essential hypertension", Some("401-405")),
                ("401.9", "Unspecified essential hypertension", Some("401")),
            ],
        );
        assert_eq!(map.lineage("4019"), vec!["390-459", "401-405", "401", "4019"]);
        assert_eq!(map.truncate("401.9", depth(3)), "401");
        assert_eq!(map.truncate("4019", depth(1)), "390-459");
        assert_eq!(map.truncate("4019", depth(4)), "4019");
        assert_eq!(map.truncate("9999", depth(2)), "9999");
    }

    #[test]
    fn lineage_accepts_the_same_spellings_as_lookup() {
        let map = VocabularyMap::from_hierarchy(
            CodingStandard::Icd9Cm,
            [
                ("401", "Essential hypertension", None),
                ("401.9", "Unspecified essential hypertension", Some("401")),
            ],
        );
        assert_eq!(map.lookup("401.9"), Ok("Unspecified essential hypertension"));
        assert_eq!(map.lineage("401.9"), vec!["401", "4019"]);
        assert_eq!(map.lineage(" 4019 "), vec!["401", "4019"]);
    }

    #[test]
    fn lineage_stops_on_parent_cycle() {
        let map = VocabularyMap::from_hierarchy(
            CodingStandard::CcsCm,
            [("1", "one", Some("2")), ("2", "two", Some("1"))],
        );
        assert_eq!(map.lineage("1"), vec!["2", "1"]);
    }

    #[test]
    fn first_entry_wins_for_duplicate_codes() {
        let map = VocabularyMap::from_entries(
            CodingStandard::Icd9Cm,
            [("431", "Intracerebral hemorrhage"), ("431", "duplicate")],
        );
        assert_eq!(map.len(), 1);
        assert_eq!(map.lookup("431"), Ok("Intracerebral hemorrhage"));
    }
}
