//! Mappings from a granular source standard onto a coarser target.

use std::collections::BTreeMap;

use crate::standard::CodingStandard;

/// Source code -> target code, one target per source.
///
/// Source tables may list several targets for one code; the first one in
/// file order is kept so that translation stays one-to-one.
#[derive(Debug, Clone)]
pub struct CrossMap {
    source: CodingStandard,
    target: CodingStandard,
    mappings: BTreeMap<String, String>,
}

impl CrossMap {
    pub fn from_pairs<I, S, T>(source: CodingStandard, target: CodingStandard, pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let mut mappings = BTreeMap::new();
        for (from, to) in pairs {
            let from = source.canonical_code(from.as_ref()).into_owned();
            let to = target.canonical_code(to.as_ref()).into_owned();
            if from.is_empty() || to.is_empty() {
                continue;
            }
            mappings.entry(from).or_insert(to);
        }
        Self {
            source,
            target,
            mappings,
        }
    }

    pub fn source(&self) -> CodingStandard {
        self.source
    }

    pub fn target(&self) -> CodingStandard {
        self.target
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Target code for a source code.
    pub fn map_code(&self, code: &str) -> Option<&str> {
        self.mappings
            .get(&*self.source.canonical_code(code))
            .map(String::as_str)
    }
}
