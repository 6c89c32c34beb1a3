//! Per-domain vocabulary registry.
//!
//! The registry is built once at pipeline start and only exposes shared
//! (`&self`) access afterwards, so it can be handed to any number of
//! workers without synchronization.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;

use ehr_model::Domain;
use tracing::info;

use crate::crossmap::CrossMap;
use crate::error::{Result, UnmappedCode, VocabError};
use crate::loader::{load_cross_map, load_vocabulary};
use crate::standard::{CodingStandard, HierarchyScheme};
use crate::vocabulary::VocabularyMap;

/// Default ATC level for drug translation (pharmacological subgroup).
pub const DEFAULT_DRUG_LEVEL: usize = 3;

/// Which vocabulary a domain is translated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VocabularySpec {
    /// Target standard whose terms replace the codes.
    pub standard: CodingStandard,
    /// Source standard of the raw codes, when they must be cross-mapped
    /// onto `standard` first (e.g. NDC onto ATC).
    pub source: Option<CodingStandard>,
    /// Hierarchy level the target code is truncated to before lookup.
    pub depth: Option<NonZeroUsize>,
}

impl VocabularySpec {
    pub fn new(standard: CodingStandard) -> Self {
        Self {
            standard,
            source: None,
            depth: None,
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: Option<CodingStandard>) -> Self {
        self.source = source;
        self
    }

    #[must_use]
    pub fn with_depth(mut self, depth: Option<NonZeroUsize>) -> Self {
        self.depth = depth;
        self
    }
}

/// Vocabulary choice for every domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrySpec {
    pub conditions: VocabularySpec,
    pub procedures: VocabularySpec,
    pub drugs: VocabularySpec,
}

impl Default for RegistrySpec {
    fn default() -> Self {
        Self {
            conditions: VocabularySpec::new(CodingStandard::Icd9Cm),
            procedures: VocabularySpec::new(CodingStandard::Icd9Proc),
            drugs: VocabularySpec::new(CodingStandard::Atc)
                .with_depth(NonZeroUsize::new(DEFAULT_DRUG_LEVEL)),
        }
    }
}

impl RegistrySpec {
    pub fn get(&self, domain: Domain) -> &VocabularySpec {
        match domain {
            Domain::Conditions => &self.conditions,
            Domain::Procedures => &self.procedures,
            Domain::Drugs => &self.drugs,
        }
    }
}

/// A domain's target vocabulary plus the optional cross map and
/// truncation applied before lookup.
#[derive(Debug, Clone)]
pub struct DomainVocabulary {
    map: Arc<VocabularyMap>,
    cross_map: Option<Arc<CrossMap>>,
    depth: Option<NonZeroUsize>,
}

impl DomainVocabulary {
    pub fn new(map: impl Into<Arc<VocabularyMap>>) -> Self {
        Self {
            map: map.into(),
            cross_map: None,
            depth: None,
        }
    }

    /// Truncate codes to `depth` levels of the target hierarchy before
    /// lookup.
    pub fn with_depth(mut self, depth: NonZeroUsize) -> Result<Self> {
        validate_depth(self.map.standard(), depth)?;
        self.depth = Some(depth);
        Ok(self)
    }

    /// Cross-map raw codes onto this vocabulary's standard before lookup.
    pub fn with_cross_map(mut self, cross_map: impl Into<Arc<CrossMap>>) -> Result<Self> {
        let cross_map = cross_map.into();
        if cross_map.target() != self.map.standard() {
            return Err(VocabError::CrossMapTargetMismatch {
                target: cross_map.target(),
                standard: self.map.standard(),
            });
        }
        self.cross_map = Some(cross_map);
        Ok(self)
    }

    pub fn standard(&self) -> CodingStandard {
        self.map.standard()
    }

    pub fn map(&self) -> &VocabularyMap {
        &self.map
    }

    pub fn cross_map(&self) -> Option<&CrossMap> {
        self.cross_map.as_deref()
    }

    pub fn depth(&self) -> Option<NonZeroUsize> {
        self.depth
    }

    /// Translate a raw code to a term.
    ///
    /// With a cross map the code is first mapped onto the target
    /// standard; a missing mapping is reported as unmapped in the source
    /// standard. With a depth the (mapped) code is truncated and the
    /// truncated code is looked up.
    pub fn lookup(&self, code: &str) -> std::result::Result<&str, UnmappedCode> {
        let target_code = match &self.cross_map {
            Some(cross_map) => cross_map
                .map_code(code)
                .ok_or_else(|| UnmappedCode::new(cross_map.source(), code))?,
            None => code,
        };
        match self.depth {
            Some(depth) => {
                let truncated = self.map.truncate(target_code, depth);
                self.map
                    .lookup(&truncated)
                    .map_err(|_| UnmappedCode::new(self.map.standard(), code))
            }
            None => self
                .map
                .lookup(target_code)
                .map_err(|_| UnmappedCode::new(self.map.standard(), code)),
        }
    }
}

fn validate_depth(standard: CodingStandard, depth: NonZeroUsize) -> Result<()> {
    let scheme = standard.hierarchy();
    if scheme == HierarchyScheme::Flat {
        return Err(VocabError::UnsupportedTruncation {
            standard,
            depth: depth.get(),
        });
    }
    if let Some(max) = scheme.max_depth()
        && depth.get() > max
    {
        return Err(VocabError::DepthOutOfRange {
            standard,
            depth: depth.get(),
            max,
        });
    }
    Ok(())
}

/// Immutable set of domain vocabularies.
#[derive(Debug, Clone)]
pub struct VocabularyRegistry {
    conditions: DomainVocabulary,
    procedures: DomainVocabulary,
    drugs: DomainVocabulary,
}

impl VocabularyRegistry {
    pub fn from_domains(
        conditions: DomainVocabulary,
        procedures: DomainVocabulary,
        drugs: DomainVocabulary,
    ) -> Self {
        Self {
            conditions,
            procedures,
            drugs,
        }
    }

    /// Load every domain's vocabulary from `dir`.
    ///
    /// Each standard file is read once even when several domains use it.
    /// A missing file is fatal.
    pub fn load(dir: &Path, spec: &RegistrySpec) -> Result<Self> {
        let mut maps: BTreeMap<CodingStandard, Arc<VocabularyMap>> = BTreeMap::new();
        let mut cross_maps: BTreeMap<(CodingStandard, CodingStandard), Arc<CrossMap>> =
            BTreeMap::new();

        let mut build = |domain: Domain| -> Result<DomainVocabulary> {
            let spec = spec.get(domain);
            let map = match maps.get(&spec.standard) {
                Some(map) => Arc::clone(map),
                None => {
                    let map = Arc::new(load_vocabulary(dir, spec.standard)?);
                    maps.insert(spec.standard, Arc::clone(&map));
                    map
                }
            };
            let mut vocabulary = DomainVocabulary::new(map);
            if let Some(depth) = spec.depth {
                vocabulary = vocabulary.with_depth(depth)?;
            }
            if let Some(source) = spec.source {
                let key = (source, spec.standard);
                let cross_map = match cross_maps.get(&key) {
                    Some(cross_map) => Arc::clone(cross_map),
                    None => {
                        let cross_map = Arc::new(load_cross_map(dir, source, spec.standard)?);
                        cross_maps.insert(key, Arc::clone(&cross_map));
                        cross_map
                    }
                };
                vocabulary = vocabulary.with_cross_map(cross_map)?;
            }
            info!(
                domain = %domain,
                standard = %spec.standard,
                source = ?spec.source.map(CodingStandard::name),
                depth = ?spec.depth,
                concept_count = vocabulary.map().len(),
                "domain vocabulary ready"
            );
            Ok(vocabulary)
        };

        let conditions = build(Domain::Conditions)?;
        let procedures = build(Domain::Procedures)?;
        let drugs = build(Domain::Drugs)?;
        Ok(Self::from_domains(conditions, procedures, drugs))
    }

    pub fn domain(&self, domain: Domain) -> &DomainVocabulary {
        match domain {
            Domain::Conditions => &self.conditions,
            Domain::Procedures => &self.procedures,
            Domain::Drugs => &self.drugs,
        }
    }

    pub fn lookup(&self, domain: Domain, code: &str) -> std::result::Result<&str, UnmappedCode> {
        self.domain(domain).lookup(code)
    }
}
