//! Pipeline configuration.
//!
//! Settings come from three layers, highest precedence first: command-line
//! flags, an optional TOML file, built-in defaults. Both upper layers are
//! a [`ConfigLayer`]; [`PipelineConfig::resolve`] fills the gaps and
//! validates the result before any data is touched.
//!
//! ```toml
//! dataset_root = "data/mimic3"
//! partition = "test"
//! drug_level = 3
//! checkpoint_interval = 50
//!
//! # map diagnoses onto CCS categories through ICD9CM_to_CCSCM.csv
//! conditions_standard = "CCSCM"
//! conditions_source = "ICD9CM"
//! ```

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use ehr_ingest::{CohortOptions, DEFAULT_SPLIT_SEED, MIN_CONDITION_VISITS, SplitRatios};
use ehr_model::Partition;
use ehr_normalize::TranslateOptions;
use ehr_output::{CheckpointPolicy, DEFAULT_CHECKPOINT_INTERVAL};
use ehr_vocab::{
    CodingStandard, DEFAULT_DRUG_LEVEL, HierarchyScheme, RegistrySpec, VocabularySpec,
    resolve_vocab_dir,
};
use serde::Deserialize;
use thiserror::Error;

/// Output file name under `<dataset_root>/output/` when none is given.
pub const DEFAULT_OUTPUT_FILE: &str = "complete_nl.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("no dataset root given (pass DATASET_ROOT or set dataset_root in the config file)")]
    MissingDatasetRoot,

    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// One layer of optional settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigLayer {
    pub dataset_root: Option<PathBuf>,
    pub vocab_dir: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub seed: Option<u64>,
    pub partition: Option<Partition>,
    pub split_ratios: Option<[f64; 3]>,
    pub min_condition_visits: Option<usize>,
    pub conditions_level: Option<usize>,
    pub conditions_source: Option<String>,
    pub procedures_level: Option<usize>,
    pub procedures_source: Option<String>,
    pub drug_level: Option<usize>,
    pub drug_source: Option<String>,
    pub conditions_standard: Option<String>,
    pub procedures_standard: Option<String>,
    pub drugs_standard: Option<String>,
    pub checkpoint_interval: Option<usize>,
    pub warn_unmapped: Option<bool>,
    pub log_codes: Option<bool>,
    pub parallel: Option<bool>,
}

impl ConfigLayer {
    /// Read a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text, path)
    }

    pub fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overlay `upper` on top of `self`; values set in `upper` win.
    #[must_use]
    pub fn overlay(self, upper: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            dataset_root: upper.dataset_root.or(self.dataset_root),
            vocab_dir: upper.vocab_dir.or(self.vocab_dir),
            output: upper.output.or(self.output),
            seed: upper.seed.or(self.seed),
            partition: upper.partition.or(self.partition),
            split_ratios: upper.split_ratios.or(self.split_ratios),
            min_condition_visits: upper.min_condition_visits.or(self.min_condition_visits),
            conditions_level: upper.conditions_level.or(self.conditions_level),
            conditions_source: upper.conditions_source.or(self.conditions_source),
            procedures_level: upper.procedures_level.or(self.procedures_level),
            procedures_source: upper.procedures_source.or(self.procedures_source),
            drug_level: upper.drug_level.or(self.drug_level),
            drug_source: upper.drug_source.or(self.drug_source),
            conditions_standard: upper.conditions_standard.or(self.conditions_standard),
            procedures_standard: upper.procedures_standard.or(self.procedures_standard),
            drugs_standard: upper.drugs_standard.or(self.drugs_standard),
            checkpoint_interval: upper.checkpoint_interval.or(self.checkpoint_interval),
            warn_unmapped: upper.warn_unmapped.or(self.warn_unmapped),
            log_codes: upper.log_codes.or(self.log_codes),
            parallel: upper.parallel.or(self.parallel),
        }
    }
}

/// Fully resolved and validated settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub dataset_root: PathBuf,
    pub vocab_dir: PathBuf,
    pub output: PathBuf,
    pub cohort: CohortOptions,
    pub registry: RegistrySpec,
    pub translate: TranslateOptions,
    pub checkpoint: CheckpointPolicy,
    pub parallel: bool,
}

impl PipelineConfig {
    /// Overlay `cli` on the optional config file and resolve the result.
    pub fn load(config_file: Option<&Path>, cli: ConfigLayer) -> Result<Self, ConfigError> {
        let file_layer = match config_file {
            Some(path) => ConfigLayer::from_file(path)?,
            None => ConfigLayer::default(),
        };
        Self::resolve(file_layer.overlay(cli))
    }

    /// Apply defaults to a merged layer and validate it.
    ///
    /// Every domain takes a target standard, an optional source standard
    /// to cross-map from and an optional truncation level. `drug_level`
    /// defaults to 3 when drugs use ATC; everything else is untruncated
    /// unless a level is given.
    pub fn resolve(layer: ConfigLayer) -> Result<Self, ConfigError> {
        let dataset_root = layer.dataset_root.ok_or(ConfigError::MissingDatasetRoot)?;
        let vocab_dir = resolve_vocab_dir(layer.vocab_dir.as_deref(), &dataset_root);
        let output = layer
            .output
            .unwrap_or_else(|| dataset_root.join("output").join(DEFAULT_OUTPUT_FILE));

        let ratios = match layer.split_ratios {
            Some([train, validation, test]) => SplitRatios::new(train, validation, test)
                .map_err(|error| ConfigError::Invalid {
                    key: "split_ratios",
                    reason: error.to_string(),
                })?,
            None => SplitRatios::default(),
        };
        let cohort = CohortOptions {
            seed: layer.seed.unwrap_or(DEFAULT_SPLIT_SEED),
            ratios,
            partition: layer.partition.unwrap_or_default(),
            min_condition_visits: layer.min_condition_visits.unwrap_or(MIN_CONDITION_VISITS),
        };

        let registry = RegistrySpec {
            conditions: DomainKeys::CONDITIONS.resolve(
                layer.conditions_standard.as_deref(),
                layer.conditions_source.as_deref(),
                layer.conditions_level,
            )?,
            procedures: DomainKeys::PROCEDURES.resolve(
                layer.procedures_standard.as_deref(),
                layer.procedures_source.as_deref(),
                layer.procedures_level,
            )?,
            drugs: DomainKeys::DRUGS.resolve(
                layer.drugs_standard.as_deref(),
                layer.drug_source.as_deref(),
                layer.drug_level,
            )?,
        };

        let interval = layer
            .checkpoint_interval
            .unwrap_or(DEFAULT_CHECKPOINT_INTERVAL);
        let checkpoint = CheckpointPolicy::every(interval).ok_or_else(|| ConfigError::Invalid {
            key: "checkpoint_interval",
            reason: "must be at least 1".to_string(),
        })?;

        Ok(Self {
            dataset_root,
            vocab_dir,
            output,
            cohort,
            registry,
            translate: TranslateOptions {
                warn_unmapped: layer.warn_unmapped.unwrap_or(false),
                log_codes: layer.log_codes.unwrap_or(false),
            },
            checkpoint,
            parallel: layer.parallel.unwrap_or(false),
        })
    }
}

/// Config key names and defaults for one domain's vocabulary.
struct DomainKeys {
    standard: &'static str,
    source: &'static str,
    level: &'static str,
    default_standard: CodingStandard,
    /// Level applied when none is given and the default standard is used.
    default_level: Option<usize>,
}

impl DomainKeys {
    const CONDITIONS: DomainKeys = DomainKeys {
        standard: "conditions_standard",
        source: "conditions_source",
        level: "conditions_level",
        default_standard: CodingStandard::Icd9Cm,
        default_level: None,
    };

    const PROCEDURES: DomainKeys = DomainKeys {
        standard: "procedures_standard",
        source: "procedures_source",
        level: "procedures_level",
        default_standard: CodingStandard::Icd9Proc,
        default_level: None,
    };

    const DRUGS: DomainKeys = DomainKeys {
        standard: "drugs_standard",
        source: "drug_source",
        level: "drug_level",
        default_standard: CodingStandard::Atc,
        default_level: Some(DEFAULT_DRUG_LEVEL),
    };

    fn resolve(
        &self,
        standard: Option<&str>,
        source: Option<&str>,
        level: Option<usize>,
    ) -> Result<VocabularySpec, ConfigError> {
        let standard = match standard {
            Some(value) => parse_standard(self.standard, value)?,
            None => self.default_standard,
        };
        let source = source
            .map(|value| parse_standard(self.source, value))
            .transpose()?;
        if source == Some(standard) {
            return Err(ConfigError::Invalid {
                key: self.source,
                reason: format!("{standard} is already the target standard"),
            });
        }
        let depth = match level {
            Some(level) => Some(self.depth(standard, level)?),
            None if standard == self.default_standard => {
                self.default_level.and_then(NonZeroUsize::new)
            }
            None => None,
        };
        Ok(VocabularySpec::new(standard)
            .with_source(source)
            .with_depth(depth))
    }

    fn depth(&self, standard: CodingStandard, level: usize) -> Result<NonZeroUsize, ConfigError> {
        let depth = NonZeroUsize::new(level).ok_or_else(|| ConfigError::Invalid {
            key: self.level,
            reason: "must be at least 1".to_string(),
        })?;
        let scheme = standard.hierarchy();
        if scheme == HierarchyScheme::Flat {
            return Err(ConfigError::Invalid {
                key: self.level,
                reason: format!("{standard} has no hierarchy"),
            });
        }
        if let Some(max) = scheme.max_depth()
            && level > max
        {
            return Err(ConfigError::Invalid {
                key: self.level,
                reason: format!("{standard} has {max} levels"),
            });
        }
        Ok(depth)
    }
}

fn parse_standard(key: &'static str, value: &str) -> Result<CodingStandard, ConfigError> {
    value
        .parse::<CodingStandard>()
        .map_err(|error| ConfigError::Invalid {
            key,
            reason: error.to_string(),
        })
}
