use std::path::PathBuf;

use ehr_model::{Domain, Partition, SplitSizes};
use ehr_normalize::NormalizationReport;
use ehr_vocab::CodingStandard;

#[derive(Debug)]
pub struct MapResult {
    pub dataset_root: PathBuf,
    pub vocab_dir: PathBuf,
    pub output: PathBuf,
    pub partition: Partition,
    pub split_sizes: SplitSizes,
    pub pre_split: bool,
    pub partition_size: usize,
    pub ineligible: usize,
    pub domains: Vec<DomainSetup>,
    pub report: NormalizationReport,
    pub snapshots: usize,
}

/// Vocabulary a domain was translated with.
#[derive(Debug)]
pub struct DomainSetup {
    pub domain: Domain,
    pub standard: CodingStandard,
    pub source: Option<CodingStandard>,
    pub depth: Option<usize>,
}

#[derive(Debug)]
pub struct LookupResult {
    pub standard: CodingStandard,
    pub code: String,
    /// Code actually looked up after truncation.
    pub resolved_code: String,
    pub term: Option<String>,
    pub lineage: Vec<String>,
}
