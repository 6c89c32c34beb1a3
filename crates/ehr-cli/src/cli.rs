//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use ehr_cli::config::ConfigLayer;
use ehr_model::Partition;

#[derive(Parser)]
#[command(
    name = "ehr-codemap",
    version,
    about = "Translate coded EHR visit histories into vocabulary terms",
    long_about = "Translate the diagnosis, procedure and drug codes of an EHR cohort into \
                  human-readable terms.\n\n\
                  Codes are looked up in per-domain vocabularies (ICD-9-CM, ICD-9 procedures, \
                  ATC). Unresolved codes are kept and reported; progress is checkpointed to a \
                  JSON snapshot."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Normalize a cohort and write the translated snapshot.
    Map(MapArgs),

    /// Look up a single code in a vocabulary.
    Lookup(LookupArgs),

    /// List the built-in coding standards.
    Standards,
}

#[derive(Parser)]
pub struct MapArgs {
    /// Dataset folder with train/validation/test.json or patients.json.
    #[arg(value_name = "DATASET_ROOT")]
    pub dataset_root: Option<PathBuf>,

    /// TOML config file; flags given here override its values.
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Vocabulary folder (default: $EHR_VOCAB_DIR, then <DATASET_ROOT>/vocab).
    #[arg(long = "vocab-dir", value_name = "DIR")]
    pub vocab_dir: Option<PathBuf>,

    /// Snapshot path (default: <DATASET_ROOT>/output/complete_nl.json).
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Seed used when splitting patients.json.
    #[arg(long = "seed", value_name = "N")]
    pub seed: Option<u64>,

    /// Partition to normalize.
    #[arg(long = "partition", value_enum)]
    pub partition: Option<PartitionArg>,

    /// Target standard for condition codes (default ICD9CM).
    #[arg(long = "conditions-standard", value_name = "STANDARD")]
    pub conditions_standard: Option<String>,

    /// Standard of the raw condition codes when they need cross-mapping.
    #[arg(long = "conditions-source", value_name = "STANDARD")]
    pub conditions_source: Option<String>,

    /// Hierarchy level condition codes are truncated to before lookup.
    #[arg(long = "conditions-level", value_name = "N")]
    pub conditions_level: Option<usize>,

    /// Target standard for procedure codes (default ICD9PROC).
    #[arg(long = "procedures-standard", value_name = "STANDARD")]
    pub procedures_standard: Option<String>,

    /// Standard of the raw procedure codes when they need cross-mapping.
    #[arg(long = "procedures-source", value_name = "STANDARD")]
    pub procedures_source: Option<String>,

    /// Hierarchy level procedure codes are truncated to before lookup.
    #[arg(long = "procedures-level", value_name = "N")]
    pub procedures_level: Option<usize>,

    /// Target standard for drug codes (default ATC).
    #[arg(long = "drugs-standard", value_name = "STANDARD")]
    pub drugs_standard: Option<String>,

    /// Standard of the raw drug codes when they need cross-mapping (e.g. NDC).
    #[arg(long = "drug-source", value_name = "STANDARD")]
    pub drug_source: Option<String>,

    /// ATC level drug codes are truncated to before lookup (default 3).
    #[arg(long = "drug-level", value_name = "N")]
    pub drug_level: Option<usize>,

    /// Patients between checkpoint snapshots.
    #[arg(long = "checkpoint-interval", value_name = "K")]
    pub checkpoint_interval: Option<usize>,

    /// Warn once per unresolved code.
    #[arg(long = "warn-unmapped")]
    pub warn_unmapped: bool,

    /// Include raw code values in unresolved-code warnings.
    #[arg(long = "log-codes")]
    pub log_codes: bool,

    /// Translate patients in parallel within each checkpoint chunk.
    #[arg(long = "parallel")]
    pub parallel: bool,

    /// Hide the progress bar.
    #[arg(long = "no-progress")]
    pub no_progress: bool,
}

impl MapArgs {
    /// Settings given on the command line, as the topmost config layer.
    pub fn config_layer(&self) -> ConfigLayer {
        ConfigLayer {
            dataset_root: self.dataset_root.clone(),
            vocab_dir: self.vocab_dir.clone(),
            output: self.output.clone(),
            seed: self.seed,
            partition: self.partition.map(Partition::from),
            conditions_standard: self.conditions_standard.clone(),
            conditions_source: self.conditions_source.clone(),
            conditions_level: self.conditions_level,
            procedures_standard: self.procedures_standard.clone(),
            procedures_source: self.procedures_source.clone(),
            procedures_level: self.procedures_level,
            drugs_standard: self.drugs_standard.clone(),
            drug_source: self.drug_source.clone(),
            drug_level: self.drug_level,
            checkpoint_interval: self.checkpoint_interval,
            warn_unmapped: self.warn_unmapped.then_some(true),
            log_codes: self.log_codes.then_some(true),
            parallel: self.parallel.then_some(true),
            ..ConfigLayer::default()
        }
    }
}

#[derive(Parser)]
pub struct LookupArgs {
    /// Coding standard (ICD9CM, ICD9PROC, NDC, ATC, CCSCM, CCSPROC).
    #[arg(value_name = "STANDARD")]
    pub standard: String,

    /// Code to look up.
    #[arg(value_name = "CODE")]
    pub code: String,

    /// Truncate the code to this hierarchy level first.
    #[arg(long = "level", value_name = "N")]
    pub level: Option<usize>,

    /// Vocabulary folder (default: $EHR_VOCAB_DIR, then ./vocab).
    #[arg(long = "vocab-dir", value_name = "DIR")]
    pub vocab_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum PartitionArg {
    Train,
    Validation,
    Test,
}

impl From<PartitionArg> for Partition {
    fn from(value: PartitionArg) -> Self {
        match value {
            PartitionArg::Train => Partition::Train,
            PartitionArg::Validation => Partition::Validation,
            PartitionArg::Test => Partition::Test,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
