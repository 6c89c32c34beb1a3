//! Cohort loading for the code-mapping pipeline.
//!
//! Reads the dataset split from disk (or splits `patients.json` with a
//! fixed seed), keeps patients with enough condition visits and projects
//! each record onto the fields the normalizer translates.

pub mod artifact;
pub mod cohort;
pub mod error;
pub mod split;

pub use artifact::{ALL_RECORDS_FILE, ArtifactLayout, RawRecord, discover_artifacts, read_records};
pub use cohort::{
    CohortOptions, LoadedCohort, MIN_CONDITION_VISITS, filter_eligible, is_eligible, load_cohort,
    load_split, project, read_split,
};
pub use error::{IngestError, Result};
pub use split::{DEFAULT_SPLIT_SEED, SplitRatios, split_records};
