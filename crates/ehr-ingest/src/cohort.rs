//! Eligibility filter, projection and cohort assembly.

use std::path::Path;
use std::time::Instant;

use ehr_model::{Cohort, Domain, Partition, PatientRecord, Split, SplitSizes, Visit};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, info_span};

use crate::artifact::{ArtifactLayout, RawRecord, discover_artifacts, read_records};
use crate::error::{IngestError, Result};
use crate::split::{DEFAULT_SPLIT_SEED, SplitRatios, split_records};

/// Minimum number of condition visits a patient needs to be kept.
pub const MIN_CONDITION_VISITS: usize = 2;

/// Record key holding the patient identifier.
pub const PATIENT_ID_KEY: &str = "patient_id";

/// Options for [`load_cohort`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CohortOptions {
    pub seed: u64,
    pub ratios: SplitRatios,
    pub partition: Partition,
    pub min_condition_visits: usize,
}

impl Default for CohortOptions {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SPLIT_SEED,
            ratios: SplitRatios::default(),
            partition: Partition::default(),
            min_condition_visits: MIN_CONDITION_VISITS,
        }
    }
}

impl CohortOptions {
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_partition(mut self, partition: Partition) -> Self {
        self.partition = partition;
        self
    }

    #[must_use]
    pub fn with_ratios(mut self, ratios: SplitRatios) -> Self {
        self.ratios = ratios;
        self
    }

    #[must_use]
    pub fn with_min_condition_visits(mut self, min_condition_visits: usize) -> Self {
        self.min_condition_visits = min_condition_visits;
        self
    }
}

/// A loaded cohort together with the numbers reported to the user.
#[derive(Debug, Clone)]
pub struct LoadedCohort {
    pub cohort: Cohort,
    pub partition: Partition,
    pub split_sizes: SplitSizes,
    /// Records in the selected partition before filtering.
    pub partition_size: usize,
    /// Records dropped by the eligibility filter.
    pub ineligible: usize,
    pub pre_split: bool,
}

/// Read the dataset split, from pre-split artifacts when present.
pub fn load_split(root: &Path, seed: u64, ratios: SplitRatios) -> Result<Split<RawRecord>> {
    read_split(discover_artifacts(root)?, seed, ratios)
}

/// Read the split described by an already discovered layout.
pub fn read_split(
    layout: ArtifactLayout,
    seed: u64,
    ratios: SplitRatios,
) -> Result<Split<RawRecord>> {
    match layout {
        ArtifactLayout::PreSplit {
            train,
            validation,
            test,
        } => Ok(Split {
            train: read_records(&train)?,
            validation: read_records(&validation)?,
            test: read_records(&test)?,
        }),
        ArtifactLayout::Combined(path) => split_records(read_records(&path)?, seed, ratios),
    }
}

/// Whether a raw record has enough condition visits.
///
/// A record without a `conditions` array is never eligible.
pub fn is_eligible(record: &RawRecord, min_condition_visits: usize) -> bool {
    record
        .get(Domain::Conditions.as_str())
        .and_then(Value::as_array)
        .is_some_and(|visits| visits.len() >= min_condition_visits)
}

/// Keep the eligible records in their original order.
pub fn filter_eligible(records: Vec<RawRecord>, min_condition_visits: usize) -> Vec<RawRecord> {
    records
        .into_iter()
        .filter(|record| is_eligible(record, min_condition_visits))
        .collect()
}

/// Reduce a raw record to its id and the three domains.
///
/// Absent (or `null`) domains are omitted. `index` is the record's
/// position in its partition and is only used for error reporting.
pub fn project(record: &RawRecord, index: usize) -> Result<PatientRecord> {
    let patient_id = match record.get(PATIENT_ID_KEY) {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Number(id)) if id.is_i64() || id.is_u64() => id.to_string(),
        Some(other) => {
            return Err(IngestError::InvalidRecord {
                index,
                reason: format!("{PATIENT_ID_KEY} must be a string or integer, got {other}"),
            });
        }
        None => {
            return Err(IngestError::InvalidRecord {
                index,
                reason: format!("missing {PATIENT_ID_KEY}"),
            });
        }
    };

    let mut projected = PatientRecord::new(patient_id);
    for domain in Domain::ALL {
        match record.get(domain.as_str()) {
            None | Some(Value::Null) => {}
            Some(value) => {
                let visits = parse_visits(value).map_err(|reason| IngestError::InvalidRecord {
                    index,
                    reason: format!("{domain}: {reason}"),
                })?;
                projected.set_visits(domain, Some(visits));
            }
        }
    }
    Ok(projected)
}

fn parse_visits(value: &Value) -> std::result::Result<Vec<Visit>, String> {
    let Value::Array(visits) = value else {
        return Err("expected an array of visits".to_string());
    };
    visits
        .iter()
        .enumerate()
        .map(|(visit_idx, visit)| {
            let Value::Array(codes) = visit else {
                return Err(format!("visit {visit_idx} is not an array of codes"));
            };
            codes
                .iter()
                .map(|code| match code {
                    Value::String(code) => Ok(code.clone()),
                    Value::Number(code) => Ok(code.to_string()),
                    other => Err(format!("visit {visit_idx} has a non-scalar code {other}")),
                })
                .collect()
        })
        .collect()
}

/// Load the selected partition, filter it and project every record.
pub fn load_cohort(root: &Path, options: &CohortOptions) -> Result<LoadedCohort> {
    let span = info_span!("load_cohort", root = %root.display(), partition = %options.partition);
    let _guard = span.enter();
    let start = Instant::now();

    let layout = discover_artifacts(root)?;
    let pre_split = layout.is_pre_split();
    let split = read_split(layout, options.seed, options.ratios)?;
    let split_sizes = split.sizes();
    debug!(
        train = split_sizes.train,
        validation = split_sizes.validation,
        test = split_sizes.test,
        pre_split,
        "dataset split ready"
    );

    let records = split.take(options.partition);
    let partition_size = records.len();
    let eligible = filter_eligible(records, options.min_condition_visits);
    let ineligible = partition_size - eligible.len();

    let patients = eligible
        .iter()
        .enumerate()
        .map(|(index, record)| project(record, index))
        .collect::<Result<Vec<_>>>()?;

    info!(
        patient_count = patients.len(),
        partition_size,
        ineligible,
        duration_ms = start.elapsed().as_millis(),
        "cohort loaded"
    );
    Ok(LoadedCohort {
        cohort: Cohort::new(patients),
        partition: options.partition,
        split_sizes,
        partition_size,
        ineligible,
        pre_split,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawRecord {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn eligibility_requires_two_condition_visits() {
        assert!(is_eligible(&raw(json!({"conditions": [["1"], ["2"]]})), 2));
        assert!(!is_eligible(&raw(json!({"conditions": [["1"]]})), 2));
        assert!(!is_eligible(&raw(json!({"drugs": [["1"], ["2"]]})), 2));
    }

    #[test]
    fn projection_drops_extra_keys_and_absent_domains() {
        let record = raw(json!({
            "patient_id": "p1",
            "visit_ids": ["v1", "v2"],
            "conditions": [["431", "4019"], ["4019"]],
            "drugs": [["C08C"]],
        }));
        let projected = project(&record, 0).unwrap();
        assert_eq!(projected.patient_id, "p1");
        assert_eq!(projected.shape(Domain::Conditions), Some(vec![2, 1]));
        assert_eq!(projected.procedures, None);
        assert_eq!(projected.drugs, Some(vec![vec!["C08C".to_string()]]));
    }

    #[test]
    fn integer_ids_and_codes_become_strings() {
        let record = raw(json!({"patient_id": 10006, "procedures": [[3404, "3348"]]}));
        let projected = project(&record, 0).unwrap();
        assert_eq!(projected.patient_id, "10006");
        assert_eq!(
            projected.procedures,
            Some(vec![vec!["3404".to_string(), "3348".to_string()]])
        );
    }

    #[test]
    fn missing_id_is_invalid() {
        let error = project(&raw(json!({"conditions": []})), 3).unwrap_err();
        assert!(matches!(error, IngestError::InvalidRecord { index: 3, .. }));
    }

    #[test]
    fn malformed_domain_is_invalid() {
        let error = project(&raw(json!({"patient_id": "1", "conditions": ["431"]})), 0)
            .unwrap_err();
        assert!(matches!(error, IngestError::InvalidRecord { .. }));
    }
}
