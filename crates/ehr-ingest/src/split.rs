//! Deterministic train/validation/test splitting.

use ehr_model::Split;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::{IngestError, Result};

/// Seed used when none is configured.
pub const DEFAULT_SPLIT_SEED: u64 = 42;

const RATIO_TOLERANCE: f64 = 1e-6;

/// Fractions of records assigned to each partition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitRatios {
    pub train: f64,
    pub validation: f64,
    pub test: f64,
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self {
            train: 0.8,
            validation: 0.1,
            test: 0.1,
        }
    }
}

impl SplitRatios {
    pub fn new(train: f64, validation: f64, test: f64) -> Result<Self> {
        let ratios = Self {
            train,
            validation,
            test,
        };
        ratios.validate()?;
        Ok(ratios)
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.train, self.validation, self.test]
    }

    pub fn validate(&self) -> Result<()> {
        let values = self.as_array();
        if values.iter().any(|value| !value.is_finite() || *value < 0.0) {
            return Err(IngestError::InvalidRatios {
                ratios: values,
                reason: "ratios must be finite and non-negative".to_string(),
            });
        }
        let sum: f64 = values.iter().sum();
        if (sum - 1.0).abs() > RATIO_TOLERANCE {
            return Err(IngestError::InvalidRatios {
                ratios: values,
                reason: format!("ratios sum to {sum}, expected 1"),
            });
        }
        Ok(())
    }
}

/// Partition records with a seeded shuffle.
///
/// The same seed and input order always produce the same partitions.
/// Train and validation sizes are rounded down; test takes the remainder.
pub fn split_records<T>(records: Vec<T>, seed: u64, ratios: SplitRatios) -> Result<Split<T>> {
    ratios.validate()?;
    let total = records.len();
    let mut order: Vec<usize> = (0..total).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    // Ratios may sum to slightly above 1, so clamp before slicing.
    let train_len = (((total as f64) * ratios.train).floor() as usize).min(total);
    let validation_len = (((total as f64) * ratios.validation).floor() as usize)
        .min(total.saturating_sub(train_len));

    let mut slots: Vec<Option<T>> = records.into_iter().map(Some).collect();
    let mut take = |indices: &[usize]| -> Vec<T> {
        indices
            .iter()
            .filter_map(|&idx| slots[idx].take())
            .collect()
    };

    let train = take(&order[..train_len]);
    let validation = take(&order[train_len..train_len + validation_len]);
    let test = take(&order[train_len + validation_len..]);
    Ok(Split {
        train,
        validation,
        test,
    })
}
