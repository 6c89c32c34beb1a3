//! Cohorts and dataset splits.

use serde::{Deserialize, Serialize};

use crate::domain::Partition;
use crate::record::PatientRecord;

/// Eligible patients, in the order they were loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cohort {
    patients: Vec<PatientRecord>,
}

impl Cohort {
    pub fn new(patients: Vec<PatientRecord>) -> Self {
        Self { patients }
    }

    pub fn len(&self) -> usize {
        self.patients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PatientRecord> {
        self.patients.iter()
    }

    pub fn patients(&self) -> &[PatientRecord] {
        &self.patients
    }

    pub fn into_patients(self) -> Vec<PatientRecord> {
        self.patients
    }
}

impl From<Vec<PatientRecord>> for Cohort {
    fn from(patients: Vec<PatientRecord>) -> Self {
        Self::new(patients)
    }
}

impl<'a> IntoIterator for &'a Cohort {
    type Item = &'a PatientRecord;
    type IntoIter = std::slice::Iter<'a, PatientRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.patients.iter()
    }
}

/// A train/validation/test partition of records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Split<T> {
    pub train: Vec<T>,
    pub validation: Vec<T>,
    pub test: Vec<T>,
}

/// Record counts per partition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitSizes {
    pub train: usize,
    pub validation: usize,
    pub test: usize,
}

impl SplitSizes {
    pub fn total(&self) -> usize {
        self.train + self.validation + self.test
    }
}

impl<T> Split<T> {
    pub fn sizes(&self) -> SplitSizes {
        SplitSizes {
            train: self.train.len(),
            validation: self.validation.len(),
            test: self.test.len(),
        }
    }

    pub fn get(&self, partition: Partition) -> &[T] {
        match partition {
            Partition::Train => &self.train,
            Partition::Validation => &self.validation,
            Partition::Test => &self.test,
        }
    }

    /// Consume the split and keep a single partition.
    pub fn take(self, partition: Partition) -> Vec<T> {
        match partition {
            Partition::Train => self.train,
            Partition::Validation => self.validation,
            Partition::Test => self.test,
        }
    }
}
