//! Clinical domains carried by a patient history.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// A clinical domain whose codes are translated independently.
///
/// The declaration order is the processing order: conditions first, then
/// procedures, then drugs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    /// Diagnosis codes (e.g. ICD-9-CM).
    Conditions,
    /// Procedure codes (e.g. ICD-9 procedure codes).
    Procedures,
    /// Drug codes (e.g. NDC or ATC).
    Drugs,
}

impl Domain {
    /// All domains in processing order.
    pub const ALL: [Domain; 3] = [Domain::Conditions, Domain::Procedures, Domain::Drugs];

    /// Record key used for this domain in input and output documents.
    pub fn as_str(self) -> &'static str {
        match self {
            Domain::Conditions => "conditions",
            Domain::Procedures => "procedures",
            Domain::Drugs => "drugs",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "conditions" | "diagnoses" => Ok(Domain::Conditions),
            "procedures" => Ok(Domain::Procedures),
            "drugs" | "prescriptions" => Ok(Domain::Drugs),
            _ => Err(ModelError::UnknownDomain(value.to_string())),
        }
    }
}

/// One partition of a train/validation/test split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    Train,
    Validation,
    #[default]
    Test,
}

impl Partition {
    pub const ALL: [Partition; 3] = [Partition::Train, Partition::Validation, Partition::Test];

    pub fn as_str(self) -> &'static str {
        match self {
            Partition::Train => "train",
            Partition::Validation => "validation",
            Partition::Test => "test",
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Partition {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "train" => Ok(Partition::Train),
            "validation" | "val" => Ok(Partition::Validation),
            "test" => Ok(Partition::Test),
            _ => Err(ModelError::UnknownPartition(value.to_string())),
        }
    }
}
