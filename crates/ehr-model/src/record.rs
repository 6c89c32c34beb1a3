//! Patient records and their per-domain visit histories.
//!
//! A record holds up to three domains. Each domain is an ordered sequence
//! of visits and each visit is an ordered sequence of code strings:
//!
//! ```text
//! conditions: [["431", "4019"], ["4019"]]
//!              ^ visit 1        ^ visit 2
//! ```
//!
//! The same struct is used for the raw history and for the translated
//! output document; translation only replaces strings in place.

use serde::{Deserialize, Serialize};

use crate::domain::Domain;

/// Codes recorded during one clinical encounter.
pub type Visit = Vec<String>;

/// A single patient's projected history.
///
/// Domains that were absent from the source record are `None` and are
/// omitted from the serialized document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub patient_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<Visit>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procedures: Option<Vec<Visit>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drugs: Option<Vec<Visit>>,
}

impl PatientRecord {
    /// Create a record with no domains.
    pub fn new(patient_id: impl Into<String>) -> Self {
        Self {
            patient_id: patient_id.into(),
            ..Self::default()
        }
    }

    /// Builder-style setter for one domain.
    #[must_use]
    pub fn with_visits(mut self, domain: Domain, visits: Vec<Visit>) -> Self {
        self.set_visits(domain, Some(visits));
        self
    }

    pub fn visits(&self, domain: Domain) -> Option<&[Visit]> {
        match domain {
            Domain::Conditions => self.conditions.as_deref(),
            Domain::Procedures => self.procedures.as_deref(),
            Domain::Drugs => self.drugs.as_deref(),
        }
    }

    pub fn visits_mut(&mut self, domain: Domain) -> Option<&mut Vec<Visit>> {
        match domain {
            Domain::Conditions => self.conditions.as_mut(),
            Domain::Procedures => self.procedures.as_mut(),
            Domain::Drugs => self.drugs.as_mut(),
        }
    }

    pub fn set_visits(&mut self, domain: Domain, visits: Option<Vec<Visit>>) {
        match domain {
            Domain::Conditions => self.conditions = visits,
            Domain::Procedures => self.procedures = visits,
            Domain::Drugs => self.drugs = visits,
        }
    }

    /// Number of visits recorded for a domain (0 when the domain is absent).
    pub fn visit_count(&self, domain: Domain) -> usize {
        self.visits(domain).map_or(0, <[Visit]>::len)
    }

    /// Codes per visit for a domain, `None` when the domain is absent.
    pub fn shape(&self, domain: Domain) -> Option<Vec<usize>> {
        self.visits(domain)
            .map(|visits| visits.iter().map(Vec::len).collect())
    }

    /// Total number of codes across all domains and visits.
    pub fn code_count(&self) -> usize {
        Domain::ALL
            .iter()
            .filter_map(|domain| self.visits(*domain))
            .flat_map(|visits| visits.iter())
            .map(Vec::len)
            .sum()
    }

    /// Domains present on this record, in processing order.
    pub fn present_domains(&self) -> impl Iterator<Item = Domain> + '_ {
        Domain::ALL
            .into_iter()
            .filter(|domain| self.visits(*domain).is_some())
    }
}
