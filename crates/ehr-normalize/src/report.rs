//! Translation coverage reporting.

use std::collections::BTreeSet;

use ehr_model::Domain;
use serde::Serialize;

/// Code counts for one domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DomainCoverage {
    pub codes: usize,
    pub resolved: usize,
    pub unmapped: usize,
}

impl DomainCoverage {
    pub fn record_resolved(&mut self) {
        self.codes += 1;
        self.resolved += 1;
    }

    pub fn record_unmapped(&mut self) {
        self.codes += 1;
        self.unmapped += 1;
    }

    pub fn merge(&mut self, other: &DomainCoverage) {
        self.codes += other.codes;
        self.resolved += other.resolved;
        self.unmapped += other.unmapped;
    }

    /// Fraction of codes resolved; 1.0 when there were no codes.
    pub fn coverage_ratio(&self) -> f64 {
        if self.codes == 0 {
            1.0
        } else {
            self.resolved as f64 / self.codes as f64
        }
    }
}

/// Coverage for each domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CoverageByDomain {
    pub conditions: DomainCoverage,
    pub procedures: DomainCoverage,
    pub drugs: DomainCoverage,
}

impl CoverageByDomain {
    pub fn get(&self, domain: Domain) -> &DomainCoverage {
        match domain {
            Domain::Conditions => &self.conditions,
            Domain::Procedures => &self.procedures,
            Domain::Drugs => &self.drugs,
        }
    }

    pub fn get_mut(&mut self, domain: Domain) -> &mut DomainCoverage {
        match domain {
            Domain::Conditions => &mut self.conditions,
            Domain::Procedures => &mut self.procedures,
            Domain::Drugs => &mut self.drugs,
        }
    }

    pub fn total(&self) -> DomainCoverage {
        let mut total = DomainCoverage::default();
        for domain in Domain::ALL {
            total.merge(self.get(domain));
        }
        total
    }

    pub fn merge(&mut self, other: &CoverageByDomain) {
        for domain in Domain::ALL {
            self.get_mut(domain).merge(other.get(domain));
        }
    }
}

/// Coverage for a single patient.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatientReport {
    pub patient_id: String,
    pub coverage: CoverageByDomain,
}

impl PatientReport {
    pub fn new(patient_id: impl Into<String>) -> Self {
        Self {
            patient_id: patient_id.into(),
            coverage: CoverageByDomain::default(),
        }
    }

    pub fn unmapped(&self) -> usize {
        self.coverage.total().unmapped
    }

    pub fn is_fully_resolved(&self) -> bool {
        self.unmapped() == 0
    }
}

/// Aggregate coverage over a cohort.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizationReport {
    pub patients: usize,
    pub coverage: CoverageByDomain,
    /// Ids of patients with at least one unresolved code.
    pub patients_with_unmapped: BTreeSet<String>,
}

impl NormalizationReport {
    pub fn merge(&mut self, patient: &PatientReport) {
        self.patients += 1;
        self.coverage.merge(&patient.coverage);
        if !patient.is_fully_resolved() {
            self.patients_with_unmapped
                .insert(patient.patient_id.clone());
        }
    }

    /// Fold another cohort report into this one.
    pub fn absorb(&mut self, other: NormalizationReport) {
        self.patients += other.patients;
        self.coverage.merge(&other.coverage);
        self.patients_with_unmapped
            .extend(other.patients_with_unmapped);
    }

    pub fn domain(&self, domain: Domain) -> &DomainCoverage {
        self.coverage.get(domain)
    }

    pub fn total(&self) -> DomainCoverage {
        self.coverage.total()
    }

    pub fn coverage_ratio(&self) -> f64 {
        self.total().coverage_ratio()
    }
}

impl FromIterator<PatientReport> for NormalizationReport {
    fn from_iter<I: IntoIterator<Item = PatientReport>>(iter: I) -> Self {
        let mut report = NormalizationReport::default();
        for patient in iter {
            report.merge(&patient);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_tracks_patients_with_unmapped_codes() {
        let mut clean = PatientReport::new("1");
        clean.coverage.conditions.record_resolved();
        let mut partial = PatientReport::new("2");
        partial.coverage.drugs.record_resolved();
        partial.coverage.drugs.record_unmapped();

        let report: NormalizationReport = [clean, partial].into_iter().collect();
        assert_eq!(report.patients, 2);
        assert_eq!(report.total().codes, 3);
        assert_eq!(report.domain(Domain::Drugs).unmapped, 1);
        assert_eq!(
            report.patients_with_unmapped.iter().collect::<Vec<_>>(),
            vec!["2"]
        );
        assert!((report.coverage_ratio() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn empty_coverage_is_complete() {
        assert!((DomainCoverage::default().coverage_ratio() - 1.0).abs() < f64::EPSILON);
    }
}
