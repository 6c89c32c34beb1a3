//! Code-to-term translation over patient histories.
//!
//! Every code is looked up independently. A code the vocabulary cannot
//! resolve is kept as-is and counted, so one bad code never stops the
//! visit, the patient or the cohort.

use ehr_model::{Cohort, Domain, PatientRecord};
use ehr_vocab::{UnmappedCode, VocabularyRegistry};

use crate::options::TranslateOptions;
use crate::report::{NormalizationReport, PatientReport};

/// A translated patient and its coverage.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedPatient {
    pub record: PatientRecord,
    pub report: PatientReport,
}

/// A translated cohort, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedCohort {
    pub patients: Vec<PatientRecord>,
    pub report: NormalizationReport,
}

/// Translate one patient without touching the input.
pub fn translate_patient(
    record: &PatientRecord,
    registry: &VocabularyRegistry,
    options: &TranslateOptions,
) -> TranslatedPatient {
    let mut translated = record.clone();
    let report = translate_patient_in_place(&mut translated, registry, options);
    TranslatedPatient {
        record: translated,
        report,
    }
}

/// Translate one patient's codes in place.
///
/// Domains are processed in [`Domain::ALL`] order, visits and codes in
/// record order. Absent domains are skipped.
pub fn translate_patient_in_place(
    record: &mut PatientRecord,
    registry: &VocabularyRegistry,
    options: &TranslateOptions,
) -> PatientReport {
    let mut report = PatientReport::new(record.patient_id.clone());
    for domain in Domain::ALL {
        let vocabulary = registry.domain(domain);
        let Some(visits) = record.visits_mut(domain) else {
            continue;
        };
        let coverage = report.coverage.get_mut(domain);
        for (visit_idx, visit) in visits.iter_mut().enumerate() {
            for code in visit.iter_mut() {
                match vocabulary.lookup(code) {
                    Ok(term) => {
                        *code = term.to_string();
                        coverage.record_resolved();
                    }
                    Err(miss) => {
                        coverage.record_unmapped();
                        if options.warn_unmapped {
                            warn_unmapped(&report.patient_id, domain, visit_idx, &miss, options);
                        }
                    }
                }
            }
        }
    }
    report
}

fn warn_unmapped(
    patient_id: &str,
    domain: Domain,
    visit: usize,
    miss: &UnmappedCode,
    options: &TranslateOptions,
) {
    if options.log_codes {
        tracing::warn!(
            patient_id,
            domain = %domain,
            visit,
            standard = %miss.standard,
            code = %miss.code,
            "code could not be found, keeping original"
        );
    } else {
        tracing::warn!(
            patient_id,
            domain = %domain,
            visit,
            standard = %miss.standard,
            "code could not be found, keeping original"
        );
    }
}

/// Translate a whole cohort. The input cohort is left unchanged.
pub fn translate(
    cohort: &Cohort,
    registry: &VocabularyRegistry,
    options: &TranslateOptions,
) -> TranslatedCohort {
    let mut patients = cohort.patients().to_vec();
    let report = translate_in_place(&mut patients, registry, options);
    TranslatedCohort { patients, report }
}

/// Translate records in place, in slice order.
pub fn translate_in_place(
    records: &mut [PatientRecord],
    registry: &VocabularyRegistry,
    options: &TranslateOptions,
) -> NormalizationReport {
    records
        .iter_mut()
        .map(|record| translate_patient_in_place(record, registry, options))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ehr_model::Visit;
    use ehr_vocab::{CodingStandard, DomainVocabulary, VocabularyMap};
    use std::num::NonZeroUsize;

    fn visits(raw: &[&[&str]]) -> Vec<Visit> {
        raw.iter()
            .map(|visit| visit.iter().map(|code| (*code).to_string()).collect())
            .collect()
    }

    fn registry() -> VocabularyRegistry {
        let conditions = VocabularyMap::from_entries(
            CodingStandard::Icd9Cm,
            [
                ("431", "Intracerebral hemorrhage"),
                ("4019", "Unspecified essential hypertension"),
            ],
        );
        let procedures = VocabularyMap::from_entries(
            CodingStandard::Icd9Proc,
            [("3404", "Insertion of intercostal catheter for drainage")],
        );
        let drugs = VocabularyMap::from_entries(
            CodingStandard::Atc,
            [("C08C", "Dihydropyridine derivatives")],
        );
        let drugs = DomainVocabulary::new(drugs)
            .with_depth(NonZeroUsize::new(3).unwrap())
            .unwrap();
        VocabularyRegistry::from_domains(
            DomainVocabulary::new(conditions),
            DomainVocabulary::new(procedures),
            drugs,
        )
    }

    #[test]
    fn translates_every_domain() {
        let record = PatientRecord::new("1")
            .with_visits(Domain::Conditions, visits(&[&["431", "4019"], &["4019"]]))
            .with_visits(Domain::Drugs, visits(&[&["C08C"]]));
        let translated = translate_patient(&record, &registry(), &TranslateOptions::default());
        assert_eq!(
            translated.record.conditions,
            Some(visits(&[
                &["Intracerebral hemorrhage", "Unspecified essential hypertension"],
                &["Unspecified essential hypertension"],
            ]))
        );
        assert_eq!(
            translated.record.drugs,
            Some(visits(&[&["Dihydropyridine derivatives"]]))
        );
        assert_eq!(translated.record.procedures, None);
        assert!(translated.report.is_fully_resolved());
        assert_eq!(translated.report.coverage.conditions.resolved, 3);
    }

    #[test]
    fn unmapped_code_is_kept_and_counted() {
        let record = PatientRecord::new("2")
            .with_visits(Domain::Conditions, visits(&[&["9999", "431"]]));
        let translated = translate_patient(
            &record,
            &registry(),
            &TranslateOptions::default().with_warn_unmapped(true),
        );
        assert_eq!(
            translated.record.conditions,
            Some(visits(&[&["9999", "Intracerebral hemorrhage"]]))
        );
        assert_eq!(translated.report.coverage.conditions.unmapped, 1);
        assert_eq!(translated.report.unmapped(), 1);
    }

    #[test]
    fn empty_visits_and_duplicates() {
        let record = PatientRecord::new("3")
            .with_visits(Domain::Conditions, visits(&[&[], &["431", "431"]]))
            .with_visits(Domain::Procedures, Vec::new());
        let translated = translate_patient(&record, &registry(), &TranslateOptions::default());
        assert_eq!(
            translated.record.conditions,
            Some(visits(&[
                &[],
                &["Intracerebral hemorrhage", "Intracerebral hemorrhage"],
            ]))
        );
        assert_eq!(translated.record.procedures, Some(Vec::new()));
    }

    #[test]
    fn cohort_translation_leaves_input_untouched() {
        let cohort = Cohort::new(vec![
            PatientRecord::new("1").with_visits(Domain::Conditions, visits(&[&["431"]])),
            PatientRecord::new("2").with_visits(Domain::Conditions, visits(&[&["9999"]])),
        ]);
        let before = cohort.clone();
        let translated = translate(&cohort, &registry(), &TranslateOptions::default());
        assert_eq!(cohort, before);
        assert_eq!(
            translated.patients[0].conditions,
            Some(visits(&[&["Intracerebral hemorrhage"]]))
        );
        assert_eq!(translated.report.patients, 2);
        assert!(translated.report.patients_with_unmapped.contains("2"));
    }
}
