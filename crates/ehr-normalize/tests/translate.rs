#![allow(missing_docs)]

use std::io::{self, Write};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use ehr_model::{Cohort, Domain, PatientRecord, Visit};
use ehr_normalize::{TranslateOptions, translate, translate_in_place};
use ehr_vocab::{CodingStandard, DomainVocabulary, VocabularyMap, VocabularyRegistry};
use proptest::prelude::*;
use serde_json::json;
use tracing_subscriber::fmt::MakeWriter;

/// Collects formatted log output in memory.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        let bytes = self.0.lock().expect("log buffer").clone();
        String::from_utf8(bytes).expect("utf-8 logs")
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("log buffer").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn capture_logs<T>(run: impl FnOnce() -> T) -> (T, String) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .without_time()
        .finish();
    let value = tracing::subscriber::with_default(subscriber, run);
    (value, logs.contents())
}

fn registry() -> VocabularyRegistry {
    let conditions = VocabularyMap::from_entries(
        CodingStandard::Icd9Cm,
        [
            ("431", "Intracerebral hemorrhage"),
            ("401.9", "Unspecified essential hypertension"),
            ("428.0", "Congestive heart failure, unspecified"),
        ],
    );
    let procedures = VocabularyMap::from_entries(
        CodingStandard::Icd9Proc,
        [
            ("33.48", "Other repair and plastic operations on bronchus"),
            ("34.04", "Insertion of intercostal catheter for drainage"),
        ],
    );
    let drugs = VocabularyMap::from_entries(
        CodingStandard::Atc,
        [
            ("C08C", "Dihydropyridine derivatives"),
            ("N02B", "Other analgesics and antipyretics"),
        ],
    );
    VocabularyRegistry::from_domains(
        DomainVocabulary::new(conditions),
        DomainVocabulary::new(procedures),
        DomainVocabulary::new(drugs)
            .with_depth(NonZeroUsize::new(3).expect("non-zero"))
            .expect("ATC supports depth 3"),
    )
}

fn visits(raw: &[&[&str]]) -> Vec<Visit> {
    raw.iter()
        .map(|visit| visit.iter().map(|code| (*code).to_string()).collect())
        .collect()
}

#[test]
fn hypertension_scenario_translates_all_codes() {
    let cohort = Cohort::new(vec![
        PatientRecord::new("1")
            .with_visits(Domain::Conditions, visits(&[&["431", "4019"], &["4019"]]))
            .with_visits(Domain::Drugs, visits(&[&["C08C"]])),
    ]);
    let translated = translate(&cohort, &registry(), &TranslateOptions::default());

    let document = serde_json::to_value(&translated.patients).expect("serialize");
    assert_eq!(
        document,
        json!([{
            "patient_id": "1",
            "conditions": [
                ["Intracerebral hemorrhage", "Unspecified essential hypertension"],
                ["Unspecified essential hypertension"]
            ],
            "drugs": [["Dihydropyridine derivatives"]]
        }])
    );
    assert!(translated.report.patients_with_unmapped.is_empty());
}

#[test]
fn unmapped_scenario_keeps_original_code() {
    let cohort = Cohort::new(vec![
        PatientRecord::new("2").with_visits(Domain::Conditions, visits(&[&["9999"], &["431"]])),
    ]);
    let translated = translate(
        &cohort,
        &registry(),
        &TranslateOptions::default().with_warn_unmapped(true),
    );
    assert_eq!(
        translated.patients[0].conditions,
        Some(visits(&[&["9999"], &["Intracerebral hemorrhage"]]))
    );
    assert_eq!(translated.report.domain(Domain::Conditions).unmapped, 1);
    assert_eq!(translated.report.domain(Domain::Conditions).resolved, 1);
}

#[test]
fn unmapped_warning_names_patient_but_not_code_by_default() {
    let cohort = Cohort::new(vec![
        PatientRecord::new("1")
            .with_visits(Domain::Conditions, visits(&[&["431", "4019", "9999"]])),
        PatientRecord::new("5").with_visits(Domain::Conditions, visits(&[&["431"]])),
    ]);
    let registry = registry();

    let (translated, logs) = capture_logs(|| {
        translate(
            &cohort,
            &registry,
            &TranslateOptions::default().with_warn_unmapped(true),
        )
    });
    assert_eq!(
        translated.patients[0].conditions,
        Some(visits(&[&[
            "Intracerebral hemorrhage",
            "Unspecified essential hypertension",
            "9999"
        ]]))
    );
    assert_eq!(
        translated.patients[1].conditions,
        Some(visits(&[&["Intracerebral hemorrhage"]]))
    );
    assert_eq!(logs.matches("WARN").count(), 1);
    assert!(logs.contains("patient_id=\"1\""));
    assert!(logs.contains("domain=conditions"));
    assert!(!logs.contains("9999"));

    let (_, logs) = capture_logs(|| {
        translate(
            &cohort,
            &registry,
            &TranslateOptions::default()
                .with_warn_unmapped(true)
                .with_log_codes(true),
        )
    });
    assert!(logs.contains("9999"));
}

#[test]
fn warnings_are_off_unless_requested() {
    let cohort = Cohort::new(vec![
        PatientRecord::new("1").with_visits(Domain::Conditions, visits(&[&["9999"]])),
    ]);
    let registry = registry();
    let (_, logs) = capture_logs(|| translate(&cohort, &registry, &TranslateOptions::default()));
    assert!(logs.is_empty());
}

#[test]
fn full_drug_codes_resolve_at_level_three() {
    let mut records = vec![
        PatientRecord::new("3").with_visits(Domain::Drugs, visits(&[&["C08CA01", "N02BE01"]])),
    ];
    let report = translate_in_place(&mut records, &registry(), &TranslateOptions::default());
    assert_eq!(
        records[0].drugs,
        Some(visits(&[&[
            "Dihydropyridine derivatives",
            "Other analgesics and antipyretics"
        ]]))
    );
    assert_eq!(report.domain(Domain::Drugs).resolved, 2);
}

fn code_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("431".to_string()),
        Just("4019".to_string()),
        Just("3404".to_string()),
        Just("C08CA01".to_string()),
        "[0-9]{3,5}",
        "[A-Z][0-9]{2}[A-Z]{2}[0-9]{2}",
    ]
}

fn visits_strategy() -> impl Strategy<Value = Option<Vec<Visit>>> {
    proptest::option::of(proptest::collection::vec(
        proptest::collection::vec(code_strategy(), 0..5),
        0..5,
    ))
}

fn record_strategy() -> impl Strategy<Value = PatientRecord> {
    (
        "[a-z0-9]{1,8}",
        visits_strategy(),
        visits_strategy(),
        visits_strategy(),
    )
        .prop_map(|(patient_id, conditions, procedures, drugs)| PatientRecord {
            patient_id,
            conditions,
            procedures,
            drugs,
        })
}

proptest! {
    /// Translation never changes the visit or code counts of any domain.
    #[test]
    fn translation_preserves_structure(
        records in proptest::collection::vec(record_strategy(), 0..8)
    ) {
        let cohort = Cohort::new(records);
        let translated = translate(&cohort, &registry(), &TranslateOptions::default());
        prop_assert_eq!(translated.patients.len(), cohort.len());
        for (before, after) in cohort.iter().zip(&translated.patients) {
            prop_assert_eq!(&before.patient_id, &after.patient_id);
            for domain in Domain::ALL {
                prop_assert_eq!(before.shape(domain), after.shape(domain));
            }
        }
        let total = translated.report.total();
        let codes: usize = cohort.iter().map(PatientRecord::code_count).sum();
        prop_assert_eq!(total.codes, codes);
        prop_assert_eq!(total.resolved + total.unmapped, codes);
    }

    /// Translating translated output changes nothing.
    #[test]
    fn translation_is_idempotent(
        records in proptest::collection::vec(record_strategy(), 0..8)
    ) {
        let registry = registry();
        let once = translate(&Cohort::new(records), &registry, &TranslateOptions::default());
        let twice = translate(
            &Cohort::new(once.patients.clone()),
            &registry,
            &TranslateOptions::default(),
        );
        prop_assert_eq!(once.patients, twice.patients);
    }
}
