//! End-to-end tests for the `map` flow.

#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use ehr_cli::config::{ConfigLayer, PipelineConfig};
use ehr_cli::run::run_map;
use ehr_ingest::IngestError;
use ehr_model::Domain;
use ehr_vocab::{CodingStandard, VocabError};
use serde_json::{Value, json};

fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create fixture dir");
    }
    fs::write(path, contents).expect("write fixture");
}

fn write_vocab(root: &Path) {
    let vocab = root.join("vocab");
    write(
        &vocab.join("ICD9CM.csv"),
        "code,name,parent_code\n\
         431,Intracerebral hemorrhage,\n\
         401.9,Unspecified essential hypertension,\n",
    );
    write(
        &vocab.join("ICD9PROC.csv"),
        "code,name,parent_code\n34.04,Insertion of intercostal catheter for drainage,\n",
    );
    write(
        &vocab.join("ATC.csv"),
        "code,name\nC08C,Dihydropyridine derivatives\nC08CA01,amlodipine\n",
    );
}

fn write_dataset(root: &Path) {
    write(&root.join("train.json"), "[]");
    write(&root.join("validation.json"), "[]");
    let test = json!([
        {
            "patient_id": "1",
            "conditions": [["431", "4019"], ["4019"]],
            "drugs": [["C08C"]]
        },
        {
            "patient_id": 2,
            "conditions": [["9999"], ["431"]],
            "procedures": [["3404"]]
        },
        {"patient_id": "3", "conditions": [["431"]]}
    ]);
    write(&root.join("test.json"), &test.to_string());
}

fn config(root: &Path) -> PipelineConfig {
    PipelineConfig::resolve(ConfigLayer {
        dataset_root: Some(root.to_path_buf()),
        vocab_dir: Some(root.join("vocab")),
        ..ConfigLayer::default()
    })
    .expect("resolve config")
}

fn output_dir(root: &Path) -> PathBuf {
    root.join("output")
}

#[test]
fn map_writes_translated_cohort() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_vocab(dir.path());
    write_dataset(dir.path());

    let result = run_map(&config(dir.path()), false).expect("map succeeds");
    assert_eq!(result.output, output_dir(dir.path()).join("complete_nl.json"));
    assert_eq!(result.partition_size, 3);
    assert_eq!(result.ineligible, 1);
    assert_eq!(result.snapshots, 1);
    assert_eq!(result.report.domain(Domain::Conditions).unmapped, 1);
    assert_eq!(result.report.domain(Domain::Procedures).resolved, 1);
    assert_eq!(result.report.patients_with_unmapped.len(), 1);

    let written: Value =
        serde_json::from_str(&fs::read_to_string(&result.output).expect("read output"))
            .expect("output is JSON");
    assert_eq!(
        written,
        json!([
            {
                "patient_id": "1",
                "conditions": [
                    ["Intracerebral hemorrhage", "Unspecified essential hypertension"],
                    ["Unspecified essential hypertension"]
                ],
                "drugs": [["Dihydropyridine derivatives"]]
            },
            {
                "patient_id": "2",
                "conditions": [["9999"], ["Intracerebral hemorrhage"]],
                "procedures": [["Insertion of intercostal catheter for drainage"]]
            }
        ])
    );
}

#[test]
fn config_file_settings_reach_the_run() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_vocab(dir.path());
    write_dataset(dir.path());
    let config_path = dir.path().join("pipeline.toml");
    write(
        &config_path,
        &format!(
            "vocab_dir = {:?}\noutput = {:?}\ncheckpoint_interval = 1\nmin_condition_visits = 1\n",
            dir.path().join("vocab"),
            dir.path().join("out").join("terms.json"),
        ),
    );
    let cli = ConfigLayer {
        dataset_root: Some(dir.path().to_path_buf()),
        ..ConfigLayer::default()
    };

    let config = PipelineConfig::load(Some(&config_path), cli).expect("load config");
    let result = run_map(&config, false).expect("map succeeds");
    assert_eq!(result.output, dir.path().join("out").join("terms.json"));
    assert_eq!(result.partition_size, 3);
    assert_eq!(result.ineligible, 0);
    // one per patient plus the final snapshot
    assert_eq!(result.snapshots, 4);
    assert!(result.output.is_file());
    assert!(!output_dir(dir.path()).exists());
}

#[test]
fn missing_vocabulary_fails_before_any_output() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_vocab(dir.path());
    write_dataset(dir.path());
    fs::remove_file(dir.path().join("vocab").join("ICD9CM.csv")).expect("remove ICD9CM");

    let error = run_map(&config(dir.path()), false).unwrap_err();
    assert!(matches!(
        error.downcast_ref::<VocabError>(),
        Some(VocabError::MissingStandard {
            standard: CodingStandard::Icd9Cm,
            ..
        })
    ));
    assert!(!output_dir(dir.path()).exists());
}

#[test]
fn missing_cohort_fails_before_any_output() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_vocab(dir.path());

    let error = run_map(&config(dir.path()), false).unwrap_err();
    assert!(matches!(
        error.downcast_ref::<IngestError>(),
        Some(IngestError::NoArtifacts { .. })
    ));
    assert!(!output_dir(dir.path()).exists());
}

#[test]
fn malformed_record_fails_before_any_output() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_vocab(dir.path());
    write_dataset(dir.path());
    write(
        &dir.path().join("test.json"),
        &json!([{"conditions": [["431"], ["431"]]}]).to_string(),
    );

    let error = run_map(&config(dir.path()), false).unwrap_err();
    assert!(matches!(
        error.downcast_ref::<IngestError>(),
        Some(IngestError::InvalidRecord { .. })
    ));
    assert!(!output_dir(dir.path()).exists());
}
