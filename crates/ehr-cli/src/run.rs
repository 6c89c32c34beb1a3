//! The `map` flow: vocabulary, cohort, then checkpointed normalization.
//!
//! Every fatal condition surfaces before the first snapshot is written, so
//! a failed run leaves no output behind.

use std::num::NonZeroUsize;
use std::time::Instant;

use anyhow::{Context, Result};
use ehr_ingest::load_cohort;
use ehr_model::Domain;
use ehr_output::JsonSnapshotWriter;
use ehr_vocab::{CrossMap, VocabularyRegistry};
use tracing::{info, info_span};

use crate::config::PipelineConfig;
use crate::pipeline::{DriverOptions, patient_progress, progress_allowed, run_normalization};
use crate::types::{DomainSetup, MapResult};

pub fn run_map(config: &PipelineConfig, show_progress: bool) -> Result<MapResult> {
    let run_span = info_span!("map", dataset_root = %config.dataset_root.display());
    let _run_guard = run_span.enter();

    // =========================================================================
    // Stage 1: Vocabulary registry
    // =========================================================================
    let vocab_span = info_span!("load_vocabulary", vocab_dir = %config.vocab_dir.display());
    let vocab_start = Instant::now();
    let registry = vocab_span
        .in_scope(|| VocabularyRegistry::load(&config.vocab_dir, &config.registry))
        .with_context(|| format!("load vocabulary from {}", config.vocab_dir.display()))?;
    info!(
        vocab_dir = %config.vocab_dir.display(),
        duration_ms = vocab_start.elapsed().as_millis(),
        "vocabulary loaded"
    );

    // =========================================================================
    // Stage 2: Cohort
    // =========================================================================
    let loaded = load_cohort(&config.dataset_root, &config.cohort)
        .with_context(|| format!("load cohort from {}", config.dataset_root.display()))?;

    // =========================================================================
    // Stage 3: Normalize with checkpoints
    // =========================================================================
    let mut writer = JsonSnapshotWriter::new(&config.output);
    let progress = patient_progress(
        loaded.cohort.len(),
        progress_allowed(show_progress, &config.translate),
    );
    let options = DriverOptions {
        translate: config.translate,
        policy: config.checkpoint,
        parallel: config.parallel,
    };
    let outcome = run_normalization(
        loaded.cohort.into_patients(),
        &registry,
        &options,
        &mut writer,
        &progress,
    )?;

    let domains = Domain::ALL
        .into_iter()
        .map(|domain| {
            let vocabulary = registry.domain(domain);
            DomainSetup {
                domain,
                standard: vocabulary.standard(),
                source: vocabulary.cross_map().map(CrossMap::source),
                depth: vocabulary.depth().map(NonZeroUsize::get),
            }
        })
        .collect();

    Ok(MapResult {
        dataset_root: config.dataset_root.clone(),
        vocab_dir: config.vocab_dir.clone(),
        output: writer.path().to_path_buf(),
        partition: loaded.partition,
        split_sizes: loaded.split_sizes,
        pre_split: loaded.pre_split,
        partition_size: loaded.partition_size,
        ineligible: loaded.ineligible,
        domains,
        report: outcome.report,
        snapshots: outcome.snapshots,
    })
}
