//! Checkpointed normalization driver.
//!
//! The driver owns the working set: the translated prefix followed by
//! the not-yet-translated rest. Patients are translated in chunks of the
//! checkpoint interval; after each full chunk the whole working set is
//! handed to the sink, and once more after the last patient. A crash
//! therefore leaves the most recent complete snapshot as the recovery
//! point; a re-run starts from the beginning.

use std::io::{self, IsTerminal};
use std::time::Instant;

use anyhow::{Context, Result};
use ehr_model::PatientRecord;
use ehr_normalize::{
    NormalizationReport, PatientReport, TranslateOptions, translate_in_place,
    translate_patient_in_place,
};
use ehr_output::{CheckpointPolicy, CheckpointSink};
use ehr_vocab::VocabularyRegistry;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{debug, info, info_span};

const PROGRESS_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} patients ({per_sec}) {msg}";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverOptions {
    pub translate: TranslateOptions,
    pub policy: CheckpointPolicy,
    /// Translate the patients of a chunk on the rayon pool. Output and
    /// snapshots are identical to a sequential run.
    pub parallel: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DriverOutcome {
    pub records: Vec<PatientRecord>,
    pub report: NormalizationReport,
    /// Snapshots handed to the sink, including the final one.
    pub snapshots: usize,
}

/// Translate every record and persist checkpoints through `sink`.
///
/// Snapshots are always written from the calling thread. An empty input
/// still produces one (empty) snapshot.
pub fn run_normalization(
    mut records: Vec<PatientRecord>,
    registry: &VocabularyRegistry,
    options: &DriverOptions,
    sink: &mut dyn CheckpointSink,
    progress: &ProgressBar,
) -> Result<DriverOutcome> {
    let total = records.len();
    let interval = options.policy.interval.get();
    let span = info_span!(
        "normalize",
        patient_count = total,
        interval,
        parallel = options.parallel
    );
    let _guard = span.enter();
    let start = Instant::now();

    let mut report = NormalizationReport::default();
    let mut snapshots = 0usize;
    let mut processed = 0usize;

    while processed < total {
        let end = (processed + interval).min(total);
        let chunk = &mut records[processed..end];
        report.absorb(translate_chunk(
            chunk,
            registry,
            &options.translate,
            options.parallel,
        ));
        processed = end;
        progress.set_position(processed as u64);

        if options.policy.is_due(processed) {
            write_checkpoint(sink, &records, processed)?;
            snapshots += 1;
        }
    }

    write_checkpoint(sink, &records, processed)?;
    snapshots += 1;
    progress.finish_and_clear();

    let total_coverage = report.total();
    info!(
        patient_count = total,
        codes = total_coverage.codes,
        resolved = total_coverage.resolved,
        unmapped = total_coverage.unmapped,
        snapshots,
        duration_ms = start.elapsed().as_millis(),
        "normalization complete"
    );
    Ok(DriverOutcome {
        records,
        report,
        snapshots,
    })
}

fn translate_chunk(
    chunk: &mut [PatientRecord],
    registry: &VocabularyRegistry,
    options: &TranslateOptions,
    parallel: bool,
) -> NormalizationReport {
    if parallel {
        let reports: Vec<PatientReport> = chunk
            .par_iter_mut()
            .map(|record| translate_patient_in_place(record, registry, options))
            .collect();
        reports.into_iter().collect()
    } else {
        translate_in_place(chunk, registry, options)
    }
}

fn write_checkpoint(
    sink: &mut dyn CheckpointSink,
    records: &[PatientRecord],
    processed: usize,
) -> Result<()> {
    let span = info_span!("snapshot", processed);
    let _guard = span.enter();
    sink.snapshot(records)
        .with_context(|| format!("write checkpoint after {processed} patients"))?;
    debug!(processed, record_count = records.len(), "checkpoint written");
    Ok(())
}

/// Whether a progress bar may be drawn for a run.
///
/// Per-code warnings go to the same terminal as the bar, so the bar is
/// dropped when they are enabled.
pub fn progress_allowed(requested: bool, translate: &TranslateOptions) -> bool {
    requested && !translate.warn_unmapped
}

/// Progress bar over `len` patients.
///
/// Hidden when disabled or when stderr is not a terminal.
pub fn patient_progress(len: usize, enabled: bool) -> ProgressBar {
    if !enabled || !io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let progress = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::with_template(PROGRESS_TEMPLATE) {
        progress.set_style(style.progress_chars("=> "));
    }
    progress
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_dropped_when_warnings_share_the_terminal() {
        let quiet = TranslateOptions::default();
        let warning = TranslateOptions::default().with_warn_unmapped(true);
        assert!(progress_allowed(true, &quiet));
        assert!(!progress_allowed(true, &warning));
        assert!(!progress_allowed(false, &quiet));
    }

    #[test]
    fn disabled_progress_is_hidden() {
        assert!(patient_progress(10, false).is_hidden());
    }
}
