//! Best-effort code normalization.
//!
//! Replaces each raw code in a patient's visit history with the term the
//! domain vocabulary resolves it to. Structure is preserved exactly: the
//! number of visits per domain and of codes per visit never changes.

pub mod options;
pub mod report;
pub mod translate;

pub use options::TranslateOptions;
pub use report::{CoverageByDomain, DomainCoverage, NormalizationReport, PatientReport};
pub use translate::{
    TranslatedCohort, TranslatedPatient, translate, translate_in_place, translate_patient,
    translate_patient_in_place,
};
