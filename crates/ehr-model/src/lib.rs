pub mod cohort;
pub mod domain;
pub mod error;
pub mod record;

pub use cohort::{Cohort, Split, SplitSizes};
pub use domain::{Domain, Partition};
pub use error::{ModelError, Result};
pub use record::{PatientRecord, Visit};
