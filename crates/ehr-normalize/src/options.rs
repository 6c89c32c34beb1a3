//! Translation options.

use serde::{Deserialize, Serialize};

/// Controls what the normalizer reports about unresolved codes.
///
/// Translation itself is unaffected: unresolved codes are always kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateOptions {
    /// Emit a warning per unresolved code.
    pub warn_unmapped: bool,
    /// Include the raw code value in those warnings. Off by default so
    /// logs only carry the patient id and domain.
    pub log_codes: bool,
}

impl TranslateOptions {
    #[must_use]
    pub fn with_warn_unmapped(mut self, warn_unmapped: bool) -> Self {
        self.warn_unmapped = warn_unmapped;
        self
    }

    #[must_use]
    pub fn with_log_codes(mut self, log_codes: bool) -> Self {
        self.log_codes = log_codes;
        self
    }
}
