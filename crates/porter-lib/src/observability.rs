//! Structured events for porting and verification
//!
//! Every event carries an `event` field naming it, so downstream log
//! pipelines can filter on it regardless of the message text.

use crate::models::{Family, Language, Prediction};
use tracing::{info, warn};

/// Emits named, structured porting events
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    component: String,
}

impl StructuredLogger {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
        }
    }

    /// Log a rendered model
    pub fn log_model_exported(
        &self,
        estimator: &str,
        family: Family,
        language: Language,
        filename: &str,
        checksum: &str,
    ) {
        info!(
            event = "model_exported",
            component = %self.component,
            estimator = %estimator,
            family = %family,
            language = %language,
            filename = %filename,
            checksum = %checksum,
            "Exported model"
        );
    }

    /// Log a successful compile step
    pub fn log_artifact_compiled(&self, language: Language, filename: &str, duration_ms: u128) {
        info!(
            event = "artifact_compiled",
            component = %self.component,
            language = %language,
            filename = %filename,
            duration_ms = duration_ms as u64,
            "Compiled ported artifact"
        );
    }

    pub fn log_toolchain_missing(&self, language: Language, executable: &str) {
        warn!(
            event = "toolchain_missing",
            component = %self.component,
            language = %language,
            executable = %executable,
            "Required executable not found"
        );
    }

    /// Log one sample where the ported code disagrees with the source model
    pub fn log_prediction_diverged(
        &self,
        language: Language,
        sample: usize,
        expected: &Prediction,
        actual: &Prediction,
    ) {
        warn!(
            event = "prediction_diverged",
            component = %self.component,
            language = %language,
            sample = sample,
            expected = %expected,
            actual = %actual,
            "Ported prediction diverged"
        );
    }

    /// Log the summary of an equivalence check
    pub fn log_equivalence_checked(
        &self,
        family: Family,
        language: Language,
        total: usize,
        diverged: usize,
    ) {
        let match_rate = if total == 0 {
            1.0
        } else {
            (total - diverged) as f64 / total as f64
        };

        if diverged == 0 {
            info!(
                event = "equivalence_checked",
                component = %self.component,
                family = %family,
                language = %language,
                total = total,
                diverged = diverged,
                match_rate = match_rate,
                "Equivalence check passed"
            );
        } else {
            warn!(
                event = "equivalence_checked",
                component = %self.component,
                family = %family,
                language = %language,
                total = total,
                diverged = diverged,
                match_rate = match_rate,
                "Equivalence check failed"
            );
        }
    }
}
