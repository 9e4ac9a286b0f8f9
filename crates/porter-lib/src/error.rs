//! Error taxonomy for porting, compiling and executing models

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, PorterError>;

/// Errors raised while porting a model or running the ported code
#[derive(Debug, Error)]
pub enum PorterError {
    /// The estimator type is not in the registry of known families
    #[error("the given model '{0}' isn't supported")]
    UnsupportedAlgorithm(String),

    /// A required fitted attribute is absent or malformed
    #[error("the model '{estimator}' is not fully fitted: {reason}")]
    IncompleteModel { estimator: String, reason: String },

    /// No renderer is registered for the requested language
    #[error("the target programming language '{language}' isn't supported{}", .family.as_ref().map(|f| format!(" for {}", f)).unwrap_or_default())]
    UnsupportedLanguage {
        language: String,
        family: Option<crate::models::Family>,
    },

    /// The method is not in the estimator's supported set
    #[error("the given model method '{method}' isn't supported by '{estimator}'")]
    UnsupportedMethod { method: String, estimator: String },

    /// A required external executable is not installed
    #[error("the required application '{executable}' for {language} isn't available")]
    ToolchainMissing { executable: String, language: String },

    /// A class or method name that cannot be used in generated code
    #[error("invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// Input row does not have the model's number of features
    #[error("expected {expected} features per sample, got {actual}")]
    FeatureCountMismatch { expected: usize, actual: usize },

    /// Input row holds NaN or an infinity, which the targets cannot parse alike
    #[error("feature {feature} is {value}, only finite values can be passed to ported code")]
    NonFiniteFeature { feature: usize, value: f64 },

    /// The compile step exited unsuccessfully
    #[error("compilation failed ({command}, exit code {exit_code:?}): {output}")]
    CompilationFailure {
        command: String,
        exit_code: Option<i32>,
        output: String,
    },

    /// The execute step failed or printed something unparsable
    #[error("execution failed ({command}, exit code {exit_code:?}): {output}")]
    ExecutionFailure {
        command: String,
        exit_code: Option<i32>,
        output: String,
    },

    /// An external process exceeded its bounded wait and was killed
    #[error("'{command}' killed after exceeding {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    /// Ported predictions disagree with the source model
    #[error("{diverged} of {total} predictions diverged (first at sample {first})")]
    DivergentPrediction {
        diverged: usize,
        total: usize,
        first: usize,
    },

    #[error("workspace error at {}: {source}", .path.display())]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("invalid model document: {0}")]
    Json(#[from] serde_json::Error),
}

impl PorterError {
    pub(crate) fn incomplete(estimator: &str, reason: impl Into<String>) -> Self {
        PorterError::IncompleteModel {
            estimator: estimator.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn workspace(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PorterError::Workspace {
            path: path.into(),
            source,
        }
    }

    /// Returns true for caller/environment mismatches that are detected
    /// before any file is written or process spawned
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            PorterError::UnsupportedAlgorithm(_)
                | PorterError::IncompleteModel { .. }
                | PorterError::UnsupportedLanguage { .. }
                | PorterError::UnsupportedMethod { .. }
                | PorterError::ToolchainMissing { .. }
                | PorterError::InvalidName { .. }
                | PorterError::FeatureCountMismatch { .. }
                | PorterError::NonFiniteFeature { .. }
        )
    }

    /// Check that `row` is `n_features` wide and entirely finite
    pub(crate) fn check_row(n_features: usize, row: &[f64]) -> Result<()> {
        if row.len() != n_features {
            return Err(PorterError::FeatureCountMismatch {
                expected: n_features,
                actual: row.len(),
            });
        }
        match row.iter().position(|v| !v.is_finite()) {
            Some(feature) => Err(PorterError::NonFiniteFeature {
                feature,
                value: row[feature],
            }),
            None => Ok(()),
        }
    }
}
