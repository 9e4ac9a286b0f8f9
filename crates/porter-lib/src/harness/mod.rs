//! Compile and execute harness
//!
//! Runs a `PortedArtifact` for real: write the source into a scoped
//! workspace, compile it when the language needs it, then execute it once
//! per feature row and parse what it prints.

pub mod commands;
pub mod probe;
pub mod process;
pub mod workspace;


pub use commands::{compile_command, dependencies, execute_command, CommandLine};
pub use probe::{PathProbe, ShellProbe, ToolchainProbe};
pub use workspace::Workspace;

use crate::config::HarnessConfig;
use crate::error::{PorterError, Result};
use crate::models::{Language, Method, Prediction};
use crate::observability::StructuredLogger;
use process::{Finished, Stage};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::cell::OnceCell;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Generated source plus what it takes to build and run it
///
/// Immutable once created; one per export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortedArtifact {
    pub language: Language,
    pub class_name: String,
    pub method_name: String,
    pub method: Method,
    pub source: String,
    pub filename: String,
    pub compile: Option<CommandLine>,
    pub execute: CommandLine,
    /// Hex SHA-256 of `source`
    pub checksum: String,
    pub n_features: usize,
    pub n_classes: usize,
}

impl PortedArtifact {
    pub fn new(
        language: Language,
        class_name: &str,
        method_name: &str,
        method: Method,
        source: String,
        n_features: usize,
        n_classes: usize,
    ) -> Self {
        let checksum = hex::encode(Sha256::digest(source.as_bytes()));
        Self {
            language,
            class_name: class_name.to_string(),
            method_name: method_name.to_string(),
            method,
            filename: language.filename(class_name),
            compile: compile_command(language, class_name),
            execute: execute_command(language, class_name),
            source,
            checksum,
            n_features,
            n_classes,
        }
    }
}

/// Where to run and whether to keep the result
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Caller-chosen workspace; must be absent or empty
    pub workspace: Option<PathBuf>,
    /// Keep the workspace when the run succeeds
    pub keep_workspace: bool,
}

/// Predictions of one harness run
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutput {
    /// One per input row, in input order
    pub predictions: Vec<Prediction>,
    /// Set when the workspace was kept
    pub workspace: Option<PathBuf>,
}

/// Compiles and executes artifacts of one target language
///
/// The toolchain probe runs at most once per harness.
pub struct CompileExecuteHarness {
    language: Language,
    config: HarnessConfig,
    probe: Box<dyn ToolchainProbe>,
    /// `Some(executable)` when a dependency is missing
    toolchain: OnceCell<Option<String>>,
    logger: StructuredLogger,
}

impl std::fmt::Debug for CompileExecuteHarness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompileExecuteHarness")
            .field("language", &self.language)
            .field("config", &self.config)
            .field("toolchain", &self.toolchain.get())
            .finish()
    }
}

impl CompileExecuteHarness {
    pub fn new(language: Language, config: HarnessConfig) -> Self {
        Self {
            language,
            config,
            probe: Box::new(PathProbe),
            toolchain: OnceCell::new(),
            logger: StructuredLogger::new("harness"),
        }
    }

    /// Replace the probe, forgetting any cached result
    pub fn with_probe(mut self, probe: impl ToolchainProbe + 'static) -> Self {
        self.probe = Box::new(probe);
        self.toolchain = OnceCell::new();
        self
    }

    /// Replace the configuration, keeping the probe and its cached result
    pub fn with_config(mut self, config: HarnessConfig) -> Self {
        self.config = config;
        self
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Fail with `ToolchainMissing` unless every dependency is installed
    pub fn ensure_toolchain(&self) -> Result<()> {
        let missing = self.toolchain.get_or_init(|| {
            let missing = dependencies(self.language)
                .iter()
                .find(|exe| !self.probe.is_available(exe))
                .map(|exe| exe.to_string());
            if let Some(exe) = &missing {
                self.logger.log_toolchain_missing(self.language, exe);
            }
            missing
        });
        match missing {
            Some(executable) => Err(PorterError::ToolchainMissing {
                executable: executable.clone(),
                language: self.language.id().to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Build the artifact once and execute it for every row
    ///
    /// Row widths, feature finiteness and the toolchain are checked before any
    /// workspace exists.
    pub fn run(
        &self,
        artifact: &PortedArtifact,
        rows: &[&[f64]],
        options: &RunOptions,
    ) -> Result<RunOutput> {
        if artifact.language != self.language {
            return Err(PorterError::UnsupportedLanguage {
                language: artifact.language.id().to_string(),
                family: None,
            });
        }
        for row in rows {
            PorterError::check_row(artifact.n_features, row)?;
        }
        self.ensure_toolchain()?;

        let workspace = Workspace::acquire(
            options.workspace.as_deref(),
            self.config.workspace_root.as_deref(),
        )?;
        let predictions = self.run_in(&workspace, artifact, rows)?;

        let kept = if options.keep_workspace || self.config.keep_workspace {
            let path = workspace.keep();
            tracing::info!(path = %path.display(), "Kept workspace");
            Some(path)
        } else {
            None
        };
        Ok(RunOutput {
            predictions,
            workspace: kept,
        })
    }

    fn run_in(
        &self,
        workspace: &Workspace,
        artifact: &PortedArtifact,
        rows: &[&[f64]],
    ) -> Result<Vec<Prediction>> {
        let dir = workspace.path();
        workspace.write(&artifact.filename, &artifact.source)?;

        if let Some(compile) = &artifact.compile {
            let start = Instant::now();
            process::run_checked(compile, dir, self.config.process_timeout(), Stage::Compile)?;
            self.logger.log_artifact_compiled(
                self.language,
                &artifact.filename,
                start.elapsed().as_millis(),
            );
        }

        rows.iter()
            .enumerate()
            .map(|(i, row)| {
                tracing::debug!(sample = i, language = %self.language, "Executing ported artifact");
                self.execute(dir, artifact, row)
            })
            .collect()
    }

    fn execute(&self, dir: &Path, artifact: &PortedArtifact, row: &[f64]) -> Result<Prediction> {
        let command = artifact
            .execute
            .with_args(row.iter().map(|v| format!("{:?}", v)));
        let finished =
            process::run_checked(&command, dir, self.config.process_timeout(), Stage::Execute)?;
        parse_output(artifact, &command, &finished)
    }
}

/// Parse a label or a probability vector from the printed output
fn parse_output(
    artifact: &PortedArtifact,
    command: &CommandLine,
    finished: &Finished,
) -> Result<Prediction> {
    let text = finished.stdout.trim();
    let unparsable = || {
        Stage::Execute.failure(
            command,
            finished.status.code(),
            format!("unparsable output: {:?}", finished.combined()),
        )
    };
    match artifact.method {
        Method::Predict => text
            .parse::<i64>()
            .map(Prediction::Label)
            .map_err(|_| unparsable()),
        Method::PredictProba => {
            let values = text
                .split_whitespace()
                .map(|v| v.parse::<f64>())
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|_| unparsable())?;
            if values.len() == artifact.n_classes {
                Ok(Prediction::Probabilities(values))
            } else {
                Err(unparsable())
            }
        }
    }
}
