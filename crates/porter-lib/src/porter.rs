//! Porter facade
//!
//! `Porter` ties the pipeline together for one estimator, target language
//! and method: introspection, dispatch and the method check all happen in
//! `Porter::new`, so every configuration error surfaces before any export
//! or harness run.

use crate::config::HarnessConfig;
use crate::dispatch::Renderer;
use crate::error::Result;
use crate::harness::{CompileExecuteHarness, PortedArtifact, RunOptions, ToolchainProbe};
use crate::introspect::{introspect, CanonicalModel, Estimator};
use crate::models::{
    AlgorithmDescriptor, Category, Family, Features, Language, Method, Prediction,
    PredictionOutput,
};
use crate::observability::StructuredLogger;
use crate::render::{round_trip, NumberFormat, RenderOptions};
use serde::Serialize;
use std::path::PathBuf;

/// Export record for tooling that wants more than the source text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportDetails {
    pub model: String,
    pub filename: String,
    pub class_name: String,
    pub method_name: String,
    pub cmd: CommandDetails,
    pub algorithm: AlgorithmDetails,
    /// Hex SHA-256 of `model`
    pub checksum: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandDetails {
    pub compilation: Option<String>,
    pub execution: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlgorithmDetails {
    #[serde(rename = "type")]
    pub category: Category,
    pub name: String,
    pub family: Family,
}

/// Naming and workspace choices for a prediction run
#[derive(Debug, Clone)]
pub struct PredictOptions {
    pub class_name: String,
    /// Defaults to the method's own name
    pub method_name: Option<String>,
    /// Caller-chosen workspace; must be absent or empty
    pub workspace: Option<PathBuf>,
    pub keep_workspace: bool,
}

impl Default for PredictOptions {
    fn default() -> Self {
        Self {
            class_name: "Brain".to_string(),
            method_name: None,
            workspace: None,
            keep_workspace: false,
        }
    }
}

impl PredictOptions {
    pub fn with_workspace(mut self, path: impl Into<PathBuf>) -> Self {
        self.workspace = Some(path.into());
        self
    }

    pub fn keep_workspace(mut self, keep: bool) -> Self {
        self.keep_workspace = keep;
        self
    }

    fn run_options(&self) -> RunOptions {
        RunOptions {
            workspace: self.workspace.clone(),
            keep_workspace: self.keep_workspace,
        }
    }
}

/// Ports one fitted estimator to one language for one method
pub struct Porter {
    descriptor: AlgorithmDescriptor,
    model: CanonicalModel,
    method: Method,
    renderer: Renderer,
    harness: CompileExecuteHarness,
    number_format: NumberFormat,
    logger: StructuredLogger,
}

impl std::fmt::Debug for Porter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Porter")
            .field("descriptor", &self.descriptor)
            .field("method", &self.method)
            .field("renderer", &self.renderer)
            .finish()
    }
}

impl Porter {
    /// Introspect, check the method and resolve the renderer
    pub fn new(estimator: &Estimator, language: Language, method: Method) -> Result<Self> {
        let (descriptor, model) = introspect(estimator)?;
        descriptor.require(method)?;
        let renderer = Renderer::lookup(descriptor.family, language)?;

        Ok(Self {
            descriptor,
            model,
            method,
            renderer,
            harness: CompileExecuteHarness::new(language, HarnessConfig::default()),
            number_format: round_trip,
            logger: StructuredLogger::new("porter"),
        })
    }

    /// Use a different harness configuration; an installed probe stays
    pub fn with_config(mut self, config: HarnessConfig) -> Self {
        self.harness = self.harness.with_config(config);
        self
    }

    pub fn with_probe(mut self, probe: impl ToolchainProbe + 'static) -> Self {
        self.harness = self.harness.with_probe(probe);
        self
    }

    /// Literal format for doubles in generated code
    pub fn with_number_format(mut self, number_format: NumberFormat) -> Self {
        self.number_format = number_format;
        self
    }

    pub fn descriptor(&self) -> &AlgorithmDescriptor {
        &self.descriptor
    }

    pub fn language(&self) -> Language {
        self.renderer.language()
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn harness(&self) -> &CompileExecuteHarness {
        &self.harness
    }

    /// The canonical model itself, evaluable as the source classifier
    pub fn reference(&self) -> &CanonicalModel {
        &self.model
    }

    /// Render and package the model; touches neither disk nor processes
    pub fn artifact(&self, class_name: &str, method_name: &str) -> Result<PortedArtifact> {
        let options =
            RenderOptions::new(class_name, method_name).with_number_format(self.number_format);
        let source = self.renderer.render(&self.model, self.method, &options)?;
        let artifact = PortedArtifact::new(
            self.language(),
            class_name,
            method_name,
            self.method,
            source,
            self.model.n_features,
            self.model.n_classes(),
        );
        self.logger.log_model_exported(
            &self.descriptor.estimator,
            self.descriptor.family,
            artifact.language,
            &artifact.filename,
            &artifact.checksum,
        );
        Ok(artifact)
    }

    /// Generated source text
    pub fn export(&self, class_name: &str, method_name: &str) -> Result<String> {
        Ok(self.artifact(class_name, method_name)?.source)
    }

    pub fn export_details(&self, class_name: &str, method_name: &str) -> Result<ExportDetails> {
        let artifact = self.artifact(class_name, method_name)?;
        Ok(ExportDetails {
            filename: artifact.filename,
            class_name: artifact.class_name,
            method_name: artifact.method_name,
            cmd: CommandDetails {
                compilation: artifact.compile.map(|c| c.to_string()),
                execution: artifact.execute.to_string(),
            },
            algorithm: AlgorithmDetails {
                category: self.descriptor.category,
                name: self.descriptor.estimator.clone(),
                family: self.descriptor.family,
            },
            checksum: artifact.checksum,
            model: artifact.source,
        })
    }

    /// Export, compile and execute for each row, shaped like the input
    pub fn predict(
        &self,
        features: &Features,
        options: &PredictOptions,
    ) -> Result<PredictionOutput> {
        let predictions = self.predict_rows(&features.rows(), options)?;
        Ok(match features {
            Features::Single(_) => match predictions.into_iter().next() {
                Some(p) => PredictionOutput::Single(p),
                None => PredictionOutput::Batch(Vec::new()),
            },
            Features::Batch(_) => PredictionOutput::Batch(predictions),
        })
    }

    /// Export, compile and execute for each row
    pub fn predict_rows(&self, rows: &[&[f64]], options: &PredictOptions) -> Result<Vec<Prediction>> {
        let method_name = options
            .method_name
            .clone()
            .unwrap_or_else(|| self.method.as_str().to_string());
        let artifact = self.artifact(&options.class_name, &method_name)?;
        let output = self.harness.run(&artifact, rows, &options.run_options())?;
        Ok(output.predictions)
    }
}
