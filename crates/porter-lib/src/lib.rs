//! Model porting library
//!
//! This crate provides the core functionality for:
//! - Extracting canonical parameters from trained classifier dumps
//! - Rendering those parameters as standalone source code in C, Go, Java,
//!   JavaScript, PHP and Ruby
//! - Compiling and executing the generated code in an isolated workspace
//! - Checking the ported code against the source model's own predictions

pub mod config;
pub mod dispatch;
pub mod equivalence;
pub mod error;
pub mod harness;
pub mod introspect;
pub mod models;
pub mod observability;
pub mod porter;
pub mod reference;
pub mod render;

pub use config::HarnessConfig;
pub use dispatch::Renderer;
pub use equivalence::{EquivalenceChecker, EquivalenceReport, RecordedClassifier, SampleOutcome};
pub use error::{PorterError, Result};
pub use harness::{
    CompileExecuteHarness, PathProbe, PortedArtifact, RunOptions, RunOutput, ShellProbe,
    ToolchainProbe,
};
pub use introspect::{CanonicalModel, Estimator};
pub use models::*;
pub use observability::StructuredLogger;
pub use porter::{ExportDetails, Porter, PredictOptions};
pub use reference::Classifier;
pub use render::{round_trip, NumberFormat, RenderOptions};
