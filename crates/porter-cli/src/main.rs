//! Model porter CLI
//!
//! A command-line tool for exporting trained classifiers as standalone
//! source code, running the exported code and checking it against the
//! original model.

mod commands;
mod output;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use commands::{check, export, languages, predict};
use porter_lib::{Language, Method};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

/// Model porter CLI
#[derive(Parser)]
#[command(name = "porter")]
#[command(author, version, about = "Port trained classifiers to C, Go, Java, JavaScript, PHP and Ruby", long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(long, short, global = true, default_value = "table")]
    pub format: output::OutputFormat,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Which model to port and how
#[derive(Args, Debug, Clone)]
pub struct Target {
    /// Path to the estimator dump (JSON)
    #[arg(long, short)]
    pub model: PathBuf,

    /// Target language (c, go, java, js, php, ruby)
    #[arg(long, short)]
    pub language: Language,

    /// Method to port (predict, predict_proba)
    #[arg(long, default_value = "predict")]
    pub method: Method,

    /// Class name in the generated code
    #[arg(long, default_value = "Brain")]
    pub class_name: String,

    /// Method name in the generated code (defaults to the method)
    #[arg(long)]
    pub method_name: Option<String>,
}

impl Target {
    pub fn method_name(&self) -> String {
        self.method_name
            .clone()
            .unwrap_or_else(|| self.method.as_str().to_string())
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show which estimators and languages are supported
    Languages,

    /// Export a model as source code
    Export {
        #[command(flatten)]
        target: Target,

        /// Print the full export record instead of only the source
        #[arg(long)]
        details: bool,

        /// Write the source to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Compile and run the exported code on feature vectors
    Predict {
        #[command(flatten)]
        target: Target,

        /// Comma-separated feature vector; repeat for a batch
        #[arg(long = "features", required = true)]
        features: Vec<String>,

        /// Workspace directory (must be absent or empty)
        #[arg(long)]
        workspace: Option<PathBuf>,

        /// Keep the workspace after a successful run
        #[arg(long)]
        keep_workspace: bool,
    },

    /// Check the exported code against the source model
    Check {
        #[command(flatten)]
        target: Target,

        /// JSON file with an array of feature vectors
        #[arg(long)]
        inputs: PathBuf,

        /// JSON file with the original model's outputs for `inputs`
        #[arg(long)]
        expected: Option<PathBuf>,

        /// Relative tolerance for probabilities
        #[arg(long, default_value_t = porter_lib::equivalence::DEFAULT_TOLERANCE)]
        tolerance: f64,
    },
}

fn init_logging(json: bool, verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.with_target(false).init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json, cli.verbose);

    match cli.command {
        Commands::Languages => {
            languages::show_languages(cli.format)?;
        }
        Commands::Export {
            target,
            details,
            output,
        } => {
            export::export_model(&target, details, output, cli.format)?;
        }
        Commands::Predict {
            target,
            features,
            workspace,
            keep_workspace,
        } => {
            predict::predict(&target, &features, workspace, keep_workspace, cli.format)?;
        }
        Commands::Check {
            target,
            inputs,
            expected,
            tolerance,
        } => {
            check::check_model(&target, &inputs, expected.as_deref(), tolerance, cli.format)?;
        }
    }

    Ok(())
}
