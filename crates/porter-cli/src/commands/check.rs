//! Equivalence check command

use anyhow::{bail, Context, Result};
use porter_lib::{EquivalenceChecker, PredictOptions, Prediction, RecordedClassifier};
use serde::de::DeserializeOwned;
use std::path::Path;
use tabled::Tabled;

use crate::output::{
    color_match, color_rate, format_features, print_error, print_json, print_success,
    print_table, OutputFormat,
};
use crate::Target;

use super::load_porter;

/// Row for the per-sample outcome table
#[derive(Tabled, serde::Serialize)]
struct OutcomeRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Features")]
    features: String,
    #[tabled(rename = "Expected")]
    expected: String,
    #[tabled(rename = "Ported")]
    actual: String,
    #[tabled(rename = "Result")]
    result: String,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Run the exported code and the source model on the same inputs
///
/// Fails when any sample diverges.
pub fn check_model(
    target: &Target,
    inputs: &Path,
    expected: Option<&Path>,
    tolerance: f64,
    format: OutputFormat,
) -> Result<()> {
    let rows: Vec<Vec<f64>> = read_json(inputs)?;
    let porter = load_porter(target)?;
    let checker = EquivalenceChecker::new(&porter).with_tolerance(tolerance);
    let options = PredictOptions {
        class_name: target.class_name.clone(),
        method_name: Some(target.method_name()),
        ..PredictOptions::default()
    };

    let report = match expected {
        Some(path) => {
            let outputs: Vec<Prediction> = read_json(path)?;
            if outputs.len() != rows.len() {
                bail!(
                    "{} holds {} outputs for {} inputs",
                    path.display(),
                    outputs.len(),
                    rows.len()
                );
            }
            let recorded = RecordedClassifier::new(rows.clone(), outputs);
            checker.check(&recorded, &rows, &options)?
        }
        None => checker.check(porter.reference(), &rows, &options)?,
    };

    match format {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Table => {
            let table: Vec<OutcomeRow> = report
                .outcomes
                .iter()
                .map(|o| OutcomeRow {
                    index: o.index,
                    features: format_features(&o.features),
                    expected: o.expected.to_string(),
                    actual: o.actual.to_string(),
                    result: color_match(o.matched),
                })
                .collect();
            print_table(&table, format);
            println!(
                "{} / {} samples match ({})",
                report.outcomes.len() - report.divergences().len(),
                report.outcomes.len(),
                color_rate(report.match_rate())
            );
        }
    }

    let family = report.family;
    let language = report.language;
    match report.into_result() {
        Ok(_) => {
            if let OutputFormat::Table = format {
                print_success(&format!("{} code is equivalent for {}", language, family));
            }
            Ok(())
        }
        Err(e) => {
            print_error(&e.to_string());
            Err(e.into())
        }
    }
}
