//! Predict command

use anyhow::{bail, Context, Result};
use porter_lib::{Features, PredictOptions, Prediction};
use serde::Serialize;
use std::path::PathBuf;
use tabled::Tabled;

use crate::output::{format_features, print_info, print_table, OutputFormat};
use crate::Target;

use super::load_porter;

/// Row for predictions table
#[derive(Tabled, Serialize)]
struct PredictionRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Features")]
    features: String,
    #[tabled(rename = "Prediction")]
    #[serde(skip)]
    prediction: String,
    #[tabled(skip)]
    #[serde(rename = "prediction")]
    raw: Prediction,
}

/// Parse `"1.0, 2.5,-3"` into a feature vector
pub fn parse_features(text: &str) -> Result<Vec<f64>> {
    let values = text
        .split(',')
        .map(|part| {
            let part = part.trim();
            part.parse::<f64>()
                .with_context(|| format!("Invalid feature value '{}'", part))
        })
        .collect::<Result<Vec<_>>>()?;
    if values.is_empty() {
        bail!("Empty feature vector");
    }
    Ok(values)
}

/// Compile and run the exported code on each feature vector
pub fn predict(
    target: &Target,
    features: &[String],
    workspace: Option<PathBuf>,
    keep_workspace: bool,
    format: OutputFormat,
) -> Result<()> {
    let rows = features
        .iter()
        .map(|f| parse_features(f))
        .collect::<Result<Vec<_>>>()?;
    let porter = load_porter(target)?;

    let options = PredictOptions {
        class_name: target.class_name.clone(),
        method_name: Some(target.method_name()),
        workspace: workspace.clone(),
        keep_workspace,
    };
    let predictions = porter
        .predict(&Features::Batch(rows.clone()), &options)
        .context("Prediction failed")?
        .into_vec();

    let table: Vec<PredictionRow> = rows
        .iter()
        .zip(predictions)
        .enumerate()
        .map(|(index, (row, prediction))| PredictionRow {
            index,
            features: format_features(row),
            prediction: prediction.to_string(),
            raw: prediction,
        })
        .collect();
    print_table(&table, format);

    if keep_workspace {
        if let (Some(path), OutputFormat::Table) = (workspace, format) {
            print_info(&format!("Workspace kept at {}", path.display()));
        }
    }
    Ok(())
}
