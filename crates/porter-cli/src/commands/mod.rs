//! CLI command implementations

pub mod check;
pub mod export;
pub mod languages;
pub mod predict;

use anyhow::{Context, Result};
use porter_lib::{Estimator, HarnessConfig, Porter};

use crate::Target;

/// Load the estimator dump and build a `Porter` for the target
pub fn load_porter(target: &Target) -> Result<Porter> {
    let estimator = Estimator::from_path(&target.model)
        .with_context(|| format!("Failed to load model from {}", target.model.display()))?;
    tracing::debug!(estimator = %estimator.name, path = %target.model.display(), "Loaded estimator dump");
    let config = HarnessConfig::load().context("Failed to load harness configuration")?;
    let porter = Porter::new(&estimator, target.language, target.method)
        .with_context(|| format!("Cannot port {} to {}", estimator.name, target.language))?
        .with_config(config);
    Ok(porter)
}
