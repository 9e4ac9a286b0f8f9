//! Export command

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::output::{print_json, print_success, OutputFormat};
use crate::Target;

use super::load_porter;

/// Export a model as source code, or as a full export record with `details`
pub fn export_model(
    target: &Target,
    details: bool,
    output: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let porter = load_porter(target)?;
    let method_name = target.method_name();

    if details {
        let record = porter.export_details(&target.class_name, &method_name)?;
        if let Some(path) = output {
            std::fs::write(&path, &record.model)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        match format {
            OutputFormat::Json => print_json(&record),
            OutputFormat::Table => {
                println!("Filename:    {}", record.filename);
                println!("Class:       {}", record.class_name);
                println!("Method:      {}", record.method_name);
                println!(
                    "Compile:     {}",
                    record.cmd.compilation.as_deref().unwrap_or("-")
                );
                println!("Execute:     {}", record.cmd.execution);
                println!(
                    "Algorithm:   {} ({}, {})",
                    record.algorithm.name, record.algorithm.family, record.algorithm.category
                );
                println!("SHA-256:     {}", record.checksum);
            }
        }
        return Ok(());
    }

    let source = porter.export(&target.class_name, &method_name)?;
    match output {
        Some(path) => {
            std::fs::write(&path, &source)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            print_success(&format!("Wrote {}", path.display()));
        }
        None => print!("{}", source),
    }
    Ok(())
}
