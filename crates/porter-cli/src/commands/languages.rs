//! Support matrix command

use anyhow::Result;
use serde::Serialize;
use tabled::Tabled;

use crate::output::{print_table, OutputFormat};
use porter_lib::dispatch::languages_for;
use porter_lib::introspect::{describe, supported_estimators};

/// Row for the support matrix table
#[derive(Tabled, Serialize)]
struct SupportRow {
    #[tabled(rename = "Estimator")]
    estimator: String,
    #[tabled(rename = "Family")]
    family: String,
    #[tabled(rename = "Methods")]
    methods: String,
    #[tabled(rename = "Languages")]
    languages: String,
}

/// Show every supported estimator with its methods and target languages
pub fn show_languages(format: OutputFormat) -> Result<()> {
    let rows = supported_estimators()
        .into_iter()
        .map(|(name, family)| {
            let descriptor = describe(name)?;
            let methods: Vec<&str> = descriptor.methods.iter().map(|m| m.as_str()).collect();
            let languages: Vec<&str> = languages_for(family).iter().map(|l| l.id()).collect();
            Ok(SupportRow {
                estimator: name.to_string(),
                family: family.to_string(),
                methods: methods.join(", "),
                languages: languages.join(", "),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    print_table(&rows, format);
    Ok(())
}
