//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a table from a list of items
pub fn print_table<T: Tabled + Serialize>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("{}", "No items found".yellow());
                return;
            }
            let table = Table::new(items).with(Style::rounded()).to_string();
            println!("{}", table);
        }
        OutputFormat::Json => print_json(&items),
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    if let Ok(json) = serde_json::to_string_pretty(value) {
        println!("{}", json);
    }
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Color a pass/fail marker
pub fn color_match(matched: bool) -> String {
    if matched {
        "match".green().to_string()
    } else {
        "DIVERGED".red().bold().to_string()
    }
}

/// Format a match rate as a percentage, colored by how close it is to 100%
pub fn color_rate(rate: f64) -> String {
    let formatted = format!("{:.1}%", rate * 100.0);
    if rate >= 1.0 {
        formatted.green().to_string()
    } else if rate >= 0.9 {
        formatted.yellow().to_string()
    } else {
        formatted.red().to_string()
    }
}

/// Compact rendering of a feature vector
pub fn format_features(features: &[f64]) -> String {
    let parts: Vec<String> = features.iter().map(|v| format!("{}", v)).collect();
    parts.join(", ")
}
