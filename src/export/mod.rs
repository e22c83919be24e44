//! Export leads to CSV or JSON files.

pub mod csv;
pub mod json;

use std::path::Path;
use std::str::FromStr;

use crate::error::{LeadError, Result};
use crate::model::lead::Lead;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl FromStr for ExportFormat {
    type Err = LeadError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(LeadError::invalid("export format", s)),
        }
    }
}

/// Write `leads` to `output_path` in the given format.
pub fn export_leads(
    leads: &[&Lead],
    format: ExportFormat,
    output_path: &Path,
    csv_separator: char,
) -> Result<()> {
    match format {
        ExportFormat::Csv => csv::export_csv(leads, output_path, csv_separator),
        ExportFormat::Json => json::export_json(leads, output_path),
    }
}
