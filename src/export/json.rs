//! Export leads as a pretty-printed JSON array.

use std::path::Path;

use crate::error::{LeadError, Result};
use crate::model::lead::Lead;

pub fn export_json(leads: &[&Lead], output_path: &Path) -> Result<()> {
    let mut json = serde_json::to_string_pretty(leads)?;
    json.push('\n');
    std::fs::write(output_path, json).map_err(|e| LeadError::io(output_path, e))
}
