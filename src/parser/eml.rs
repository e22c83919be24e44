//! Single `.eml` files (RFC 5322 messages without MBOX framing).

use std::path::Path;

use crate::error::{LeadError, Result};

/// Read the raw bytes of an `.eml` file.
pub fn read_eml(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    std::fs::read(path).map_err(|e| LeadError::open(path, e))
}

/// True if the path has an `.eml` extension (case-insensitive).
pub fn is_eml_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("eml"))
}
