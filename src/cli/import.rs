//! CLI command handler for audit trail import
//!
//! Reads a JSON or YAML export and merges its records into the local trail,
//! skipping records that are already present.

use std::path::Path;

use super::ExportFormat;
use crate::error::{AuditError, AuditResult};
use crate::export::{import_from_json, import_from_yaml};
use crate::storage::Storage;

/// Handle the import command
pub fn handle_import_command(
    storage: &Storage,
    file: &Path,
    format: Option<ExportFormat>,
) -> AuditResult<()> {
    if !file.exists() {
        return Err(AuditError::Io(format!("File not found: {}", file.display())));
    }

    let format = format.unwrap_or_else(|| detect_format(file));
    let content = std::fs::read_to_string(file)
        .map_err(|e| AuditError::Io(format!("Failed to read {}: {}", file.display(), e)))?;

    let export = match format {
        ExportFormat::Json => import_from_json(&content)?,
        ExportFormat::Yaml => import_from_yaml(&content)?,
        ExportFormat::Csv => {
            return Err(AuditError::Validation(
                "CSV exports cannot be imported. Use a JSON or YAML export.".into(),
            ))
        }
    };

    let total = export.records.len();
    let imported = storage.records.import(export.records)?;

    println!("Imported {} of {} record(s) from {}", imported, total, file.display());
    if imported < total {
        println!("  Skipped (already present): {}", total - imported);
    }

    Ok(())
}

fn detect_format(file: &Path) -> ExportFormat {
    match file
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("yaml" | "yml") => ExportFormat::Yaml,
        Some("csv") => ExportFormat::Csv,
        _ => ExportFormat::Json,
    }
}
