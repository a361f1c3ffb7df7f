//! YAML Export functionality
//!
//! Exports the complete audit trail to YAML format for human review.

use std::io::Write;

use crate::error::{AuditError, AuditResult};
use crate::export::json::TrailExport;
use crate::storage::RecordBackend;

/// Export the full audit trail to YAML format
pub fn export_trail_yaml<W: Write + ?Sized>(backend: &dyn RecordBackend, writer: &mut W) -> AuditResult<()> {
    let export = TrailExport::from_backend(backend)?;
    let io_err = |e: std::io::Error| AuditError::Export(e.to_string());

    writeln!(writer, "# audit-trail export").map_err(io_err)?;
    writeln!(writer, "# Generated: {}", export.exported_at).map_err(io_err)?;
    writeln!(writer, "# App Version: {}", export.app_version).map_err(io_err)?;
    writeln!(
        writer,
        "# {} records for {} entities",
        export.metadata.record_count, export.metadata.entity_count
    )
    .map_err(io_err)?;
    writeln!(writer).map_err(io_err)?;

    serde_yaml::to_writer(writer, &export).map_err(|e| AuditError::Export(e.to_string()))?;

    Ok(())
}

/// Read back a YAML export
pub fn import_from_yaml(yaml_str: &str) -> AuditResult<TrailExport> {
    let export: TrailExport =
        serde_yaml::from_str(yaml_str).map_err(|e| AuditError::Export(e.to_string()))?;

    export.validate().map_err(AuditError::Validation)?;

    Ok(export)
}
