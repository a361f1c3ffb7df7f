//! JSON Export functionality
//!
//! Exports the complete audit trail to JSON format with schema versioning.

use std::collections::BTreeSet;
use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AuditError, AuditResult};
use crate::models::AuditRecord;
use crate::storage::RecordBackend;

/// Current export schema version
pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Full audit trail export structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrailExport {
    /// Schema version for compatibility checking
    pub schema_version: String,

    pub exported_at: DateTime<Utc>,

    /// Application version that created the export
    pub app_version: String,

    /// Every record, in append order
    pub records: Vec<AuditRecord>,

    pub metadata: ExportMetadata,
}

/// Export metadata for reference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub record_count: usize,

    /// Distinct audited entities
    pub entity_count: usize,

    /// Records currently flagged latest
    pub latest_count: usize,

    pub earliest_record: Option<DateTime<Utc>>,

    pub latest_record: Option<DateTime<Utc>>,
}

impl ExportMetadata {
    fn describe(records: &[AuditRecord]) -> Self {
        let entities: BTreeSet<(&str, &str)> = records
            .iter()
            .map(|r| (r.entity_kind.as_str(), r.entity_id.as_str()))
            .collect();

        Self {
            record_count: records.len(),
            entity_count: entities.len(),
            latest_count: records.iter().filter(|r| r.latest).count(),
            earliest_record: records.iter().map(|r| r.created_at).min(),
            latest_record: records.iter().map(|r| r.created_at).max(),
        }
    }
}

impl TrailExport {
    pub fn from_records(records: Vec<AuditRecord>) -> Self {
        Self {
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            exported_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            metadata: ExportMetadata::describe(&records),
            records,
        }
    }

    /// Snapshot every record in a backend
    pub fn from_backend(backend: &dyn RecordBackend) -> AuditResult<Self> {
        Ok(Self::from_records(backend.all()?))
    }

    /// Validate the export structure
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_version != EXPORT_SCHEMA_VERSION {
            return Err(format!(
                "Schema version mismatch: expected {}, got {}",
                EXPORT_SCHEMA_VERSION, self.schema_version
            ));
        }

        if self.metadata.record_count != self.records.len() {
            return Err(format!(
                "Metadata lists {} records but the export holds {}",
                self.metadata.record_count,
                self.records.len()
            ));
        }

        let mut seen = BTreeSet::new();
        for record in &self.records {
            if !seen.insert(record.id) {
                return Err(format!("Duplicate record id {}", record.id));
            }
        }

        Ok(())
    }
}

/// Export the full audit trail to JSON
pub fn export_trail_json<W: Write + ?Sized>(
    backend: &dyn RecordBackend,
    writer: &mut W,
    pretty: bool,
) -> AuditResult<()> {
    let export = TrailExport::from_backend(backend)?;

    if pretty {
        serde_json::to_writer_pretty(writer, &export)
    } else {
        serde_json::to_writer(writer, &export)
    }
    .map_err(|e| AuditError::Export(e.to_string()))?;

    Ok(())
}

/// Read back a JSON export
pub fn import_from_json(json_str: &str) -> AuditResult<TrailExport> {
    let export: TrailExport =
        serde_json::from_str(json_str).map_err(|e| AuditError::Export(e.to_string()))?;

    export.validate().map_err(AuditError::Validation)?;

    Ok(export)
}
