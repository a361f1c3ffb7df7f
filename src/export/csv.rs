//! CSV Export functionality
//!
//! One row per changed path, so a change history opens as a flat sheet.
//! Records without changes still get a single row with empty path columns.

use std::io::Write;

use crate::error::{AuditError, AuditResult};
use crate::models::AuditRecord;

const HEADER: [&str; 10] = [
    "Record",
    "Created",
    "Tenant",
    "Entity",
    "Entity ID",
    "Table",
    "Action",
    "Latest",
    "Path",
    "Change",
];

/// Export records to CSV, one row per changed path
pub fn export_records_csv<W: Write>(records: &[AuditRecord], writer: W) -> AuditResult<()> {
    let mut out = csv::Writer::from_writer(writer);
    let csv_err = |e: csv::Error| AuditError::Export(e.to_string());

    out.write_record(HEADER).map_err(csv_err)?;

    for record in records {
        let created = record.created_at.to_rfc3339();
        let latest = record.latest.to_string();
        let action = record.action.to_string();
        let id = record.id.as_uuid().to_string();
        let prefix = [
            id.as_str(),
            created.as_str(),
            record.tenant_id.as_deref().unwrap_or(""),
            record.entity_kind.as_str(),
            record.entity_id.as_str(),
            record.table_name.as_str(),
            action.as_str(),
            latest.as_str(),
        ];

        if record.change_set.is_empty() {
            out.write_record(prefix.iter().chain(["", ""].iter()))
                .map_err(csv_err)?;
            continue;
        }

        for (path, change) in &record.change_set {
            let rendered = change
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| change.to_string());
            out.write_record(
                prefix
                    .iter()
                    .copied()
                    .chain([path.as_str(), rendered.as_str()]),
            )
            .map_err(csv_err)?;
        }
    }

    out.flush()
        .map_err(|e| AuditError::Export(e.to_string()))?;
    Ok(())
}
