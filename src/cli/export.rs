//! CLI commands for audit trail export
//!
//! Writes the stored records to a file or stdout in JSON, YAML or CSV.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::{Subcommand, ValueEnum};

use crate::error::{AuditError, AuditResult};
use crate::export::{csv, json, yaml, TrailExport};
use crate::storage::{RecordBackend, Storage};

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// JSON format (full trail with metadata)
    Json,
    /// YAML format (full trail, human-readable)
    Yaml,
    /// CSV format (one row per changed path)
    Csv,
}

impl ExportFormat {
    /// File extension for the format
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Yaml => "yaml",
            ExportFormat::Csv => "csv",
        }
    }
}

/// Export subcommands
#[derive(Subcommand, Debug)]
pub enum ExportCommands {
    /// Export every record
    All {
        /// Output file path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Export format
        #[arg(short, long, value_enum, default_value = "json")]
        format: ExportFormat,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Export one entity's history to CSV
    Entity {
        /// Entity type name
        kind: String,
        /// Entity primary key
        id: String,
        /// Output file path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show export information without writing files
    Info,
}

/// Handle export commands
pub fn handle_export_command(storage: &Storage, cmd: ExportCommands) -> AuditResult<()> {
    match cmd {
        ExportCommands::All {
            output,
            format,
            pretty,
        } => handle_export_all(storage, output, format, pretty),
        ExportCommands::Entity { kind, id, output } => {
            let records = storage.records.history(&kind, &id)?;
            if records.is_empty() {
                return Err(AuditError::NotFound {
                    entity_type: "Entity",
                    identifier: format!("{}/{}", kind, id),
                });
            }
            with_output(output.as_ref(), |writer| {
                csv::export_records_csv(&records, writer)
            })?;
            if let Some(path) = output {
                println!("Exported {} records to: {}", records.len(), path.display());
            }
            Ok(())
        }
        ExportCommands::Info => handle_export_info(storage),
    }
}

fn handle_export_all(
    storage: &Storage,
    output: Option<PathBuf>,
    format: ExportFormat,
    pretty: bool,
) -> AuditResult<()> {
    let backend = storage.records.as_ref();

    with_output(output.as_ref(), |writer| match format {
        ExportFormat::Json => {
            json::export_trail_json(backend, writer, pretty)?;
            // serde_json leaves off the final newline
            writeln!(writer).map_err(|e| AuditError::Export(e.to_string()))
        }
        ExportFormat::Yaml => yaml::export_trail_yaml(backend, writer),
        ExportFormat::Csv => csv::export_records_csv(&backend.all()?, writer),
    })?;

    if let Some(path) = output {
        println!("Audit trail exported to: {}", path.display());
    }
    Ok(())
}

fn handle_export_info(storage: &Storage) -> AuditResult<()> {
    let export = TrailExport::from_backend(storage.records.as_ref())?;
    let meta = &export.metadata;

    println!("Export Information");
    println!("==================");
    println!("Schema version: {}", export.schema_version);
    println!("Records:        {}", meta.record_count);
    println!("Entities:       {}", meta.entity_count);
    println!("Latest records: {}", meta.latest_count);
    if let (Some(first), Some(last)) = (meta.earliest_record, meta.latest_record) {
        println!(
            "Time span:      {} to {}",
            first.format("%Y-%m-%d %H:%M:%S"),
            last.format("%Y-%m-%d %H:%M:%S")
        );
    }
    println!();
    println!(
        "Default location: {}",
        storage
            .paths()
            .export_dir()
            .join(format!("audit-trail.{}", ExportFormat::Json.extension()))
            .display()
    );

    Ok(())
}

/// Run `write` against the output file, or stdout when no path is given
fn with_output<F>(output: Option<&PathBuf>, write: F) -> AuditResult<()>
where
    F: FnOnce(&mut dyn Write) -> AuditResult<()>,
{
    match output {
        Some(path) => {
            let file = File::create(path).map_err(|e| {
                AuditError::Export(format!("Failed to create file {}: {}", path.display(), e))
            })?;
            let mut writer = BufWriter::new(file);
            write(&mut writer)?;
            writer
                .flush()
                .map_err(|e| AuditError::Export(e.to_string()))
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = stdout.lock();
            write(&mut writer)?;
            writer
                .flush()
                .map_err(|e| AuditError::Export(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuditPaths;
    use crate::models::{Action, AuditRecord, ChangePayload, EntityInfo};
    use tempfile::TempDir;

    #[test]
    fn test_export_all_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let storage = Storage::new(AuditPaths::with_base_dir(temp_dir.path().to_path_buf())).unwrap();
        storage
            .records
            .supersede_and_insert(AuditRecord::new(
                &EntityInfo::new("Customer", "42", "customer"),
                Action::Create,
                ChangePayload::new(),
            ))
            .unwrap();

        for format in [ExportFormat::Json, ExportFormat::Yaml, ExportFormat::Csv] {
            let path = temp_dir.path().join(format!("trail.{}", format.extension()));
            handle_export_all(&storage, Some(path.clone()), format, false).unwrap();
            let contents = std::fs::read_to_string(&path).unwrap();
            assert!(contents.contains("Customer"), "{format:?} export missing entity");
        }
    }

    #[test]
    fn test_export_unknown_entity() {
        let temp_dir = TempDir::new().unwrap();
        let storage = Storage::new(AuditPaths::with_base_dir(temp_dir.path().to_path_buf())).unwrap();

        let err = handle_export_command(
            &storage,
            ExportCommands::Entity {
                kind: "Customer".into(),
                id: "missing".into(),
                output: None,
            },
        )
        .unwrap_err();
        assert!(err.is_not_found());
    }
}
