//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the audit engine and storage.

pub mod audit;
pub mod diff;
pub mod export;
pub mod import;

pub use audit::{handle_audit_command, AuditCommands};
pub use diff::{handle_diff_command, handle_flatten_command, DiffArgs, FlattenArgs};
pub use export::{handle_export_command, ExportCommands, ExportFormat};
pub use import::handle_import_command;

use std::path::Path;

use crate::error::{AuditError, AuditResult};
use crate::models::{ArrayMode, Value};

/// Read a JSON document into a value tree
pub(crate) fn load_document(path: &Path, arrays: ArrayMode) -> AuditResult<Value> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| AuditError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
    let json: serde_json::Value = serde_json::from_str(&contents).map_err(|e| {
        AuditError::Json(format!("Failed to parse {}: {}", path.display(), e))
    })?;
    Ok(Value::from_json(&json, arrays))
}

pub(crate) fn array_mode(sets: bool) -> ArrayMode {
    if sets {
        ArrayMode::Set
    } else {
        ArrayMode::List
    }
}
