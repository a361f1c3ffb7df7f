//! Export module for audit-trail
//!
//! Provides audit trail export in multiple formats:
//! - CSV: one row per changed path (spreadsheet-compatible)
//! - JSON: machine-readable full export with schema version
//! - YAML: human-readable full export

pub mod csv;
pub mod json;
pub mod yaml;

pub use self::csv::export_records_csv;
pub use json::{export_trail_json, import_from_json, TrailExport, EXPORT_SCHEMA_VERSION};
pub use yaml::{export_trail_yaml, import_from_yaml};

