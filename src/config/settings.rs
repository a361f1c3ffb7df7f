//! Settings for audit-trail
//!
//! Controls the diff engine tolerances, which entities and tables are kept
//! out of the audit trail, and the size of the background worker pool.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::paths::AuditPaths;
use crate::diff::DiffOptions;
use crate::error::AuditError;

/// Tenant whose exclusion set applies when a tenant has none configured
pub const SYSTEM_TENANT: &str = "System";

/// Largest accepted timestamp tolerance: one day
pub const MAX_TIMESTAMP_EPSILON_MS: i64 = 86_400_000;

/// Settings for audit-trail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Nesting depth past which values are treated as opaque text
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Timestamps closer than this many milliseconds compare equal
    #[serde(default = "default_timestamp_epsilon_ms")]
    pub timestamp_epsilon_ms: i64,

    /// Minimum field-match ratio for pairing elements of unordered collections
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Bookkeeping fields that never take part in a diff
    #[serde(default = "default_ignored_fields")]
    pub ignored_fields: Vec<String>,

    /// Entity kinds that are never audited
    #[serde(default = "default_excluded_entities")]
    pub excluded_entities: BTreeSet<String>,

    /// Tables excluded from auditing, per tenant
    #[serde(default = "default_excluded_tables")]
    pub excluded_tables: BTreeMap<String, BTreeSet<String>>,

    /// Number of background audit workers
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Pending events each worker queue holds before new events are dropped
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_schema_version() -> u32 {
    1
}

fn default_max_depth() -> usize {
    5
}

fn default_timestamp_epsilon_ms() -> i64 {
    1
}

fn default_similarity_threshold() -> f64 {
    0.7
}

fn default_ignored_fields() -> Vec<String> {
    ["id", "tenantId", "createdBy", "updatedBy", "createdAt", "updatedAt"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_excluded_entities() -> BTreeSet<String> {
    ["AuditRecord", "HttpTraceAuditLog"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_excluded_tables() -> BTreeMap<String, BTreeSet<String>> {
    let mut tables = BTreeMap::new();
    tables.insert(
        SYSTEM_TENANT.to_string(),
        BTreeSet::from(["audit_log".to_string()]),
    );
    tables
}

fn default_worker_count() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    1024
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            max_depth: default_max_depth(),
            timestamp_epsilon_ms: default_timestamp_epsilon_ms(),
            similarity_threshold: default_similarity_threshold(),
            ignored_fields: default_ignored_fields(),
            excluded_entities: default_excluded_entities(),
            excluded_tables: default_excluded_tables(),
            worker_count: default_worker_count(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &AuditPaths) -> Result<Self, AuditError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
                AuditError::Io(format!("Failed to read settings file: {}", e))
            })?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                AuditError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            settings.validate()?;
            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &AuditPaths) -> Result<(), AuditError> {
        paths.ensure_directories()?;

        let settings_path = paths.settings_file();
        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            AuditError::Config(format!("Failed to serialize settings: {}", e))
        })?;

        std::fs::write(&settings_path, contents).map_err(|e| {
            AuditError::Io(format!("Failed to write settings file: {}", e))
        })?;

        Ok(())
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<(), AuditError> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(AuditError::Validation(format!(
                "similarity_threshold must be between 0 and 1, got {}",
                self.similarity_threshold
            )));
        }
        if !(0..=MAX_TIMESTAMP_EPSILON_MS).contains(&self.timestamp_epsilon_ms) {
            return Err(AuditError::Validation(format!(
                "timestamp_epsilon_ms must be between 0 and {}, got {}",
                MAX_TIMESTAMP_EPSILON_MS, self.timestamp_epsilon_ms
            )));
        }
        if self.worker_count == 0 {
            return Err(AuditError::Validation("worker_count must be at least 1".into()));
        }
        if self.queue_capacity == 0 {
            return Err(AuditError::Validation(
                "queue_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Engine options derived from these settings
    pub fn diff_options(&self) -> DiffOptions {
        DiffOptions {
            max_depth: self.max_depth,
            timestamp_epsilon: chrono::Duration::try_milliseconds(self.timestamp_epsilon_ms)
                .unwrap_or(chrono::Duration::MAX),
            similarity_threshold: self.similarity_threshold,
            ignored_fields: self.ignored_fields.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.max_depth, 5);
        assert_eq!(settings.timestamp_epsilon_ms, 1);
        assert_eq!(settings.similarity_threshold, 0.7);
        assert!(settings.excluded_entities.contains("AuditRecord"));
        assert!(settings.excluded_tables[SYSTEM_TENANT].contains("audit_log"));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = AuditPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        settings.max_depth = 3;
        settings
            .excluded_tables
            .insert("acme".into(), BTreeSet::from(["payroll".to_string()]));

        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.max_depth, 3);
        assert!(loaded.excluded_tables["acme"].contains("payroll"));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"max_depth": 2}"#).unwrap();
        assert_eq!(settings.max_depth, 2);
        assert_eq!(settings.worker_count, 4);
        assert_eq!(settings.ignored_fields.len(), 6);
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let paths = AuditPaths::with_base_dir(temp_dir.path().to_path_buf());
        std::fs::write(paths.settings_file(), r#"{"similarity_threshold": 1.5}"#).unwrap();

        let err = Settings::load_or_create(&paths).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_epsilon_bounds() {
        let mut settings = Settings::default();
        settings.timestamp_epsilon_ms = 0;
        assert!(settings.validate().is_ok());

        settings.timestamp_epsilon_ms = -1;
        assert!(settings.validate().unwrap_err().is_validation());

        settings.timestamp_epsilon_ms = i64::MAX;
        assert!(settings.validate().unwrap_err().is_validation());
        // Unvalidated settings still produce options
        assert_eq!(settings.diff_options().timestamp_epsilon, chrono::Duration::MAX);
    }

    #[test]
    fn test_zero_epsilon_diff_is_reflexive() {
        let settings = Settings {
            timestamp_epsilon_ms: 0,
            ..Settings::default()
        };
        let differ = crate::diff::StructuralDiffer::new(&settings.diff_options());
        let stamp = chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2024, 1, 1, 0, 0, 0).unwrap();
        let value: crate::models::Value = crate::models::Record::new("Customer")
            .with_value("lastLogin", crate::models::Value::timestamp(stamp))
            .into();

        assert!(differ.diff(&value, &value.clone()).is_empty());
    }

    #[test]
    fn test_diff_options() {
        let settings = Settings::default();
        let options = settings.diff_options();
        assert_eq!(options.max_depth, 5);
        assert_eq!(options.timestamp_epsilon, chrono::Duration::milliseconds(1));
    }
}
