//! Path management for audit-trail
//!
//! Resolves where settings, the record repository and exports live.
//!
//! ## Path Resolution Order
//!
//! 1. `AUDIT_TRAIL_DATA_DIR` environment variable (if set)
//! 2. The platform configuration directory for `audit-trail`
//!    (`~/.config/audit-trail` on Linux, `%APPDATA%\audit-trail` on Windows)

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::AuditError;

/// Environment variable overriding the base directory
pub const DATA_DIR_ENV: &str = "AUDIT_TRAIL_DATA_DIR";

/// Manages all paths used by audit-trail
#[derive(Debug, Clone)]
pub struct AuditPaths {
    /// Base directory for all audit-trail data
    base_dir: PathBuf,
}

impl AuditPaths {
    /// Create a new AuditPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if no platform configuration directory can be determined.
    pub fn new() -> Result<Self, AuditError> {
        let base_dir = if let Ok(custom) = std::env::var(DATA_DIR_ENV) {
            PathBuf::from(custom)
        } else {
            resolve_default_path()?
        };

        Ok(Self { base_dir })
    }

    /// Create AuditPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the data directory
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Get the export directory
    pub fn export_dir(&self) -> PathBuf {
        self.base_dir.join("exports")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to audit_records.json
    pub fn records_file(&self) -> PathBuf {
        self.data_dir().join("audit_records.json")
    }

    /// Ensure all required directories exist
    pub fn ensure_directories(&self) -> Result<(), AuditError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| AuditError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.data_dir())
            .map_err(|e| AuditError::Io(format!("Failed to create data directory: {}", e)))?;

        std::fs::create_dir_all(self.export_dir())
            .map_err(|e| AuditError::Io(format!("Failed to create export directory: {}", e)))?;

        Ok(())
    }

    /// Check if a settings file has been written
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

fn resolve_default_path() -> Result<PathBuf, AuditError> {
    ProjectDirs::from("", "", "audit-trail")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| AuditError::Config("Could not determine a configuration directory".into()))
}
