//! Storage layer for audit-trail
//!
//! Provides JSON file storage with atomic writes and automatic directory
//! creation, behind the [`RecordBackend`] trait the record store writes
//! through.

pub mod file_io;
pub mod records;

pub use file_io::{read_json, write_json_atomic};
pub use records::AuditRecordRepository;

use std::sync::Arc;

use crate::config::paths::AuditPaths;
use crate::error::AuditError;
use crate::models::{AuditRecord, RecordId};

/// Persistence used by the audit record store
///
/// Implementations must make [`supersede_and_insert`](Self::supersede_and_insert)
/// atomic with respect to each other: two concurrent calls for the same
/// entity must not both leave their record as the only latest one unseen by
/// the other.
pub trait RecordBackend: Send + Sync {
    /// The record currently flagged latest for an entity
    fn find_latest(
        &self,
        entity_kind: &str,
        entity_id: &str,
    ) -> Result<Option<AuditRecord>, AuditError>;

    /// Clear the latest flag on the entity's current records and insert a new
    /// one. Returns the ids of the records that were superseded.
    fn supersede_and_insert(&self, record: AuditRecord) -> Result<Vec<RecordId>, AuditError>;

    /// All records for an entity, oldest first
    fn history(&self, entity_kind: &str, entity_id: &str) -> Result<Vec<AuditRecord>, AuditError>;

    /// Every record in append order
    fn all(&self) -> Result<Vec<AuditRecord>, AuditError>;

    /// Recompute latest flags from creation time. Returns how many flags changed.
    fn reconcile(&self) -> Result<usize, AuditError>;
}

/// Main storage coordinator
pub struct Storage {
    paths: AuditPaths,
    pub records: Arc<AuditRecordRepository>,
}

impl Storage {
    /// Create a new Storage instance
    pub fn new(paths: AuditPaths) -> Result<Self, AuditError> {
        paths.ensure_directories()?;

        Ok(Self {
            records: Arc::new(AuditRecordRepository::new(paths.records_file())),
            paths,
        })
    }

    /// Get the paths configuration
    pub fn paths(&self) -> &AuditPaths {
        &self.paths
    }

    /// Load all data from disk
    pub fn load_all(&self) -> Result<(), AuditError> {
        self.records.load()
    }

    /// The record repository as a shareable backend handle
    pub fn backend(&self) -> Arc<dyn RecordBackend> {
        self.records.clone()
    }

    /// Check if storage has been initialized
    pub fn is_initialized(&self) -> bool {
        self.paths.settings_file().exists()
    }
}
