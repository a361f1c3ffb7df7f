//! Audit record repository for JSON storage
//!
//! Manages loading and saving audit records to audit_records.json. Records
//! are kept in append order with an index from entity key to positions.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::AuditError;
use crate::models::{AuditRecord, RecordId};

use super::file_io::{read_json, write_json_atomic};
use super::RecordBackend;

/// Serializable record data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct RecordData {
    records: Vec<AuditRecord>,
}

#[derive(Debug, Default)]
struct RecordTable {
    records: Vec<AuditRecord>,
    /// Index: `kind/id` -> positions in `records`, in append order
    by_entity: HashMap<String, Vec<usize>>,
}

impl RecordTable {
    fn from_records(records: Vec<AuditRecord>) -> Self {
        let mut table = Self::default();
        for record in records {
            table.push(record);
        }
        table
    }

    fn push(&mut self, record: AuditRecord) {
        let position = self.records.len();
        self.by_entity
            .entry(entity_key(&record.entity_kind, &record.entity_id))
            .or_default()
            .push(position);
        self.records.push(record);
    }

    fn pop(&mut self) {
        if let Some(record) = self.records.pop() {
            let key = entity_key(&record.entity_kind, &record.entity_id);
            if let Some(positions) = self.by_entity.get_mut(&key) {
                positions.pop();
                if positions.is_empty() {
                    self.by_entity.remove(&key);
                }
            }
        }
    }

    /// Flag the newest record of every entity as latest and clear the rest.
    /// Returns how many flags changed.
    fn settle_latest(&mut self) -> usize {
        let mut newest: Vec<usize> = Vec::with_capacity(self.by_entity.len());
        for positions in self.by_entity.values() {
            // Later position wins among equal timestamps
            if let Some(&top) = positions
                .iter()
                .max_by_key(|&&i| (self.records[i].created_at, i))
            {
                newest.push(top);
            }
        }
        newest.sort_unstable();

        let mut changed = 0;
        for (i, record) in self.records.iter_mut().enumerate() {
            let should_be_latest = newest.binary_search(&i).is_ok();
            if record.latest != should_be_latest {
                record.latest = should_be_latest;
                changed += 1;
            }
        }
        changed
    }

    fn positions(&self, entity_kind: &str, entity_id: &str) -> &[usize] {
        self.by_entity
            .get(&entity_key(entity_kind, entity_id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn entity_key(entity_kind: &str, entity_id: &str) -> String {
    format!("{}/{}", entity_kind, entity_id)
}

/// Repository for audit record persistence
///
/// Without a path the repository lives in memory only.
pub struct AuditRecordRepository {
    path: Option<PathBuf>,
    data: RwLock<RecordTable>,
}

impl AuditRecordRepository {
    /// Create a repository backed by a JSON file
    pub fn new(path: PathBuf) -> Self {
        Self {
            path: Some(path),
            data: RwLock::new(RecordTable::default()),
        }
    }

    /// Create a repository that never touches disk
    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: RwLock::new(RecordTable::default()),
        }
    }

    /// Load records from disk, replacing whatever is in memory
    pub fn load(&self) -> Result<(), AuditError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let file_data: RecordData = read_json(path)?;
        let count = file_data.records.len();

        let mut data = self.write()?;
        *data = RecordTable::from_records(file_data.records);

        tracing::debug!(count, path = %path.display(), "loaded audit records");
        Ok(())
    }

    /// Save records to disk
    pub fn save(&self) -> Result<(), AuditError> {
        let data = self.read()?;
        self.persist(&data)
    }

    /// Get a record by ID
    pub fn get(&self, id: RecordId) -> Result<Option<AuditRecord>, AuditError> {
        let data = self.read()?;
        Ok(data.records.iter().find(|r| r.id == id).cloned())
    }

    /// Find a record by the short display form or a full UUID
    pub fn find(&self, query: &str) -> Result<Option<AuditRecord>, AuditError> {
        if let Ok(id) = query.parse::<RecordId>() {
            return self.get(id);
        }
        let data = self.read()?;
        Ok(data
            .records
            .iter()
            .find(|r| r.id.to_string() == query)
            .cloned())
    }

    /// Get all records for an entity kind, in append order
    pub fn by_kind(&self, entity_kind: &str) -> Result<Vec<AuditRecord>, AuditError> {
        let data = self.read()?;
        Ok(data
            .records
            .iter()
            .filter(|r| r.entity_kind == entity_kind)
            .cloned()
            .collect())
    }

    /// Merge records from an export. Records already present (by id) are
    /// skipped and latest flags are recomputed afterwards. Returns how many
    /// records were added.
    pub fn import(&self, records: Vec<AuditRecord>) -> Result<usize, AuditError> {
        let mut data = self.write()?;
        let previous = data.records.clone();
        let mut known: BTreeSet<RecordId> = data.records.iter().map(|r| r.id).collect();

        let mut imported = 0;
        for record in records {
            if known.insert(record.id) {
                data.push(record);
                imported += 1;
            }
        }
        if imported == 0 {
            return Ok(0);
        }
        data.settle_latest();

        if let Err(e) = self.persist(&data) {
            *data = RecordTable::from_records(previous);
            return Err(e);
        }

        tracing::info!(imported, "imported audit records");
        Ok(imported)
    }

    /// Count all records
    pub fn count(&self) -> Result<usize, AuditError> {
        Ok(self.read()?.records.len())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, RecordTable>, AuditError> {
        self.data
            .read()
            .map_err(|e| AuditError::Storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, RecordTable>, AuditError> {
        self.data
            .write()
            .map_err(|e| AuditError::Storage(format!("Failed to acquire write lock: {}", e)))
    }

    fn persist(&self, table: &RecordTable) -> Result<(), AuditError> {
        match &self.path {
            Some(path) => write_json_atomic(
                path,
                &RecordData {
                    records: table.records.clone(),
                },
            ),
            None => Ok(()),
        }
    }
}

impl RecordBackend for AuditRecordRepository {
    fn find_latest(
        &self,
        entity_kind: &str,
        entity_id: &str,
    ) -> Result<Option<AuditRecord>, AuditError> {
        let data = self.read()?;
        Ok(data
            .positions(entity_kind, entity_id)
            .iter()
            .rev()
            .map(|&i| &data.records[i])
            .find(|r| r.latest)
            .cloned())
    }

    /// Flip, insert and persist under one write lock. If persisting fails the
    /// in-memory state is rolled back so memory and disk stay in step.
    fn supersede_and_insert(&self, record: AuditRecord) -> Result<Vec<RecordId>, AuditError> {
        let mut data = self.write()?;

        let flipped: Vec<usize> = data
            .positions(&record.entity_kind, &record.entity_id)
            .iter()
            .copied()
            .filter(|&i| data.records[i].latest)
            .collect();
        for &i in &flipped {
            data.records[i].latest = false;
        }
        data.push(record);

        if let Err(e) = self.persist(&data) {
            data.pop();
            for &i in &flipped {
                data.records[i].latest = true;
            }
            return Err(e);
        }

        Ok(flipped.iter().map(|&i| data.records[i].id).collect())
    }

    fn history(&self, entity_kind: &str, entity_id: &str) -> Result<Vec<AuditRecord>, AuditError> {
        let data = self.read()?;
        let mut records: Vec<AuditRecord> = data
            .positions(entity_kind, entity_id)
            .iter()
            .map(|&i| data.records[i].clone())
            .collect();
        // Stable: same-instant records keep append order
        records.sort_by_key(|r| r.created_at);
        Ok(records)
    }

    fn all(&self) -> Result<Vec<AuditRecord>, AuditError> {
        Ok(self.read()?.records.clone())
    }

    fn reconcile(&self) -> Result<usize, AuditError> {
        let mut data = self.write()?;
        let changed = data.settle_latest();

        if changed > 0 {
            self.persist(&data)?;
            tracing::info!(changed, "reconciled latest flags");
        }
        Ok(changed)
    }
}
