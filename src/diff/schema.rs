//! Per-type field schemas
//!
//! Records of the same type usually carry the same fields, so the sorted list
//! of auditable field names is computed once per type and reused. A record
//! whose fields differ from the cached list gets its own schema; the cache
//! never adds or drops a field. The registry is shared by every worker; a
//! lost race on first population only means the schema is computed twice.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::models::Record;

/// Sorted auditable field names of one record type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSchema {
    pub kind: Option<String>,
    pub fields: Vec<String>,
}

impl RecordSchema {
    fn contains(&self, field: &str) -> bool {
        self.fields
            .binary_search_by(|f| f.as_str().cmp(field))
            .is_ok()
    }
}

/// Cache of record schemas keyed by type name
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    /// Normalized names of bookkeeping fields
    ignored: Vec<String>,
    cache: RwLock<HashMap<String, Arc<RecordSchema>>>,
}

impl SchemaRegistry {
    pub fn new(ignored_fields: &[String]) -> Self {
        Self {
            ignored: ignored_fields.iter().map(|f| normalize_name(f)).collect(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Whether a field is bookkeeping. `tenantId`, `tenant_id` and `TenantID`
    /// all match the same entry.
    pub fn is_ignored(&self, field: &str) -> bool {
        let normalized = normalize_name(field);
        self.ignored.iter().any(|i| *i == normalized)
    }

    /// Schema for a record, from the cache when its type has been seen before
    pub fn schema_for(&self, record: &Record) -> Arc<RecordSchema> {
        let Some(kind) = record.kind.as_deref() else {
            return Arc::new(self.compute(record));
        };

        if let Some(schema) = self.cached(kind) {
            if self.matches(&schema, record) {
                return schema;
            }
            // Same type name, different shape: don't trust the cache for this one
            tracing::debug!(kind, "record fields differ from cached schema");
            return Arc::new(self.compute(record));
        }

        let schema = Arc::new(self.compute(record));
        if let Ok(mut cache) = self.cache.write() {
            cache
                .entry(kind.to_string())
                .or_insert_with(|| Arc::clone(&schema));
        }
        schema
    }

    /// Number of cached types
    pub fn len(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cached(&self, kind: &str) -> Option<Arc<RecordSchema>> {
        self.cache.read().ok()?.get(kind).cloned()
    }

    /// The record's auditable fields are exactly the schema's fields
    fn matches(&self, schema: &RecordSchema, record: &Record) -> bool {
        let mut auditable = record.fields.keys().filter(|f| !self.is_ignored(f));
        let mut count = 0;
        let all_known = auditable.all(|f| {
            count += 1;
            schema.contains(f)
        });
        all_known && count == schema.fields.len()
    }

    fn compute(&self, record: &Record) -> RecordSchema {
        // BTreeMap keys are already sorted
        let fields = record
            .fields
            .keys()
            .filter(|f| !self.is_ignored(f))
            .cloned()
            .collect();
        RecordSchema {
            kind: record.kind.clone(),
            fields,
        }
    }
}

fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}
