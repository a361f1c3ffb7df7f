//! Append-only audit history with a single latest record per entity

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::config::{Settings, SYSTEM_TENANT};
use crate::diff::ChangeSet;
use crate::error::AuditResult;
use crate::models::{Action, AuditRecord, EntityInfo};
use crate::storage::RecordBackend;

/// What an append did
#[derive(Debug, Clone, PartialEq)]
pub enum AppendOutcome {
    /// A new latest record was written
    Recorded(AuditRecord),
    /// The entity's table is excluded for its tenant
    Excluded,
    /// An update with nothing to record
    Unchanged,
    /// The write failed; the failure has been logged
    Failed,
}

impl AppendOutcome {
    pub fn is_recorded(&self) -> bool {
        matches!(self, AppendOutcome::Recorded(_))
    }

    pub fn record(&self) -> Option<&AuditRecord> {
        match self {
            AppendOutcome::Recorded(record) => Some(record),
            _ => None,
        }
    }
}

/// Writes audit records and keeps the latest flag consistent
#[derive(Clone)]
pub struct AuditRecordStore {
    backend: Arc<dyn RecordBackend>,
    /// Tenant -> excluded table names
    excluded_tables: BTreeMap<String, BTreeSet<String>>,
}

impl AuditRecordStore {
    pub fn new(
        backend: Arc<dyn RecordBackend>,
        excluded_tables: BTreeMap<String, BTreeSet<String>>,
    ) -> Self {
        Self {
            backend,
            excluded_tables,
        }
    }

    pub fn from_settings(backend: Arc<dyn RecordBackend>, settings: &Settings) -> Self {
        Self::new(backend, settings.excluded_tables.clone())
    }

    pub fn backend(&self) -> &Arc<dyn RecordBackend> {
        &self.backend
    }

    /// Whether the entity's table is excluded for its tenant. A tenant with
    /// no exclusions configured, or no tenant at all, uses the system set.
    pub fn is_excluded(&self, info: &EntityInfo) -> bool {
        let tenant = info.tenant_id.as_deref().unwrap_or(SYSTEM_TENANT);
        self.excluded_tables
            .get(tenant)
            .or_else(|| self.excluded_tables.get(SYSTEM_TENANT))
            .is_some_and(|tables| {
                tables
                    .iter()
                    .any(|t| t.eq_ignore_ascii_case(&info.table_name))
            })
    }

    /// Record a lifecycle change. Never fails: write errors are logged and
    /// reported as [`AppendOutcome::Failed`].
    pub fn append(&self, info: &EntityInfo, action: Action, changes: &ChangeSet) -> AppendOutcome {
        if self.is_excluded(info) {
            tracing::trace!(
                table = %info.table_name,
                tenant = info.tenant_id.as_deref().unwrap_or(SYSTEM_TENANT),
                "table excluded from audit"
            );
            return AppendOutcome::Excluded;
        }

        if action == Action::Update && changes.is_empty() {
            tracing::trace!(entity = %info.key(), "update without changes");
            return AppendOutcome::Unchanged;
        }

        let record = AuditRecord::new(info, action, changes.to_payload());
        match self.backend.supersede_and_insert(record.clone()) {
            Ok(superseded) => {
                tracing::debug!(
                    entity = %info.key(),
                    %action,
                    record = %record.id,
                    superseded = superseded.len(),
                    "audit record written"
                );
                AppendOutcome::Recorded(record)
            }
            Err(e) => {
                tracing::error!(entity = %info.key(), %action, error = %e, "failed to write audit record");
                AppendOutcome::Failed
            }
        }
    }

    /// History of an entity, oldest first
    pub fn history(&self, entity_kind: &str, entity_id: &str) -> AuditResult<Vec<AuditRecord>> {
        self.backend.history(entity_kind, entity_id)
    }

    /// The entity's current latest record
    pub fn latest(&self, entity_kind: &str, entity_id: &str) -> AuditResult<Option<AuditRecord>> {
        self.backend.find_latest(entity_kind, entity_id)
    }

    /// Repair latest flags left inconsistent by racing appends
    pub fn reconcile(&self) -> AuditResult<usize> {
        self.backend.reconcile()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::ChangeEntry;
    use crate::error::AuditError;
    use crate::models::{RecordId, Value};
    use crate::storage::AuditRecordRepository;

    fn store() -> AuditRecordStore {
        let backend: Arc<dyn RecordBackend> = Arc::new(AuditRecordRepository::in_memory());
        AuditRecordStore::from_settings(backend, &Settings::default())
    }

    fn changes() -> ChangeSet {
        let mut changes = ChangeSet::new();
        changes.insert(
            "firstName",
            ChangeEntry::modified(Value::string("Jane"), Value::string("John")),
        );
        changes
    }

    fn customer() -> EntityInfo {
        EntityInfo::new("Customer", "42", "customer").with_tenant("acme")
    }

    #[test]
    fn test_append_keeps_one_latest() {
        let store = store();
        let info = customer();

        let first = store.append(&info, Action::Create, &changes());
        let second = store.append(&info, Action::Update, &changes());
        let third = store.append(&info, Action::Update, &changes());
        assert!(first.is_recorded() && second.is_recorded() && third.is_recorded());

        let history = store.history("Customer", "42").unwrap();
        assert_eq!(history.len(), 3);
        let latest: Vec<_> = history.iter().filter(|r| r.latest).collect();
        assert_eq!(latest.len(), 1);
        assert_eq!(Some(latest[0]), third.record());
    }

    #[test]
    fn test_payload_uses_arrow_convention() {
        let store = store();
        let outcome = store.append(&customer(), Action::Update, &changes());
        let record = outcome.record().unwrap();
        assert_eq!(record.change_set["firstName"], "Jane->John");
        assert_eq!(record.action, Action::Update);
    }

    #[test]
    fn test_empty_update_is_noop() {
        let store = store();
        let outcome = store.append(&customer(), Action::Update, &ChangeSet::new());
        assert_eq!(outcome, AppendOutcome::Unchanged);
        assert!(store.history("Customer", "42").unwrap().is_empty());
    }

    #[test]
    fn test_empty_create_is_recorded() {
        let store = store();
        let outcome = store.append(&customer(), Action::Create, &ChangeSet::new());
        assert!(outcome.is_recorded());
    }

    #[test]
    fn test_system_exclusions_apply_as_fallback() {
        let store = store();
        let info = EntityInfo::new("AuditLog", "1", "audit_log").with_tenant("acme");
        assert_eq!(store.append(&info, Action::Create, &changes()), AppendOutcome::Excluded);

        let untenanted = EntityInfo::new("AuditLog", "1", "AUDIT_LOG");
        assert_eq!(
            store.append(&untenanted, Action::Create, &changes()),
            AppendOutcome::Excluded
        );
        assert!(store.backend().all().unwrap().is_empty());
    }

    #[test]
    fn test_tenant_exclusions_replace_system_set() {
        let mut excluded = BTreeMap::new();
        excluded.insert(SYSTEM_TENANT.to_string(), BTreeSet::from(["audit_log".to_string()]));
        excluded.insert("acme".to_string(), BTreeSet::from(["orders".to_string()]));
        let store = AuditRecordStore::new(Arc::new(AuditRecordRepository::in_memory()), excluded);

        let orders = EntityInfo::new("Order", "7", "orders").with_tenant("acme");
        assert!(store.is_excluded(&orders));
        assert!(!store.is_excluded(&orders.clone().with_tenant("globex")));

        let log = EntityInfo::new("AuditLog", "1", "audit_log").with_tenant("acme");
        assert!(!store.is_excluded(&log));
    }

    struct BrokenBackend;

    impl RecordBackend for BrokenBackend {
        fn find_latest(&self, _: &str, _: &str) -> AuditResult<Option<AuditRecord>> {
            Ok(None)
        }

        fn supersede_and_insert(&self, _: AuditRecord) -> AuditResult<Vec<RecordId>> {
            Err(AuditError::Storage("disk full".into()))
        }

        fn history(&self, _: &str, _: &str) -> AuditResult<Vec<AuditRecord>> {
            Ok(Vec::new())
        }

        fn all(&self) -> AuditResult<Vec<AuditRecord>> {
            Ok(Vec::new())
        }

        fn reconcile(&self) -> AuditResult<usize> {
            Ok(0)
        }
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let store = AuditRecordStore::new(Arc::new(BrokenBackend), BTreeMap::new());
        let outcome = store.append(&customer(), Action::Create, &changes());
        assert_eq!(outcome, AppendOutcome::Failed);
    }
}
