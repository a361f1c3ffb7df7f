//! Lifecycle events and the diff-and-append unit of work

use std::sync::Arc;

use serde::Serialize;

use super::store::{AppendOutcome, AuditRecordStore};
use crate::config::Settings;
use crate::diff::StructuralDiffer;
use crate::error::AuditResult;
use crate::models::{Action, EntityInfo, Value};
use crate::storage::RecordBackend;

/// Kind of persistence event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LifecycleKind {
    Insert,
    Update,
    Delete,
}

impl LifecycleKind {
    /// Action recorded for this event
    pub fn action(self) -> Action {
        match self {
            LifecycleKind::Insert => Action::Create,
            LifecycleKind::Update => Action::Update,
            LifecycleKind::Delete => Action::Delete,
        }
    }
}

/// A value-copied snapshot of one persistence event
///
/// Holds no references into the host's entities, so it can cross threads and
/// outlive the transaction that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEvent {
    pub kind: LifecycleKind,
    pub info: EntityInfo,
    pub before: Value,
    pub after: Value,
}

impl AuditEvent {
    pub fn inserted(info: EntityInfo, state: Value) -> Self {
        Self {
            kind: LifecycleKind::Insert,
            info,
            before: Value::Null,
            after: state,
        }
    }

    pub fn updated(info: EntityInfo, before: Value, after: Value) -> Self {
        Self {
            kind: LifecycleKind::Update,
            info,
            before,
            after,
        }
    }

    pub fn deleted(info: EntityInfo, state: Value) -> Self {
        Self {
            kind: LifecycleKind::Delete,
            info,
            before: state,
            after: Value::Null,
        }
    }
}

/// Where the listener hands events off to
pub trait EventSink: Send + Sync {
    fn submit(&self, event: AuditEvent) -> AuditResult<()>;
}

/// Diffs an event and appends the result
pub struct AuditPipeline {
    differ: StructuralDiffer,
    store: AuditRecordStore,
}

impl AuditPipeline {
    pub fn new(differ: StructuralDiffer, store: AuditRecordStore) -> Self {
        Self { differ, store }
    }

    pub fn from_settings(settings: &Settings, backend: Arc<dyn RecordBackend>) -> Self {
        Self::new(
            StructuralDiffer::new(&settings.diff_options()),
            AuditRecordStore::from_settings(backend, settings),
        )
    }

    pub fn differ(&self) -> &StructuralDiffer {
        &self.differ
    }

    pub fn store(&self) -> &AuditRecordStore {
        &self.store
    }

    /// Run one event to completion on the current thread
    pub fn handle(&self, event: AuditEvent) -> AppendOutcome {
        // Skip the diff for tables that would be dropped anyway
        if self.store.is_excluded(&event.info) {
            return AppendOutcome::Excluded;
        }
        let changes = self.differ.diff(&event.before, &event.after);
        self.store.append(&event.info, event.kind.action(), &changes)
    }
}

/// Runs events inline, on the caller's thread
impl EventSink for AuditPipeline {
    fn submit(&self, event: AuditEvent) -> AuditResult<()> {
        self.handle(event);
        Ok(())
    }
}
