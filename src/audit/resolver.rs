//! Identity resolution for audited entities

use std::collections::BTreeSet;

use crate::config::Settings;
use crate::models::{AuditedEntity, EntityInfo};

/// Extracts the identity of an entity, or rejects kinds outside audit scope
#[derive(Debug, Clone, Default)]
pub struct EntityInfoResolver {
    excluded_entities: BTreeSet<String>,
}

impl EntityInfoResolver {
    pub fn new<I, S>(excluded_entities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            excluded_entities: excluded_entities.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.excluded_entities.iter().cloned())
    }

    /// Whether an entity kind is never audited
    pub fn is_excluded(&self, entity_kind: &str) -> bool {
        self.excluded_entities.contains(entity_kind)
    }

    /// Identity of an entity, `None` when its kind is excluded or it has no id
    pub fn resolve(&self, entity: &dyn AuditedEntity) -> Option<EntityInfo> {
        let kind = entity.entity_kind();
        if self.is_excluded(kind) {
            tracing::trace!(kind, "entity kind excluded from audit");
            return None;
        }

        let id = entity.entity_id();
        if id.is_empty() {
            tracing::warn!(kind, "entity has no id, not audited");
            return None;
        }

        Some(EntityInfo {
            tenant_id: entity.tenant_id().map(str::to_string),
            entity_kind: kind.to_string(),
            entity_id: id,
            table_name: entity.table_name().to_string(),
            actor_id: entity.actor_id().map(str::to_string),
        })
    }
}
