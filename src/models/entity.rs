//! Entity identity at the persistence boundary

use serde::{Deserialize, Serialize};

use super::auditable::Auditable;

/// An entity the host persistence layer hands to the audit listener
///
/// The host maps its own metadata (table annotations, primary key, tenant
/// column) onto these accessors.
pub trait AuditedEntity: Auditable {
    /// Simple type name, e.g. `Customer`
    fn entity_kind(&self) -> &str;

    /// Table the entity is stored in
    fn table_name(&self) -> &str;

    /// Stringified primary key
    fn entity_id(&self) -> String;

    fn tenant_id(&self) -> Option<&str> {
        None
    }

    /// Who performed the change
    fn actor_id(&self) -> Option<&str> {
        None
    }
}

/// Resolved identity of an entity for one lifecycle event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    pub entity_kind: String,
    pub entity_id: String,
    pub table_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,
}

impl EntityInfo {
    pub fn new(
        entity_kind: impl Into<String>,
        entity_id: impl Into<String>,
        table_name: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: None,
            entity_kind: entity_kind.into(),
            entity_id: entity_id.into(),
            table_name: table_name.into(),
            actor_id: None,
        }
    }

    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    pub fn with_actor(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }

    /// `kind/id`, the key a history is grouped by
    pub fn key(&self) -> String {
        format!("{}/{}", self.entity_kind, self.entity_id)
    }
}
