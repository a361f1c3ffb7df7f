//! Audit record data structures
//!
//! Defines the persisted shape of one entry in an entity's change history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::EntityInfo;
use super::ids::RecordId;

/// Serialized change set: path to rendered change
pub type ChangePayload = serde_json::Map<String, serde_json::Value>;

/// What happened to the entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Entity was created
    Create,
    /// Entity was updated
    Update,
    /// Entity was deleted
    Delete,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Create => write!(f, "Create"),
            Action::Update => write!(f, "Update"),
            Action::Delete => write!(f, "Delete"),
        }
    }
}

impl Action {
    /// Parse an action name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "create" => Some(Action::Create),
            "update" => Some(Action::Update),
            "delete" => Some(Action::Delete),
            _ => None,
        }
    }
}

/// A single audit record
///
/// Immutable once written, except for `latest`, which is cleared when a newer
/// record for the same entity is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub id: RecordId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,

    /// Simple type name of the entity
    #[serde(rename = "entityName")]
    pub entity_kind: String,

    pub entity_id: String,

    pub table_name: String,

    pub action: Action,

    /// Whether this is the newest record for the entity
    pub latest: bool,

    /// Reserved for linking child entities to a parent history; never set
    #[serde(default)]
    pub parent_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,

    /// Rendered change set
    #[serde(rename = "differenceList")]
    pub change_set: ChangePayload,

    #[serde(rename = "createdTimestamp")]
    pub created_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Create a new latest record for an entity
    pub fn new(info: &EntityInfo, action: Action, change_set: ChangePayload) -> Self {
        Self {
            id: RecordId::new(),
            tenant_id: info.tenant_id.clone(),
            entity_kind: info.entity_kind.clone(),
            entity_id: info.entity_id.clone(),
            table_name: info.table_name.clone(),
            action,
            latest: true,
            parent_id: None,
            actor_id: info.actor_id.clone(),
            change_set,
            created_at: Utc::now(),
        }
    }

    /// Number of changed paths
    pub fn change_count(&self) -> usize {
        self.change_set.len()
    }

    /// Format the record for human-readable output
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] {} {} {} ({})",
            self.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.action,
            self.entity_kind,
            self.entity_id,
            self.table_name
        );

        if self.latest {
            output.push_str(" *latest*");
        }

        for (path, change) in &self.change_set {
            let rendered = change
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| change.to_string());
            output.push_str(&format!("\n  {}: {}", display_path(path), rendered));
        }

        output
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "(root)"
    } else {
        path
    }
}
