//! Change sets produced by the differ

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::flatten::{flatten_tree, FlatValue, Shape};
use crate::models::{ChangePayload, Value};

/// One changed path
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "change", rename_all = "lowercase")]
pub enum ChangeEntry {
    /// Present only in the new version
    Added { value: Value },
    /// Present only in the old version
    Removed { value: Value },
    /// Present in both with different values
    Modified { old: Value, new: Value },
}

impl ChangeEntry {
    pub fn added(value: Value) -> Self {
        ChangeEntry::Added { value }
    }

    pub fn removed(value: Value) -> Self {
        ChangeEntry::Removed { value }
    }

    pub fn modified(old: Value, new: Value) -> Self {
        ChangeEntry::Modified { old, new }
    }

    /// Short label for tables
    pub fn label(&self) -> &'static str {
        match self {
            ChangeEntry::Added { .. } => "added",
            ChangeEntry::Removed { .. } => "removed",
            ChangeEntry::Modified { .. } => "modified",
        }
    }
}

/// `old->new`, `+value` or `-value`
impl fmt::Display for ChangeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeEntry::Added { value } => write!(f, "+{}", value),
            ChangeEntry::Removed { value } => write!(f, "-{}", value),
            ChangeEntry::Modified { old, new } => write!(f, "{}->{}", old, new),
        }
    }
}

/// Changed paths of one diff, ordered by path
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ChangeSet(BTreeMap<String, ChangeEntry>);

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, entry: ChangeEntry) {
        self.0.insert(path.into(), entry);
    }

    pub fn get(&self, path: &str) -> Option<&ChangeEntry> {
        self.0.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ChangeEntry)> {
        self.0.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn into_inner(self) -> BTreeMap<String, ChangeEntry> {
        self.0
    }

    /// Render as the string map stored on audit records.
    ///
    /// Modifications become `old->new`. Added and removed scalars become
    /// `+value` and `-value`; added or removed structures are expanded into
    /// one such entry per non-null leaf below their path.
    pub fn to_payload(&self) -> ChangePayload {
        let mut payload = ChangePayload::new();
        for (path, entry) in &self.0 {
            match entry {
                ChangeEntry::Modified { .. } => {
                    payload.insert(path.clone(), entry.to_string().into());
                }
                ChangeEntry::Added { value } => expand(&mut payload, path, '+', value),
                ChangeEntry::Removed { value } => expand(&mut payload, path, '-', value),
            }
        }
        payload
    }
}

fn expand(payload: &mut ChangePayload, path: &str, sign: char, value: &Value) {
    if value.is_primitive() {
        payload.insert(path.to_string(), format!("{}{}", sign, value).into());
        return;
    }

    let before = payload.len();
    for (leaf_path, leaf) in flatten_tree(value, path).iter() {
        let text = match leaf {
            FlatValue::Null => continue,
            FlatValue::Empty { shape: Shape::List | Shape::Set } => "[]".to_string(),
            FlatValue::Empty { shape: Shape::Record | Shape::Map } => "{}".to_string(),
            FlatValue::Scalar { value } => value.to_string(),
        };
        payload.insert(leaf_path.clone(), format!("{}{}", sign, text).into());
    }

    // Nothing but nulls underneath
    if payload.len() == before {
        payload.insert(path.to_string(), format!("{}{}", sign, value).into());
    }
}

impl FromIterator<(String, ChangeEntry)> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = (String, ChangeEntry)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ChangeSet {
    type Item = (String, ChangeEntry);
    type IntoIter = std::collections::btree_map::IntoIter<String, ChangeEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;
    use serde_json::json;

    #[test]
    fn test_entry_display() {
        assert_eq!(
            ChangeEntry::modified(Value::string("Jane"), Value::string("John")).to_string(),
            "Jane->John"
        );
        assert_eq!(ChangeEntry::added(Value::string("SQL")).to_string(), "+SQL");
        assert_eq!(ChangeEntry::removed(Value::int(3)).to_string(), "-3");
    }

    #[test]
    fn test_payload_for_scalars() {
        let mut changes = ChangeSet::new();
        changes.insert(
            "firstName",
            ChangeEntry::modified(Value::string("Create"), Value::string("Update")),
        );
        changes.insert("skillSet.2", ChangeEntry::added(Value::string("SQL")));
        changes.insert("nickname", ChangeEntry::modified(Value::Null, Value::string("JD")));

        let payload = changes.to_payload();
        assert_eq!(payload["firstName"], json!("Create->Update"));
        assert_eq!(payload["skillSet.2"], json!("+SQL"));
        assert_eq!(payload["nickname"], json!("null->JD"));
    }

    #[test]
    fn test_payload_expands_structures() {
        let address: Value = Record::new("Address")
            .with("street", "5")
            .with("city", "6")
            .with_value("zip", Value::Null)
            .into();
        let mut changes = ChangeSet::new();
        changes.insert("addressList.1", ChangeEntry::added(address));
        changes.insert("tags", ChangeEntry::removed(Value::list([])));

        let payload = changes.to_payload();
        assert_eq!(payload["addressList.1.street"], json!("+5"));
        assert_eq!(payload["addressList.1.city"], json!("+6"));
        assert!(!payload.contains_key("addressList.1.zip"));
        assert_eq!(payload["tags"], json!("-[]"));
    }

    #[test]
    fn test_payload_all_null_structure() {
        let empty: Value = Record::untyped().with_value("zip", Value::Null).into();
        let mut changes = ChangeSet::new();
        changes.insert("address", ChangeEntry::added(empty));

        let payload = changes.to_payload();
        assert_eq!(payload["address"], json!("+{zip=null}"));
    }

    #[test]
    fn test_serialize_entries() {
        let changes: ChangeSet = [(
            "age".to_string(),
            ChangeEntry::modified(Value::int(1), Value::int(2)),
        )]
        .into_iter()
        .collect();
        let json = serde_json::to_value(&changes).unwrap();
        assert_eq!(json["age"]["change"], "modified");
        assert_eq!(json["age"]["old"], 1);
        assert_eq!(json["age"]["new"], 2);
    }
}
