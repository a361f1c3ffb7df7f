//! The value model every audited object is converted into
//!
//! Domain types describe themselves as a `Value` tree through the
//! [`Auditable`](super::Auditable) trait, or arrive as JSON documents via
//! [`Value::from_json`]. The diff engine only ever sees this tree.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A leaf value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Scalar {
    String(String),
    Bool(bool),
    Integer(i64),
    Float(f64),
    /// Enum variant, stored by name
    Enum(String),
    Timestamp(DateTime<Utc>),
}

/// Kind tag of a scalar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    String,
    Bool,
    Integer,
    Float,
    Enum,
    Timestamp,
}

impl Scalar {
    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::String(_) => ScalarKind::String,
            Scalar::Bool(_) => ScalarKind::Bool,
            Scalar::Integer(_) => ScalarKind::Integer,
            Scalar::Float(_) => ScalarKind::Float,
            Scalar::Enum(_) => ScalarKind::Enum,
            Scalar::Timestamp(_) => ScalarKind::Timestamp,
        }
    }

    /// JSON form used when rendering payloads and exports
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Scalar::String(s) | Scalar::Enum(s) => serde_json::Value::String(s.clone()),
            Scalar::Bool(b) => serde_json::Value::Bool(*b),
            Scalar::Integer(i) => serde_json::Value::from(*i),
            Scalar::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or_else(|| serde_json::Value::String(f.to_string())),
            Scalar::Timestamp(ts) => serde_json::Value::String(format_timestamp(ts)),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::String(s) | Scalar::Enum(s) => write!(f, "{}", s),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Integer(i) => write!(f, "{}", i),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::Timestamp(ts) => write!(f, "{}", format_timestamp(ts)),
        }
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// A structured object: named fields plus the name of the type it came from
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    /// Type name, used to key the field schema cache. `None` for schemaless input.
    pub kind: Option<String>,
    pub fields: BTreeMap<String, Value>,
}

impl Record {
    /// Start a record for the named type
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            fields: BTreeMap::new(),
        }
    }

    /// A record with no type name
    pub fn untyped() -> Self {
        Self::default()
    }

    /// Add a field, converting it through `Auditable`
    pub fn with(mut self, name: impl Into<String>, value: &(impl super::Auditable + ?Sized)) -> Self {
        self.fields.insert(name.into(), value.to_value());
        self
    }

    /// Add a field that is already a `Value`
    pub fn with_value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Record(record)
    }
}

/// Any domain value during traversal
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Scalar(Scalar),
    /// Ordered sequence; position is identity
    List(Vec<Value>),
    /// Unordered collection; iteration order carries no meaning
    Set(Vec<Value>),
    /// Keyed collection, keys stringified
    Map(BTreeMap<String, Value>),
    Record(Record),
}

/// Kind tag of a value, scalars split by their own kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Scalar(ScalarKind),
    List,
    Set,
    Map,
    Record,
}

/// How JSON arrays are interpreted by [`Value::from_json`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArrayMode {
    #[default]
    List,
    Set,
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::Scalar(Scalar::String(s.into()))
    }

    pub fn bool(b: bool) -> Self {
        Value::Scalar(Scalar::Bool(b))
    }

    pub fn int(i: i64) -> Self {
        Value::Scalar(Scalar::Integer(i))
    }

    pub fn float(f: f64) -> Self {
        Value::Scalar(Scalar::Float(f))
    }

    pub fn enum_name(name: impl Into<String>) -> Self {
        Value::Scalar(Scalar::Enum(name.into()))
    }

    pub fn timestamp(ts: DateTime<Utc>) -> Self {
        Value::Scalar(Scalar::Timestamp(ts))
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(items.into_iter().collect())
    }

    pub fn set(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Set(items.into_iter().collect())
    }

    pub fn map<K: fmt::Display>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Scalar(s) => ValueKind::Scalar(s.kind()),
            Value::List(_) => ValueKind::List,
            Value::Set(_) => ValueKind::Set,
            Value::Map(_) => ValueKind::Map,
            Value::Record(_) => ValueKind::Record,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Null or a scalar; anything that terminates traversal on its own
    pub fn is_primitive(&self) -> bool {
        matches!(self, Value::Null | Value::Scalar(_))
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Convert a JSON document. Objects become untyped records; strings that
    /// parse as RFC 3339 become timestamps.
    pub fn from_json(json: &serde_json::Value, arrays: ArrayMode) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::int(i),
                None => Value::float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => match DateTime::parse_from_rfc3339(s) {
                Ok(ts) => Value::timestamp(ts.with_timezone(&Utc)),
                Err(_) => Value::string(s.clone()),
            },
            serde_json::Value::Array(items) => {
                let items = items.iter().map(|i| Value::from_json(i, arrays));
                match arrays {
                    ArrayMode::List => Value::list(items),
                    ArrayMode::Set => Value::set(items),
                }
            }
            serde_json::Value::Object(obj) => Value::Record(Record {
                kind: None,
                fields: obj
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v, arrays)))
                    .collect(),
            }),
        }
    }

    /// Convert anything serde can serialize, going through its JSON form
    pub fn from_serialize<T: Serialize + ?Sized>(
        value: &T,
        arrays: ArrayMode,
    ) -> crate::error::AuditResult<Self> {
        let json = serde_json::to_value(value)
            .map_err(|e| crate::error::AuditError::traversal("", e.to_string()))?;
        Ok(Value::from_json(&json, arrays))
    }

    /// JSON form of the whole tree
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Scalar(s) => s.to_json(),
            Value::List(items) | Value::Set(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::Record(record) => serde_json::Value::Object(
                record
                    .fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Textual form. Sets print their elements sorted so the text of a set does
/// not depend on iteration order.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Scalar(s) => write!(f, "{}", s),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(|i| i.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Value::Set(items) => {
                let mut parts: Vec<String> = items.iter().map(|i| i.to_string()).collect();
                parts.sort();
                write!(f, "[{}]", parts.join(", "))
            }
            Value::Map(map) => write_fields(f, None, map),
            Value::Record(record) => write_fields(f, record.kind.as_deref(), &record.fields),
        }
    }
}

fn write_fields(
    f: &mut fmt::Formatter<'_>,
    kind: Option<&str>,
    fields: &BTreeMap<String, Value>,
) -> fmt::Result {
    let parts: Vec<String> = fields.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    write!(f, "{}{{{}}}", kind.unwrap_or(""), parts.join(", "))
}
