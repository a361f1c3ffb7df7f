//! Flattening of value trees into dotted-path maps, and back
//!
//! `customer.addressList.0.city` style paths: field names and map keys as
//! segments, non-negative integers for list and set positions. Sets are
//! sorted by element text before indexing, so equal sets flatten the same
//! regardless of iteration order.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::schema::SchemaRegistry;
use super::DiffOptions;
use crate::models::{Record, Scalar, Value};

/// Path separator
pub const SEPARATOR: char = '.';

/// Container kind remembered for a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Record,
    List,
    Set,
    Map,
}

impl Shape {
    fn empty_value(self) -> Value {
        match self {
            Shape::Record => Value::Record(Record::untyped()),
            Shape::List => Value::List(Vec::new()),
            Shape::Set => Value::Set(Vec::new()),
            Shape::Map => Value::Map(BTreeMap::new()),
        }
    }
}

/// A leaf in a flat map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FlatValue {
    Null,
    /// An empty collection at this path, as opposed to an absent one
    Empty { shape: Shape },
    Scalar { value: Scalar },
}

impl FlatValue {
    /// JSON form for display
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FlatValue::Null => serde_json::Value::Null,
            FlatValue::Empty { shape } => match shape {
                Shape::List | Shape::Set => serde_json::Value::Array(Vec::new()),
                Shape::Record | Shape::Map => serde_json::Value::Object(Default::default()),
            },
            FlatValue::Scalar { value } => value.to_json(),
        }
    }
}

/// Dotted path to leaf, plus the container shape of every inner path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlatMap {
    entries: BTreeMap<String, FlatValue>,
    #[serde(default)]
    shapes: BTreeMap<String, Shape>,
}

impl FlatMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a leaf. Hand-built maps can skip shapes; numeric segments are
    /// then read back as list positions.
    pub fn insert(&mut self, path: impl Into<String>, value: FlatValue) {
        self.entries.insert(path.into(), value);
    }

    /// Insert a scalar leaf
    pub fn insert_scalar(&mut self, path: impl Into<String>, value: Scalar) {
        self.insert(path, FlatValue::Scalar { value });
    }

    /// Record the container shape at a path
    pub fn set_shape(&mut self, path: impl Into<String>, shape: Shape) {
        self.shapes.insert(path.into(), shape);
    }

    pub fn get(&self, path: &str) -> Option<&FlatValue> {
        self.entries.get(path)
    }

    pub fn shape(&self, path: &str) -> Option<Shape> {
        self.shapes.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FlatValue)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    /// `path -> value` as a JSON object
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.entries
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }

    /// Rebuild the value tree the map was flattened from.
    ///
    /// Without a recorded shape, an inner path whose children are all numeric
    /// becomes a list and anything else a record. Field names or map keys
    /// containing the separator cannot be told apart from nesting.
    pub fn unflatten(&self) -> Value {
        let mut root = Node::default();
        for (path, value) in &self.entries {
            root.descend(path).leaf = Some(value.clone());
        }
        for (path, shape) in &self.shapes {
            root.descend(path).shape = Some(*shape);
        }
        root.build()
    }
}

#[derive(Default)]
struct Node {
    leaf: Option<FlatValue>,
    shape: Option<Shape>,
    children: BTreeMap<String, Node>,
}

impl Node {
    fn descend(&mut self, path: &str) -> &mut Node {
        if path.is_empty() {
            return self;
        }
        path.split(SEPARATOR).fold(self, |node, segment| {
            node.children.entry(segment.to_string()).or_default()
        })
    }

    fn build(self) -> Value {
        if self.children.is_empty() {
            return match (self.leaf, self.shape) {
                (Some(FlatValue::Null), _) | (None, None) => Value::Null,
                (Some(FlatValue::Scalar { value }), _) => Value::Scalar(value),
                (Some(FlatValue::Empty { shape }), _) | (None, Some(shape)) => {
                    shape.empty_value()
                }
            };
        }

        let all_numeric = self.children.keys().all(|k| k.parse::<usize>().is_ok());
        let shape = match self.shape {
            Some(Shape::List | Shape::Set) if !all_numeric => Shape::Record,
            Some(shape) => shape,
            None if all_numeric => Shape::List,
            None => Shape::Record,
        };

        match shape {
            Shape::List | Shape::Set => {
                let mut indexed: Vec<(usize, Value)> = self
                    .children
                    .into_iter()
                    .filter_map(|(k, child)| k.parse::<usize>().ok().map(|i| (i, child.build())))
                    .collect();
                indexed.sort_by_key(|(i, _)| *i);
                let items = indexed.into_iter().map(|(_, v)| v).collect();
                if shape == Shape::Set {
                    Value::Set(items)
                } else {
                    Value::List(items)
                }
            }
            Shape::Map => Value::Map(
                self.children
                    .into_iter()
                    .map(|(k, child)| (k, child.build()))
                    .collect(),
            ),
            Shape::Record => Value::Record(Record {
                kind: None,
                fields: self
                    .children
                    .into_iter()
                    .map(|(k, child)| (k, child.build()))
                    .collect(),
            }),
        }
    }
}

/// Join a parent path and a segment
pub fn join_path(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{}{}{}", parent, SEPARATOR, segment)
    }
}

/// Converts values into their canonical form and flat maps
#[derive(Debug, Clone)]
pub struct Flattener {
    max_depth: usize,
    schemas: Arc<SchemaRegistry>,
}

impl Default for Flattener {
    fn default() -> Self {
        Self::new(&DiffOptions::default())
    }
}

impl Flattener {
    pub fn new(options: &DiffOptions) -> Self {
        Self::with_registry(
            options.max_depth,
            Arc::new(SchemaRegistry::new(&options.ignored_fields)),
        )
    }

    /// Share a schema registry with other flatteners
    pub fn with_registry(max_depth: usize, schemas: Arc<SchemaRegistry>) -> Self {
        Self { max_depth, schemas }
    }

    pub fn schemas(&self) -> &Arc<SchemaRegistry> {
        &self.schemas
    }

    /// Flatten a value under a path prefix (a trailing separator is ignored)
    pub fn flatten(&self, value: &Value, prefix: &str) -> FlatMap {
        let mut out = FlatMap::new();
        let prefix = prefix.strip_suffix(SEPARATOR).unwrap_or(prefix);
        flatten_into(&self.normalize(value), prefix, &mut out);
        out
    }

    /// Canonical form of a value: bookkeeping fields dropped, record fields
    /// and set elements sorted, subtrees past the depth limit replaced by
    /// the text of their own canonical form. Type names only select the
    /// schema and are not kept.
    pub fn normalize(&self, value: &Value) -> Value {
        self.canonicalize(value, Some(0))
    }

    /// Canonical form with no depth limit, used for the text of opaque subtrees
    fn canonicalize_all(&self, value: &Value) -> Value {
        self.canonicalize(value, None)
    }

    fn canonicalize(&self, value: &Value, depth: Option<usize>) -> Value {
        let next = depth.map(|d| d + 1);
        match value {
            Value::Null | Value::Scalar(_) => value.clone(),
            _ if depth.is_some_and(|d| d > self.max_depth) => {
                Value::string(self.canonicalize_all(value).to_string())
            }
            Value::List(items) => Value::List(
                items
                    .iter()
                    .map(|i| self.canonicalize(i, next))
                    .collect(),
            ),
            Value::Set(items) => {
                let mut items: Vec<Value> = items
                    .iter()
                    .map(|i| self.canonicalize(i, next))
                    .collect();
                items.sort_by_cached_key(|v| v.to_string());
                Value::Set(items)
            }
            Value::Map(map) => Value::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.canonicalize(v, next)))
                    .collect(),
            ),
            Value::Record(record) => {
                let schema = self.schemas.schema_for(record);
                let fields = schema
                    .fields
                    .iter()
                    .filter_map(|name| {
                        record
                            .get(name)
                            .map(|v| (name.clone(), self.canonicalize(v, next)))
                    })
                    .collect();
                Value::Record(Record { kind: None, fields })
            }
        }
    }
}

/// Flatten a tree that is already in canonical form
pub fn flatten_tree(value: &Value, prefix: &str) -> FlatMap {
    let mut out = FlatMap::new();
    flatten_into(value, prefix, &mut out);
    out
}

fn flatten_into(value: &Value, path: &str, out: &mut FlatMap) {
    match value {
        Value::Null => out.insert(path, FlatValue::Null),
        Value::Scalar(s) => out.insert_scalar(path, s.clone()),
        Value::List(items) | Value::Set(items) => {
            let shape = if matches!(value, Value::Set(_)) {
                Shape::Set
            } else {
                Shape::List
            };
            out.set_shape(path, shape);
            if items.is_empty() {
                out.insert(path, FlatValue::Empty { shape });
            }
            for (i, item) in items.iter().enumerate() {
                flatten_into(item, &join_path(path, &i.to_string()), out);
            }
        }
        Value::Map(map) => flatten_fields(map, Shape::Map, path, out),
        Value::Record(record) => flatten_fields(&record.fields, Shape::Record, path, out),
    }
}

fn flatten_fields(fields: &BTreeMap<String, Value>, shape: Shape, path: &str, out: &mut FlatMap) {
    out.set_shape(path, shape);
    if fields.is_empty() {
        out.insert(path, FlatValue::Empty { shape });
    }
    for (name, field) in fields {
        flatten_into(field, &join_path(path, name), out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn address(street: &str, city: &str) -> Value {
        Record::new("Address")
            .with("street", street)
            .with("city", city)
            .into()
    }

    fn customer() -> Value {
        Record::new("Customer")
            .with("id", "42")
            .with("tenantId", "System")
            .with("firstName", "Create")
            .with("lastName", "Doe")
            .with_value("address", address("1", "2"))
            .with_value("addressList", Value::list([address("3", "4")]))
            .with_value(
                "skillSet",
                Value::set([Value::string("Python"), Value::string("Java")]),
            )
            .with_value("status", Value::map([("status", Value::bool(true))]))
            .with_value("tags", Value::list([]))
            .with_value("middleName", Value::Null)
            .into()
    }

    fn scalar(s: &str) -> FlatValue {
        FlatValue::Scalar {
            value: Scalar::String(s.into()),
        }
    }

    #[test]
    fn test_flatten_paths() {
        let flat = Flattener::default().flatten(&customer(), "");

        assert_eq!(flat.get("firstName"), Some(&scalar("Create")));
        assert_eq!(flat.get("address.street"), Some(&scalar("1")));
        assert_eq!(flat.get("addressList.0.city"), Some(&scalar("4")));
        assert_eq!(flat.get("skillSet.0"), Some(&scalar("Java")));
        assert_eq!(flat.get("skillSet.1"), Some(&scalar("Python")));
        assert_eq!(
            flat.get("status.status"),
            Some(&FlatValue::Scalar {
                value: Scalar::Bool(true)
            })
        );
        assert_eq!(flat.get("middleName"), Some(&FlatValue::Null));
    }

    #[test]
    fn test_bookkeeping_fields_excluded() {
        let flat = Flattener::default().flatten(&customer(), "");
        assert!(flat.get("id").is_none());
        assert!(flat.get("tenantId").is_none());
    }

    #[test]
    fn test_empty_collection_marker() {
        let flat = Flattener::default().flatten(&customer(), "");
        assert_eq!(
            flat.get("tags"),
            Some(&FlatValue::Empty { shape: Shape::List })
        );
    }

    #[test]
    fn test_prefix_and_trailing_separator() {
        let flattener = Flattener::default();
        let with_dot = flattener.flatten(&customer(), "customer.");
        let without = flattener.flatten(&customer(), "customer");
        assert_eq!(with_dot, without);
        assert!(with_dot.get("customer.firstName").is_some());
    }

    #[test]
    fn test_scalar_root() {
        let flat = Flattener::default().flatten(&Value::int(5), "count.");
        assert_eq!(
            flat.get("count"),
            Some(&FlatValue::Scalar {
                value: Scalar::Integer(5)
            })
        );
    }

    #[test]
    fn test_set_iteration_order_irrelevant() {
        let a: HashSet<&str> = ["Java", "Python", "CSS", "JavaScript"].into_iter().collect();
        let b: Vec<Value> = ["JavaScript", "CSS", "Python", "Java"]
            .into_iter()
            .map(Value::string)
            .collect();

        let flattener = Flattener::default();
        let left = flattener.flatten(&crate::models::Auditable::to_value(&a), "");
        let right = flattener.flatten(&Value::Set(b), "");
        assert_eq!(
            serde_json::to_string(&left).unwrap(),
            serde_json::to_string(&right).unwrap()
        );
    }

    #[test]
    fn test_depth_limit_makes_subtree_opaque() {
        let options = DiffOptions {
            max_depth: 1,
            ..DiffOptions::default()
        };
        let nested: Value = Record::untyped()
            .with_value(
                "a",
                Record::untyped()
                    .with_value("b", Record::untyped().with("c", "deep").into())
                    .into(),
            )
            .into();

        let flat = Flattener::new(&options).flatten(&nested, "");
        assert_eq!(flat.get("a.b"), Some(&scalar("{c=deep}")));
        assert!(flat.get("a.b.c").is_none());
    }

    #[test]
    fn test_opaque_subtree_text_drops_bookkeeping() {
        let options = DiffOptions {
            max_depth: 1,
            ..DiffOptions::default()
        };
        let nested: Value = Record::untyped()
            .with_value(
                "a",
                Record::untyped()
                    .with_value(
                        "b",
                        Record::new("Address")
                            .with("city", "X")
                            .with("updatedAt", "mon")
                            .into(),
                    )
                    .into(),
            )
            .into();

        let flat = Flattener::new(&options).flatten(&nested, "");
        assert_eq!(flat.get("a.b"), Some(&scalar("{city=X}")));
    }

    #[test]
    fn test_flatten_independent_of_cached_schemas() {
        let narrow: Value = Record::new("Contact").with("a", "1").into();
        let wide: Value = Record::new("Contact").with("a", "1").with("b", "2").into();

        let fresh = Flattener::default().flatten(&narrow, "");

        let shared = Flattener::default();
        shared.flatten(&wide, "");
        let after_wide = shared.flatten(&narrow, "");

        assert_eq!(fresh, after_wide);
        assert!(after_wide.get("b").is_none());
    }

    #[test]
    fn test_unflatten_restores_canonical_tree() {
        let flattener = Flattener::default();
        let original = customer();
        let flat = flattener.flatten(&original, "");

        assert_eq!(flat.unflatten(), flattener.normalize(&original));
    }

    #[test]
    fn test_unflatten_hand_built_map() {
        let mut flat = FlatMap::new();
        flat.insert_scalar("name", Scalar::String("John".into()));
        flat.insert_scalar("hobbies.0", Scalar::String("Reading".into()));
        flat.insert_scalar("hobbies.1", Scalar::String("Gaming".into()));
        flat.insert_scalar("address.city", Scalar::String("New York".into()));

        let Value::Record(root) = flat.unflatten() else {
            panic!("expected record");
        };
        assert_eq!(
            root.get("hobbies"),
            Some(&Value::list([Value::string("Reading"), Value::string("Gaming")]))
        );
        assert!(matches!(root.get("address"), Some(Value::Record(_))));
    }
}
