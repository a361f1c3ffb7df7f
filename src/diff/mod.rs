//! Structural diff engine
//!
//! Turns two versions of a value tree into the set of paths that changed:
//! [`Flattener`] canonicalizes and flattens, [`ValueComparator`] decides
//! leaf equality, [`StructuralDiffer`] walks both trees and produces a
//! [`ChangeSet`].

pub mod change;
pub mod compare;
pub mod differ;
pub mod flatten;
pub mod schema;

pub use change::{ChangeEntry, ChangeSet};
pub use compare::ValueComparator;
pub use differ::StructuralDiffer;
pub use flatten::{flatten_tree, join_path, FlatMap, FlatValue, Flattener, Shape};
pub use schema::{RecordSchema, SchemaRegistry};

use chrono::Duration;

/// Tunables for one diff engine
#[derive(Debug, Clone, PartialEq)]
pub struct DiffOptions {
    /// Containers nested deeper than this are compared by their text
    pub max_depth: usize,
    /// Timestamps closer than this are equal
    pub timestamp_epsilon: Duration,
    /// Minimum similarity for two set elements to count as the same element
    pub similarity_threshold: f64,
    /// Bookkeeping fields excluded from every record
    pub ignored_fields: Vec<String>,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            max_depth: 5,
            timestamp_epsilon: Duration::milliseconds(1),
            similarity_threshold: 0.7,
            ignored_fields: [
                "id",
                "tenantId",
                "createdBy",
                "updatedBy",
                "createdAt",
                "updatedAt",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}
