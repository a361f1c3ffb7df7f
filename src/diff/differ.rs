//! Recursive structural diff

use std::collections::{BTreeMap, BTreeSet};

use super::change::{ChangeEntry, ChangeSet};
use super::compare::ValueComparator;
use super::flatten::{join_path, FlatMap, Flattener};
use super::DiffOptions;
use crate::models::Value;

/// Stand-in for a field or key missing on one side
static NULL: Value = Value::Null;

/// Slack for the similarity threshold so that 7 of 10 fields counts as 0.7
const SCORE_EPSILON: f64 = 1e-9;

/// Path segment carrying a list length change
pub const SIZE_SEGMENT: &str = "size";

/// Computes the change set between two versions of a value
#[derive(Debug, Clone)]
pub struct StructuralDiffer {
    flattener: Flattener,
    comparator: ValueComparator,
    similarity_threshold: f64,
}

impl Default for StructuralDiffer {
    fn default() -> Self {
        Self::new(&DiffOptions::default())
    }
}

impl StructuralDiffer {
    pub fn new(options: &DiffOptions) -> Self {
        Self {
            flattener: Flattener::new(options),
            comparator: ValueComparator::new(options.timestamp_epsilon),
            similarity_threshold: options.similarity_threshold,
        }
    }

    pub fn flattener(&self) -> &Flattener {
        &self.flattener
    }

    pub fn comparator(&self) -> &ValueComparator {
        &self.comparator
    }

    /// Diff two value trees
    pub fn diff(&self, old: &Value, new: &Value) -> ChangeSet {
        let old = self.flattener.normalize(old);
        let new = self.flattener.normalize(new);
        let mut out = ChangeSet::new();
        self.diff_node("", &old, &new, &mut out);
        tracing::trace!(changes = out.len(), "diff computed");
        out
    }

    /// Diff two flat maps. Gives the same result as [`diff`](Self::diff) on
    /// the trees the maps were flattened from.
    pub fn diff_flat(&self, old: &FlatMap, new: &FlatMap) -> ChangeSet {
        self.diff(&old.unflatten(), &new.unflatten())
    }

    /// Share of fields two structured values agree on, 1.0 when deep-equal
    pub fn similarity(&self, a: &Value, b: &Value) -> f64 {
        self.score(&self.flattener.normalize(a), &self.flattener.normalize(b))
    }

    fn diff_node(&self, path: &str, old: &Value, new: &Value, out: &mut ChangeSet) {
        match (old, new) {
            (Value::Null, Value::Null) => {}
            (Value::Null, _) => out.insert(path, ChangeEntry::added(new.clone())),
            (_, Value::Null) => out.insert(path, ChangeEntry::removed(old.clone())),
            (Value::Scalar(a), Value::Scalar(b)) => {
                if !self.comparator.scalars_equal(a, b) {
                    out.insert(path, ChangeEntry::modified(old.clone(), new.clone()));
                }
            }
            (Value::Record(a), Value::Record(b)) => {
                self.diff_fields(path, &a.fields, &b.fields, out)
            }
            (Value::Map(a), Value::Map(b)) => self.diff_fields(path, a, b, out),
            (Value::List(a), Value::List(b)) => self.diff_list(path, a, b, out),
            (Value::Set(a), Value::Set(b)) => self.diff_set(path, a, b, out),
            // Type changed: reported whole
            _ => out.insert(path, ChangeEntry::modified(old.clone(), new.clone())),
        }
    }

    fn diff_fields(
        &self,
        path: &str,
        old: &BTreeMap<String, Value>,
        new: &BTreeMap<String, Value>,
        out: &mut ChangeSet,
    ) {
        let names: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
        for name in names {
            self.diff_node(
                &join_path(path, name),
                old.get(name).unwrap_or(&NULL),
                new.get(name).unwrap_or(&NULL),
                out,
            );
        }
    }

    fn diff_list(&self, path: &str, old: &[Value], new: &[Value], out: &mut ChangeSet) {
        let common = old.len().min(new.len());
        for (i, (a, b)) in old.iter().zip(new).enumerate() {
            self.diff_node(&join_path(path, &i.to_string()), a, b, out);
        }

        if old.len() == new.len() {
            return;
        }
        out.insert(
            join_path(path, SIZE_SEGMENT),
            ChangeEntry::modified(Value::int(old.len() as i64), Value::int(new.len() as i64)),
        );
        for (i, item) in new.iter().enumerate().skip(common) {
            out.insert(
                join_path(path, &i.to_string()),
                ChangeEntry::added(item.clone()),
            );
        }
        for (i, item) in old.iter().enumerate().skip(common) {
            out.insert(
                join_path(path, &i.to_string()),
                ChangeEntry::removed(item.clone()),
            );
        }
    }

    /// Sets are indexed by the new side's order. Removed elements have no
    /// position there and are numbered after the last new element.
    fn diff_set(&self, path: &str, old: &[Value], new: &[Value], out: &mut ChangeSet) {
        if old.iter().chain(new).all(Value::is_primitive) {
            self.diff_primitive_set(path, old, new, out);
            return;
        }

        let mut old_taken = vec![false; old.len()];
        let mut partner: Vec<Option<usize>> = vec![None; new.len()];

        // Exact matches first, so a near match never takes an element that
        // has an identical counterpart.
        for (ni, item) in new.iter().enumerate() {
            let found = old
                .iter()
                .enumerate()
                .find(|(oi, candidate)| !old_taken[*oi] && self.comparator.equal(candidate, item));
            if let Some((oi, _)) = found {
                old_taken[oi] = true;
                partner[ni] = Some(oi);
            }
        }

        for (ni, item) in new.iter().enumerate() {
            if partner[ni].is_some() {
                continue;
            }
            let mut best: Option<(usize, f64)> = None;
            for (oi, candidate) in old.iter().enumerate() {
                if old_taken[oi] {
                    continue;
                }
                let score = self.score(candidate, item);
                if score + SCORE_EPSILON < self.similarity_threshold {
                    continue;
                }
                // Strictly better only: ties stay with the first old element
                if best.map_or(true, |(_, top)| score > top) {
                    best = Some((oi, score));
                }
            }
            if let Some((oi, _)) = best {
                old_taken[oi] = true;
                partner[ni] = Some(oi);
            }
        }

        for (ni, item) in new.iter().enumerate() {
            let item_path = join_path(path, &ni.to_string());
            match partner[ni] {
                Some(oi) => self.diff_node(&item_path, &old[oi], item, out),
                None => out.insert(item_path, ChangeEntry::added(item.clone())),
            }
        }

        let leftovers = old
            .iter()
            .zip(&old_taken)
            .filter(|(_, taken)| !**taken)
            .map(|(item, _)| item);
        for (k, item) in leftovers.enumerate() {
            out.insert(
                join_path(path, &(new.len() + k).to_string()),
                ChangeEntry::removed(item.clone()),
            );
        }
    }

    /// Primitive sets compare by element text. Pure additions and pure
    /// removals are itemized; any other change replaces the whole set.
    fn diff_primitive_set(&self, path: &str, old: &[Value], new: &[Value], out: &mut ChangeSet) {
        let old_text: BTreeSet<String> = old.iter().map(Value::to_string).collect();
        let new_text: BTreeSet<String> = new.iter().map(Value::to_string).collect();

        if old_text == new_text {
            return;
        }

        if old_text.is_subset(&new_text) {
            for (i, item) in new.iter().enumerate() {
                if !old_text.contains(&item.to_string()) {
                    out.insert(
                        join_path(path, &i.to_string()),
                        ChangeEntry::added(item.clone()),
                    );
                }
            }
        } else if new_text.is_subset(&old_text) {
            let gone = old.iter().filter(|item| !new_text.contains(&item.to_string()));
            for (k, item) in gone.enumerate() {
                out.insert(
                    join_path(path, &(new.len() + k).to_string()),
                    ChangeEntry::removed(item.clone()),
                );
            }
        } else {
            out.insert(
                path,
                ChangeEntry::modified(Value::Set(old.to_vec()), Value::Set(new.to_vec())),
            );
        }
    }

    fn score(&self, a: &Value, b: &Value) -> f64 {
        if self.comparator.equal(a, b) {
            return 1.0;
        }
        match (a, b) {
            (Value::Record(x), Value::Record(y)) => self.field_ratio(&x.fields, &y.fields),
            (Value::Map(x), Value::Map(y)) => self.field_ratio(x, y),
            _ => 0.0,
        }
    }

    /// Matching fields over the union of field names; a field on one side
    /// only never matches
    fn field_ratio(&self, a: &BTreeMap<String, Value>, b: &BTreeMap<String, Value>) -> f64 {
        let names: BTreeSet<&String> = a.keys().chain(b.keys()).collect();
        if names.is_empty() {
            return 1.0;
        }
        let matching = names
            .iter()
            .filter(|name| match (a.get(name.as_str()), b.get(name.as_str())) {
                (Some(x), Some(y)) => self.comparator.equal(x, y),
                _ => false,
            })
            .count();
        matching as f64 / names.len() as f64
    }
}
