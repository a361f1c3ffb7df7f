//! Property tests for the diff engine.
//!
//! These validate the invariants every caller relies on: a value never
//! differs from itself, set order never shows up in a flat map, and diffing
//! flat maps agrees with diffing the trees they came from.

use std::collections::BTreeMap;

use audit_trail::diff::{DiffOptions, Flattener, StructuralDiffer};
use audit_trail::models::{Record, Value};
use proptest::prelude::*;

// Strategy: Generate arbitrary scalar leaves
fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::bool),
        (-1000i64..1000).prop_map(Value::int),
        "[A-Za-z ]{0,8}".prop_map(Value::string),
        prop_oneof![Just("BS"), Just("MS"), Just("PHD")].prop_map(Value::enum_name),
    ]
}

// Strategy: Generate field names that never collide with bookkeeping fields
fn arb_key() -> impl Strategy<Value = String> {
    "[a-f]{1,3}"
}

// Strategy: Generate arbitrary value trees
fn arb_value() -> impl Strategy<Value = Value> {
    arb_scalar().prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::list),
            prop::collection::vec(arb_scalar(), 0..4).prop_map(Value::set),
            prop::collection::btree_map(arb_key(), inner.clone(), 0..4)
                .prop_map(|m: BTreeMap<String, Value>| Value::Map(m)),
            prop::collection::btree_map(arb_key(), inner, 0..4).prop_map(|fields| {
                Value::Record(Record {
                    kind: Some("Node".into()),
                    fields,
                })
            }),
        ]
    })
}

proptest! {
    /// Property: A value never differs from itself
    #[test]
    fn proptest_diff_is_reflexive(value in arb_value()) {
        let differ = StructuralDiffer::default();
        let changes = differ.diff(&value, &value.clone());
        prop_assert!(changes.is_empty(), "unexpected changes: {:?}", changes);
    }

    /// Property: Set element order never reaches the flat map
    #[test]
    fn proptest_flatten_ignores_set_order(items in prop::collection::vec(arb_scalar(), 0..6)) {
        let flattener = Flattener::new(&DiffOptions::default());
        let mut reversed = items.clone();
        reversed.reverse();

        let forward = Value::from(Record::new("Employee").with_value("skillSet", Value::set(items)));
        let backward = Value::from(Record::new("Employee").with_value("skillSet", Value::set(reversed)));

        prop_assert_eq!(flattener.flatten(&forward, ""), flattener.flatten(&backward, ""));
    }

    /// Property: Diffing flat maps gives the same change set as diffing trees
    #[test]
    fn proptest_flat_diff_matches_tree_diff(old in arb_value(), new in arb_value()) {
        let differ = StructuralDiffer::default();
        let flattener = differ.flattener();

        let tree = differ.diff(&old, &new);
        let flat = differ.diff_flat(&flattener.flatten(&old, ""), &flattener.flatten(&new, ""));

        prop_assert_eq!(tree, flat);
    }

    /// Property: Every changed path is reported once, with a non-empty
    /// payload entry for it
    #[test]
    fn proptest_payload_covers_changes(old in arb_value(), new in arb_value()) {
        let differ = StructuralDiffer::default();
        let changes = differ.diff(&old, &new);
        let payload = changes.to_payload();

        prop_assert_eq!(changes.is_empty(), payload.is_empty());
    }
}
