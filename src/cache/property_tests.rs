//! Property-Based Tests for the cache key codec and entry store
//!
//! Uses proptest to check key stability, containment matching and store
//! bookkeeping over generated inputs.

use proptest::prelude::*;
use serde_json::{Map, Value};
use tokio::time::Instant;

use crate::cache::{CacheStore, EntryPatch};
use crate::codec::{contains, parse, serialize};

// == Strategies ==
/// Generates JSON scalars
fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        any::<f64>()
            .prop_filter("finite", |f| f.is_finite())
            .prop_map(Value::from),
        "[a-z0-9 ]{0,12}".prop_map(Value::String),
    ]
}

/// Generates arbitrary JSON values up to a small depth
fn json_strategy() -> impl Strategy<Value = Value> {
    scalar_strategy().prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..6)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

/// Generates property lists with unique names
fn properties_strategy() -> impl Strategy<Value = Vec<(String, Value)>> {
    prop::collection::btree_map("[a-z]{1,6}", json_strategy(), 1..8)
        .prop_map(|map| map.into_iter().collect())
}

fn object_from(props: &[(String, Value)]) -> Value {
    let mut map = Map::new();
    for (key, value) in props {
        map.insert(key.clone(), value.clone());
    }
    Value::Object(map)
}

/// Writes an object's JSON text with its properties in reverse order.
///
/// Test builds enable `preserve_order`, so parsing this text yields a map whose
/// insertion order is the reverse of `object_from`'s.
fn reversed_text(props: &[(String, Value)]) -> String {
    let fields: Vec<String> = props
        .iter()
        .rev()
        .map(|(key, value)| format!("{}:{}", Value::String(key.clone()), value))
        .collect();
    format!("{{{}}}", fields.join(","))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // *For any* object, serializing it with its properties in a different
    // insertion order SHALL yield the same key.
    #[test]
    fn prop_key_independent_of_property_order(props in properties_strategy()) {
        let forward = object_from(&props);
        let reversed: Value = serde_json::from_str(&reversed_text(&props)).unwrap();
        if props.len() > 1 {
            let first = reversed.as_object().unwrap().keys().next().unwrap();
            prop_assert_eq!(first, &props[props.len() - 1].0);
        }

        prop_assert_eq!(serialize(&forward), serialize(&reversed));
    }

    // *For any* two values that are not deeply equal, their keys SHALL differ.
    #[test]
    fn prop_distinct_values_distinct_keys(a in json_strategy(), b in json_strategy()) {
        prop_assume!(a != b);
        prop_assert_ne!(serialize(&a), serialize(&b));
    }

    // *For any* value, decoding its key SHALL give back a deeply equal value.
    #[test]
    fn prop_key_round_trip(value in json_strategy()) {
        let decoded = parse(&serialize(&value)).unwrap();
        prop_assert_eq!(decoded, value);
    }

    // *For any* value, the value SHALL contain itself.
    #[test]
    fn prop_value_contains_itself(value in json_strategy()) {
        prop_assert!(contains(&value, &value));
    }

    // *For any* object, every subset of its properties SHALL be contained in it.
    #[test]
    fn prop_object_contains_property_subset(
        props in properties_strategy(),
        keep in prop::collection::vec(any::<bool>(), 8)
    ) {
        let value = object_from(&props);
        let subset: Vec<(String, Value)> = props
            .iter()
            .zip(keep.iter())
            .filter(|(_, keep)| **keep)
            .map(|(prop, _)| prop.clone())
            .collect();

        prop_assert!(contains(&value, &object_from(&subset)));
    }

    // *For any* object and property, a pattern asking for a different value of
    // that property SHALL NOT match.
    #[test]
    fn prop_changed_scalar_does_not_match(props in properties_strategy(), n in any::<i64>()) {
        let value = object_from(&props);
        let (key, current) = &props[0];
        let replacement = Value::from(n);
        prop_assume!(current != &replacement);

        let pattern = object_from(&[(key.clone(), replacement)]);
        prop_assert!(!contains(&value, &pattern));
    }

    // *For any* sequence of seeds and commits, the store SHALL hold exactly
    // one entry per distinct key and count them accurately.
    #[test]
    fn prop_store_one_entry_per_key(values in prop::collection::vec(json_strategy(), 1..30)) {
        let mut store = CacheStore::new(["q"]);
        let now = Instant::now();
        let mut distinct = std::collections::HashSet::new();

        for value in &values {
            let key = serialize(value);
            store.get_or_seed("q", &key, &Value::Null, now);
            store.commit("q", &key, EntryPatch::resolved(value.clone()));
            distinct.insert(key);
        }

        prop_assert_eq!(store.len(), distinct.len());
        prop_assert_eq!(store.stats().total_entries, distinct.len());
        for key in &distinct {
            let entry = store.get("q", key).unwrap();
            prop_assert_eq!(serialize(&entry.data), key.clone());
        }
    }
}
