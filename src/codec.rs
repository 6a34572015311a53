//! Key Codec Module
//!
//! Derives stable cache keys from parameter values and decodes them back.
//!
//! Object properties are emitted in lexicographic order at every depth, so two
//! values that differ only in property insertion order share one key. Arrays
//! and scalars are emitted structurally as-is. `serde_json::Value` cannot hold
//! a cycle, so the encoder is total.

use serde_json::{Map, Value};

use crate::error::{QueryError, Result};

// == Canonicalize ==
/// Rebuilds a value with every object's properties inserted in sorted order.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));

            let mut sorted = Map::with_capacity(entries.len());
            for (key, val) in entries {
                sorted.insert(key.clone(), canonicalize(val));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        scalar => scalar.clone(),
    }
}

// == Serialize ==
/// Encodes a parameter value into its cache key.
///
/// Integers and floats stay distinct: `1` and `1.0` produce different keys and
/// do not match each other as invalidation patterns.
pub fn serialize(value: &Value) -> String {
    // Display on a Value is infallible JSON without whitespace
    canonicalize(value).to_string()
}

// == Parse ==
/// Decodes a cache key back into the parameter value it was derived from.
pub fn parse(key: &str) -> Result<Value> {
    serde_json::from_str(key).map_err(|source| QueryError::MalformedKey {
        key: key.to_string(),
        source,
    })
}

// == Canonical Key ==
/// Re-derives a key so that hand-written keys match codec output.
///
/// Keys that do not decode are returned unchanged; those can only come from
/// callers supplying their own key.
pub fn canonical_key(key: &str) -> String {
    match parse(key) {
        Ok(value) => serialize(&value),
        Err(_) => key.to_string(),
    }
}

// == Contains ==
/// Checks whether `value` structurally contains `pattern`.
///
/// Every property of an object pattern must be present in `value` and contain
/// the pattern's property in turn. Array patterns are matched index by index
/// the same way. Scalars must be equal. An empty object or array pattern has
/// no property to check and matches any value.
pub fn contains(value: &Value, pattern: &Value) -> bool {
    match pattern {
        Value::Object(expected) if expected.is_empty() => true,
        Value::Array(expected) if expected.is_empty() => true,
        Value::Object(expected) => match value {
            Value::Object(actual) => expected.iter().all(|(prop, want)| {
                actual
                    .get(prop)
                    .is_some_and(|have| contains(have, want))
            }),
            _ => false,
        },
        Value::Array(expected) => match value {
            Value::Array(actual) => expected
                .iter()
                .enumerate()
                .all(|(i, want)| actual.get(i).is_some_and(|have| contains(have, want))),
            _ => false,
        },
        scalar => value == scalar,
    }
}
