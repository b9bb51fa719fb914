//! Work units for deduplicated dispatch

use serde_json::{Map, Value};
use std::collections::HashMap;

/// Recursively rebuild `value` with object keys in sorted order
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let sorted: Map<String, Value> = keys
                .into_iter()
                .map(|k| (k.clone(), canonicalize(&map[k])))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Identity of one tool invocation.
///
/// Two argument sets that differ only in key order produce the same key.
///
/// ```
/// use council_domain::dispatch::canonical_key;
/// use serde_json::{Map, json};
///
/// let a: Map<_, _> = json!({"b": 1, "a": 2}).as_object().unwrap().clone();
/// let b: Map<_, _> = json!({"a": 2, "b": 1}).as_object().unwrap().clone();
/// assert_eq!(canonical_key("search", &a), canonical_key("search", &b));
/// ```
pub fn canonical_key(tool_name: &str, args: &Map<String, Value>) -> String {
    let canonical = canonicalize(&Value::Object(args.clone()));
    format!("{}:{}", tool_name, canonical)
}

/// A unique argument set together with every input position that requested it
#[derive(Debug, Clone, PartialEq)]
pub struct WorkUnit {
    pub canonical_key: String,
    pub arguments: Map<String, Value>,
    /// Positions in the input batch, ascending
    pub origin_positions: Vec<usize>,
}

/// Group a batch of argument sets by canonical key.
///
/// Units come out in order of first occurrence. Every input position
/// appears in exactly one unit.
pub fn group_work_units(tool_name: &str, batch: &[Map<String, Value>]) -> Vec<WorkUnit> {
    let mut units: Vec<WorkUnit> = Vec::new();
    let mut index_of: HashMap<String, usize> = HashMap::new();

    for (position, args) in batch.iter().enumerate() {
        let key = canonical_key(tool_name, args);
        match index_of.get(&key) {
            Some(&index) => units[index].origin_positions.push(position),
            None => {
                index_of.insert(key.clone(), units.len());
                units.push(WorkUnit {
                    canonical_key: key,
                    arguments: args.clone(),
                    origin_positions: vec![position],
                });
            }
        }
    }

    units
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_canonical_key_sorts_nested_objects() {
        let a = args(json!({"q": {"z": 1, "a": [ {"y": 1, "x": 2} ]}}));
        let b = args(json!({"q": {"a": [ {"x": 2, "y": 1} ], "z": 1}}));
        assert_eq!(canonical_key("t", &a), canonical_key("t", &b));
    }

    #[test]
    fn test_canonical_key_includes_tool_name() {
        let a = args(json!({"v": 1}));
        assert_ne!(canonical_key("one", &a), canonical_key("two", &a));
    }

    #[test]
    fn test_canonical_key_keeps_array_order() {
        let a = args(json!({"v": [1, 2]}));
        let b = args(json!({"v": [2, 1]}));
        assert_ne!(canonical_key("t", &a), canonical_key("t", &b));
    }

    #[test]
    fn test_group_work_units() {
        let batch = vec![
            args(json!({"v": "a"})),
            args(json!({"v": "b"})),
            args(json!({"v": "a"})),
        ];
        let units = group_work_units("echo", &batch);

        assert_eq!(units.len(), 2);
        assert_eq!(units[0].origin_positions, vec![0, 2]);
        assert_eq!(units[1].origin_positions, vec![1]);
        assert_eq!(units[1].arguments["v"], "b");
    }

    #[test]
    fn test_group_large_batch_with_repeats() {
        let batch: Vec<_> = (0..3000).map(|i| args(json!({"v": i % 3}))).collect();
        let units = group_work_units("echo", &batch);

        assert_eq!(units.len(), 3);
        assert_eq!(units[1].origin_positions.len(), 1000);
        assert_eq!(units[2].origin_positions[..2], [2, 5]);
    }

    #[test]
    fn test_group_empty_batch() {
        assert!(group_work_units("echo", &[]).is_empty());
    }
}
