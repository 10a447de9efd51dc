//! Helpers over raw content values

use serde_yaml::{Mapping, Value};

/// Copies every entry of `patch` over `base` (depth 1, patch wins)
pub fn merge_shallow(base: &mut Mapping, patch: &Mapping) {
    for (key, value) in patch {
        base.insert(key.clone(), value.clone());
    }
}

/// Every scalar leaf below `value`, depth first
pub fn leaves(value: &Value) -> Vec<&Value> {
    let mut out = Vec::new();
    collect_leaves(value, &mut out);
    out
}

fn collect_leaves<'a>(value: &'a Value, out: &mut Vec<&'a Value>) {
    match value {
        Value::Sequence(items) => items.iter().for_each(|item| collect_leaves(item, out)),
        Value::Mapping(map) => map.values().for_each(|child| collect_leaves(child, out)),
        Value::Tagged(tagged) => collect_leaves(&tagged.value, out),
        leaf => out.push(leaf),
    }
}

/// String attribute of a mapping value
pub fn str_attr<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.as_mapping()?.get(key)?.as_str()
}
