//! Root Lookup
//!
//! Resolves `/`-separated path expressions against a whole document.

use serde_json::Value;

/// Fetch the value at `path` (e.g. `/spec/containers/0/image`).
///
/// Empty segments are ignored, so `""` and `"/"` resolve to `root`.
/// Returns `None` when any segment cannot be followed.
pub fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .try_fold(root, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment
                .parse::<usize>()
                .ok()
                .and_then(|index| items.get(index)),
            _ => None,
        })
}
