//! Dot-path navigation over `serde_json::Value`.

use serde_json::Value;

/// Navigate a JSON value by a dot-separated path (`"data.items.0.name"`).
///
/// Object keys and array indices are both supported. Any missing key,
/// out-of-bounds index, or navigation through a scalar resolves to
/// `Value::Null` rather than erroring — a missing path is not a failure.
#[must_use]
pub fn navigate(value: &Value, path: &str) -> Value {
    if path.is_empty() {
        return value.clone();
    }
    let mut current = value;
    for segment in path.split('.') {
        match current {
            Value::Object(map) => match map.get(segment) {
                Some(v) => current = v,
                None => return Value::Null,
            },
            Value::Array(arr) => match segment.parse::<usize>().ok().and_then(|i| arr.get(i)) {
                Some(v) => current = v,
                None => return Value::Null,
            },
            _ => return Value::Null,
        }
    }
    current.clone()
}
