//! Structural checks for validator predicates
//!
//! Validators are plain `fn(&Value) -> bool` built from these helpers, e.g.
//!
//! ```ignore
//! fn is_summary(v: &Value) -> bool {
//!     has_string(v, "summaryTitle") && has_array(v, "rewrites")
//! }
//! ```

use serde_json::Value;

pub fn is_object(value: &Value) -> bool {
    value.is_object()
}

/// `key` is present with any value, including `null`
pub fn has_key(value: &Value, key: &str) -> bool {
    value.get(key).is_some()
}

pub fn has_string(value: &Value, key: &str) -> bool {
    value.get(key).is_some_and(Value::is_string)
}

pub fn has_number(value: &Value, key: &str) -> bool {
    value.get(key).is_some_and(Value::is_number)
}

pub fn has_bool(value: &Value, key: &str) -> bool {
    value.get(key).is_some_and(Value::is_boolean)
}

pub fn has_array(value: &Value, key: &str) -> bool {
    value.get(key).is_some_and(Value::is_array)
}

pub fn has_object(value: &Value, key: &str) -> bool {
    value.get(key).is_some_and(Value::is_object)
}

/// `value[key]` is an array whose every element satisfies `predicate`
pub fn array_all(value: &Value, key: &str, predicate: impl Fn(&Value) -> bool) -> bool {
    value
        .get(key)
        .and_then(Value::as_array)
        .is_some_and(|items| items.iter().all(predicate))
}

/// `value[key]` is an array of strings
pub fn has_string_array(value: &Value, key: &str) -> bool {
    array_all(value, key, Value::is_string)
}
