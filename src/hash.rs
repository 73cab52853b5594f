//! Idempotency hashing for pledge drafts.
//!
//! A pledge that was already created on the backend can be paid again as
//! long as the visitor has not changed anything that went into it. To detect
//! that, the draft is flattened into a plain string: every member value is
//! rendered in declaration order and joined with a delimiter that grows with
//! the nesting depth (`|`, then `$`, then `$$`, ...), so a flat value that
//! happens to contain `|` cannot collide with a nested structure.
//!
//! The result is only ever compared for equality. It is not a credential.

use serde::Serialize;
use serde_json::Value;

const TOP_DELIMITER: &str = "|";

/// Flatten any serializable value into its idempotency string.
///
/// Struct fields keep their declaration order (`serde_json` is built with
/// `preserve_order`), so two values with identical content always produce
/// the same string.
pub fn hash_of<T: Serialize>(value: &T) -> String {
    // Serializing plain data structs into a `Value` cannot fail; a failure
    // would only come from a map with non-string keys.
    match serde_json::to_value(value) {
        Ok(value) => simple_hash(&value),
        Err(e) => {
            tracing::warn!(error = %e, "pledge draft could not be serialized for hashing");
            String::new()
        }
    }
}

/// Flatten a JSON value with the top-level delimiter.
pub fn simple_hash(value: &Value) -> String {
    flatten(value, TOP_DELIMITER)
}

fn flatten(value: &Value, delimiter: &str) -> String {
    let nested = nested_delimiter(delimiter);
    let parts: Vec<String> = match value {
        Value::Object(map) => map.values().map(|v| render(v, &nested)).collect(),
        Value::Array(items) => items.iter().map(|v| render(v, &nested)).collect(),
        scalar => return render(scalar, &nested),
    };
    parts.join(delimiter)
}

fn render(value: &Value, nested: &str) -> String {
    match value {
        Value::Object(_) | Value::Array(_) => flatten(value, nested),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
    }
}

/// `|` nests into `$`, every further level prepends another `$`.
fn nested_delimiter(delimiter: &str) -> String {
    if delimiter == TOP_DELIMITER {
        "$".to_string()
    } else {
        format!("${delimiter}")
    }
}
