//! Masking of credentials the API may echo back in response bodies.

use serde_json::Value;

/// Replacement written over every sensitive field.
pub const MASK: &str = "********";

/// Masks agent keys, cluster keys, AWS credentials and integration API keys in
/// a response body, in place.
///
/// ```rust
/// use serde_json::json;
/// use wz_table::transport::redact::{redact, MASK};
///
/// let mut body = json!({ "error": 0, "data": { "id": "001", "internal_key": "abc" } });
/// redact(&mut body);
/// assert_eq!(body["data"]["internal_key"], MASK);
/// ```
pub fn redact(body: &mut Value) {
    let Some(data) = body.get_mut("data").and_then(Value::as_object_mut) else {
        return;
    };

    if let Some(key) = data.get_mut("internal_key") {
        *key = Value::from(MASK);
    }

    // Cluster configuration, either at the top level or nested.
    if data.contains_key("node_type") {
        if let Some(key) = data.get_mut("key") {
            *key = Value::from(MASK);
        }
    }
    if let Some(cluster) = data.get_mut("cluster").and_then(Value::as_object_mut) {
        if cluster.contains_key("node_type") {
            if let Some(key) = cluster.get_mut("key") {
                *key = Value::from(MASK);
            }
        }
    }

    if let Some(modules) = data.get_mut("wmodules").and_then(Value::as_array_mut) {
        for module in modules {
            let Some(aws) = module.get_mut("aws-s3") else {
                continue;
            };
            for section in ["buckets", "services"] {
                if let Some(entries) = aws.get_mut(section).and_then(Value::as_array_mut) {
                    for entry in entries.iter_mut().filter_map(Value::as_object_mut) {
                        entry.insert("access_key".into(), Value::from(MASK));
                        entry.insert("secret_key".into(), Value::from(MASK));
                    }
                }
            }
        }
    }

    if let Some(integrations) = data.get_mut("integration").and_then(Value::as_array_mut) {
        for integration in integrations.iter_mut().filter_map(Value::as_object_mut) {
            integration.insert("api_key".into(), Value::from(MASK));
        }
    }
}
