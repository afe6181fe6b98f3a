use std::time::SystemTime;

use serde_json::{json, Value};

use crate::error::ConfigError;
use crate::request::{ConfigOverride, OverrideSpec};
use crate::utils::format_timestamp;

/// `count` deep copies of `base`, each passed through `variation` with its
/// 0-based index. `None` applies [`default_variation`].
pub fn generate_variations<F>(base: &Value, count: usize, variation: Option<F>) -> Vec<Value>
where
    F: Fn(Value, usize) -> Value,
{
    (0..count)
        .map(|i| match &variation {
            Some(f) => f(base.clone(), i),
            None => default_variation(base.clone(), i),
        })
        .collect()
}

/// Numbers `id`, `name` and the email local part with `index + 1`, and stamps
/// `requestIndex` and `timestamp`. Non-object payloads pass through.
pub fn default_variation(mut payload: Value, index: usize) -> Value {
    let n = index + 1;
    let Some(obj) = payload.as_object_mut() else {
        return payload;
    };

    if obj.contains_key("id") {
        obj.insert("id".to_owned(), json!(n));
    }
    if let Some(name) = obj.get("name").and_then(Value::as_str).map(str::to_owned) {
        obj.insert("name".to_owned(), json!(format!("{} {}", name, n)));
    }
    if let Some(email) = obj.get("email").and_then(Value::as_str).map(str::to_owned) {
        let varied = match email.split_once('@') {
            Some((local, domain)) => format!("{}{}@{}", local, n, domain),
            None => format!("{}{}", email, n),
        };
        obj.insert("email".to_owned(), json!(varied));
    }
    obj.insert("requestIndex".to_owned(), json!(n));
    obj.insert("timestamp".to_owned(), json!(format_timestamp(SystemTime::now())));
    payload
}

/// One slot per payload, each slot carrying `base` with that payload as body.
/// Every payload must be a JSON object.
pub fn payload_overrides(payloads: Vec<Value>, base: &ConfigOverride) -> Result<OverrideSpec, ConfigError> {
    if payloads.is_empty() {
        return Err(ConfigError::EmptyPayloads);
    }
    if let Some(index) = payloads.iter().position(|p| !p.is_object()) {
        return Err(ConfigError::PayloadNotObject { index });
    }
    Ok(OverrideSpec::PerSlot(
        payloads
            .into_iter()
            .map(|payload| base.clone().body(payload))
            .collect(),
    ))
}
