pub mod defaults;
pub mod types;
pub mod validator;

pub use defaults::defaults;
pub use types::*;
pub use validator::validate;

use crate::error::ConfigError;
use serde_json::Value;

/// Deep-merge `overrides` onto `base`: objects merge recursively, any other
/// override value (including null) wins on leaf conflicts.
pub fn deep_merge(base: Value, overrides: &Value) -> Value {
    match (base, overrides) {
        (Value::Object(mut merged), Value::Object(over)) => {
            for (key, value) in over {
                let entry = match merged.remove(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), entry);
            }
            Value::Object(merged)
        }
        (_, over) => over.clone(),
    }
}

/// Merge `overrides` onto `defaults`, validate the `mongo` sub-object, and
/// return the typed configuration. No side effects beyond validation.
pub fn resolve(defaults: &Value, overrides: &Value) -> Result<MongoConfig, ConfigError> {
    let merged = deep_merge(defaults.clone(), overrides);
    let mongo = merged.get("mongo").cloned().unwrap_or(Value::Null);
    validator::validate(&mongo)?;
    serde_json::from_value(mongo).map_err(|e| ConfigError::Load(e.to_string()))
}
