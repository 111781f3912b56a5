//! Field-by-field validation of the merged `mongo` config value.
//!
//! Validation runs on the raw merged JSON, before the typed parse, so the
//! first failing field can be reported by its dotted path.

use crate::error::ConfigError;
use serde_json::Value;

pub fn validate(mongo: &Value) -> Result<(), ConfigError> {
    if !mongo.is_object() {
        return Err(invalid("mongo", "must be an object"));
    }
    check_bool(mongo, "enabled")?;
    check_bool(mongo, "debug")?;
    check_object(mongo, "paths")?;
    check_string(mongo, "paths.seed")?;
    check_string(mongo, "paths.models")?;
    check_object(mongo, "conn")?;
    check_string(mongo, "conn.uri")?;
    check_object(mongo, "conn.options")?;
    check_object(mongo, "schema")?;
    check_object(mongo, "schema.options")?;
    Ok(())
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn field<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(root, |value, key| value.get(key))
}

fn check_bool(root: &Value, path: &str) -> Result<(), ConfigError> {
    match field(root, path) {
        None | Some(Value::Null) => Err(invalid(path, "is required")),
        Some(Value::Bool(_)) => Ok(()),
        Some(_) => Err(invalid(path, "must be a boolean")),
    }
}

fn check_string(root: &Value, path: &str) -> Result<(), ConfigError> {
    match field(root, path) {
        None | Some(Value::Null) => Err(invalid(path, "is required")),
        Some(Value::String(_)) => Ok(()),
        Some(_) => Err(invalid(path, "must be a string")),
    }
}

fn check_object(root: &Value, path: &str) -> Result<(), ConfigError> {
    match field(root, path) {
        None | Some(Value::Null) => Err(invalid(path, "is required")),
        Some(Value::Object(_)) => Ok(()),
        Some(_) => Err(invalid(path, "must be an object")),
    }
}
