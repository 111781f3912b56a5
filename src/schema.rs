//! Schema options, field specs, and the serialization transforms applied to
//! every registered model.

use mongodb::bson::{Bson, Document};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Per-schema options. On the connection context they act as defaults for
/// every registered schema; a schema's own options win key by key.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SchemaOptions {
    /// Remove empty embedded documents from serialized forms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimize: Option<bool>,
    /// Stamp `createdAt`/`updatedAt` on the insert path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamps: Option<bool>,
    /// Field names hidden from both serialized forms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Vec<String>>,
}

impl SchemaOptions {
    /// Layer `own` on top of `self`: each key set in `own` wins.
    pub fn overlay(&self, own: &SchemaOptions) -> SchemaOptions {
        SchemaOptions {
            minimize: own.minimize.or(self.minimize),
            timestamps: own.timestamps.or(self.timestamps),
            filter: own.filter.clone().or_else(|| self.filter.clone()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Int,
    Float,
    Bool,
    Date,
    ObjectId,
    Array,
    Object,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::String => "string",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Bool => "bool",
            FieldType::Date => "date",
            FieldType::ObjectId => "objectid",
            FieldType::Array => "array",
            FieldType::Object => "object",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    /// Value filled in on the insert path when the field is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// Field entry as written in a model definition file: either the shorthand
/// `"name": "string"` or the full spec object.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum FieldConfig {
    Shorthand(FieldType),
    Full(FieldSpec),
}

impl From<FieldConfig> for FieldSpec {
    fn from(config: FieldConfig) -> FieldSpec {
        match config {
            FieldConfig::Shorthand(field_type) => FieldSpec {
                field_type,
                required: false,
                default: None,
            },
            FieldConfig::Full(spec) => spec,
        }
    }
}

/// A model's structural definition with its options resolved against the
/// context defaults. Owns the serialization transforms.
#[derive(Clone, Debug)]
pub struct Schema {
    pub fields: BTreeMap<String, FieldSpec>,
    minimize: bool,
    timestamps: bool,
    filter: Vec<String>,
}

impl Schema {
    /// Combine the context-wide defaults with the schema's own options.
    /// Own options are applied after the defaults, so they win per key.
    pub fn new(
        fields: BTreeMap<String, FieldSpec>,
        defaults: &SchemaOptions,
        own: &SchemaOptions,
    ) -> Schema {
        let resolved = defaults.overlay(own);
        Schema {
            fields,
            minimize: resolved.minimize.unwrap_or(true),
            timestamps: resolved.timestamps.unwrap_or(false),
            filter: resolved.filter.unwrap_or_default(),
        }
    }

    pub fn minimize(&self) -> bool {
        self.minimize
    }

    pub fn timestamps(&self) -> bool {
        self.timestamps
    }

    pub fn filter(&self) -> &[String] {
        &self.filter
    }

    /// Plain-object form: the raw `_id` and every filtered field removed,
    /// the virtual `id` (hex of `_id`) included.
    pub fn to_object(&self, doc: &Document) -> Document {
        let mut out = doc.clone();
        if let Some(Bson::ObjectId(oid)) = doc.get("_id") {
            out.insert("id", oid.to_hex());
        }
        out.remove("_id");
        for key in &self.filter {
            out.remove(key);
        }
        if self.minimize {
            minimize_document(&mut out);
        }
        out
    }

    /// Wire form: `to_object` rendered as JSON, with ObjectIds as hex
    /// strings and dates as RFC 3339 strings.
    pub fn to_json(&self, doc: &Document) -> Value {
        Value::Object(document_to_json(&self.to_object(doc)))
    }
}

fn minimize_document(doc: &mut Document) {
    let keys: Vec<String> = doc.keys().cloned().collect();
    for key in keys {
        if let Some(Bson::Document(inner)) = doc.get_mut(&key) {
            minimize_document(inner);
            if inner.is_empty() {
                doc.remove(&key);
            }
        }
    }
}

fn document_to_json(doc: &Document) -> Map<String, Value> {
    doc.iter().map(|(k, v)| (k.clone(), bson_to_json(v))).collect()
}

fn bson_to_json(value: &Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => dt
            .try_to_rfc3339_string()
            .map(Value::String)
            .unwrap_or(Value::Null),
        Bson::Document(doc) => Value::Object(document_to_json(doc)),
        Bson::Array(items) => Value::Array(items.iter().map(bson_to_json).collect()),
        other => other.clone().into_relaxed_extjson(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{doc, oid::ObjectId, DateTime};

    fn schema_with(filter: &[&str], timestamps: bool) -> Schema {
        let defaults = SchemaOptions {
            minimize: Some(false),
            timestamps: Some(timestamps),
            filter: None,
        };
        let own = SchemaOptions {
            filter: Some(filter.iter().map(|s| s.to_string()).collect()),
            ..Default::default()
        };
        Schema::new(BTreeMap::new(), &defaults, &own)
    }

    #[test]
    fn wire_form_hides_internal_id_and_filtered_fields() {
        let schema = schema_with(&["password"], true);
        let oid = ObjectId::new();
        let doc = doc! {
            "_id": oid,
            "name": "Ada",
            "password": "secret",
            "createdAt": DateTime::now(),
            "updatedAt": DateTime::now(),
        };
        let json = schema.to_json(&doc);
        let obj = json.as_object().unwrap();
        assert!(obj.get("_id").is_none());
        assert!(obj.get("password").is_none());
        assert_eq!(obj.get("id").unwrap().as_str().unwrap(), oid.to_hex());
        assert!(obj.get("createdAt").unwrap().is_string());
        assert!(obj.get("updatedAt").unwrap().is_string());
        assert_eq!(obj.get("name").unwrap(), "Ada");
    }

    #[test]
    fn object_form_follows_the_same_rules() {
        let schema = schema_with(&["secret"], false);
        let doc = doc! { "_id": ObjectId::new(), "secret": 1, "kept": true };
        let object = schema.to_object(&doc);
        assert!(!object.contains_key("_id"));
        assert!(!object.contains_key("secret"));
        assert!(object.contains_key("id"));
        assert!(object.get_bool("kept").unwrap());
    }

    #[test]
    fn own_options_win_over_context_defaults() {
        let defaults = SchemaOptions {
            minimize: Some(false),
            timestamps: Some(true),
            filter: None,
        };
        let own = SchemaOptions {
            timestamps: Some(false),
            ..Default::default()
        };
        let schema = Schema::new(BTreeMap::new(), &defaults, &own);
        assert!(!schema.timestamps());
        assert!(!schema.minimize());
    }

    #[test]
    fn minimize_strips_empty_embedded_documents() {
        let defaults = SchemaOptions {
            minimize: Some(true),
            ..Default::default()
        };
        let schema = Schema::new(BTreeMap::new(), &defaults, &SchemaOptions::default());
        let object = schema.to_object(&doc! {
            "meta": {},
            "nested": { "inner": {} },
            "kept": { "a": 1 },
        });
        assert!(!object.contains_key("meta"));
        assert!(!object.contains_key("nested"));
        assert!(object.contains_key("kept"));
    }

    #[test]
    fn shorthand_field_config_expands() {
        let spec: FieldSpec = serde_json::from_str::<FieldConfig>(r#""string""#)
            .unwrap()
            .into();
        assert_eq!(spec.field_type, FieldType::String);
        assert!(!spec.required);
    }
}
