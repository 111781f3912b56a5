//! Model definitions, runtime model handles, and the insertion-ordered
//! registry.

use crate::context::ConnectionState;
use crate::error::MongoError;
use crate::schema::{FieldConfig, FieldSpec, FieldType, Schema, SchemaOptions};
use mongodb::bson::{self, Bson, DateTime, Document};
use mongodb::Collection;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// One model definition file: name, optional collection, fields, options.
#[derive(Clone, Debug, Deserialize)]
pub struct ModelDefinition {
    pub name: String,
    /// Collection name; derived from `name` when absent.
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldConfig>,
    #[serde(default)]
    pub options: SchemaOptions,
}

/// A registered model: resolved schema plus collection access through the
/// shared connection state.
#[derive(Clone)]
pub struct Model {
    name: String,
    collection: String,
    schema: Schema,
    state: Arc<ConnectionState>,
}

impl Model {
    pub(crate) fn new(
        def: ModelDefinition,
        defaults: &SchemaOptions,
        state: Arc<ConnectionState>,
    ) -> Model {
        let fields = def
            .fields
            .into_iter()
            .map(|(name, config)| (name, FieldSpec::from(config)))
            .collect();
        let schema = Schema::new(fields, defaults, &def.options);
        let collection = def.collection.unwrap_or_else(|| pluralize(&def.name));
        Model {
            name: def.name,
            collection,
            schema,
            state,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn collection_name(&self) -> &str {
        &self.collection
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Handle to the underlying collection. Requires an open connection.
    pub fn collection(&self) -> Result<Collection<Document>, MongoError> {
        Ok(self.state.database()?.collection(&self.collection))
    }

    /// Check `doc` against the field specs: required fields present, values
    /// matching their declared type.
    pub fn validate(&self, doc: &Document) -> Result<(), MongoError> {
        for (field, spec) in &self.schema.fields {
            match doc.get(field) {
                None | Some(Bson::Null) => {
                    if spec.required {
                        return Err(MongoError::Validation {
                            model: self.name.clone(),
                            field: field.clone(),
                            reason: "is required".to_string(),
                        });
                    }
                }
                Some(value) => {
                    if !type_matches(spec.field_type, value) {
                        return Err(MongoError::Validation {
                            model: self.name.clone(),
                            field: field.clone(),
                            reason: format!("must be of type {}", spec.field_type),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Convert a JSON value into an insert-ready document: fill field
    /// defaults, stamp timestamps when enabled, then validate.
    pub fn prepare(&self, value: &Value) -> Result<Document, MongoError> {
        let mut doc = bson::to_document(value)
            .map_err(|e| MongoError::Seed(format!("{}: not a document: {}", self.name, e)))?;
        for (field, spec) in &self.schema.fields {
            if doc.get(field).is_none() {
                if let Some(default) = &spec.default {
                    let default = bson::to_bson(default).map_err(|e| {
                        MongoError::Seed(format!("{}.{}: bad default: {}", self.name, field, e))
                    })?;
                    doc.insert(field.as_str(), default);
                }
            }
        }
        if self.schema.timestamps() {
            let now = DateTime::now();
            if !doc.contains_key("createdAt") {
                doc.insert("createdAt", now);
            }
            if !doc.contains_key("updatedAt") {
                doc.insert("updatedAt", now);
            }
        }
        self.validate(&doc)?;
        Ok(doc)
    }

    /// Prepare and bulk-insert documents. Returns the inserted count.
    pub async fn insert_many(&self, values: &[Value]) -> Result<u64, MongoError> {
        let docs = values
            .iter()
            .map(|value| self.prepare(value))
            .collect::<Result<Vec<_>, _>>()?;
        if docs.is_empty() {
            return Ok(0);
        }
        let result = self.collection()?.insert_many(docs).await?;
        Ok(result.inserted_ids.len() as u64)
    }

    /// Plain-object serialized form (see [`Schema::to_object`]).
    pub fn to_object(&self, doc: &Document) -> Document {
        self.schema.to_object(doc)
    }

    /// Wire (JSON) serialized form (see [`Schema::to_json`]).
    pub fn to_json(&self, doc: &Document) -> Value {
        self.schema.to_json(doc)
    }
}

fn type_matches(field_type: FieldType, value: &Bson) -> bool {
    match (field_type, value) {
        (FieldType::String, Bson::String(_)) => true,
        (FieldType::Int, Bson::Int32(_) | Bson::Int64(_)) => true,
        (FieldType::Float, Bson::Double(_) | Bson::Int32(_) | Bson::Int64(_)) => true,
        (FieldType::Bool, Bson::Boolean(_)) => true,
        // Seed data arrives as JSON, where dates and object ids are strings.
        (FieldType::Date, Bson::DateTime(_) | Bson::String(_)) => true,
        (FieldType::ObjectId, Bson::ObjectId(_) | Bson::String(_)) => true,
        (FieldType::Array, Bson::Array(_)) => true,
        (FieldType::Object, Bson::Document(_)) => true,
        _ => false,
    }
}

/// Lowercase + naive pluralization, the ODM convention ("User" -> "users").
fn pluralize(name: &str) -> String {
    let lower = name.to_lowercase();
    if lower.ends_with('s') {
        lower
    } else {
        format!("{}s", lower)
    }
}

/// Insertion-ordered registry keyed by model name. Duplicates overwrite
/// silently, keeping the original discovery position.
#[derive(Clone, Default)]
pub struct ModelRegistry {
    models: Vec<Model>,
    by_name: HashMap<String, usize>,
}

impl ModelRegistry {
    pub fn insert(&mut self, model: Model) {
        match self.by_name.get(model.name()) {
            Some(&index) => self.models[index] = model,
            None => {
                self.by_name.insert(model.name().to_string(), self.models.len());
                self.models.push(model);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Model> {
        self.by_name.get(name).map(|&index| &self.models[index])
    }

    /// Models in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Model> {
        self.models.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(Model::name)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
