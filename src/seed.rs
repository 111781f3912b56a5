//! Seeding: the seeder seam and the file-backed dataset implementation.

use crate::error::MongoError;
use crate::loader::absolute;
use crate::model::ModelRegistry;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::debug;

/// Populates a freshly dropped database from the model registry. `env` is
/// the host's environment name, for seeders that branch per environment.
///
/// Execution errors returned from `seed` are logged and swallowed by the
/// lifecycle; they never fail the process.
#[async_trait]
pub trait Seeder: Send + Sync {
    async fn seed(&self, models: &ModelRegistry, env: &str) -> Result<(), MongoError>;
}

/// Seed dataset on disk: a JSON object mapping model name to an array of
/// documents.
#[derive(Debug)]
pub struct DatasetSeeder {
    data: Map<String, Value>,
}

impl DatasetSeeder {
    /// Read and parse the dataset. A missing path or a malformed payload is
    /// a fatal configuration error, distinct from a seed that ran and
    /// failed.
    pub fn load(path: &Path) -> Result<DatasetSeeder, MongoError> {
        if !path.is_file() {
            return Err(MongoError::SeedPath { path: absolute(path) });
        }
        let raw = std::fs::read_to_string(path).map_err(|source| MongoError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let value: Value = serde_json::from_str(&raw).map_err(|e| MongoError::SeedData {
            path: absolute(path),
            reason: e.to_string(),
        })?;
        match value {
            Value::Object(data) => Ok(DatasetSeeder { data }),
            _ => Err(MongoError::SeedData {
                path: absolute(path),
                reason: "top-level value must be an object".to_string(),
            }),
        }
    }
}

#[async_trait]
impl Seeder for DatasetSeeder {
    async fn seed(&self, models: &ModelRegistry, _env: &str) -> Result<(), MongoError> {
        for (name, entries) in &self.data {
            let model = models.get(name).ok_or_else(|| {
                MongoError::Seed(format!("no model named \"{}\" is registered", name))
            })?;
            let docs = entries.as_array().ok_or_else(|| {
                MongoError::Seed(format!("seed entries for \"{}\" must be an array", name))
            })?;
            let inserted = model.insert_many(docs).await?;
            debug!(model = %name, count = inserted, "seeded");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_dataset_is_a_path_error() {
        let err = DatasetSeeder::load(Path::new("no/such/seed.json")).unwrap_err();
        assert!(matches!(err, MongoError::SeedPath { .. }));
        assert!(err.to_string().contains("seed path is not valid"));
    }

    #[test]
    fn non_object_dataset_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();
        let err = DatasetSeeder::load(&path).unwrap_err();
        assert!(matches!(err, MongoError::SeedData { .. }));
    }
}
