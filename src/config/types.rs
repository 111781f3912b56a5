//! Typed configuration for the `mongo` section of the host config.

use crate::schema::SchemaOptions;
use serde::{Deserialize, Serialize};

/// Validated configuration. Immutable after resolution; the normalized form
/// is written back onto the host so downstream consumers observe it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MongoConfig {
    /// Gate: when false, no further initialization occurs.
    pub enabled: bool,
    /// Verbose-logging toggle forwarded to the connection context.
    pub debug: bool,
    pub paths: PathsConfig,
    pub conn: ConnConfig,
    pub schema: SchemaDefaults,
}

/// Filesystem paths, resolved relative to the host root.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PathsConfig {
    pub seed: String,
    pub models: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConnConfig {
    /// Connection string. The URI's database name becomes the default
    /// database for the context.
    pub uri: String,
    /// Driver options. Recognized keys are mapped onto the client options;
    /// unrecognized keys are warned about and ignored.
    #[serde(default)]
    pub options: serde_json::Map<String, serde_json::Value>,
}

/// Default options combined into every registered schema.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SchemaDefaults {
    #[serde(default)]
    pub options: SchemaOptions,
}
