//! Typed errors for configuration, model loading, and lifecycle operations.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration resolution failures. Raised before any I/O happens.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The merged config failed validation; names the first offending field.
    #[error("Invalid Mongo config: {field} {reason}")]
    Invalid { field: String, reason: String },
    #[error("Invalid Mongo config: {0}")]
    Load(String),
}

#[derive(Error, Debug)]
pub enum MongoError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Models directory missing or not a directory. Fatal at load time,
    /// before any connection attempt.
    #[error("MongoDB Error: \"{}\" models path is not valid", .path.display())]
    ModelsPath { path: PathBuf },

    /// Seed path missing or not a file. Fatal, but only surfaced when
    /// `seed()` is invoked.
    #[error("MongoDB Error: \"{}\" seed path is not valid", .path.display())]
    SeedPath { path: PathBuf },

    #[error("MongoDB Error: failed to read \"{}\": {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("MongoDB Error: \"{}\" is not a valid model definition: {source}", .path.display())]
    ModelFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("MongoDB Error: \"{}\" is not a valid seed dataset: {reason}", .path.display())]
    SeedData { path: PathBuf, reason: String },

    #[error(transparent)]
    Connection(#[from] mongodb::error::Error),

    /// Database access before `connect` (or after `disconnect`).
    #[error("MongoDB Error: not connected")]
    NotConnected,

    /// A document failed its model's field checks. Seed-execution layer.
    #[error("{model}.{field} {reason}")]
    Validation {
        model: String,
        field: String,
        reason: String,
    },

    /// Seeder execution failure; logged and swallowed by `Database::seed`.
    #[error("{0}")]
    Seed(String),

    #[error("Command {cmd} not allowed. Valid options: {}.", crate::lifecycle::ALLOWED_COMMANDS.join(", "))]
    Command { cmd: String },
}
