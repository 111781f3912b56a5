//! Mooring: configuration-driven MongoDB connection lifecycle for host
//! applications.
//!
//! The crate merges and validates configuration, discovers model definitions
//! on disk, applies serialization rules to every registered schema, and
//! hands the host a small connect/disconnect/drop/seed/run API wired to its
//! before-start hook.

pub mod config;
pub mod context;
pub mod error;
pub mod host;
pub mod lifecycle;
pub mod loader;
pub mod model;
pub mod schema;
pub mod seed;

pub use config::{defaults, resolve, MongoConfig};
pub use context::ConnectionContext;
pub use error::{ConfigError, MongoError};
pub use host::{initialize, Host};
pub use lifecycle::{Command, Database, ALLOWED_COMMANDS};
pub use loader::load_models;
pub use model::{Model, ModelDefinition, ModelRegistry};
pub use schema::{Schema, SchemaOptions};
pub use seed::{DatasetSeeder, Seeder};
