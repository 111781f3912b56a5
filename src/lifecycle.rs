//! The database lifecycle API: connect, disconnect, drop, seed, run.

use crate::config::ConnConfig;
use crate::context::ConnectionContext;
use crate::error::MongoError;
use crate::model::ModelRegistry;
use crate::seed::{DatasetSeeder, Seeder};
use futures::future::try_join_all;
use mongodb::bson::{doc, Document};
use mongodb::options::ClientOptions;
use mongodb::Client;
use serde_json::Value;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Commands accepted by [`Database::run`].
pub const ALLOWED_COMMANDS: &[&str] = &["seed", "drop"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Seed,
    Drop,
}

impl FromStr for Command {
    type Err = MongoError;

    fn from_str(s: &str) -> Result<Command, MongoError> {
        match s {
            "seed" => Ok(Command::Seed),
            "drop" => Ok(Command::Drop),
            other => Err(MongoError::Command {
                cmd: other.to_string(),
            }),
        }
    }
}

/// The lifecycle API handed to the host. One instance per initializer
/// invocation; independent instances own independent contexts, so multiple
/// mounted apps can hold separate connections.
pub struct Database {
    context: Arc<ConnectionContext>,
    conn: ConnConfig,
    seed_path: PathBuf,
    env: String,
}

impl Database {
    pub fn new(
        context: Arc<ConnectionContext>,
        conn: ConnConfig,
        seed_path: PathBuf,
        env: impl Into<String>,
    ) -> Database {
        Database {
            context,
            conn,
            seed_path,
            env: env.into(),
        }
    }

    pub fn context(&self) -> &Arc<ConnectionContext> {
        &self.context
    }

    pub fn models(&self) -> &ModelRegistry {
        self.context.models()
    }

    /// Open the connection and verify it with a ping, so failures surface
    /// eagerly. Connection errors propagate to the caller; there is no
    /// retry.
    pub async fn connect(&self) -> Result<(), MongoError> {
        let mut options = ClientOptions::parse(&self.conn.uri).await?;
        apply_conn_options(&mut options, &self.conn.options);
        let db_name = options
            .default_database
            .clone()
            .unwrap_or_else(|| "test".to_string());
        let client = Client::with_options(options)?;
        client
            .database(&db_name)
            .run_command(doc! { "ping": 1 })
            .await?;
        self.context.state().set(client, db_name);
        info!("MongoDB: Connected");
        Ok(())
    }

    /// Close the connection. Safe to call without a prior successful
    /// connect.
    pub async fn disconnect(&self) {
        if let Some(client) = self.context.state().take() {
            client.shutdown().await;
        }
    }

    /// Delete every document from every collection on the database. The
    /// per-collection deletions run in parallel; this returns once all of
    /// them complete.
    pub async fn drop_collections(&self) -> Result<(), MongoError> {
        info!("MongoDB: Dropping collections...");
        let db = self.context.database()?;
        let names = db.list_collection_names().await?;
        let deletions = names.iter().map(|name| {
            let collection = db.collection::<Document>(name);
            async move { collection.delete_many(doc! {}).await }
        });
        let results = try_join_all(deletions).await?;
        if self.context.debug() {
            let deleted: u64 = results.iter().map(|r| r.deleted_count).sum();
            debug!(collections = names.len(), deleted, "purged");
        }
        info!("MongoDB: Collections dropped successfully");
        Ok(())
    }

    /// Drop everything, then run the seed dataset from the configured seed
    /// path. An unresolvable seed path is a fatal configuration error;
    /// seeder execution errors are logged and swallowed.
    pub async fn seed(&self) -> Result<(), MongoError> {
        let seeder = DatasetSeeder::load(&self.seed_path)?;
        self.seed_with(&seeder).await
    }

    /// The same drop-then-seed sequence with a caller-provided seeder.
    pub async fn seed_with(&self, seeder: &dyn Seeder) -> Result<(), MongoError> {
        self.drop_collections().await?;
        info!("MongoDB: Adding seed data...");
        match seeder.seed(self.models(), &self.env).await {
            Ok(()) => info!("MongoDB: Seed data added successfully"),
            Err(e) => error!(error = %e, "MongoDB: seed failed"),
        }
        Ok(())
    }

    /// Guarded one-shot command runner: connect, run the named operation,
    /// disconnect, sequentially. `Ok(())` means the process should exit 0;
    /// the decision to terminate belongs to the command-line entry point,
    /// not to this component. An unlisted command fails before any
    /// connection is opened.
    pub async fn run(&self, cmd: &str) -> Result<(), MongoError> {
        let command: Command = cmd.parse()?;
        self.connect().await?;
        match command {
            Command::Seed => self.seed().await?,
            Command::Drop => self.drop_collections().await?,
        }
        self.disconnect().await;
        Ok(())
    }
}

/// Map recognized `conn.options` keys onto the driver's client options.
/// Unrecognized keys (or values of the wrong type) warn and are ignored.
fn apply_conn_options(options: &mut ClientOptions, overrides: &serde_json::Map<String, Value>) {
    for (key, value) in overrides {
        let applied = match key.as_str() {
            "appName" => set(&mut options.app_name, value.as_str().map(String::from)),
            "maxPoolSize" => set(&mut options.max_pool_size, value.as_u64().map(|v| v as u32)),
            "minPoolSize" => set(&mut options.min_pool_size, value.as_u64().map(|v| v as u32)),
            "connectTimeoutMS" => set(
                &mut options.connect_timeout,
                value.as_u64().map(Duration::from_millis),
            ),
            "serverSelectionTimeoutMS" => set(
                &mut options.server_selection_timeout,
                value.as_u64().map(Duration::from_millis),
            ),
            "directConnection" => set(&mut options.direct_connection, value.as_bool()),
            "retryWrites" => set(&mut options.retry_writes, value.as_bool()),
            "replicaSet" => set(&mut options.repl_set_name, value.as_str().map(String::from)),
            _ => false,
        };
        if !applied {
            warn!(option = %key, "unrecognized connection option, ignoring");
        }
    }
}

fn set<T>(slot: &mut Option<T>, value: Option<T>) -> bool {
    match value {
        Some(v) => {
            *slot = Some(v);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaOptions;

    fn database() -> Database {
        let context = Arc::new(ConnectionContext::new(false, SchemaOptions::default()));
        let conn = ConnConfig {
            uri: "mongodb://localhost:27017/app".to_string(),
            options: serde_json::Map::new(),
        };
        Database::new(context, conn, PathBuf::from("db/seed.json"), "test")
    }

    #[test]
    fn command_parsing_matches_the_allow_list() {
        assert_eq!("seed".parse::<Command>().unwrap(), Command::Seed);
        assert_eq!("drop".parse::<Command>().unwrap(), Command::Drop);
        assert!("migrate".parse::<Command>().is_err());
    }

    #[tokio::test]
    async fn rejects_unlisted_commands_before_connecting() {
        let db = database();
        let err = db.run("dropall").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Command dropall not allowed. Valid options: seed, drop."
        );
        assert!(!db.context().is_connected());
    }

    #[tokio::test]
    async fn drop_requires_a_connection() {
        let db = database();
        let result = db.drop_collections().await;
        assert!(matches!(result, Err(MongoError::NotConnected)));
    }

    #[tokio::test]
    async fn disconnect_without_connect_is_safe() {
        database().disconnect().await;
    }

    #[tokio::test]
    async fn seed_with_missing_dataset_is_fatal() {
        let db = database();
        let result = db.seed().await;
        assert!(matches!(result, Err(MongoError::SeedPath { .. })));
    }

    #[tokio::test]
    async fn connect_options_are_mapped() {
        let mut options = ClientOptions::parse("mongodb://localhost:27017/app")
            .await
            .unwrap();
        let mut overrides = serde_json::Map::new();
        overrides.insert("appName".into(), "mooring".into());
        overrides.insert("maxPoolSize".into(), 20u64.into());
        overrides.insert("bogus".into(), true.into());
        apply_conn_options(&mut options, &overrides);
        assert_eq!(options.app_name.as_deref(), Some("mooring"));
        assert_eq!(options.max_pool_size, Some(20));
    }
}
