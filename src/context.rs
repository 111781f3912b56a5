//! Connection context: the shared client slot, schema defaults, and the
//! model registry for one initializer invocation.

use crate::error::MongoError;
use crate::model::{Model, ModelDefinition, ModelRegistry};
use crate::schema::SchemaOptions;
use mongodb::Client;
use std::sync::{Arc, PoisonError, RwLock};

/// Shared connection slot. Models hold a handle so collection access keeps
/// working after the registry is frozen behind the context.
pub struct ConnectionState {
    debug: bool,
    active: RwLock<Option<ActiveConnection>>,
}

struct ActiveConnection {
    client: Client,
    db_name: String,
}

impl ConnectionState {
    fn new(debug: bool) -> ConnectionState {
        ConnectionState {
            debug,
            active: RwLock::new(None),
        }
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn is_connected(&self) -> bool {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub(crate) fn set(&self, client: Client, db_name: String) {
        *self.active.write().unwrap_or_else(PoisonError::into_inner) =
            Some(ActiveConnection { client, db_name });
    }

    pub(crate) fn take(&self) -> Option<Client> {
        self.active
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .map(|active| active.client)
    }

    /// Handle to the default database. `NotConnected` before `connect`.
    pub fn database(&self) -> Result<mongodb::Database, MongoError> {
        let guard = self.active.read().unwrap_or_else(PoisonError::into_inner);
        let active = guard.as_ref().ok_or(MongoError::NotConnected)?;
        Ok(active.client.database(&active.db_name))
    }
}

/// One database connection plus its registered models and settings.
/// Exclusively owned by the lifecycle for a single initializer invocation;
/// independent invocations own independent contexts.
pub struct ConnectionContext {
    state: Arc<ConnectionState>,
    schema_defaults: SchemaOptions,
    registry: ModelRegistry,
}

impl ConnectionContext {
    pub fn new(debug: bool, schema_defaults: SchemaOptions) -> ConnectionContext {
        ConnectionContext {
            state: Arc::new(ConnectionState::new(debug)),
            schema_defaults,
            registry: ModelRegistry::default(),
        }
    }

    pub fn debug(&self) -> bool {
        self.state.debug()
    }

    /// Register one model. The context's schema defaults are combined into
    /// the schema here; the definition's own options win per key. Duplicate
    /// names overwrite silently.
    pub fn register(&mut self, def: ModelDefinition) {
        let model = Model::new(def, &self.schema_defaults, self.state.clone());
        self.registry.insert(model);
    }

    pub fn models(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Handle to the default database. `NotConnected` before `connect`.
    pub fn database(&self) -> Result<mongodb::Database, MongoError> {
        self.state.database()
    }

    pub(crate) fn state(&self) -> Arc<ConnectionState> {
        self.state.clone()
    }
}
