//! Host binding: the slice of a host application this module consumes, and
//! the initializer that wires the lifecycle into it.

use crate::config;
use crate::context::ConnectionContext;
use crate::error::{ConfigError, MongoError};
use crate::lifecycle::Database;
use crate::loader;
use futures::future::BoxFuture;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Callback registered to run before the host starts.
pub type BeforeStartHook = Box<dyn Fn() -> BoxFuture<'static, Result<(), MongoError>> + Send + Sync>;

/// What this module needs from a host application: a root directory for
/// resolving relative paths, an environment name, a mutable config object,
/// and a before-start hook registry. On successful initialization the
/// lifecycle API and the raw connection context are exposed here.
pub struct Host {
    root: PathBuf,
    env: String,
    pub config: Value,
    before_start: Vec<BeforeStartHook>,
    mongo: Option<Arc<Database>>,
    context: Option<Arc<ConnectionContext>>,
}

impl Host {
    pub fn new(root: impl Into<PathBuf>, env: impl Into<String>, config: Value) -> Host {
        Host {
            root: root.into(),
            env: env.into(),
            config,
            before_start: Vec::new(),
            mongo: None,
            context: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn env(&self) -> &str {
        &self.env
    }

    /// Register a callback to run before the host starts.
    pub fn on_before_start(&mut self, hook: BeforeStartHook) {
        self.before_start.push(hook);
    }

    pub fn before_start_count(&self) -> usize {
        self.before_start.len()
    }

    /// Drive the registered before-start hooks, in registration order.
    pub async fn start(&mut self) -> Result<(), MongoError> {
        for hook in &self.before_start {
            hook().await?;
        }
        Ok(())
    }

    /// The lifecycle API, present only when the module initialized enabled.
    pub fn mongo(&self) -> Option<&Arc<Database>> {
        self.mongo.as_ref()
    }

    /// The raw connection-context handle.
    pub fn mongo_context(&self) -> Option<&Arc<ConnectionContext>> {
        self.context.as_ref()
    }
}

/// Resolve configuration, build the connection context and lifecycle API,
/// and wire them onto the host.
///
/// With `enabled = false` this returns immediately and exposes nothing. On
/// any error the host is left untouched: config write-back, exposure, and
/// hook registration all happen after the last fallible step.
pub fn initialize(host: &mut Host) -> Result<(), MongoError> {
    let config = config::resolve(&config::defaults(host.env()), &host.config)?;
    if !config.enabled {
        return Ok(());
    }

    let mut context = ConnectionContext::new(config.debug, config.schema.options.clone());
    let models_path = resolve_path(host.root(), &config.paths.models);
    let seed_path = resolve_path(host.root(), &config.paths.seed);
    loader::load_models(&models_path, &mut context)?;

    let context = Arc::new(context);
    let database = Arc::new(Database::new(
        context.clone(),
        config.conn.clone(),
        seed_path,
        host.env(),
    ));
    let normalized =
        serde_json::to_value(&config).map_err(|e| ConfigError::Load(e.to_string()))?;

    match &mut host.config {
        Value::Object(map) => {
            map.insert("mongo".to_string(), normalized);
        }
        other => *other = json!({ "mongo": normalized }),
    }
    host.mongo = Some(database.clone());
    host.context = Some(context);

    let connect = database.clone();
    host.on_before_start(Box::new(move || {
        let db = connect.clone();
        Box::pin(async move { db.connect().await })
    }));
    Ok(())
}

/// Join a config path onto the host root. A leading separator marks the
/// path as root-relative, not absolute.
fn resolve_path(root: &Path, value: &str) -> PathBuf {
    root.join(value.trim_start_matches('/'))
}
