//! Example consumer: a small axum host that mounts mooring.
//!
//! Serve: `cargo run -p example-consumer`
//! One-shot commands: `cargo run -p example-consumer -- seed` (or `drop`);
//! the process exits 0 when the command completes.

use axum::{extract::State, routing::get, Json, Router};
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, Document};
use mooring::{initialize, Database, Host, MongoError};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("mooring=info")),
        )
        .init();

    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
    let uri = std::env::var("MONGODB_URI")
        .unwrap_or_else(|_| "mongodb://localhost:27017/example".into());

    let mut host = Host::new(root, env, json!({ "mongo": { "conn": { "uri": uri } } }));
    initialize(&mut host)?;
    let db = host.mongo().expect("mongo is enabled in this demo").clone();

    // One-shot command path: the exit decision lives here, not in the
    // lifecycle component.
    if let Some(cmd) = std::env::args().nth(1) {
        db.run(&cmd).await?;
        std::process::exit(0);
    }

    host.start().await?;

    let app = Router::new().route("/users", get(list_users)).with_state(db);
    let listener = TcpListener::bind("127.0.0.1:3000").await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn list_users(State(db): State<Arc<Database>>) -> Json<serde_json::Value> {
    match fetch_users(&db).await {
        Ok(users) => Json(json!({ "data": users })),
        Err(e) => Json(json!({ "error": e.to_string() })),
    }
}

async fn fetch_users(db: &Database) -> Result<Vec<serde_json::Value>, MongoError> {
    let Some(model) = db.models().get("User") else {
        return Ok(Vec::new());
    };
    let cursor = model.collection()?.find(doc! {}).await?;
    let docs: Vec<Document> = cursor.try_collect().await?;
    Ok(docs.iter().map(|doc| model.to_json(doc)).collect())
}
