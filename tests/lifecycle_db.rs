//! Integration tests against a live MongoDB. Ignored by default; run with a
//! server available:
//!
//! ```text
//! MONGODB_HOST=localhost:27017 cargo test -- --ignored
//! ```

use mongodb::bson::doc;
use mooring::{initialize, Host};
use serde_json::json;
use std::fs;
use std::path::Path;
use tracing_test::traced_test;

const USER_MODEL: &str = r#"{
  "name": "User",
  "fields": {
    "name": { "type": "string", "required": true },
    "password": "string"
  },
  "options": { "filter": ["password"] }
}"#;

fn test_uri(db: &str) -> String {
    let host = std::env::var("MONGODB_HOST").unwrap_or_else(|_| "localhost:27017".into());
    format!("mongodb://{host}/{db}")
}

fn build_host(root: &Path, db: &str, seed: &str) -> Host {
    fs::create_dir(root.join("models")).unwrap();
    fs::write(root.join("models/user.json"), USER_MODEL).unwrap();
    fs::create_dir(root.join("db")).unwrap();
    fs::write(root.join("db/seed.json"), seed).unwrap();
    Host::new(root, "test", json!({ "mongo": { "conn": { "uri": test_uri(db) } } }))
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn drop_purges_every_collection() {
    let dir = tempfile::tempdir().unwrap();
    let seed = r#"{ "User": [] }"#;
    let mut host = build_host(dir.path(), "mooring_drop", seed);
    initialize(&mut host).unwrap();
    host.start().await.unwrap();

    let db = host.mongo().unwrap().clone();
    let database = db.context().database().unwrap();
    // Three collections: two empty, one with documents.
    for name in ["users", "posts"] {
        let _ = database.create_collection(name).await;
    }
    database
        .collection::<mongodb::bson::Document>("audit")
        .insert_many(vec![doc! { "n": 1 }, doc! { "n": 2 }])
        .await
        .unwrap();

    db.drop_collections().await.unwrap();

    for name in database.list_collection_names().await.unwrap() {
        let count = database
            .collection::<mongodb::bson::Document>(&name)
            .count_documents(doc! {})
            .await
            .unwrap();
        assert_eq!(count, 0, "collection {name} not purged");
    }
    db.disconnect().await;
}

#[tokio::test]
#[traced_test]
#[ignore = "requires a running MongoDB"]
async fn run_seed_swallows_seeder_failure_and_reaches_disconnect() {
    let dir = tempfile::tempdir().unwrap();
    // The dataset names a model that is not registered: the seeder fails at
    // execution time, which must be logged, not raised.
    let seed = r#"{ "Ghost": [ { "name": "nope" } ] }"#;
    let mut host = build_host(dir.path(), "mooring_seed_fail", seed);
    initialize(&mut host).unwrap();

    let db = host.mongo().unwrap().clone();
    db.run("seed").await.unwrap();

    assert!(!db.context().is_connected(), "run must end disconnected");
    logs_assert(|lines: &[&str]| {
        let errors = lines.iter().filter(|line| line.contains("ERROR")).count();
        if errors == 1 {
            Ok(())
        } else {
            Err(format!("expected exactly one error log, saw {errors}"))
        }
    });
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn run_seed_populates_collections_and_serializes_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let seed = r#"{ "User": [ { "name": "Ada", "password": "secret" } ] }"#;
    let mut host = build_host(dir.path(), "mooring_seed_ok", seed);
    initialize(&mut host).unwrap();

    let db = host.mongo().unwrap().clone();
    db.run("seed").await.unwrap();

    // Reconnect to inspect what the one-shot run left behind.
    db.connect().await.unwrap();
    let model = db.models().get("User").unwrap();
    let found = model
        .collection()
        .unwrap()
        .find_one(doc! { "name": "Ada" })
        .await
        .unwrap()
        .expect("seeded user present");

    let wire = model.to_json(&found);
    let obj = wire.as_object().unwrap();
    assert!(obj.get("_id").is_none());
    assert!(obj.get("password").is_none());
    assert!(obj.get("id").unwrap().is_string());
    assert!(obj.get("createdAt").unwrap().is_string());
    db.disconnect().await;
}
