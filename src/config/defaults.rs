//! Built-in configuration defaults with per-environment overlays.

use crate::config::deep_merge;
use serde_json::{json, Value};

/// Default config for `env`: the base defaults deep-merged with the
/// environment overlay. `conn.uri` has no default and must come from the
/// host overrides.
pub fn defaults(env: &str) -> Value {
    let base = json!({
        "mongo": {
            "enabled": true,
            "debug": true,
            "paths": {
                "seed": "db/seed.json",
                "models": "models",
            },
            "conn": {
                "uri": null,
                "options": {},
            },
            "schema": {
                "options": {
                    "minimize": false,
                    "timestamps": true,
                },
            },
        }
    });

    let overlay = match env {
        // Quiet environments: keep lifecycle logs, drop driver chatter.
        "test" | "production" => json!({ "mongo": { "debug": false } }),
        _ => json!({}),
    };

    deep_merge(base, &overlay)
}
