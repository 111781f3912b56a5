//! Deterministic model discovery from a definitions directory.

use crate::context::ConnectionContext;
use crate::error::MongoError;
use crate::model::ModelDefinition;
use std::fs;
use std::path::{Path, PathBuf};

/// Load every model definition in `dir` into the context.
///
/// Hidden entries and the aggregator entry (file stem `index`) are skipped;
/// the rest are parsed in lexical order. Registration order is load order,
/// and duplicate model names overwrite silently.
pub fn load_models(dir: &Path, context: &mut ConnectionContext) -> Result<(), MongoError> {
    if !dir.is_dir() {
        return Err(MongoError::ModelsPath { path: absolute(dir) });
    }

    let entries = fs::read_dir(dir).map_err(|source| MongoError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| MongoError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name();
        if name.to_string_lossy().starts_with('.') {
            continue;
        }
        if path.file_stem().map(|stem| stem == "index").unwrap_or(false) {
            continue;
        }
        files.push(path);
    }
    files.sort();

    for path in files {
        let raw = fs::read_to_string(&path).map_err(|source| MongoError::Io {
            path: path.clone(),
            source,
        })?;
        let def: ModelDefinition = serde_json::from_str(&raw).map_err(|source| {
            MongoError::ModelFile {
                path: path.clone(),
                source,
            }
        })?;
        context.register(def);
    }
    Ok(())
}

/// Absolute form of `path` for error messages; never touches the filesystem.
pub(crate) fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaOptions;

    const USER: &str = r#"{ "name": "User", "fields": { "name": "string" } }"#;

    fn context() -> ConnectionContext {
        ConnectionContext::new(false, SchemaOptions::default())
    }

    fn write(dir: &Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn loads_models_and_skips_hidden_and_index_entries() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "user.json", USER);
        write(dir.path(), ".hidden.json", USER);
        write(dir.path(), "index.json", r#"{ "name": "Aggregator" }"#);
        let mut ctx = context();
        load_models(dir.path(), &mut ctx).unwrap();
        assert_eq!(ctx.models().names().collect::<Vec<_>>(), vec!["User"]);
    }

    #[test]
    fn missing_dir_reports_the_absolute_path() {
        let mut ctx = context();
        let err = load_models(Path::new("no/such/models"), &mut ctx).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("models path is not valid"), "{message}");
        let quoted = message.split('"').nth(1).unwrap();
        assert!(Path::new(quoted).is_absolute(), "{message}");
    }

    #[test]
    fn lexical_order_with_silent_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b_user.json", r#"{ "name": "User", "collection": "users_b" }"#);
        write(dir.path(), "a_post.json", r#"{ "name": "Post" }"#);
        write(dir.path(), "c_user.json", r#"{ "name": "User", "collection": "users_c" }"#);
        let mut ctx = context();
        load_models(dir.path(), &mut ctx).unwrap();
        // Discovery order is preserved; the later duplicate wins in place.
        let names: Vec<_> = ctx.models().names().collect();
        assert_eq!(names, vec!["Post", "User"]);
        assert_eq!(ctx.models().get("User").unwrap().collection_name(), "users_c");
    }

    #[test]
    fn broken_definition_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "user.json", "{ not json");
        let mut ctx = context();
        let err = load_models(dir.path(), &mut ctx).unwrap_err();
        assert!(matches!(err, MongoError::ModelFile { .. }));
    }
}
