//! TOML configuration file loading.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::file::{ConfigFile, load_document};
use super::schema::SectionSchema;
use super::value::{RawMap, RawValue};
use crate::error::ConfigError;

/// Load a TOML configuration file into a tree with the generic schema.
///
/// A missing file yields an empty tree with the path recorded.
///
/// # Errors
///
/// Returns a [`ConfigError`] when the path is not a regular file, cannot be
/// read, or does not parse as TOML.
pub fn load(path: &Path) -> Result<ConfigFile, ConfigError> {
    load_with_schema(SectionSchema::generic(), Some(path), &[])
}

/// Load a TOML configuration file with a schema and default paths.
///
/// Default paths merge first, in order, skipping missing files; the
/// explicit `path` merges last and wins.
///
/// # Errors
///
/// Returns a [`ConfigError`] for unreadable or unparseable files, or for
/// schema violations in the merged data.
pub fn load_with_schema(
    schema: Arc<SectionSchema>,
    path: Option<&Path>,
    default_paths: &[PathBuf],
) -> Result<ConfigFile, ConfigError> {
    load_document(parse, schema, path, default_paths)
}

pub(crate) fn parse(content: &str, path: &Path) -> Result<RawMap, ConfigError> {
    let table: toml::Table = content.parse().map_err(|error: toml::de::Error| {
        ConfigError::Parse {
            path: path.to_path_buf(),
            message: error.message().to_string(),
        }
    })?;
    Ok(table_to_raw(table))
}

fn table_to_raw(table: toml::Table) -> RawMap {
    table
        .into_iter()
        .map(|(key, value)| (key, toml_to_raw(value)))
        .collect()
}

/// Convert a TOML value to raw configuration data.
///
/// Datetimes stringify; every other kind maps structurally.
fn toml_to_raw(value: toml::Value) -> RawValue {
    match value {
        toml::Value::String(s) => RawValue::String(s),
        toml::Value::Integer(i) => RawValue::from(i),
        toml::Value::Float(f) => {
            serde_json::Number::from_f64(f).map_or(RawValue::Null, RawValue::Number)
        }
        toml::Value::Boolean(b) => RawValue::Bool(b),
        toml::Value::Datetime(dt) => RawValue::String(dt.to_string()),
        toml::Value::Array(items) => {
            RawValue::Array(items.into_iter().map(toml_to_raw).collect())
        }
        toml::Value::Table(table) => RawValue::Object(table_to_raw(table)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::fs;

    use super::*;

    const VALID: &str = r#"test_key = "test value"

[nested_level_1]
test_nested_key = "test nested value"
"#;

    #[test]
    fn load_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_valid.toml");
        fs::write(&path, VALID).unwrap();

        let config = load(&path).unwrap();
        let tree = config.tree();
        assert_eq!(tree.get_str(tree.root(), "test_key"), Some("test value"));
        assert_eq!(
            tree.get_str(tree.root(), "nested_level_1.test_nested_key"),
            Some("test nested value"),
        );
    }

    #[test]
    fn load_typed_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("typed.toml");
        fs::write(&path, "count = 3\nratio = 0.5\nenabled = true\nitems = [1, 2]\n").unwrap();

        let config = load(&path).unwrap();
        let tree = config.tree();
        let root = tree.root();
        assert_eq!(tree.get_integer(root, "count"), Some(3));
        assert_eq!(tree.get_float(root, "ratio"), Some(0.5));
        assert_eq!(tree.get_bool(root, "enabled"), Some(true));
        let items = tree.child_list(root, "items").unwrap();
        assert_eq!(tree.list_len(items), 2);
    }

    #[test]
    fn load_missing_file_yields_empty_tree() {
        let dir = tempfile::tempdir().unwrap();
        let config = load(&dir.path().join("missing.toml")).unwrap();
        assert!(config.tree().is_empty(config.tree().root()));
    }

    #[test]
    fn load_invalid_content_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_invalid.toml");
        fs::write(&path, "key = \n").unwrap();
        assert!(matches!(load(&path), Err(ConfigError::Parse { .. })));
    }
}
